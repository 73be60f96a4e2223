//! # Message Schemas
//!
//! Declarative field layouts and the generic codec that walks them.
//!
//! A [`MessageSchema`] is an ordered list of named, typed fields. Decoding
//! walks the fields in declaration order against a [`ByteBuffer`]; encoding
//! is the structural mirror and checks that the supplied values agree with
//! the declared types. Sequences are VarInt-count-prefixed; optionals are a
//! boolean presence flag followed by the payload; groups nest a field list
//! (used for composite sequence elements such as profile properties).
//!
//! NBT fields are encode-only: the protocol never asks the server to parse
//! inbound NBT, so decoding one is reported as an unsupported field shape
//! naming the offending field.

use uuid::Uuid;

use crate::core::buffer::ByteBuffer;
use crate::core::nbt::NbtValue;
use crate::error::{ProtocolError, Result};

/// Declared type of one message field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    Bool,
    UByte,
    UShort,
    Int,
    Long,
    VarInt,
    VarLong,
    String,
    Uuid,
    Nbt,
    /// VarInt-count-prefixed homogeneous sequence.
    Seq(Box<FieldType>),
    /// Boolean presence flag followed by the payload when present.
    Optional(Box<FieldType>),
    /// An inline ordered field list, for composite sequence elements.
    Group(Vec<FieldSpec>),
}

impl FieldType {
    pub fn seq(element: FieldType) -> Self {
        FieldType::Seq(Box::new(element))
    }

    pub fn optional(element: FieldType) -> Self {
        FieldType::Optional(Box::new(element))
    }
}

/// Decoded value of one message field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    UByte(u8),
    UShort(u16),
    Int(i32),
    Long(i64),
    VarInt(i32),
    VarLong(i64),
    String(String),
    Uuid(Uuid),
    Nbt(NbtValue),
    Seq(Vec<FieldValue>),
    Optional(Option<Box<FieldValue>>),
    Group(Vec<FieldValue>),
}

impl FieldValue {
    /// Wraps raw bytes as a sequence of unsigned bytes.
    pub fn byte_seq(bytes: &[u8]) -> Self {
        FieldValue::Seq(bytes.iter().map(|b| FieldValue::UByte(*b)).collect())
    }

    /// Unwraps a sequence of unsigned bytes back into raw bytes.
    pub fn as_byte_seq(&self) -> Option<Vec<u8>> {
        match self {
            FieldValue::Seq(values) => values
                .iter()
                .map(|v| match v {
                    FieldValue::UByte(b) => Some(*b),
                    _ => None,
                })
                .collect(),
            _ => None,
        }
    }
}

/// One named, typed field of a message.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub ty: FieldType,
}

impl FieldSpec {
    pub fn new(name: &'static str, ty: FieldType) -> Self {
        Self { name, ty }
    }
}

/// The declarative layout of one message type.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageSchema {
    pub name: &'static str,
    pub fields: Vec<FieldSpec>,
}

impl MessageSchema {
    pub fn new(name: &'static str, fields: Vec<FieldSpec>) -> Self {
        Self { name, fields }
    }

    /// Decodes every field in declaration order.
    pub fn decode(&self, buf: &mut ByteBuffer) -> Result<Vec<FieldValue>> {
        self.fields
            .iter()
            .map(|field| self.decode_value(field.name, &field.ty, buf))
            .collect()
    }

    fn decode_value(
        &self,
        field: &'static str,
        ty: &FieldType,
        buf: &mut ByteBuffer,
    ) -> Result<FieldValue> {
        match ty {
            FieldType::Bool => buf.read_bool().map(FieldValue::Bool),
            FieldType::UByte => buf.read_u8().map(FieldValue::UByte),
            FieldType::UShort => buf.read_u16().map(FieldValue::UShort),
            FieldType::Int => buf.read_i32().map(FieldValue::Int),
            FieldType::Long => buf.read_i64().map(FieldValue::Long),
            FieldType::VarInt => buf.read_var_int().map(|(v, _)| FieldValue::VarInt(v)),
            FieldType::VarLong => buf.read_var_long().map(|(v, _)| FieldValue::VarLong(v)),
            FieldType::String => buf.read_string().map(FieldValue::String),
            FieldType::Uuid => buf.read_uuid().map(FieldValue::Uuid),
            FieldType::Nbt => Err(ProtocolError::UnsupportedField {
                message: self.name,
                field,
            }),
            FieldType::Seq(element) => {
                let (count, _) = buf.read_var_int()?;
                if count < 0 || count as usize > buf.remaining() {
                    return Err(ProtocolError::FieldMismatch {
                        message: self.name,
                        field,
                    });
                }
                let values = (0..count)
                    .map(|_| self.decode_value(field, element, buf))
                    .collect::<Result<Vec<_>>>()?;
                Ok(FieldValue::Seq(values))
            }
            FieldType::Optional(element) => {
                if buf.read_bool()? {
                    let value = self.decode_value(field, element, buf)?;
                    Ok(FieldValue::Optional(Some(Box::new(value))))
                } else {
                    Ok(FieldValue::Optional(None))
                }
            }
            FieldType::Group(specs) => {
                let values = specs
                    .iter()
                    .map(|spec| self.decode_value(spec.name, &spec.ty, buf))
                    .collect::<Result<Vec<_>>>()?;
                Ok(FieldValue::Group(values))
            }
        }
    }

    /// Encodes `values` field-by-field; the structural mirror of
    /// [`MessageSchema::decode`].
    pub fn encode(&self, values: &[FieldValue]) -> Result<ByteBuffer> {
        if values.len() != self.fields.len() {
            return Err(ProtocolError::FieldMismatch {
                message: self.name,
                field: "field count",
            });
        }
        let mut buf = ByteBuffer::new();
        for (field, value) in self.fields.iter().zip(values) {
            self.encode_value(field.name, &field.ty, value, &mut buf)?;
        }
        Ok(buf)
    }

    fn encode_value(
        &self,
        field: &'static str,
        ty: &FieldType,
        value: &FieldValue,
        buf: &mut ByteBuffer,
    ) -> Result<()> {
        let mismatch = || ProtocolError::FieldMismatch {
            message: self.name,
            field,
        };
        match (ty, value) {
            (FieldType::Bool, FieldValue::Bool(v)) => buf.write_bool(*v),
            (FieldType::UByte, FieldValue::UByte(v)) => buf.write_u8(*v),
            (FieldType::UShort, FieldValue::UShort(v)) => buf.write_u16(*v),
            (FieldType::Int, FieldValue::Int(v)) => buf.write_i32(*v),
            (FieldType::Long, FieldValue::Long(v)) => buf.write_i64(*v),
            (FieldType::VarInt, FieldValue::VarInt(v)) => {
                buf.write_var_int(*v);
            }
            (FieldType::VarLong, FieldValue::VarLong(v)) => {
                buf.write_var_long(*v);
            }
            (FieldType::String, FieldValue::String(v)) => {
                buf.write_string(v);
            }
            (FieldType::Uuid, FieldValue::Uuid(v)) => buf.write_uuid(*v),
            (FieldType::Nbt, FieldValue::Nbt(v)) => v.write_to(buf),
            (FieldType::Seq(element), FieldValue::Seq(values)) => {
                buf.write_var_int(values.len() as i32);
                for v in values {
                    self.encode_value(field, element, v, buf)?;
                }
            }
            (FieldType::Optional(element), FieldValue::Optional(value)) => {
                buf.write_bool(value.is_some());
                if let Some(v) = value {
                    self.encode_value(field, element, v, buf)?;
                }
            }
            (FieldType::Group(specs), FieldValue::Group(values)) => {
                if specs.len() != values.len() {
                    return Err(mismatch());
                }
                for (spec, v) in specs.iter().zip(values) {
                    self.encode_value(spec.name, &spec.ty, v, buf)?;
                }
            }
            _ => return Err(mismatch()),
        }
        Ok(())
    }
}
