//! # NBT Tree Serializer
//!
//! Encoder for the tagged, named, recursively-nestable binary value tree used
//! by structured payloads such as rich-text disconnect reasons.
//!
//! Values are built in memory through the constructors below and serialized
//! once. The writer emits `tag + name + payload` for entries inside a
//! compound, `tag + payload` at the top level (network form, no root name),
//! and payload-only for list elements. Every compound payload is terminated by
//! an explicit End tag.
//!
//! Lists are homogeneous: [`NbtValue::list`] rejects mismatched element tags
//! at construction rather than coercing them.

use crate::core::buffer::ByteBuffer;
use crate::error::{ProtocolError, Result};

/// NBT tag identifiers, in wire order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NbtTag {
    End = 0,
    Byte = 1,
    Short = 2,
    Int = 3,
    Long = 4,
    Float = 5,
    Double = 6,
    ByteArray = 7,
    String = 8,
    List = 9,
    Compound = 10,
    IntArray = 11,
    LongArray = 12,
}

impl NbtTag {
    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            NbtTag::End => "TAG_End",
            NbtTag::Byte => "TAG_Byte",
            NbtTag::Short => "TAG_Short",
            NbtTag::Int => "TAG_Int",
            NbtTag::Long => "TAG_Long",
            NbtTag::Float => "TAG_Float",
            NbtTag::Double => "TAG_Double",
            NbtTag::ByteArray => "TAG_Byte_Array",
            NbtTag::String => "TAG_String",
            NbtTag::List => "TAG_List",
            NbtTag::Compound => "TAG_Compound",
            NbtTag::IntArray => "TAG_Int_Array",
            NbtTag::LongArray => "TAG_Long_Array",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum NbtPayload {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<u8>),
    String(String),
    List(Vec<NbtValue>),
    Compound(Vec<NbtValue>),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

/// One node of the value tree: an optional name plus a tagged payload.
#[derive(Debug, Clone, PartialEq)]
pub struct NbtValue {
    name: Option<String>,
    payload: NbtPayload,
}

enum WriteContext {
    TopLevel,
    InCompound,
    InList,
}

impl NbtValue {
    fn unnamed(payload: NbtPayload) -> Self {
        Self {
            name: None,
            payload,
        }
    }

    pub fn byte(v: i8) -> Self {
        Self::unnamed(NbtPayload::Byte(v))
    }

    pub fn short(v: i16) -> Self {
        Self::unnamed(NbtPayload::Short(v))
    }

    pub fn int(v: i32) -> Self {
        Self::unnamed(NbtPayload::Int(v))
    }

    pub fn long(v: i64) -> Self {
        Self::unnamed(NbtPayload::Long(v))
    }

    pub fn float(v: f32) -> Self {
        Self::unnamed(NbtPayload::Float(v))
    }

    pub fn double(v: f64) -> Self {
        Self::unnamed(NbtPayload::Double(v))
    }

    pub fn byte_array(v: impl Into<Vec<u8>>) -> Self {
        Self::unnamed(NbtPayload::ByteArray(v.into()))
    }

    pub fn string(v: impl Into<String>) -> Self {
        Self::unnamed(NbtPayload::String(v.into()))
    }

    pub fn int_array(v: impl Into<Vec<i32>>) -> Self {
        Self::unnamed(NbtPayload::IntArray(v.into()))
    }

    pub fn long_array(v: impl Into<Vec<i64>>) -> Self {
        Self::unnamed(NbtPayload::LongArray(v.into()))
    }

    pub fn compound(entries: Vec<NbtValue>) -> Self {
        Self::unnamed(NbtPayload::Compound(entries))
    }

    /// Builds a list value. All elements must carry the same tag.
    pub fn list(entries: Vec<NbtValue>) -> Result<Self> {
        if let Some(first) = entries.first() {
            let expected = first.tag();
            for entry in &entries {
                if entry.tag() != expected {
                    return Err(ProtocolError::MismatchedListTag {
                        expected: expected.name(),
                        found: entry.tag().name(),
                    });
                }
            }
        }
        Ok(Self::unnamed(NbtPayload::List(entries)))
    }

    /// Attaches a name, used when this value is an entry of a compound.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn tag(&self) -> NbtTag {
        match self.payload {
            NbtPayload::Byte(_) => NbtTag::Byte,
            NbtPayload::Short(_) => NbtTag::Short,
            NbtPayload::Int(_) => NbtTag::Int,
            NbtPayload::Long(_) => NbtTag::Long,
            NbtPayload::Float(_) => NbtTag::Float,
            NbtPayload::Double(_) => NbtTag::Double,
            NbtPayload::ByteArray(_) => NbtTag::ByteArray,
            NbtPayload::String(_) => NbtTag::String,
            NbtPayload::List(_) => NbtTag::List,
            NbtPayload::Compound(_) => NbtTag::Compound,
            NbtPayload::IntArray(_) => NbtTag::IntArray,
            NbtPayload::LongArray(_) => NbtTag::LongArray,
        }
    }

    /// Serializes this value in its top-level (network) form.
    pub fn write_to(&self, buf: &mut ByteBuffer) {
        self.write_internal(buf, WriteContext::TopLevel);
    }

    fn write_internal(&self, buf: &mut ByteBuffer, context: WriteContext) {
        match context {
            WriteContext::TopLevel => {
                buf.write_u8(self.tag().id());
            }
            WriteContext::InCompound => {
                buf.write_u8(self.tag().id());
                let name = self.name.as_deref().unwrap_or("");
                buf.write_u16(name.len() as u16);
                buf.write(name.as_bytes());
            }
            WriteContext::InList => {}
        }

        match &self.payload {
            NbtPayload::Byte(v) => buf.write_u8(*v as u8),
            NbtPayload::Short(v) => buf.write_i16(*v),
            NbtPayload::Int(v) => buf.write_i32(*v),
            NbtPayload::Long(v) => buf.write_i64(*v),
            NbtPayload::Float(v) => buf.write_f32(*v),
            NbtPayload::Double(v) => buf.write_f64(*v),
            NbtPayload::ByteArray(bytes) => {
                buf.write_i32(bytes.len() as i32);
                buf.write(bytes);
            }
            NbtPayload::String(s) => {
                buf.write_u16(s.len() as u16);
                buf.write(s.as_bytes());
            }
            NbtPayload::List(entries) => {
                let element_tag = entries.first().map_or(NbtTag::End, NbtValue::tag);
                buf.write_u8(element_tag.id());
                buf.write_i32(entries.len() as i32);
                for entry in entries {
                    entry.write_internal(buf, WriteContext::InList);
                }
            }
            NbtPayload::Compound(entries) => {
                for entry in entries {
                    entry.write_internal(buf, WriteContext::InCompound);
                }
                buf.write_u8(NbtTag::End.id());
            }
            NbtPayload::IntArray(values) => {
                buf.write_i32(values.len() as i32);
                for v in values {
                    buf.write_i32(*v);
                }
            }
            NbtPayload::LongArray(values) => {
                buf.write_i32(values.len() as i32);
                for v in values {
                    buf.write_i64(*v);
                }
            }
        }
    }
}
