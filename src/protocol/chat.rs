//! Rich-text chat components.
//!
//! The protocol carries styled text either as a JSON string (login
//! disconnect) or as an NBT compound (configuration disconnect). The same
//! in-memory component serves both forms: serde produces the JSON shape with
//! unset fields omitted, and [`Chat::to_nbt`] produces the tree form.

use serde::{Deserialize, Serialize};

use crate::core::nbt::NbtValue;
use crate::error::{ProtocolError, Result};

/// A named color, or an `#rrggbb` hex color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatColor {
    Black,
    DarkBlue,
    DarkGreen,
    DarkAqua,
    DarkRed,
    DarkPurple,
    Gold,
    Gray,
    DarkGray,
    Blue,
    Green,
    Aqua,
    Red,
    LightPurple,
    Yellow,
    White,
    #[serde(untagged)]
    Hex(String),
}

impl ChatColor {
    /// Validates and wraps an `#rrggbb` hex color.
    pub fn hex(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        let valid = value.len() == 7
            && value.starts_with('#')
            && value[1..].chars().all(|c| c.is_ascii_hexdigit());
        if !valid {
            return Err(ProtocolError::ConfigError(format!(
                "invalid hex color {value:?}"
            )));
        }
        Ok(ChatColor::Hex(value))
    }

    pub fn as_str(&self) -> &str {
        match self {
            ChatColor::Black => "black",
            ChatColor::DarkBlue => "dark_blue",
            ChatColor::DarkGreen => "dark_green",
            ChatColor::DarkAqua => "dark_aqua",
            ChatColor::DarkRed => "dark_red",
            ChatColor::DarkPurple => "dark_purple",
            ChatColor::Gold => "gold",
            ChatColor::Gray => "gray",
            ChatColor::DarkGray => "dark_gray",
            ChatColor::Blue => "blue",
            ChatColor::Green => "green",
            ChatColor::Aqua => "aqua",
            ChatColor::Red => "red",
            ChatColor::LightPurple => "light_purple",
            ChatColor::Yellow => "yellow",
            ChatColor::White => "white",
            ChatColor::Hex(value) => value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatFont {
    #[serde(rename = "minecraft:default")]
    Default,
    #[serde(rename = "minecraft:uniform")]
    Uniform,
    /// Enchanting table glyphs.
    #[serde(rename = "minecraft:alt")]
    Alt,
    #[serde(rename = "minecraft:illageralt")]
    IllagerAlt,
}

impl ChatFont {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatFont::Default => "minecraft:default",
            ChatFont::Uniform => "minecraft:uniform",
            ChatFont::Alt => "minecraft:alt",
            ChatFont::IllagerAlt => "minecraft:illageralt",
        }
    }
}

fn is_false(v: &bool) -> bool {
    !v
}

/// One styled text component with optional nested children.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<ChatColor>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<ChatFont>,

    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub extra: Vec<Chat>,

    #[serde(skip_serializing_if = "is_false", default)]
    pub bold: bool,

    #[serde(skip_serializing_if = "is_false", default)]
    pub italic: bool,

    #[serde(skip_serializing_if = "is_false", default)]
    pub underlined: bool,

    #[serde(skip_serializing_if = "is_false", default)]
    pub strikethrough: bool,

    #[serde(skip_serializing_if = "is_false", default)]
    pub obfuscated: bool,
}

impl Chat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, value: impl Into<String>) -> Self {
        self.text = Some(value.into());
        self
    }

    pub fn color(mut self, value: ChatColor) -> Self {
        self.color = Some(value);
        self
    }

    pub fn font(mut self, value: ChatFont) -> Self {
        self.font = Some(value);
        self
    }

    pub fn bold(mut self, value: bool) -> Self {
        self.bold = value;
        self
    }

    pub fn italic(mut self, value: bool) -> Self {
        self.italic = value;
        self
    }

    pub fn underlined(mut self, value: bool) -> Self {
        self.underlined = value;
        self
    }

    pub fn strikethrough(mut self, value: bool) -> Self {
        self.strikethrough = value;
        self
    }

    pub fn obfuscated(mut self, value: bool) -> Self {
        self.obfuscated = value;
        self
    }

    pub fn add_extra(mut self, child: Chat) -> Self {
        self.extra.push(child);
        self
    }

    /// The JSON string form carried by string-typed chat fields.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// The NBT compound form carried by tree-typed chat fields.
    pub fn to_nbt(&self) -> Result<NbtValue> {
        let mut entries = Vec::new();
        if let Some(text) = &self.text {
            entries.push(NbtValue::string(text.clone()).named("text"));
        }
        if let Some(color) = &self.color {
            entries.push(NbtValue::string(color.as_str()).named("color"));
        }
        if let Some(font) = &self.font {
            entries.push(NbtValue::string(font.as_str()).named("font"));
        }
        for (name, set) in [
            ("bold", self.bold),
            ("italic", self.italic),
            ("underlined", self.underlined),
            ("strikethrough", self.strikethrough),
            ("obfuscated", self.obfuscated),
        ] {
            if set {
                entries.push(NbtValue::byte(1).named(name));
            }
        }
        if !self.extra.is_empty() {
            let children = self
                .extra
                .iter()
                .map(Chat::to_nbt)
                .collect::<Result<Vec<_>>>()?;
            entries.push(NbtValue::list(children)?.named("extra"));
        }
        Ok(NbtValue::compound(entries))
    }
}
