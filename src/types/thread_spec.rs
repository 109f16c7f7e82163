//! Thread table entries.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::HeaderError;

/// One spool of thread: an sRGB color plus optional vendor metadata.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct ThreadSpec {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_number: Option<String>,
}

impl ThreadSpec {
    pub fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red,
            green,
            blue,
            description: None,
            catalog_number: None,
        }
    }

    /// Attaches a description. Empty strings are stored as `None`.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = non_empty(description.into());
        self
    }

    /// Attaches a catalog number. Empty strings are stored as `None`.
    pub fn with_catalog_number(mut self, catalog_number: impl Into<String>) -> Self {
        self.catalog_number = non_empty(catalog_number.into());
        self
    }

    /// The color as `#RRGGBB`.
    pub fn hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.red, self.green, self.blue)
    }

    /// Parses `#RRGGBB` (the leading `#` is optional).
    pub fn from_hex(text: &str) -> Result<Self, HeaderError> {
        let digits = text.trim().trim_start_matches('#');
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(HeaderError::Malformed(format!(
                "invalid thread color '{}'",
                text
            )));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16).map_err(|_| {
                HeaderError::Malformed(format!("invalid thread color '{}'", text))
            })
        };
        Ok(Self::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

impl fmt::Display for ThreadSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hex())?;
        if let Some(description) = &self.description {
            write!(f, " {}", description)?;
        }
        if let Some(catalog) = &self.catalog_number {
            write!(f, " ({})", catalog)?;
        }
        Ok(())
    }
}
