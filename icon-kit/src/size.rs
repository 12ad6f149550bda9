use anyhow::Result;

use crate::error::IconError;

/// Target size for an annotated vector drawable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSize {
    pub width: u32,
    pub height: u32,
    /// Label written as an `intended-usage` comment, only set for the aliases
    pub usage: Option<String>,
}

impl TargetSize {
    pub fn banner() -> Self {
        TargetSize { width: 320, height: 180, usage: Some("banner".to_string()) }
    }

    pub fn icon() -> Self {
        TargetSize { width: 108, height: 108, usage: Some("icon".to_string()) }
    }

    /// Parse `banner`, `icon` or `WIDTHxHEIGHT`.
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        match value.to_ascii_lowercase().as_str() {
            "banner" => return Ok(Self::banner()),
            "icon" => return Ok(Self::icon()),
            _ => {}
        }

        let invalid = || IconError::InvalidSize(format!("'{}' (expected WIDTHxHEIGHT, banner or icon)", value));

        let (w, h) = value
            .split_once(|c: char| c == 'x' || c == 'X')
            .ok_or_else(invalid)?;

        let width = parse_dimension(w).map_err(|_| invalid())?;
        let height = parse_dimension(h).map_err(|_| invalid())?;

        Ok(TargetSize { width, height, usage: None })
    }
}

/// A dimension must be a plain non-negative integer: no sign, no decimals, no unit.
pub fn parse_dimension(value: &str) -> Result<u32, IconError> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(IconError::InvalidSize(value.to_string()));
    }
    value
        .parse::<u32>()
        .map_err(|_| IconError::InvalidSize(value.to_string()))
}
