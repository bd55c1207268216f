//! Backend configuration
//!
//! The snapshot a backend is constructed with, plus the loosely-typed
//! property values flowing through get/set.

use serde::{Deserialize, Serialize};

/// A property value crossing the facade/backend boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl PropertyValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Bool(b)
    }
}

impl From<f64> for PropertyValue {
    fn from(n: f64) -> Self {
        PropertyValue::Number(n)
    }
}

impl From<u32> for PropertyValue {
    fn from(n: u32) -> Self {
        PropertyValue::Number(n as f64)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::Text(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::Text(s)
    }
}

/// Configuration snapshot a backend is constructed with
///
/// The id is the owning facade's stable identifier; backend markup
/// embeds it, and external SDK callbacks use it to find the instance.
/// Width and height always carry concrete values (absent dimensions
/// default to 0 before the snapshot is taken).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    pub id: String,
    pub src: String,
    pub width: u32,
    pub height: u32,
    pub volume: f64,
    pub muted: bool,
    pub autoplay: bool,
    #[serde(rename = "loop")]
    pub looping: bool,
    pub controls: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preload: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            src: String::new(),
            width: 0,
            height: 0,
            volume: 1.0,
            muted: false,
            autoplay: false,
            looping: false,
            controls: false,
            preload: None,
            poster: None,
        }
    }
}
