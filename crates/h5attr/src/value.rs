//! Typed attribute values and requests.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Capacity of a string value including its terminator.
pub const MAX_STRING_BYTES: usize = 256;
/// Longest string content returned without adjustment.
pub const MAX_STRING_CONTENT: usize = MAX_STRING_BYTES - 1;

/// A scalar attribute value copied out of a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Int32(i32),
    Float64(f64),
    String(String),
}

impl AttributeValue {
    /// The placeholder carried next to a failure status. Never data.
    pub fn placeholder(kind: AttributeKind) -> Self {
        match kind {
            AttributeKind::Int => AttributeValue::Int32(0),
            AttributeKind::Float => AttributeValue::Float64(0.0),
            AttributeKind::Str => AttributeValue::String(String::new()),
        }
    }

    pub fn kind(&self) -> AttributeKind {
        match self {
            AttributeValue::Int32(_) => AttributeKind::Int,
            AttributeValue::Float64(_) => AttributeKind::Float,
            AttributeValue::String(_) => AttributeKind::Str,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Int32(v) => write!(f, "{v}"),
            AttributeValue::Float64(v) => write!(f, "{v}"),
            AttributeValue::String(s) => f.write_str(s),
        }
    }
}

/// Which typed accessor a request goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeKind {
    Int,
    Float,
    Str,
}

impl FromStr for AttributeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "int" => Ok(AttributeKind::Int),
            "float" => Ok(AttributeKind::Float),
            "str" | "string" => Ok(AttributeKind::Str),
            other => Err(format!("unknown attribute kind: {other}")),
        }
    }
}

/// One lookup: which file, where inside it, and which attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeRequest {
    path: PathBuf,
    location: String,
    name: String,
}

impl AttributeRequest {
    pub fn new(
        path: impl Into<PathBuf>,
        location: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            location: location.into(),
            name: name.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for AttributeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}@{}", self.path.display(), self.location, self.name)
    }
}

/// Cut `s` to at most [`MAX_STRING_CONTENT`] bytes on a char boundary.
///
/// Returns `true` in the second slot when anything was removed.
pub fn bound_string(mut s: String) -> (String, bool) {
    if s.len() <= MAX_STRING_CONTENT {
        return (s, false);
    }
    let mut end = MAX_STRING_CONTENT;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s.truncate(end);
    (s, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_strings_pass_through() {
        let s = "x".repeat(MAX_STRING_CONTENT);
        let (out, adjusted) = bound_string(s.clone());
        assert_eq!(out, s);
        assert!(!adjusted);
    }

    #[test]
    fn long_strings_cut_to_content_limit() {
        for len in [256, 257, 1000] {
            let (out, adjusted) = bound_string("y".repeat(len));
            assert_eq!(out.len(), 255);
            assert!(adjusted);
        }
    }

    #[test]
    fn cut_respects_char_boundaries() {
        // 254 ASCII bytes then a 2-byte char straddling byte 255
        let s = format!("{}é", "a".repeat(254));
        assert_eq!(s.len(), 256);
        let (out, adjusted) = bound_string(s);
        assert!(adjusted);
        assert_eq!(out.len(), 254);
        assert!(out.chars().all(|c| c == 'a'));
    }

    #[test]
    fn placeholders() {
        assert_eq!(AttributeValue::placeholder(AttributeKind::Int), AttributeValue::Int32(0));
        assert_eq!(
            AttributeValue::placeholder(AttributeKind::Str),
            AttributeValue::String(String::new())
        );
        assert_eq!(AttributeValue::Float64(0.5).kind(), AttributeKind::Float);
    }

    #[test]
    fn kind_parses() {
        assert_eq!("int".parse::<AttributeKind>().unwrap(), AttributeKind::Int);
        assert_eq!("str".parse::<AttributeKind>().unwrap(), AttributeKind::Str);
        assert!("double".parse::<AttributeKind>().is_err());
    }

    #[test]
    fn request_display() {
        let req = AttributeRequest::new("c.h5", "/FullSpectra", "SampleInterval");
        assert_eq!(req.to_string(), "c.h5:/FullSpectra@SampleInterval");
    }
}
