//! Outcome codes shared by every store operation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Result of an attribute store operation.
///
/// The numeric values are part of the wire contract and never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum StatusCode {
    DaqRecNotRunning = 0,
    AcquisitionActive = 1,
    NoActiveAcquisition = 2,
    FileNotFound = 3,
    Success = 4,
    Error = 5,
    OutOfBounds = 6,
    NoData = 7,
    Timeout = 8,
    /// The value was returned but altered to fit (e.g. a truncated string).
    ValueAdjusted = 9,
    InvalidParameter = 10,
    InvalidValue = 11,
    Aborted = 12,
}

impl StatusCode {
    pub const ALL: [StatusCode; 13] = [
        StatusCode::DaqRecNotRunning,
        StatusCode::AcquisitionActive,
        StatusCode::NoActiveAcquisition,
        StatusCode::FileNotFound,
        StatusCode::Success,
        StatusCode::Error,
        StatusCode::OutOfBounds,
        StatusCode::NoData,
        StatusCode::Timeout,
        StatusCode::ValueAdjusted,
        StatusCode::InvalidParameter,
        StatusCode::InvalidValue,
        StatusCode::Aborted,
    ];

    /// Decode a wire value. Unknown values are rejected.
    pub fn from_raw(raw: i32) -> Option<StatusCode> {
        usize::try_from(raw)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn as_raw(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        self == StatusCode::Success
    }

    pub fn is_not_found(self) -> bool {
        self == StatusCode::FileNotFound
    }

    pub fn name(self) -> &'static str {
        match self {
            StatusCode::DaqRecNotRunning => "DaqRecNotRunning",
            StatusCode::AcquisitionActive => "AcquisitionActive",
            StatusCode::NoActiveAcquisition => "NoActiveAcquisition",
            StatusCode::FileNotFound => "FileNotFound",
            StatusCode::Success => "Success",
            StatusCode::Error => "Error",
            StatusCode::OutOfBounds => "OutOfBounds",
            StatusCode::NoData => "NoData",
            StatusCode::Timeout => "Timeout",
            StatusCode::ValueAdjusted => "ValueAdjusted",
            StatusCode::InvalidParameter => "InvalidParameter",
            StatusCode::InvalidValue => "InvalidValue",
            StatusCode::Aborted => "Aborted",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<i32> for StatusCode {
    type Error = i32;

    fn try_from(raw: i32) -> Result<Self, i32> {
        StatusCode::from_raw(raw).ok_or(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_values_are_fixed() {
        assert_eq!(StatusCode::DaqRecNotRunning.as_raw(), 0);
        assert_eq!(StatusCode::FileNotFound.as_raw(), 3);
        assert_eq!(StatusCode::Success.as_raw(), 4);
        assert_eq!(StatusCode::ValueAdjusted.as_raw(), 9);
        assert_eq!(StatusCode::Aborted.as_raw(), 12);
        for (i, code) in StatusCode::ALL.iter().enumerate() {
            assert_eq!(code.as_raw(), i as i32);
            assert_eq!(StatusCode::from_raw(i as i32), Some(*code));
        }
    }

    #[test]
    fn unknown_raw_values_rejected() {
        assert_eq!(StatusCode::from_raw(-1), None);
        assert_eq!(StatusCode::from_raw(13), None);
        assert_eq!(StatusCode::try_from(99), Err(99));
    }

    #[test]
    fn display_and_serde_use_member_name() {
        assert_eq!(StatusCode::InvalidParameter.to_string(), "InvalidParameter");
        let json = serde_json::to_string(&StatusCode::NoData).unwrap();
        assert_eq!(json, "\"NoData\"");
        let back: StatusCode = serde_json::from_str("\"Timeout\"").unwrap();
        assert_eq!(back, StatusCode::Timeout);
    }

    #[test]
    fn predicates() {
        assert!(StatusCode::Success.is_success());
        assert!(!StatusCode::ValueAdjusted.is_success());
        assert!(StatusCode::FileNotFound.is_not_found());
        assert!(!StatusCode::Error.is_not_found());
    }
}
