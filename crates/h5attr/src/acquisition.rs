//! Well-known attributes of time-of-flight acquisition files.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::backend::AttributeBackend;
use crate::status::StatusCode;
use crate::store::AttributeStore;

pub const ION_MODE_LOCATION: &str = "/";
pub const ION_MODE_ATTRIBUTE: &str = "IonMode";

pub const NBR_SAMPLES_LOCATION: &str = "/";
pub const NBR_SAMPLES_ATTRIBUTE: &str = "NbrSamples";

pub const SAMPLE_INTERVAL_LOCATION: &str = "/FullSpectra";
pub const SAMPLE_INTERVAL_ATTRIBUTE: &str = "SampleInterval";

/// Ion polarity recorded in the `IonMode` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Positive,
    Negative,
    Unknown,
}

impl Polarity {
    pub fn from_ion_mode(mode: &str) -> Self {
        if mode.eq_ignore_ascii_case("positive") {
            Polarity::Positive
        } else if mode.eq_ignore_ascii_case("negative") {
            Polarity::Negative
        } else {
            Polarity::Unknown
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Polarity::Positive => "positive",
            Polarity::Negative => "negative",
            Polarity::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn ion_mode<B: AttributeBackend>(
    store: &AttributeStore<B>,
    path: impl AsRef<Path>,
) -> (StatusCode, String) {
    store.get_str_attribute(path, ION_MODE_LOCATION, ION_MODE_ATTRIBUTE)
}

pub fn polarity<B: AttributeBackend>(
    store: &AttributeStore<B>,
    path: impl AsRef<Path>,
) -> (StatusCode, Polarity) {
    let (status, mode) = ion_mode(store, path);
    (status, Polarity::from_ion_mode(&mode))
}

pub fn nbr_samples<B: AttributeBackend>(
    store: &AttributeStore<B>,
    path: impl AsRef<Path>,
) -> (StatusCode, i32) {
    store.get_int_attribute(path, NBR_SAMPLES_LOCATION, NBR_SAMPLES_ATTRIBUTE)
}

pub fn sample_interval<B: AttributeBackend>(
    store: &AttributeStore<B>,
    path: impl AsRef<Path>,
) -> (StatusCode, f64) {
    store.get_float_attribute(path, SAMPLE_INTERVAL_LOCATION, SAMPLE_INTERVAL_ATTRIBUTE)
}
