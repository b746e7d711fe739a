use crate::base62::{self, CODE_LEN};
use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A short code: exactly seven symbols from the base62 alphabet.
///
/// Codes minted by the pipeline come from [`ShortCode::from_id`]. Codes
/// received from callers go through [`ShortCode::new`], which validates them.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShortCode(String);

impl ShortCode {
    /// Derives the code for an allocator-issued id.
    pub fn from_id(id: u64) -> Self {
        Self(base62::encode(id))
    }

    /// Creates a new `ShortCode` after validating the input.
    pub fn new(code: impl Into<String>) -> Result<Self, CoreError> {
        let code = code.into();
        Self::validate(&code)?;
        Ok(Self(code))
    }

    /// Creates a `ShortCode` without validation.
    ///
    /// Use this only for codes read back from trusted storage.
    pub fn new_unchecked(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Generates the full shortened URL based on the provided base URL.
    pub fn to_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.0)
    }

    /// Returns the short code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the code's bytes, the input to shard routing.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    fn validate(code: &str) -> Result<(), CoreError> {
        if code.len() != CODE_LEN {
            return Err(CoreError::InvalidShortCode(format!(
                "length must be {}, got {}",
                CODE_LEN,
                code.len()
            )));
        }

        if !code.chars().all(base62::is_symbol) {
            return Err(CoreError::InvalidShortCode(format!(
                "must contain only base62 characters: '{}'",
                code
            )));
        }

        Ok(())
    }
}

impl Display for ShortCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ShortCode {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ShortCode> for String {
    fn from(value: ShortCode) -> Self {
        value.0
    }
}
