//! API10 key derivation.

use std::fmt;

use thiserror::Error;

/// Number of leading identifier characters that make up the grouping key.
pub const KEY_WIDTH: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("identifier '{identifier}' is shorter than {width} characters", width = KEY_WIDTH)]
    MalformedIdentifier { identifier: String },
}

/// The first [`KEY_WIDTH`] characters of an `API 14` identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DerivedKey(String);

impl DerivedKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derives the grouping key from a canonical identifier string.
pub fn derive_key(identifier: &str) -> Result<DerivedKey, KeyError> {
    match identifier.char_indices().nth(KEY_WIDTH) {
        Some((end, _)) => Ok(DerivedKey(identifier[..end].to_string())),
        None if identifier.chars().count() == KEY_WIDTH => Ok(DerivedKey(identifier.to_string())),
        None => Err(KeyError::MalformedIdentifier {
            identifier: identifier.to_string(),
        }),
    }
}
