use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Characters allowed in retrieval codes. Visually ambiguous characters
/// (`0`/`O`, `1`/`I`) are excluded so codes survive being read aloud or
/// copied by hand.
pub const CODE_ALPHABET: &[u8] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZ";

/// Length of every retrieval code.
pub const CODE_LEN: usize = 6;

/// A short human-typeable code identifying a stored file.
///
/// Codes are always held uppercase; [`RetrievalCode::parse`] normalizes
/// user input, so matching is case-insensitive. Uniqueness is not the
/// generator's job: the record store's unique constraint rejects
/// collisions and callers regenerate on conflict.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct RetrievalCode(String);

/// Error returned when a string is not a well-formed retrieval code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeError {
    /// The input does not have exactly [`CODE_LEN`] characters.
    WrongLength(usize),
    /// The input contains a character outside [`CODE_ALPHABET`].
    InvalidChar(char),
}

impl fmt::Display for CodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongLength(len) => {
                write!(f, "retrieval codes have {CODE_LEN} characters, got {len}")
            }
            Self::InvalidChar(c) => write!(f, "invalid character in retrieval code: {c:?}"),
        }
    }
}

impl std::error::Error for CodeError {}

impl RetrievalCode {
    /// Generate a fresh code, each character uniform-random over the
    /// alphabet and independent of any previously issued code.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let code = (0..CODE_LEN)
            .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
            .collect();
        Self(code)
    }

    /// Parse user input, normalizing to uppercase.
    pub fn parse(input: &str) -> Result<Self, CodeError> {
        let normalized = input.trim().to_ascii_uppercase();

        let len = normalized.chars().count();
        if len != CODE_LEN {
            return Err(CodeError::WrongLength(len));
        }

        if let Some(c) = normalized
            .chars()
            .find(|c| !c.is_ascii() || !CODE_ALPHABET.contains(&(*c as u8)))
        {
            return Err(CodeError::InvalidChar(c));
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RetrievalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RetrievalCode({})", self.0)
    }
}

impl fmt::Display for RetrievalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for RetrievalCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RetrievalCode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
