//! Challenge tokens.
//!
//! A token is 32 bytes from the OS random number generator, carried on the
//! wire as lowercase hex. Tokens are the only handle a client ever holds on
//! a challenge, so unguessability is the whole point.

use rand::rngs::OsRng;
use rand::RngCore;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// An opaque, unguessable challenge identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChallengeToken([u8; 32]);

impl ChallengeToken {
    /// Generate a fresh token from the OS RNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for ChallengeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChallengeToken({}…)", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for ChallengeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for ChallengeToken {
    type Err = InvalidToken;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decoded = hex::decode(s).map_err(|_| InvalidToken)?;
        let bytes: [u8; 32] = decoded.try_into().map_err(|_| InvalidToken)?;
        Ok(Self(bytes))
    }
}

/// Error for a token that is not 64 hex characters.
#[derive(Debug, thiserror::Error)]
#[error("challenge token must be 64 hex characters")]
pub struct InvalidToken;

impl Serialize for ChallengeToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ChallengeToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip() {
        let token = ChallengeToken::generate();
        let parsed: ChallengeToken = token.to_string().parse().unwrap();
        assert_eq!(parsed, token);
    }

    #[test]
    fn generated_tokens_differ() {
        assert_ne!(ChallengeToken::generate(), ChallengeToken::generate());
    }

    #[test]
    fn rejects_malformed_input() {
        assert!("not-hex".parse::<ChallengeToken>().is_err());
        assert!("abcd".parse::<ChallengeToken>().is_err()); // too short
    }

    #[test]
    fn serde_carries_hex_string() {
        let token = ChallengeToken::from_bytes([0xab; 32]);
        let json = serde_json::to_string(&token).unwrap();
        assert_eq!(json, format!("\"{}\"", "ab".repeat(32)));
        let back: ChallengeToken = serde_json::from_str(&json).unwrap();
        assert_eq!(back, token);
    }
}
