//! Document identifiers
//!
//! Every stored record is keyed by a 12-byte [`ObjectId`], rendered on the wire
//! and in the database as 24 lowercase hex digits. Token claims carry role and
//! jenis-user references in the same form.

use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::models::ParseError;

/// Number of raw bytes in an identifier
const OBJECT_ID_LEN: usize = 12;

/// Per-process random component, fixed on first use
static PROCESS_UNIQUE: LazyLock<[u8; 5]> = LazyLock::new(|| {
    let seed = uuid::Uuid::new_v4();
    let mut bytes = [0u8; 5];
    bytes.copy_from_slice(&seed.as_bytes()[..5]);
    bytes
});

/// Rolling counter, seeded randomly so restarts don't replay sequences
static COUNTER: LazyLock<AtomicU32> = LazyLock::new(|| {
    let seed = uuid::Uuid::new_v4();
    let b = seed.as_bytes();
    AtomicU32::new(u32::from_be_bytes([0, b[0], b[1], b[2]]))
});

/// 12-byte document identifier
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; OBJECT_ID_LEN]);

impl ObjectId {
    /// The all-zero identifier, used to mark an unassigned reference
    pub const NIL: ObjectId = ObjectId([0; OBJECT_ID_LEN]);

    /// Generate a fresh identifier.
    ///
    /// Layout: 4-byte big-endian Unix seconds, 5 process-unique bytes,
    /// 3-byte big-endian counter.
    pub fn new() -> Self {
        let timestamp = Utc::now().timestamp() as u32;
        let count = COUNTER.fetch_add(1, Ordering::Relaxed) & 0x00ff_ffff;

        let mut bytes = [0u8; OBJECT_ID_LEN];
        bytes[..4].copy_from_slice(&timestamp.to_be_bytes());
        bytes[4..9].copy_from_slice(&*PROCESS_UNIQUE);
        bytes[9..].copy_from_slice(&count.to_be_bytes()[1..]);
        Self(bytes)
    }

    /// Parse 24 hex digits (either case)
    pub fn parse_str(s: &str) -> Result<Self, ParseError> {
        if s.len() != OBJECT_ID_LEN * 2 {
            return Err(ParseError::InvalidObjectId(s.to_string()));
        }
        let mut bytes = [0u8; OBJECT_ID_LEN];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|_| ParseError::InvalidObjectId(s.to_string()))?;
        Ok(Self(bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn is_nil(&self) -> bool {
        *self == Self::NIL
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for ObjectId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ObjectId::parse_str(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let id = ObjectId::parse_str("675d1cd023322aa0cdbdfdbd").unwrap();
        assert_eq!(id.to_string(), "675d1cd023322aa0cdbdfdbd");
        assert_eq!(id.0[0], 0x67);

        let upper = ObjectId::parse_str("675D1CD023322AA0CDBDFDBD").unwrap();
        assert_eq!(upper, id);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(ObjectId::parse_str("").is_err());
        assert!(ObjectId::parse_str("675d1cd023322aa0cdbdfdb").is_err());
        assert!(ObjectId::parse_str("675d1cd023322aa0cdbdfdbdff").is_err());
        assert!(ObjectId::parse_str("zz5d1cd023322aa0cdbdfdbd").is_err());
        assert!("r1".parse::<ObjectId>().is_err());
    }

    #[test]
    fn test_new_ids_are_unique_and_not_nil() {
        let a = ObjectId::new();
        let b = ObjectId::new();
        assert_ne!(a, b);
        assert!(!a.is_nil());
        assert!(ObjectId::NIL.is_nil());
        assert_eq!(ObjectId::NIL.to_hex(), "000000000000000000000000");
    }

    #[test]
    fn test_serde_as_hex_string() {
        let id = ObjectId::parse_str("675d1cd023322aa0cdbdfdbd").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"675d1cd023322aa0cdbdfdbd\"");

        let back: ObjectId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);

        assert!(serde_json::from_str::<ObjectId>("\"not-an-id\"").is_err());
        assert!(serde_json::from_str::<ObjectId>("42").is_err());
    }
}
