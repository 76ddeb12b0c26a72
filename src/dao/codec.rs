//! Text representation of the leaderboard as stored under the data key.
//!
//! The stored value is a JSON array of `{"name": .., "score": ..}` objects in
//! rank order.

use serde_json::{Value, json};
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::dao::models::{Leaderboard, LeaderboardEntry};

/// Stored value could not be turned back into a leaderboard.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The value is not JSON of the expected shape (corrupt or truncated).
    #[error("stored leaderboard is malformed")]
    Malformed(#[source] serde_json::Error),
    /// The value parsed but an entry breaks the data model.
    #[error("stored leaderboard entry #{index} is invalid")]
    InvalidEntry {
        /// Position of the offending entry in the stored array.
        index: usize,
        /// Constraint the entry broke.
        #[source]
        source: ValidationErrors,
    },
}

/// Serialize the full ordered entry list. Object keys are emitted in a fixed
/// order, so equal boards always encode to the same text.
pub fn encode(board: &Leaderboard) -> String {
    Value::Array(
        board
            .entries()
            .iter()
            .map(|entry| json!({ "name": entry.name, "score": entry.score }))
            .collect(),
    )
    .to_string()
}

/// Parse a stored value, rejecting malformed text and invalid entries.
pub fn decode(raw: &str) -> Result<Leaderboard, DecodeError> {
    let entries: Vec<LeaderboardEntry> =
        serde_json::from_str(raw).map_err(DecodeError::Malformed)?;

    for (index, entry) in entries.iter().enumerate() {
        entry
            .validate()
            .map_err(|source| DecodeError::InvalidEntry { index, source })?;
    }

    Ok(Leaderboard::from_entries(entries))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Leaderboard {
        Leaderboard::from_entries(vec![
            LeaderboardEntry::new("Bob", 20),
            LeaderboardEntry::new("Ann", 10),
            LeaderboardEntry::new("Zoë \"the\" great", 0),
        ])
    }

    #[test]
    fn encode_then_decode_is_identity() {
        let board = sample();
        assert_eq!(decode(&encode(&board)).unwrap(), board);
    }

    #[test]
    fn encoding_is_deterministic() {
        assert_eq!(
            encode(&Leaderboard::from_entries(vec![LeaderboardEntry::new("Ann", 10)])),
            r#"[{"name":"Ann","score":10}]"#
        );
        assert_eq!(encode(&Leaderboard::default()), "[]");
    }

    #[test]
    fn decode_accepts_extra_whitespace_and_key_order() {
        let board = decode(r#"[ { "score": 3, "name": "Cid" } ]"#).unwrap();
        assert_eq!(board.entries(), &[LeaderboardEntry::new("Cid", 3)]);
    }

    #[test]
    fn decode_rejects_malformed_and_truncated_text() {
        for raw in ["", "not json", r#"[{"name":"Ann","score":10}"#, r#"{"name":"Ann"}"#] {
            assert!(
                matches!(decode(raw), Err(DecodeError::Malformed(_))),
                "{raw:?} should be malformed"
            );
        }
    }

    #[test]
    fn decode_rejects_negative_or_fractional_scores() {
        assert!(decode(r#"[{"name":"Ann","score":-1}]"#).is_err());
        assert!(decode(r#"[{"name":"Ann","score":1.5}]"#).is_err());
    }

    #[test]
    fn decode_rejects_empty_names() {
        let err = decode(r#"[{"name":"Ann","score":1},{"name":"","score":2}]"#).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidEntry { index: 1, .. }));
    }
}
