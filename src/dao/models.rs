use indexmap::{IndexMap, map::Entry};
use serde::Deserialize;
use validator::Validate;

/// Persisted representation of a single ranked score.
///
/// Decoded straight from stored text; encoding goes through the codec, which
/// fixes the field order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
pub struct LeaderboardEntry {
    /// Player identifier; exact, case-sensitive key for deduplication.
    #[validate(length(min = 1))]
    pub name: String,
    /// Non-negative score, higher is better.
    pub score: u64,
}

impl LeaderboardEntry {
    /// Build an entry; names are validated by the store, not here.
    pub fn new(name: impl Into<String>, score: u64) -> Self {
        Self {
            name: name.into(),
            score,
        }
    }
}

/// What a merge did to the stored score of the submitted name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The name was not ranked yet and has been appended.
    Inserted,
    /// The submitted score beat the stored one.
    Raised {
        /// Score replaced by the submission.
        previous: u64,
    },
    /// The stored score was equal or higher and has been kept.
    Unchanged {
        /// Score kept on the board.
        stored: u64,
    },
}

/// Ranked sequence of entries, best score first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    /// Wrap entries as stored, without reordering or deduplicating them.
    pub fn from_entries(entries: Vec<LeaderboardEntry>) -> Self {
        Self { entries }
    }

    /// Entries in rank order.
    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    /// Consume the board, keeping rank order.
    pub fn into_entries(self) -> Vec<LeaderboardEntry> {
        self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is ranked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up the entry stored for `name`.
    pub fn get(&self, name: &str) -> Option<&LeaderboardEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// 1-based rank of `name` together with its entry.
    pub fn rank_of(&self, name: &str) -> Option<(usize, &LeaderboardEntry)> {
        self.entries
            .iter()
            .enumerate()
            .find(|(_, entry)| entry.name == name)
            .map(|(index, entry)| (index + 1, entry))
    }

    /// Fold `entry` into the board with the monotonic-max rule and re-rank.
    ///
    /// Duplicate names already present (written by a foreign tool, say) are
    /// collapsed onto their first position keeping the highest score, so the
    /// rewritten board always holds one entry per name. Ranking is a stable
    /// sort: equal scores keep their current relative order and a newcomer
    /// tying an existing score lands after it.
    pub fn merge(&mut self, entry: LeaderboardEntry) -> MergeOutcome {
        let mut scores: IndexMap<String, u64> = IndexMap::with_capacity(self.entries.len() + 1);
        for existing in self.entries.drain(..) {
            let stored = scores.entry(existing.name).or_insert(existing.score);
            *stored = (*stored).max(existing.score);
        }

        let outcome = match scores.entry(entry.name) {
            Entry::Occupied(mut slot) => {
                let stored = *slot.get();
                if entry.score > stored {
                    slot.insert(entry.score);
                    MergeOutcome::Raised { previous: stored }
                } else {
                    MergeOutcome::Unchanged { stored }
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(entry.score);
                MergeOutcome::Inserted
            }
        };

        self.entries = scores
            .into_iter()
            .map(|(name, score)| LeaderboardEntry { name, score })
            .collect();
        self.entries.sort_by(|a, b| b.score.cmp(&a.score));
        outcome
    }
}
