//! Aggregate solve counters and the per-problem commit-sha cache.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Problem difficulty. Serialized lowercase, matching the persisted ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Case-insensitive mapping from the page's difficulty label. Unknown
    /// strings map to `None`; the pipeline treats that as a hard error.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

/// Per-problem entry in the sha cache. The `README.md` key records that the
/// problem statement file has been committed; its presence is what keeps a
/// resubmission from rewriting the statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProblemRecord {
    #[serde(rename = "README.md", default, skip_serializing_if = "Option::is_none")]
    pub statement_sha: Option<String>,

    /// Commit sha of the latest confirmed archive run. Seeded empty when the
    /// problem is first counted and filled in once the commit is confirmed.
    #[serde(default)]
    pub sha: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
}

/// Persistent solve statistics for one linked repository.
///
/// Presence of a slug in `shas` is the source of truth for "already
/// archived". The ledger is only ever advanced by cloning, speculatively
/// updating the clone, committing remotely, and persisting the clone on
/// success, so the stored ledger never runs ahead of the repository.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsLedger {
    #[serde(default)]
    pub solved: u32,
    #[serde(default)]
    pub easy: u32,
    #[serde(default)]
    pub medium: u32,
    #[serde(default)]
    pub hard: u32,
    #[serde(default)]
    pub shas: BTreeMap<String, ProblemRecord>,
}

impl StatsLedger {
    pub fn is_archived(&self, slug: &str) -> bool {
        self.shas.contains_key(slug)
    }

    pub fn has_statement(&self, slug: &str) -> bool {
        self.shas
            .get(slug)
            .map_or(false, |record| record.statement_sha.is_some())
    }

    /// Count a newly solved problem and seed its record with a placeholder
    /// sha. Callers must only invoke this for slugs absent from `shas`.
    pub fn record_solved(&mut self, slug: &str, difficulty: Difficulty) {
        self.solved += 1;
        match difficulty {
            Difficulty::Easy => self.easy += 1,
            Difficulty::Medium => self.medium += 1,
            Difficulty::Hard => self.hard += 1,
        }
        self.shas.insert(
            slug.to_owned(),
            ProblemRecord {
                statement_sha: None,
                sha: String::new(),
                difficulty: Some(difficulty),
            },
        );
    }

    /// Record the confirmed commit sha for a slug, marking the statement as
    /// written when it was part of the committed batch.
    pub fn confirm_commit(&mut self, slug: &str, commit_sha: &str, statement_committed: bool) {
        let record = self.shas.entry(slug.to_owned()).or_default();
        record.sha = commit_sha.to_owned();
        if statement_committed {
            record.statement_sha = Some(commit_sha.to_owned());
        }
    }

    /// Invariant: the difficulty counters always add up to `solved`.
    pub fn is_consistent(&self) -> bool {
        self.solved == self.easy + self.medium + self.hard
    }
}

/// Envelope written to `stats.json` in the repository. The single key names
/// the source platform so ledgers for other platforms could coexist in the
/// same file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformStats {
    pub leetcode: StatsLedger,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn difficulty_parse_is_case_insensitive() {
        assert_eq!(Difficulty::parse("Easy"), Some(Difficulty::Easy));
        assert_eq!(Difficulty::parse("MEDIUM"), Some(Difficulty::Medium));
        assert_eq!(Difficulty::parse("  hard "), Some(Difficulty::Hard));
        assert_eq!(Difficulty::parse("insane"), None);
        assert_eq!(Difficulty::parse(""), None);
    }

    #[test]
    fn record_solved_keeps_counters_consistent() {
        let mut ledger = StatsLedger::default();
        ledger.record_solved("two-sum", Difficulty::Easy);
        ledger.record_solved("lru-cache", Difficulty::Medium);
        ledger.record_solved("word-ladder", Difficulty::Hard);
        ledger.record_solved("add-two-numbers", Difficulty::Medium);

        assert_eq!(ledger.solved, 4);
        assert_eq!(ledger.easy, 1);
        assert_eq!(ledger.medium, 2);
        assert_eq!(ledger.hard, 1);
        assert!(ledger.is_consistent());
        assert!(ledger.is_archived("two-sum"));
        assert!(!ledger.is_archived("jump-game"));
        assert_eq!(ledger.shas["two-sum"].sha, "");
    }

    #[test]
    fn confirm_commit_fills_sha_and_statement_marker() {
        let mut ledger = StatsLedger::default();
        ledger.record_solved("two-sum", Difficulty::Easy);
        assert!(!ledger.has_statement("two-sum"));

        ledger.confirm_commit("two-sum", "abc123", true);
        assert_eq!(ledger.shas["two-sum"].sha, "abc123");
        assert_eq!(ledger.shas["two-sum"].statement_sha.as_deref(), Some("abc123"));
        assert!(ledger.has_statement("two-sum"));

        // Later commits refresh the sha but keep the original marker.
        ledger.confirm_commit("two-sum", "def456", false);
        assert_eq!(ledger.shas["two-sum"].sha, "def456");
        assert_eq!(ledger.shas["two-sum"].statement_sha.as_deref(), Some("abc123"));
    }

    #[test]
    fn ledger_serializes_to_the_persisted_shape() {
        let mut ledger = StatsLedger::default();
        ledger.record_solved("two-sum", Difficulty::Easy);
        ledger.confirm_commit("two-sum", "abc123", true);

        let value = serde_json::to_value(&PlatformStats { leetcode: ledger }).expect("serializes");
        assert_eq!(
            value,
            json!({
                "leetcode": {
                    "solved": 1,
                    "easy": 1,
                    "medium": 0,
                    "hard": 0,
                    "shas": {
                        "two-sum": {
                            "README.md": "abc123",
                            "sha": "abc123",
                            "difficulty": "easy"
                        }
                    }
                }
            })
        );
    }

    #[test]
    fn ledger_deserializes_from_a_persisted_envelope() {
        let raw = json!({
            "leetcode": {
                "solved": 2,
                "easy": 1,
                "medium": 1,
                "hard": 0,
                "shas": {
                    "two-sum": { "sha": "abc", "difficulty": "easy" },
                    "lru-cache": { "README.md": "fff", "sha": "ddd", "difficulty": "medium" }
                }
            }
        });
        let envelope: PlatformStats = serde_json::from_value(raw).expect("deserializes");
        let ledger = envelope.leetcode;
        assert!(ledger.is_consistent());
        assert!(!ledger.has_statement("two-sum"));
        assert!(ledger.has_statement("lru-cache"));
        assert_eq!(
            ledger.shas["lru-cache"].difficulty,
            Some(Difficulty::Medium)
        );
    }
}
