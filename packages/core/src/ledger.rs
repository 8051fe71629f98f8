//! Append-only, thread-safe, deterministically hashed entry log.
//!
//! A single mutex guards the entries vector, the law version, and the
//! sequence counter; every public method takes the mutex, so a
//! `Ledger` may be shared across blueprints running on distinct
//! threads and serialises only at this boundary.

use crate::engine::Verdict;
use crate::geometry::ControlPoints;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// One append-only ledger record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Hex-encoded SHA-256 over `(control points, law version, law
    /// names, verdict tag, sequence index)`.
    pub hash: String,
    pub sequence: u64,
    pub control_points: ControlPoints,
    pub law_version: u64,
    pub law_names: Vec<String>,
    pub verdict: Verdict,
    pub timestamp: u64,
    pub forge_name: Option<String>,
    pub blueprint_type: Option<String>,
}

/// What a caller supplies when asking the ledger to record a proposal.
/// Everything else (hash, sequence, timestamp) is computed by the
/// ledger itself.
pub struct AppendRequest<'a> {
    pub control_points: &'a ControlPoints,
    pub law_names: &'a [String],
    pub verdict: &'a Verdict,
    pub forge_name: Option<String>,
    pub blueprint_type: Option<String>,
}

struct LedgerState {
    entries: Vec<LedgerEntry>,
    law_version: u64,
    next_sequence: u64,
}

/// Append-only, deterministically hashed entry log, shared by `Arc`
/// across one or more blueprints.
pub struct Ledger {
    state: Mutex<LedgerState>,
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LedgerState {
                entries: Vec::new(),
                law_version: 1,
                next_sequence: 0,
            }),
        }
    }

    /// Append a new entry. Infallible: the ledger never rejects a
    /// well-formed record, modulo allocation.
    pub(crate) fn append(&self, request: AppendRequest<'_>) -> LedgerEntry {
        let mut state = self.state.lock().expect("ledger mutex poisoned");

        let sequence = state.next_sequence;
        state.next_sequence += 1;
        let law_version = state.law_version;

        let hash = compute_hash(
            request.control_points,
            law_version,
            request.law_names,
            request.verdict,
            sequence,
        );

        let entry = LedgerEntry {
            hash,
            sequence,
            control_points: request.control_points.clone(),
            law_version,
            law_names: request.law_names.to_vec(),
            verdict: request.verdict.clone(),
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
            forge_name: request.forge_name,
            blueprint_type: request.blueprint_type,
        };

        tracing::debug!(sequence, verdict = %entry.verdict, "ledger append");
        state.entries.push(entry.clone());
        entry
    }

    pub fn count(&self) -> usize {
        self.state.lock().expect("ledger mutex poisoned").entries.len()
    }

    pub fn last(&self) -> Option<LedgerEntry> {
        self.state.lock().expect("ledger mutex poisoned").entries.last().cloned()
    }

    pub fn entry(&self, index: usize) -> Option<LedgerEntry> {
        self.state.lock().expect("ledger mutex poisoned").entries.get(index).cloned()
    }

    pub fn all_entries(&self) -> Vec<LedgerEntry> {
        self.state.lock().expect("ledger mutex poisoned").entries.clone()
    }

    pub fn by_forge(&self, forge_name: &str) -> Vec<LedgerEntry> {
        self.state
            .lock()
            .expect("ledger mutex poisoned")
            .entries
            .iter()
            .filter(|e| e.forge_name.as_deref() == Some(forge_name))
            .cloned()
            .collect()
    }

    pub fn commits(&self) -> Vec<LedgerEntry> {
        self.state
            .lock()
            .expect("ledger mutex poisoned")
            .entries
            .iter()
            .filter(|e| e.verdict.is_commit())
            .cloned()
            .collect()
    }

    pub fn rejections(&self) -> Vec<LedgerEntry> {
        self.state
            .lock()
            .expect("ledger mutex poisoned")
            .entries
            .iter()
            .filter(|e| e.verdict.is_reject())
            .cloned()
            .collect()
    }

    pub fn law_version(&self) -> u64 {
        self.state.lock().expect("ledger mutex poisoned").law_version
    }

    /// Monotonically bump the law version; subsequent entries carry the
    /// new version. The only mutation besides append.
    pub fn bump_law_version(&self) -> u64 {
        let mut state = self.state.lock().expect("ledger mutex poisoned");
        state.law_version += 1;
        tracing::info!(law_version = state.law_version, "law version bumped");
        state.law_version
    }

    /// Recompute an entry's hash from its recorded fields and compare
    /// against the stored hash, surfacing silent corruption.
    pub fn verify_entry(&self, index: usize) -> bool {
        let Some(entry) = self.entry(index) else {
            return false;
        };
        let recomputed = compute_hash(
            &entry.control_points,
            entry.law_version,
            &entry.law_names,
            &entry.verdict,
            entry.sequence,
        );
        recomputed == entry.hash
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

fn verdict_tag(verdict: &Verdict) -> u8 {
    match verdict {
        Verdict::Commit => 0,
        Verdict::Reject(_) => 1,
    }
}

fn compute_hash(
    cp: &ControlPoints,
    law_version: u64,
    law_names: &[String],
    verdict: &Verdict,
    sequence: u64,
) -> String {
    let mut hasher = Sha256::new();
    for component in cp.iter_components() {
        hasher.update(component.to_le_bytes());
    }
    hasher.update(law_version.to_le_bytes());
    for name in law_names {
        hasher.update(name.as_bytes());
    }
    hasher.update([verdict_tag(verdict)]);
    hasher.update(sequence.to_le_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::StateVector;

    fn sample_cp() -> ControlPoints {
        ControlPoints::linear(
            &StateVector::new(vec![0.0, 0.0]),
            &StateVector::new(vec![1.0, 1.0]),
        )
        .unwrap()
    }

    #[test]
    fn consecutive_identical_appends_yield_distinct_hashes() {
        let ledger = Ledger::new();
        let cp = sample_cp();
        let law_names = vec!["l".to_string()];

        let e1 = ledger.append(AppendRequest {
            control_points: &cp,
            law_names: &law_names,
            verdict: &Verdict::Commit,
            forge_name: None,
            blueprint_type: None,
        });
        let e2 = ledger.append(AppendRequest {
            control_points: &cp,
            law_names: &law_names,
            verdict: &Verdict::Commit,
            forge_name: None,
            blueprint_type: None,
        });

        assert_ne!(e1.hash, e2.hash);
        assert_eq!(e1.sequence, 0);
        assert_eq!(e2.sequence, 1);
    }

    #[test]
    fn entries_are_never_reordered() {
        let ledger = Ledger::new();
        let cp = sample_cp();
        for i in 0..5 {
            ledger.append(AppendRequest {
                control_points: &cp,
                law_names: &[],
                verdict: &Verdict::Commit,
                forge_name: Some(format!("forge-{i}")),
                blueprint_type: None,
            });
        }
        let all = ledger.all_entries();
        for (i, e) in all.iter().enumerate() {
            assert_eq!(e.sequence, i as u64);
        }
    }

    #[test]
    fn filters_by_forge_and_verdict() {
        let ledger = Ledger::new();
        let cp = sample_cp();
        ledger.append(AppendRequest {
            control_points: &cp,
            law_names: &[],
            verdict: &Verdict::Commit,
            forge_name: Some("submit".into()),
            blueprint_type: None,
        });
        ledger.append(AppendRequest {
            control_points: &cp,
            law_names: &[],
            verdict: &Verdict::Reject(crate::engine::Witness {
                law_index: -1,
                law_name: String::new(),
                time: 1.0,
                state: StateVector::zero(2),
                repair_direction: None,
                reason: "no".into(),
            }),
            forge_name: Some("pay".into()),
            blueprint_type: None,
        });

        assert_eq!(ledger.by_forge("submit").len(), 1);
        assert_eq!(ledger.commits().len(), 1);
        assert_eq!(ledger.rejections().len(), 1);
    }

    #[test]
    fn bump_law_version_is_monotonic_and_affects_subsequent_entries() {
        let ledger = Ledger::new();
        assert_eq!(ledger.law_version(), 1);
        ledger.bump_law_version();
        assert_eq!(ledger.law_version(), 2);

        let cp = sample_cp();
        let e = ledger.append(AppendRequest {
            control_points: &cp,
            law_names: &[],
            verdict: &Verdict::Commit,
            forge_name: None,
            blueprint_type: None,
        });
        assert_eq!(e.law_version, 2);
    }

    #[test]
    fn verify_entry_detects_hash_matches_recorded_content() {
        let ledger = Ledger::new();
        let cp = sample_cp();
        ledger.append(AppendRequest {
            control_points: &cp,
            law_names: &[],
            verdict: &Verdict::Commit,
            forge_name: None,
            blueprint_type: None,
        });
        assert!(ledger.verify_entry(0));
        assert!(!ledger.verify_entry(1));
    }
}
