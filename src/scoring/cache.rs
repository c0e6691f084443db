use super::ScoringFunction;
use crate::error::{MolSwarmError, MsResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;

/// Scores for one canonical molecule, keyed by objective name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub unscaled: BTreeMap<String, f32>,
    pub scaled: BTreeMap<String, f32>,
    pub desirability: BTreeMap<String, f32>,
    pub residue: Option<String>,
}

/// Run-lifetime score store keyed by canonical molecule. Entries are never
/// overwritten: the first computed value wins, so racing duplicate work is
/// harmless as long as objectives are pure per molecule. Unbounded; bounded
/// in practice by the unique molecules a run visits.
#[derive(Debug, Default)]
pub struct ScoreCache {
    records: HashMap<String, ScoreRecord>,
}

impl ScoreCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, smiles: &str) -> bool {
        self.records.contains_key(smiles)
    }

    /// Deduplicated, first-seen-order subset of `molecules` with no record.
    pub fn novel(&self, molecules: &[String]) -> Vec<String> {
        let mut seen = HashSet::new();
        molecules
            .iter()
            .filter(|smi| seen.insert(smi.as_str()) && !self.contains(smi))
            .cloned()
            .collect()
    }

    /// First write wins; re-recording a molecule is a silent no-op.
    pub fn record(&mut self, smiles: &str, record: ScoreRecord) {
        self.records
            .entry(smiles.to_string())
            .or_insert(record);
    }

    /// Scores for a molecule that has already been recorded.
    ///
    /// Panics on a miss: the aggregator records every novel molecule before
    /// reading any back, so a miss is a bug, not a runtime condition.
    pub fn get(&self, smiles: &str) -> &ScoreRecord {
        self.records
            .get(smiles)
            .unwrap_or_else(|| panic!("score cache miss for '{}': recorded entries only", smiles))
    }

    /// Residue payload for report rows. Tolerant: embedding-only runs have
    /// no cached entries at all.
    pub fn residue(&self, smiles: &str) -> Option<&str> {
        self.records
            .get(smiles)
            .and_then(|r| r.residue.as_deref())
    }

    /// Folds a work unit's records in, keeping existing entries.
    pub fn merge(&mut self, delta: CacheDelta) {
        for (smiles, record) in delta.records {
            self.records.entry(smiles).or_insert(record);
        }
    }

    /// Warm-start payload: per-molecule unscaled scores plus the scoring
    /// configuration fingerprint they were computed under.
    pub fn snapshot(&self, fingerprint: &str) -> CacheSnapshot {
        let unscaled = self
            .records
            .iter()
            .map(|(smi, rec)| (smi.clone(), rec.unscaled.clone()))
            .collect();
        CacheSnapshot {
            fingerprint: fingerprint.to_string(),
            unscaled,
        }
    }
}

/// Records computed against a read-only cache view by one work unit,
/// merged by the orchestrator after the step barrier.
#[derive(Debug, Default)]
pub struct CacheDelta {
    pub records: Vec<(String, ScoreRecord)>,
}

impl CacheDelta {
    pub fn push(&mut self, smiles: String, record: ScoreRecord) {
        self.records.push((smiles, record));
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Lookup that shadows the shared cache during a buffered evaluation.
    pub(crate) fn find(&self, smiles: &str) -> Option<&ScoreRecord> {
        self.records
            .iter()
            .find(|(smi, _)| smi == smiles)
            .map(|(_, rec)| rec)
    }
}

/// Serialized unscaled-score cache. Scaled and desirability values are not
/// persisted: they re-derive through each objective's own scaling, and
/// storing them would bake in a configuration.
#[derive(Debug, Serialize, Deserialize)]
pub struct CacheSnapshot {
    pub fingerprint: String,
    pub unscaled: BTreeMap<String, BTreeMap<String, f32>>,
}

impl CacheSnapshot {
    pub fn load(path: &Path) -> MsResult<Self> {
        let raw = fs::read_to_string(path)?;
        let snapshot = serde_json::from_str(&raw)?;
        Ok(snapshot)
    }

    /// Rejects warm starts computed under a different objective set.
    pub fn verify(&self, fingerprint: &str) -> MsResult<()> {
        if self.fingerprint == fingerprint {
            Ok(())
        } else {
            Err(MolSwarmError::Validation(format!(
                "cache snapshot fingerprint {} does not match scoring configuration {}",
                self.fingerprint, fingerprint
            )))
        }
    }

    pub fn unscaled_for(&self, smiles: &str, objective: &str) -> Option<f32> {
        self.unscaled.get(smiles).and_then(|m| m.get(objective)).copied()
    }

    pub fn len(&self) -> usize {
        self.unscaled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.unscaled.is_empty()
    }
}

/// Stable identifier for an objective configuration, embedded in snapshots
/// so a warm start under changed names or weights is caught on load.
pub fn scoring_fingerprint(functions: &[ScoringFunction]) -> String {
    let mut hasher = Sha256::new();
    for f in functions {
        hasher.update(f.name.as_bytes());
        hasher.update([0u8]);
        hasher.update(f.weight.to_le_bytes());
        hasher.update([if f.is_mol_func() { 1u8 } else { 2u8 }]);
    }
    hex::encode(hasher.finalize())
}
