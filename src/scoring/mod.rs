pub mod aggregate;
pub mod cache;
pub mod desirability;

pub use aggregate::FitnessAggregator;
pub use cache::{scoring_fingerprint, CacheDelta, CacheSnapshot, ScoreCache, ScoreRecord};
pub use desirability::DesirabilityCurve;

use crate::error::{MolSwarmError, MsResult};
use ndarray::ArrayView2;

/// One objective's output for a batch. All vectors share the batch length.
pub struct ScoreBatch {
    pub unscaled: Vec<f32>,
    pub scaled: Vec<f32>,
    pub desirability: Vec<f32>,
    pub residues: Vec<Option<String>>,
}

impl ScoreBatch {
    /// Batch where scaling and desirability are the same curve over the raw
    /// score and no residue payload is attached.
    pub fn scaled_by(unscaled: Vec<f32>, curve: &DesirabilityCurve) -> Self {
        let scaled = curve.apply(&unscaled);
        let residues = vec![None; unscaled.len()];
        Self {
            desirability: scaled.clone(),
            scaled,
            unscaled,
            residues,
        }
    }

    pub fn len(&self) -> usize {
        self.unscaled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.unscaled.is_empty()
    }

    pub(crate) fn check_len(&self, expected: usize, name: &str) -> MsResult<()> {
        let ok = self.unscaled.len() == expected
            && self.scaled.len() == expected
            && self.desirability.len() == expected
            && self.residues.len() == expected;
        if ok {
            Ok(())
        } else {
            Err(MolSwarmError::Scoring(format!(
                "objective '{}' returned {} scores for a batch of {}",
                name,
                self.unscaled.len(),
                expected
            )))
        }
    }
}

type MolFn = Box<dyn Fn(&[String]) -> MsResult<ScoreBatch> + Send + Sync>;
type EmbFn = Box<dyn Fn(ArrayView2<'_, f32>) -> MsResult<ScoreBatch> + Send + Sync>;

/// What an objective consumes: decoded molecule strings (cacheable by
/// molecule identity) or raw particle positions (recomputed every step).
pub enum Objective {
    Molecules(MolFn),
    Embeddings(EmbFn),
}

/// Named, weighted objective. Weights are validated when the descriptor
/// list is handed to the aggregator.
pub struct ScoringFunction {
    pub name: String,
    pub weight: f32,
    pub objective: Objective,
}

impl ScoringFunction {
    pub fn on_molecules<F>(name: &str, weight: f32, f: F) -> Self
    where
        F: Fn(&[String]) -> MsResult<ScoreBatch> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            weight,
            objective: Objective::Molecules(Box::new(f)),
        }
    }

    pub fn on_embeddings<F>(name: &str, weight: f32, f: F) -> Self
    where
        F: Fn(ArrayView2<'_, f32>) -> MsResult<ScoreBatch> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            weight,
            objective: Objective::Embeddings(Box::new(f)),
        }
    }

    pub fn is_mol_func(&self) -> bool {
        matches!(self.objective, Objective::Molecules(_))
    }
}
