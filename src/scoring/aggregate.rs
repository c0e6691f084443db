use super::cache::{scoring_fingerprint, CacheDelta, ScoreCache, ScoreRecord};
use super::{Objective, ScoringFunction};
use crate::chem;
use crate::error::{MolSwarmError, MsResult};
use crate::swarm::Swarm;
use std::collections::BTreeMap;
use std::collections::HashSet;
use tracing::warn;

/// Turns per-objective scores into one weighted fitness per particle.
///
/// Molecule objectives are computed once per unique molecule and remapped
/// through the cache; embedding objectives run on the raw position matrix
/// every call. Weights are validated up front so a bad configuration fails
/// before any scoring happens.
pub struct FitnessAggregator {
    functions: Vec<ScoringFunction>,
    weight_sum: f32,
}

impl FitnessAggregator {
    pub fn new(functions: Vec<ScoringFunction>) -> MsResult<Self> {
        if functions.is_empty() {
            return Err(MolSwarmError::Config(
                "no scoring functions configured".to_string(),
            ));
        }
        let mut names = HashSet::new();
        for f in &functions {
            if !(f.weight > 0.0) {
                return Err(MolSwarmError::Config(format!(
                    "objective '{}' has non-positive weight {}",
                    f.name, f.weight
                )));
            }
            if !names.insert(f.name.as_str()) {
                return Err(MolSwarmError::Config(format!(
                    "duplicate objective name '{}'",
                    f.name
                )));
            }
        }
        let weight_sum: f32 = functions.iter().map(|f| f.weight).sum();
        if !(weight_sum > 0.0) {
            return Err(MolSwarmError::Config(
                "scoring weights sum to zero".to_string(),
            ));
        }
        Ok(Self {
            functions,
            weight_sum,
        })
    }

    pub fn functions(&self) -> &[ScoringFunction] {
        &self.functions
    }

    /// Snapshot guard value for the current objective configuration.
    pub fn fingerprint(&self) -> String {
        scoring_fingerprint(&self.functions)
    }

    /// Evaluates one swarm and folds freshly scored molecules into `cache`.
    pub fn update_fitness(&self, swarm: &mut Swarm, cache: &mut ScoreCache) -> MsResult<()> {
        let delta = self.evaluate(swarm, cache)?;
        cache.merge(delta);
        Ok(())
    }

    /// Evaluates one swarm against a read-only cache view and returns the
    /// new records instead of writing them. Work units use this so the
    /// orchestrator can merge after the step barrier.
    pub fn update_fitness_buffered(
        &self,
        swarm: &mut Swarm,
        cache: &ScoreCache,
    ) -> MsResult<CacheDelta> {
        self.evaluate(swarm, cache)
    }

    fn evaluate(&self, swarm: &mut Swarm, cache: &ScoreCache) -> MsResult<CacheDelta> {
        // 1. Canonicalize in place so every downstream key is stable.
        for smi in &mut swarm.smiles {
            *smi = chem::canonical(smi);
        }

        // 2. Run molecule objectives over cache misses only.
        let mut delta = CacheDelta::default();
        if self.functions.iter().any(|f| f.is_mol_func()) {
            let novel = cache.novel(&swarm.smiles);
            if !novel.is_empty() {
                let mut records = vec![ScoreRecord::default(); novel.len()];
                for f in &self.functions {
                    if let Objective::Molecules(call) = &f.objective {
                        let batch = call(&novel)?;
                        batch.check_len(novel.len(), &f.name)?;
                        for (i, rec) in records.iter_mut().enumerate() {
                            rec.unscaled.insert(f.name.clone(), batch.unscaled[i]);
                            rec.scaled.insert(f.name.clone(), batch.scaled[i]);
                            rec.desirability.insert(f.name.clone(), batch.desirability[i]);
                            if rec.residue.is_none() {
                                rec.residue = batch.residues[i].clone();
                            }
                        }
                    }
                }
                for (smi, rec) in novel.into_iter().zip(records) {
                    delta.push(smi, rec);
                }
            }
        }

        // 3. Assemble per-particle vectors and the weighted fitness.
        let n = swarm.num_part;
        let mut fitness = vec![0.0f32; n];
        for f in &self.functions {
            let (unscaled, scaled, desirability) = match &f.objective {
                Objective::Molecules(_) => {
                    let mut u = Vec::with_capacity(n);
                    let mut s = Vec::with_capacity(n);
                    let mut d = Vec::with_capacity(n);
                    for smi in &swarm.smiles {
                        let rec = match delta.find(smi) {
                            Some(rec) => rec,
                            None => cache.get(smi),
                        };
                        u.push(fetch(&rec.unscaled, smi, &f.name));
                        s.push(fetch(&rec.scaled, smi, &f.name));
                        d.push(fetch(&rec.desirability, smi, &f.name));
                    }
                    (u, s, d)
                }
                Objective::Embeddings(call) => {
                    let batch = call(swarm.x.view())?;
                    batch.check_len(n, &f.name)?;
                    (batch.unscaled, batch.scaled, batch.desirability)
                }
            };
            for (acc, &sc) in fitness.iter_mut().zip(&scaled) {
                *acc += sc * f.weight;
            }
            swarm.unscaled_scores.insert(f.name.clone(), unscaled);
            swarm.scaled_scores.insert(f.name.clone(), scaled);
            swarm.desirability_scores.insert(f.name.clone(), desirability);
        }
        for v in &mut fitness {
            *v /= self.weight_sum;
        }
        let non_finite = fitness.iter().filter(|v| !v.is_finite()).count();
        if non_finite > 0 {
            warn!(particles = non_finite, "scoring produced non-finite fitness");
        }
        swarm.update_fitness(fitness)?;
        Ok(delta)
    }
}

fn fetch(map: &BTreeMap<String, f32>, smiles: &str, objective: &str) -> f32 {
    map.get(objective).copied().unwrap_or_else(|| {
        panic!(
            "cache record for '{}' lacks objective '{}'",
            smiles, objective
        )
    })
}
