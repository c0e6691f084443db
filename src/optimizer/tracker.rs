use crate::chem;
use crate::scoring::ScoreCache;
use crate::swarm::Swarm;
use std::cmp::Ordering;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq)]
pub struct BestSolution {
    pub smiles: String,
    pub fitness: f32,
    pub residue: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRow {
    pub step: usize,
    pub swarm: usize,
    pub fitness: f32,
    pub smiles: String,
    pub residue: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct FitnessSummary {
    pub max: f32,
    pub min: f32,
    pub mean: f32,
}

/// Run-level bookkeeping: the ranked table of the best molecules seen so
/// far and the per-step swarm-best history. Plain owned state, threaded
/// through whichever loop drives the run.
pub struct BestTracker {
    num_track: usize,
    seeds: HashSet<String>,
    solutions: Vec<BestSolution>,
    history: Vec<HistoryRow>,
}

impl BestTracker {
    /// Seed molecules are excluded from the table: rediscovering the query
    /// is not progress.
    pub fn new(num_track: usize, seed_smiles: &[String]) -> Self {
        Self {
            num_track,
            seeds: seed_smiles.iter().map(|s| chem::canonical(s)).collect(),
            solutions: Vec::new(),
            history: Vec::new(),
        }
    }

    pub fn num_track(&self) -> usize {
        self.num_track
    }

    pub fn solutions(&self) -> &[BestSolution] {
        &self.solutions
    }

    pub fn history(&self) -> &[HistoryRow] {
        &self.history
    }

    pub fn tracked_best(&self) -> Option<&BestSolution> {
        self.solutions.first()
    }

    /// Merges every particle of every swarm into the ranked table.
    ///
    /// Existing rows precede the new candidates, so deduplication keeps the
    /// earlier-found instance of a molecule; the stable sort then preserves
    /// that preference among equal fitness values.
    pub fn update_best_solutions(&mut self, swarms: &[Swarm], cache: &ScoreCache) -> FitnessSummary {
        let mut merged = std::mem::take(&mut self.solutions);
        for swarm in swarms {
            for (smi, &fitness) in swarm.smiles.iter().zip(&swarm.fitness) {
                if self.seeds.contains(smi.as_str()) {
                    continue;
                }
                merged.push(BestSolution {
                    smiles: smi.clone(),
                    fitness,
                    residue: cache.residue(smi).map(String::from),
                });
            }
        }
        let mut seen = HashSet::new();
        merged.retain(|row| seen.insert(row.smiles.clone()));
        merged.sort_by(|a, b| {
            b.fitness
                .partial_cmp(&a.fitness)
                .unwrap_or(Ordering::Equal)
        });
        merged.truncate(self.num_track);
        self.solutions = merged;
        self.summary()
    }

    /// One row per swarm per step, append-only.
    pub fn update_history(&mut self, step: usize, swarms: &[Swarm], cache: &ScoreCache) {
        for (idx, swarm) in swarms.iter().enumerate() {
            self.history.push(HistoryRow {
                step,
                swarm: idx,
                fitness: swarm.swarm_best_fitness,
                smiles: swarm.best_smiles.clone(),
                residue: cache.residue(&swarm.best_smiles).map(String::from),
            });
        }
    }

    /// Max/min/mean fitness of the current table; NaN across the board when
    /// the table is empty.
    pub fn summary(&self) -> FitnessSummary {
        if self.solutions.is_empty() {
            return FitnessSummary {
                max: f32::NAN,
                min: f32::NAN,
                mean: f32::NAN,
            };
        }
        let n = self.solutions.len() as f32;
        let sum: f32 = self.solutions.iter().map(|s| s.fitness).sum();
        FitnessSummary {
            max: self.solutions[0].fitness,
            min: self.solutions[self.solutions.len() - 1].fitness,
            mean: sum / n,
        }
    }
}
