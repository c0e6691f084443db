use crate::chem;
use crate::config::PsoParams;
use crate::error::{MolSwarmError, MsResult};
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One swarm of particles moving through embedding space. Mutated in place
/// by the step loop; molecules and positions are resynchronized through the
/// embedding model after every move.
pub struct Swarm {
    pub num_part: usize,
    pub x: Array2<f32>,
    pub v: Array2<f32>,
    pub smiles: Vec<String>,
    pub fitness: Vec<f32>,
    pub particle_best_x: Array2<f32>,
    pub particle_best_fitness: Vec<f32>,
    pub swarm_best_x: Array1<f32>,
    pub swarm_best_fitness: f32,
    pub best_smiles: String,
    pub unscaled_scores: HashMap<String, Vec<f32>>,
    pub scaled_scores: HashMap<String, Vec<f32>>,
    pub desirability_scores: HashMap<String, Vec<f32>>,
    pub params: PsoParams,
    rng: fastrand::Rng,
}

impl Swarm {
    /// All particles start on the seed embedding with randomized velocities
    /// inside the clamp box, so the population fans out from the query.
    pub fn seeded(
        smiles: &str,
        embedding: ArrayView1<'_, f32>,
        num_part: usize,
        params: &PsoParams,
        seed: u64,
    ) -> MsResult<Self> {
        if num_part == 0 {
            return Err(MolSwarmError::Config(
                "swarm needs at least one particle".to_string(),
            ));
        }
        params.validate()?;
        let dim = embedding.len();
        let mut rng = fastrand::Rng::with_seed(seed);
        let canonical = chem::canonical(smiles);

        let mut x = Array2::zeros((num_part, dim));
        for mut row in x.rows_mut() {
            row.assign(&embedding);
        }
        let span = params.v_max - params.v_min;
        let v = Array2::from_shape_fn((num_part, dim), |_| params.v_min + rng.f32() * span);

        Ok(Self {
            num_part,
            particle_best_x: x.clone(),
            swarm_best_x: embedding.to_owned(),
            x,
            v,
            smiles: vec![canonical.clone(); num_part],
            fitness: vec![f32::NEG_INFINITY; num_part],
            particle_best_fitness: vec![f32::NEG_INFINITY; num_part],
            swarm_best_fitness: f32::NEG_INFINITY,
            best_smiles: canonical,
            unscaled_scores: HashMap::new(),
            scaled_scores: HashMap::new(),
            desirability_scores: HashMap::new(),
            params: params.clone(),
            rng,
        })
    }

    pub fn dim(&self) -> usize {
        self.x.ncols()
    }

    /// Velocity update with deterministic inertia and two uniform random
    /// pulls (one scalar draw per particle each), then clamped move.
    pub fn next_step(&mut self) {
        let p = &self.params;
        for i in 0..self.num_part {
            let u2 = self.rng.f32() * p.phi2;
            let u3 = self.rng.f32() * p.phi3;
            for j in 0..self.x.ncols() {
                let pull_personal = u2 * (self.particle_best_x[[i, j]] - self.x[[i, j]]);
                let pull_global = u3 * (self.swarm_best_x[j] - self.x[[i, j]]);
                let v = (p.phi1 * self.v[[i, j]] + pull_personal + pull_global)
                    .clamp(p.v_min, p.v_max);
                self.v[[i, j]] = v;
                self.x[[i, j]] = (self.x[[i, j]] + v).clamp(p.x_min, p.x_max);
            }
        }
    }

    /// Installs fresh per-particle fitness and rolls the personal and swarm
    /// bests forward.
    pub fn update_fitness(&mut self, fitness: Vec<f32>) -> MsResult<()> {
        if fitness.len() != self.num_part {
            return Err(MolSwarmError::Validation(format!(
                "fitness vector has {} entries for {} particles",
                fitness.len(),
                self.num_part
            )));
        }
        self.fitness = fitness;

        let mut best_idx = None;
        for i in 0..self.num_part {
            let f = self.fitness[i];
            if f > self.particle_best_fitness[i] {
                self.particle_best_fitness[i] = f;
                self.particle_best_x
                    .row_mut(i)
                    .assign(&self.x.row(i));
            }
            if best_idx.map_or(true, |b: usize| f > self.fitness[b]) {
                best_idx = Some(i);
            }
        }
        if let Some(i) = best_idx {
            if self.fitness[i] > self.swarm_best_fitness {
                self.swarm_best_fitness = self.fitness[i];
                self.swarm_best_x = self.x.row(i).to_owned();
                self.best_smiles = self.smiles[i].clone();
            }
        }
        Ok(())
    }

    pub fn to_snapshot(&self) -> SwarmSnapshot {
        SwarmSnapshot {
            smiles: self.smiles.clone(),
            x: to_nested(&self.x),
            v: to_nested(&self.v),
            fitness: self.fitness.clone(),
            particle_best_x: to_nested(&self.particle_best_x),
            particle_best_fitness: self.particle_best_fitness.clone(),
            swarm_best_x: self.swarm_best_x.to_vec(),
            swarm_best_fitness: self.swarm_best_fitness,
            best_smiles: self.best_smiles.clone(),
        }
    }

    /// Rebuilds a swarm from persisted state. Score maps are not part of a
    /// snapshot; the next evaluation repopulates them.
    pub fn from_snapshot(snapshot: &SwarmSnapshot, params: &PsoParams, seed: u64) -> MsResult<Self> {
        params.validate()?;
        let x = from_nested(&snapshot.x, "x")?;
        let v = from_nested(&snapshot.v, "v")?;
        let particle_best_x = from_nested(&snapshot.particle_best_x, "particle_best_x")?;
        let num_part = x.nrows();
        if num_part == 0 {
            return Err(MolSwarmError::Validation(
                "snapshot has no particles".to_string(),
            ));
        }
        let dim = x.ncols();
        if v.dim() != (num_part, dim) || particle_best_x.dim() != (num_part, dim) {
            return Err(MolSwarmError::Validation(
                "snapshot matrices disagree on shape".to_string(),
            ));
        }
        if snapshot.smiles.len() != num_part
            || snapshot.fitness.len() != num_part
            || snapshot.particle_best_fitness.len() != num_part
        {
            return Err(MolSwarmError::Validation(
                "snapshot vectors disagree on particle count".to_string(),
            ));
        }
        if snapshot.swarm_best_x.len() != dim {
            return Err(MolSwarmError::Validation(
                "snapshot swarm best has wrong dimension".to_string(),
            ));
        }
        Ok(Self {
            num_part,
            x,
            v,
            smiles: snapshot.smiles.iter().map(|s| chem::canonical(s)).collect(),
            fitness: snapshot.fitness.clone(),
            particle_best_x,
            particle_best_fitness: snapshot.particle_best_fitness.clone(),
            swarm_best_x: Array1::from_vec(snapshot.swarm_best_x.clone()),
            swarm_best_fitness: snapshot.swarm_best_fitness,
            best_smiles: chem::canonical(&snapshot.best_smiles),
            unscaled_scores: HashMap::new(),
            scaled_scores: HashMap::new(),
            desirability_scores: HashMap::new(),
            params: params.clone(),
            rng: fastrand::Rng::with_seed(seed),
        })
    }
}

/// Persistable swarm state (plain vectors, no matrix types on the wire).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwarmSnapshot {
    pub smiles: Vec<String>,
    pub x: Vec<Vec<f32>>,
    pub v: Vec<Vec<f32>>,
    pub fitness: Vec<f32>,
    pub particle_best_x: Vec<Vec<f32>>,
    pub particle_best_fitness: Vec<f32>,
    pub swarm_best_x: Vec<f32>,
    pub swarm_best_fitness: f32,
    pub best_smiles: String,
}

fn to_nested(m: &Array2<f32>) -> Vec<Vec<f32>> {
    m.rows().into_iter().map(|r| r.to_vec()).collect()
}

fn from_nested(rows: &[Vec<f32>], name: &str) -> MsResult<Array2<f32>> {
    let nrows = rows.len();
    let ncols = rows.first().map_or(0, |r| r.len());
    if rows.iter().any(|r| r.len() != ncols) {
        return Err(MolSwarmError::Validation(format!(
            "snapshot matrix '{}' is ragged",
            name
        )));
    }
    let flat: Vec<f32> = rows.iter().flatten().copied().collect();
    Array2::from_shape_vec((nrows, ncols), flat)
        .map_err(|e| MolSwarmError::Validation(format!("snapshot matrix '{}': {}", name, e)))
}
