// ===== molswarm/src/optimizer/mod.rs =====
pub mod pool;
pub mod runner;
pub mod tracker;

pub use pool::{ManualPooledSwarmOptimizer, PooledSwarmOptimizer};
pub use runner::{BatchedSwarmOptimizer, RunOutcome, SwarmOptimizer};
pub use tracker::{BestSolution, BestTracker, FitnessSummary, HistoryRow};

use crate::chem;
use crate::config::{Config, PsoParams};
use crate::embedding::EmbeddingModel;
use crate::error::{MolSwarmError, MsResult};
use crate::scoring::CacheDelta;
use crate::swarm::Swarm;

/// What one work unit hands back across the step barrier: its advanced
/// swarm and the score records it computed off the shared cache view.
pub struct StepOutcome {
    pub swarm: Swarm,
    pub delta: CacheDelta,
}

/// Decodes the swarm's positions, installs the molecules, and re-encodes
/// them as the new positions, keeping particles on embeddings the model can
/// actually reach.
pub(crate) fn resync<M: EmbeddingModel + ?Sized>(model: &M, swarm: &mut Swarm) -> MsResult<()> {
    let decoded = model.emb_to_seq(swarm.x.view())?;
    if decoded.len() != swarm.num_part {
        return Err(MolSwarmError::Embedding(format!(
            "decoder returned {} molecules for {} particles",
            decoded.len(),
            swarm.num_part
        )));
    }
    swarm.smiles = decoded;
    let encoded = model.seq_to_emb(&swarm.smiles)?;
    if encoded.dim() != (swarm.num_part, swarm.dim()) {
        return Err(MolSwarmError::Embedding(format!(
            "encoder returned shape {:?}, expected [{}, {}]",
            encoded.dim(),
            swarm.num_part,
            swarm.dim()
        )));
    }
    swarm.x = encoded;
    Ok(())
}

/// One seeded swarm per query, with derived per-swarm rng seeds.
pub(crate) fn seeded_swarms<M: EmbeddingModel + ?Sized>(
    model: &M,
    queries: &[String],
    num_part: usize,
    pso: &PsoParams,
    base_seed: u64,
) -> MsResult<Vec<Swarm>> {
    let canon: Vec<String> = queries.iter().map(|q| chem::canonical(q)).collect();
    let emb = model.seq_to_emb(&canon)?;
    if emb.nrows() != canon.len() {
        return Err(MolSwarmError::Embedding(format!(
            "encoder returned {} rows for {} queries",
            emb.nrows(),
            canon.len()
        )));
    }
    canon
        .iter()
        .enumerate()
        .map(|(i, smi)| {
            Swarm::seeded(
                smi,
                emb.row(i),
                num_part,
                pso,
                base_seed.wrapping_add(i as u64),
            )
        })
        .collect()
}

/// Replicates one query across the configured number of swarms.
pub(crate) fn query_swarms<M: EmbeddingModel + ?Sized>(
    model: &M,
    query: &str,
    config: &Config,
) -> MsResult<Vec<Swarm>> {
    let queries = vec![query.to_string(); config.run.num_swarms];
    seeded_swarms(
        model,
        &queries,
        config.run.num_part,
        &config.pso,
        config.run.seed,
    )
}

/// One query per swarm; the list length must match the configured count.
pub(crate) fn query_list_swarms<M: EmbeddingModel + ?Sized>(
    model: &M,
    queries: &[String],
    config: &Config,
) -> MsResult<Vec<Swarm>> {
    if queries.len() != config.run.num_swarms {
        return Err(MolSwarmError::Config(format!(
            "{} seed molecules for {} swarms",
            queries.len(),
            config.run.num_swarms
        )));
    }
    seeded_swarms(
        model,
        queries,
        config.run.num_part,
        &config.pso,
        config.run.seed,
    )
}

pub(crate) fn check_swarms(swarms: &[Swarm]) -> MsResult<()> {
    let first_dim = match swarms.first() {
        Some(s) => s.dim(),
        None => {
            return Err(MolSwarmError::Config(
                "optimizer needs at least one swarm".to_string(),
            ))
        }
    };
    if swarms.iter().any(|s| s.dim() != first_dim) {
        return Err(MolSwarmError::Validation(
            "swarms disagree on embedding dimension".to_string(),
        ));
    }
    Ok(())
}
