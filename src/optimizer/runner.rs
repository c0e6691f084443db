use super::tracker::{BestTracker, FitnessSummary};
use super::{check_swarms, query_list_swarms, query_swarms, resync};
use crate::config::Config;
use crate::embedding::EmbeddingModel;
use crate::error::{MolSwarmError, MsResult};
use crate::reports;
use crate::scoring::{FitnessAggregator, ScoreCache, ScoringFunction};
use crate::swarm::{Swarm, SwarmSnapshot};
use ndarray::{concatenate, s, Axis};
use std::fs;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Copy)]
pub struct RunOutcome {
    pub steps_run: usize,
    pub summary: FitnessSummary,
}

/// One-swarm-at-a-time driver. Evaluates and advances each swarm in order
/// and refreshes the artifact set in `out_dir` every step.
pub struct SwarmOptimizer<M: EmbeddingModel> {
    model: M,
    swarms: Vec<Swarm>,
    aggregator: FitnessAggregator,
    cache: ScoreCache,
    tracker: BestTracker,
}

impl<M: EmbeddingModel> SwarmOptimizer<M> {
    pub fn new(
        model: M,
        swarms: Vec<Swarm>,
        functions: Vec<ScoringFunction>,
        num_track: usize,
        seed_smiles: &[String],
    ) -> MsResult<Self> {
        check_swarms(&swarms)?;
        Ok(Self {
            model,
            swarms,
            aggregator: FitnessAggregator::new(functions)?,
            cache: ScoreCache::new(),
            tracker: BestTracker::new(num_track, seed_smiles),
        })
    }

    /// Seeds every swarm from the same query molecule.
    pub fn from_query(
        query: &str,
        model: M,
        functions: Vec<ScoringFunction>,
        config: &Config,
    ) -> MsResult<Self> {
        let swarms = query_swarms(&model, query, config)?;
        Self::new(
            model,
            swarms,
            functions,
            config.run.num_track,
            &[query.to_string()],
        )
    }

    /// Seeds one swarm per query molecule.
    pub fn from_query_list(
        queries: &[String],
        model: M,
        functions: Vec<ScoringFunction>,
        config: &Config,
    ) -> MsResult<Self> {
        let swarms = query_list_swarms(&model, queries, config)?;
        Self::new(model, swarms, functions, config.run.num_track, queries)
    }

    /// Restores a previous run's swarms. Seed molecules still need to be
    /// named so the tracker keeps excluding them.
    pub fn from_snapshots(
        snapshots: &[SwarmSnapshot],
        seed_smiles: &[String],
        model: M,
        functions: Vec<ScoringFunction>,
        config: &Config,
    ) -> MsResult<Self> {
        let swarms = snapshots
            .iter()
            .enumerate()
            .map(|(i, snap)| {
                Swarm::from_snapshot(snap, &config.pso, config.run.seed.wrapping_add(i as u64))
            })
            .collect::<MsResult<Vec<_>>>()?;
        Self::new(model, swarms, functions, config.run.num_track, seed_smiles)
    }

    pub fn swarms(&self) -> &[Swarm] {
        &self.swarms
    }

    pub fn tracker(&self) -> &BestTracker {
        &self.tracker
    }

    pub fn cache(&self) -> &ScoreCache {
        &self.cache
    }

    pub fn run(&mut self, num_steps: usize, out_dir: &Path) -> MsResult<RunOutcome> {
        // 1. The output directory must be fresh; overwriting a previous
        //    run's artifacts is treated as a configuration mistake.
        if out_dir.exists() {
            return Err(MolSwarmError::Config(format!(
                "output directory '{}' already exists",
                out_dir.display()
            )));
        }
        fs::create_dir_all(out_dir)?;

        // 2. Score the starting populations.
        for swarm in &mut self.swarms {
            self.aggregator.update_fitness(swarm, &mut self.cache)?;
        }

        // 3. Step loop: observe, advance, persist.
        let mut summary = self.tracker.summary();
        for step in 0..num_steps {
            self.tracker.update_history(step, &self.swarms, &self.cache);
            summary = self.tracker.update_best_solutions(&self.swarms, &self.cache);
            info!(
                step,
                max = summary.max,
                min = summary.min,
                mean = summary.mean,
                "swarm step"
            );
            reports::append_epoch_stats(&out_dir.join(reports::EPOCH_STATS), step, &summary)?;

            for swarm in &mut self.swarms {
                swarm.next_step();
                resync(&self.model, swarm)?;
                self.aggregator.update_fitness(swarm, &mut self.cache)?;
            }

            self.persist(out_dir)?;
        }

        Ok(RunOutcome {
            steps_run: num_steps,
            summary,
        })
    }

    fn persist(&self, out_dir: &Path) -> MsResult<()> {
        reports::write_best_solutions_csv(
            self.tracker.solutions(),
            &out_dir.join(reports::BEST_SOLUTIONS_CSV),
        )?;
        reports::write_history_csv(self.tracker.history(), &out_dir.join(reports::HISTORY_CSV))?;
        reports::write_best_solutions_html(
            self.tracker.solutions(),
            &out_dir.join(reports::BEST_SOLUTIONS_HTML),
        )?;
        reports::write_cache_snapshot(
            &self.cache,
            &self.aggregator.fingerprint(),
            &out_dir.join(reports::CACHE_JSON),
        )?;
        Ok(())
    }
}

/// Driver that moves all swarms through the embedding model in one batch:
/// positions are stacked into a single matrix, decoded and re-encoded once,
/// and sliced back per swarm by fixed offsets. Worth it when every model
/// call pays a fixed dispatch cost.
pub struct BatchedSwarmOptimizer<M: EmbeddingModel> {
    model: M,
    swarms: Vec<Swarm>,
    aggregator: FitnessAggregator,
    cache: ScoreCache,
    tracker: BestTracker,
    num_part: usize,
}

impl<M: EmbeddingModel> BatchedSwarmOptimizer<M> {
    pub fn new(
        model: M,
        swarms: Vec<Swarm>,
        functions: Vec<ScoringFunction>,
        num_track: usize,
        seed_smiles: &[String],
    ) -> MsResult<Self> {
        check_swarms(&swarms)?;
        let num_part = swarms[0].num_part;
        if swarms.iter().any(|s| s.num_part != num_part) {
            return Err(MolSwarmError::Config(
                "batched strategy requires a uniform particle count across swarms".to_string(),
            ));
        }
        Ok(Self {
            model,
            swarms,
            aggregator: FitnessAggregator::new(functions)?,
            cache: ScoreCache::new(),
            tracker: BestTracker::new(num_track, seed_smiles),
            num_part,
        })
    }

    pub fn from_query(
        query: &str,
        model: M,
        functions: Vec<ScoringFunction>,
        config: &Config,
    ) -> MsResult<Self> {
        let swarms = query_swarms(&model, query, config)?;
        Self::new(
            model,
            swarms,
            functions,
            config.run.num_track,
            &[query.to_string()],
        )
    }

    pub fn from_query_list(
        queries: &[String],
        model: M,
        functions: Vec<ScoringFunction>,
        config: &Config,
    ) -> MsResult<Self> {
        let swarms = query_list_swarms(&model, queries, config)?;
        Self::new(model, swarms, functions, config.run.num_track, queries)
    }

    pub fn from_snapshots(
        snapshots: &[SwarmSnapshot],
        seed_smiles: &[String],
        model: M,
        functions: Vec<ScoringFunction>,
        config: &Config,
    ) -> MsResult<Self> {
        let swarms = snapshots
            .iter()
            .enumerate()
            .map(|(i, snap)| {
                Swarm::from_snapshot(snap, &config.pso, config.run.seed.wrapping_add(i as u64))
            })
            .collect::<MsResult<Vec<_>>>()?;
        Self::new(model, swarms, functions, config.run.num_track, seed_smiles)
    }

    pub fn swarms(&self) -> &[Swarm] {
        &self.swarms
    }

    pub fn tracker(&self) -> &BestTracker {
        &self.tracker
    }

    pub fn cache(&self) -> &ScoreCache {
        &self.cache
    }

    pub fn run(&mut self, num_steps: usize) -> MsResult<RunOutcome> {
        // 1. Score the starting populations.
        for swarm in &mut self.swarms {
            self.aggregator.update_fitness(swarm, &mut self.cache)?;
        }

        // 2. Step loop with one model round trip per step.
        let mut summary = self.tracker.summary();
        for step in 0..num_steps {
            self.tracker.update_history(step, &self.swarms, &self.cache);
            summary = self.tracker.update_best_solutions(&self.swarms, &self.cache);
            info!(
                step,
                max = summary.max,
                min = summary.min,
                mean = summary.mean,
                "swarm step (batched)"
            );

            for swarm in &mut self.swarms {
                swarm.next_step();
            }
            self.batched_resync()?;
            for swarm in &mut self.swarms {
                self.aggregator.update_fitness(swarm, &mut self.cache)?;
            }
        }

        Ok(RunOutcome {
            steps_run: num_steps,
            summary,
        })
    }

    /// Stack positions, decode and re-encode once, slice back per swarm.
    fn batched_resync(&mut self) -> MsResult<()> {
        let total = self.swarms.len() * self.num_part;
        let dim = self.swarms[0].dim();

        let views: Vec<_> = self.swarms.iter().map(|sw| sw.x.view()).collect();
        let stacked = concatenate(Axis(0), &views)
            .map_err(|e| MolSwarmError::Validation(format!("position stacking failed: {}", e)))?;

        let decoded = self.model.emb_to_seq(stacked.view())?;
        if decoded.len() != total {
            return Err(MolSwarmError::Embedding(format!(
                "decoder returned {} molecules for {} particles",
                decoded.len(),
                total
            )));
        }
        let encoded = self.model.seq_to_emb(&decoded)?;
        if encoded.dim() != (total, dim) {
            return Err(MolSwarmError::Embedding(format!(
                "encoder returned shape {:?}, expected [{}, {}]",
                encoded.dim(),
                total,
                dim
            )));
        }

        for (i, swarm) in self.swarms.iter_mut().enumerate() {
            let lo = i * self.num_part;
            let hi = lo + self.num_part;
            swarm.smiles = decoded[lo..hi].to_vec();
            swarm.x = encoded.slice(s![lo..hi, ..]).to_owned();
        }
        Ok(())
    }
}
