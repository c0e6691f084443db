use super::runner::RunOutcome;
use super::tracker::BestTracker;
use super::{check_swarms, query_list_swarms, query_swarms, resync, StepOutcome};
use crate::config::Config;
use crate::embedding::EmbeddingModel;
use crate::error::{MolSwarmError, MsResult};
use crate::scoring::{FitnessAggregator, ScoreCache, ScoringFunction};
use crate::swarm::{Swarm, SwarmSnapshot};
use rayon::prelude::*;
use tracing::{debug, info};

fn build_pool(num_workers: usize) -> MsResult<rayon::ThreadPool> {
    if num_workers == 0 {
        return Err(MolSwarmError::Config(
            "worker pool needs at least one worker".to_string(),
        ));
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_workers)
        .build()
        .map_err(|e| MolSwarmError::Config(format!("worker pool: {}", e)))
}

/// Driver that hands each swarm to a dedicated worker every step. Swarms
/// move into the work units; the model and objectives are shared read-only,
/// and freshly scored molecules come back as deltas merged after the
/// barrier. The model must tolerate concurrent calls.
pub struct PooledSwarmOptimizer<M: EmbeddingModel + Sync> {
    model: M,
    swarms: Vec<Swarm>,
    aggregator: FitnessAggregator,
    cache: ScoreCache,
    tracker: BestTracker,
    pool: rayon::ThreadPool,
}

impl<M: EmbeddingModel + Sync> PooledSwarmOptimizer<M> {
    pub fn new(
        model: M,
        swarms: Vec<Swarm>,
        functions: Vec<ScoringFunction>,
        num_track: usize,
        seed_smiles: &[String],
        num_workers: usize,
    ) -> MsResult<Self> {
        check_swarms(&swarms)?;
        Ok(Self {
            model,
            swarms,
            aggregator: FitnessAggregator::new(functions)?,
            cache: ScoreCache::new(),
            tracker: BestTracker::new(num_track, seed_smiles),
            pool: build_pool(num_workers)?,
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
            config.run.num_workers,
        )
    }

    pub fn from_query_list(
        queries: &[String],
        model: M,
        functions: Vec<ScoringFunction>,
        config: &Config,
    ) -> MsResult<Self> {
        let swarms = query_list_swarms(&model, queries, config)?;
        Self::new(
            model,
            swarms,
            functions,
            config.run.num_track,
            queries,
            config.run.num_workers,
        )
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
        Self::new(
            model,
            swarms,
            functions,
            config.run.num_track,
            seed_smiles,
            config.run.num_workers,
        )
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

    /// Runs up to `num_steps` steps, stopping early once the single tracked
    /// best molecule reaches maximal fitness.
    ///
    /// A worker error aborts the run and consumes the swarms; rebuild from
    /// snapshots to retry.
    pub fn run(&mut self, num_steps: usize) -> MsResult<RunOutcome> {
        // 1. Parallel evaluation of the starting populations. Identical
        //    seed molecules may be scored once per swarm here; the
        //    first-write-wins merge keeps a single record.
        let deltas = {
            let aggregator = &self.aggregator;
            let cache = &self.cache;
            let swarms = &mut self.swarms;
            self.pool.install(|| {
                swarms
                    .par_iter_mut()
                    .map(|swarm| aggregator.update_fitness_buffered(swarm, cache))
                    .collect::<MsResult<Vec<_>>>()
            })?
        };
        for delta in deltas {
            self.cache.merge(delta);
        }

        // 2. Step loop: one work unit per swarm, full barrier, merge.
        let mut summary = self.tracker.summary();
        let mut steps_run = 0;
        for step in 0..num_steps {
            steps_run += 1;

            let taken = std::mem::take(&mut self.swarms);
            let outcomes = {
                let model = &self.model;
                let aggregator = &self.aggregator;
                let cache = &self.cache;
                self.pool.install(|| {
                    taken
                        .into_par_iter()
                        .map(|mut swarm| {
                            swarm.next_step();
                            resync(model, &mut swarm)?;
                            let delta = aggregator.update_fitness_buffered(&mut swarm, cache)?;
                            Ok(StepOutcome { swarm, delta })
                        })
                        .collect::<MsResult<Vec<_>>>()
                })?
            };
            for outcome in outcomes {
                self.cache.merge(outcome.delta);
                self.swarms.push(outcome.swarm);
            }

            summary = self.tracker.update_best_solutions(&self.swarms, &self.cache);
            self.tracker.update_history(step, &self.swarms, &self.cache);
            info!(
                step,
                max = summary.max,
                min = summary.min,
                mean = summary.mean,
                "swarm step (pooled)"
            );

            if self.tracker.num_track() == 1 && summary.max >= 1.0 {
                debug!(step, "tracked best hit maximal fitness, stopping early");
                break;
            }
        }

        Ok(RunOutcome { steps_run, summary })
    }
}

/// Pooled variant for pipelines where fitness comes from outside (a wet-lab
/// round, a batch oracle). Each iteration applies the supplied fitness to
/// the current populations, then advances and resynchronizes so the caller
/// can score the new molecules.
pub struct ManualPooledSwarmOptimizer<M: EmbeddingModel + Sync> {
    model: M,
    swarms: Vec<Swarm>,
    pool: rayon::ThreadPool,
}

impl<M: EmbeddingModel + Sync> ManualPooledSwarmOptimizer<M> {
    pub fn new(model: M, swarms: Vec<Swarm>, num_workers: usize) -> MsResult<Self> {
        check_swarms(&swarms)?;
        Ok(Self {
            model,
            swarms,
            pool: build_pool(num_workers)?,
        })
    }

    pub fn from_query(query: &str, model: M, config: &Config) -> MsResult<Self> {
        let swarms = query_swarms(&model, query, config)?;
        Self::new(model, swarms, config.run.num_workers)
    }

    pub fn swarms(&self) -> &[Swarm] {
        &self.swarms
    }

    pub fn snapshots(&self) -> Vec<SwarmSnapshot> {
        self.swarms.iter().map(|s| s.to_snapshot()).collect()
    }

    /// One externally scored iteration: install `fitness` (one vector per
    /// swarm, one value per particle), advance every swarm in parallel, and
    /// leave the decoded molecules ready for the next scoring round.
    pub fn run_one_iteration(&mut self, fitness: Vec<Vec<f32>>) -> MsResult<()> {
        if fitness.len() != self.swarms.len() {
            return Err(MolSwarmError::Validation(format!(
                "{} fitness vectors for {} swarms",
                fitness.len(),
                self.swarms.len()
            )));
        }
        for (swarm, f) in self.swarms.iter_mut().zip(fitness) {
            swarm.update_fitness(f)?;
        }

        let model = &self.model;
        let swarms = &mut self.swarms;
        self.pool.install(|| {
            swarms.par_iter_mut().try_for_each(|swarm| {
                swarm.next_step();
                resync(model, swarm)
            })
        })
    }
}
