use clap::Args;
use molswarm::config::{Config, Strategy};
use molswarm::embedding::CodebookModel;
use molswarm::error::{MolSwarmError, MsResult};
use molswarm::optimizer::{BatchedSwarmOptimizer, PooledSwarmOptimizer, SwarmOptimizer};
use molswarm::reports;
use molswarm::scoring::{DesirabilityCurve, ScoreBatch, ScoringFunction};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Instant;
use strum::IntoEnumIterator;

#[derive(Args, Debug, Clone)]
pub struct DemoArgs {
    #[command(flatten)]
    pub config: Config,

    /// Seed molecule shared by every swarm.
    #[arg(short, long, default_value = "CCO")]
    pub query: String,

    #[arg(short, long, default_value = "sequential")]
    pub strategy: String,

    /// Artifact directory; sequential runs refuse to reuse an existing one.
    #[arg(short, long, default_value = "molswarm_out")]
    pub out_dir: PathBuf,

    /// Fragment slots (embedding dimensions) in the demo codebook model.
    #[arg(long, default_value_t = 8)]
    pub slots: usize,

    /// Rows to show in the final table.
    #[arg(long, default_value_t = 15)]
    pub top: usize,
}

pub fn run(args: DemoArgs) -> MsResult<()> {
    let strategy = Strategy::from_str(&args.strategy).map_err(|_| {
        let known: Vec<String> = Strategy::iter().map(|s| s.to_string()).collect();
        MolSwarmError::Config(format!(
            "unknown strategy '{}', expected one of: {}",
            args.strategy,
            known.join(", ")
        ))
    })?;

    println!("\n🧪 Building codebook model with {} slots", args.slots);
    let model = CodebookModel::with_default_vocab(args.slots)?;
    let functions = demo_objectives()?;

    println!(
        "🔥 Optimizing '{}' with {} swarm(s) of {} particles ({})",
        args.query, args.config.run.num_swarms, args.config.run.num_part, strategy
    );

    let num_steps = args.config.run.num_steps;
    let start = Instant::now();

    let (outcome, solutions) = match strategy {
        Strategy::Sequential => {
            let mut opt = SwarmOptimizer::from_query(&args.query, model, functions, &args.config)?;
            let outcome = opt.run(num_steps, &args.out_dir)?;
            println!("📂 Artifacts written to {}", args.out_dir.display());
            (outcome, opt.tracker().solutions().to_vec())
        }
        Strategy::Batched => {
            let mut opt =
                BatchedSwarmOptimizer::from_query(&args.query, model, functions, &args.config)?;
            let outcome = opt.run(num_steps)?;
            (outcome, opt.tracker().solutions().to_vec())
        }
        Strategy::Pooled => {
            let mut opt =
                PooledSwarmOptimizer::from_query(&args.query, model, functions, &args.config)?;
            let outcome = opt.run(num_steps)?;
            (outcome, opt.tracker().solutions().to_vec())
        }
    };

    println!("\n=== 🏆 BEST MOLECULES ===");
    println!("{}", reports::best_solutions_table(&solutions, args.top));
    println!(
        "Ran {} step(s) in {:.2}s | swarm fitness max {:.3} mean {:.3}",
        outcome.steps_run,
        start.elapsed().as_secs_f32(),
        outcome.summary.max,
        outcome.summary.mean
    );

    Ok(())
}

/// Toy objectives over the codebook alphabet: favor aromatic rings and a
/// mid-sized molecule, and nudge particles back toward the box center.
fn demo_objectives() -> MsResult<Vec<ScoringFunction>> {
    let ring_curve = DesirabilityCurve::new(vec![(0.0, 0.1), (1.0, 0.9), (2.0, 1.0)])?;
    let rings = ScoringFunction::on_molecules("rings", 1.0, move |smiles: &[String]| {
        let unscaled: Vec<f32> = smiles
            .iter()
            .map(|s| s.matches("c1").count() as f32)
            .collect();
        Ok(ScoreBatch::scaled_by(unscaled, &ring_curve))
    });

    let size_curve = DesirabilityCurve::new(vec![
        (0.0, 0.0),
        (6.0, 0.6),
        (14.0, 1.0),
        (24.0, 0.4),
        (40.0, 0.0),
    ])?;
    let size = ScoringFunction::on_molecules("size", 2.0, move |smiles: &[String]| {
        let unscaled: Vec<f32> = smiles.iter().map(|s| s.chars().count() as f32).collect();
        Ok(ScoreBatch::scaled_by(unscaled, &size_curve))
    });

    let drift_curve = DesirabilityCurve::new(vec![(0.0, 1.0), (1.0, 0.2)])?;
    let drift = ScoringFunction::on_embeddings("drift", 0.5, move |emb| {
        let unscaled: Vec<f32> = emb
            .rows()
            .into_iter()
            .map(|row| row.iter().map(|v| v.abs()).sum::<f32>() / row.len().max(1) as f32)
            .collect();
        Ok(ScoreBatch::scaled_by(unscaled, &drift_curve))
    });

    Ok(vec![rings, size, drift])
}
