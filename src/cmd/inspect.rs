use clap::Args;
use molswarm::error::MsResult;
use molswarm::reports;
use molswarm::scoring::CacheSnapshot;
use std::fs;
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    /// Run output directory, or a best-solutions CSV directly.
    pub path: PathBuf,

    /// Rows to show.
    #[arg(long, default_value_t = 25)]
    pub top: usize,
}

pub fn run(args: InspectArgs) -> MsResult<()> {
    let dir = if args.path.is_dir() {
        Some(args.path.clone())
    } else {
        None
    };
    let csv_path = match &dir {
        Some(d) => d.join(reports::BEST_SOLUTIONS_CSV),
        None => args.path.clone(),
    };

    let solutions = reports::read_best_solutions_csv(&csv_path)?;
    println!("\n📊 {} ({} molecules)", csv_path.display(), solutions.len());
    println!("{}", reports::best_solutions_table(&solutions, args.top));

    if let Some(d) = dir {
        let stats_path = d.join(reports::EPOCH_STATS);
        if stats_path.exists() {
            let stats = fs::read_to_string(&stats_path)?;
            let lines: Vec<&str> = stats.lines().collect();
            println!("📈 Last steps:");
            for line in lines.iter().rev().take(5).rev() {
                println!("   {}", line);
            }
        }

        let cache_path = d.join(reports::CACHE_JSON);
        if cache_path.exists() {
            let snapshot = CacheSnapshot::load(&cache_path)?;
            println!(
                "🧮 Score cache: {} molecules, fingerprint {}",
                snapshot.len(),
                &snapshot.fingerprint[..snapshot.fingerprint.len().min(12)]
            );
        }
    }

    Ok(())
}
