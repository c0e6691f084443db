// ===== molswarm/src/main.rs =====
use clap::{Parser, Subcommand};
use std::process;

mod cmd;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Demo(cmd::demo::DemoArgs),
    Inspect(cmd::inspect::InspectArgs),
}

fn main() {
    tracing_subscriber::fmt::init();

    // 1. Parse CLI
    let cli = Cli::parse();

    // 2. Execute
    let result = match cli.command {
        Commands::Demo(args) => cmd::demo::run(args),
        Commands::Inspect(args) => cmd::inspect::run(args),
    };

    if let Err(e) = result {
        eprintln!("\n❌ {}", e);
        process::exit(1);
    }
}
