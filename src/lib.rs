pub mod chem;
pub mod config;
pub mod embedding;
pub mod error;
pub mod optimizer;
pub mod reports;
pub mod scoring;
pub mod swarm;
