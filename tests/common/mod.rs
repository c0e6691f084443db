#![allow(dead_code)]

use molswarm::config::Config;
use molswarm::embedding::{CodebookModel, EmbeddingModel};
use molswarm::scoring::{DesirabilityCurve, ScoreBatch, ScoringFunction};
use molswarm::swarm::Swarm;

/// Codebook model shared by the integration tests.
pub fn demo_model() -> CodebookModel {
    CodebookModel::with_default_vocab(6).unwrap()
}

/// Small deterministic run configuration.
pub fn test_config(num_part: usize, num_swarms: usize, num_steps: usize) -> Config {
    let mut config = Config::default();
    config.run.num_part = num_part;
    config.run.num_swarms = num_swarms;
    config.run.num_steps = num_steps;
    config.run.num_track = 50;
    config.run.num_workers = 2;
    config.run.seed = 42;
    config
}

/// Swarm seeded from `query` through the demo codebook model.
pub fn seeded_swarm(model: &CodebookModel, query: &str, num_part: usize, seed: u64) -> Swarm {
    let emb = model.seq_to_emb(&[query.to_string()]).unwrap();
    let config = Config::default();
    Swarm::seeded(query, emb.row(0), num_part, &config.pso, seed).unwrap()
}

/// Molecule objective scoring SMILES length through a linear ramp.
pub fn length_objective(name: &str, weight: f32) -> ScoringFunction {
    let curve = DesirabilityCurve::new(vec![(0.0, 0.0), (32.0, 1.0)]).unwrap();
    ScoringFunction::on_molecules(name, weight, move |smiles: &[String]| {
        let unscaled: Vec<f32> = smiles.iter().map(|s| s.chars().count() as f32).collect();
        Ok(ScoreBatch::scaled_by(unscaled, &curve))
    })
}

/// Molecule objective that scores every molecule the same.
pub fn constant_objective(name: &str, weight: f32, value: f32) -> ScoringFunction {
    ScoringFunction::on_molecules(name, weight, move |smiles: &[String]| {
        let n = smiles.len();
        Ok(ScoreBatch {
            unscaled: vec![value; n],
            scaled: vec![value; n],
            desirability: vec![value; n],
            residues: vec![None; n],
        })
    })
}

/// Embedding objective that scores every particle the same.
pub fn constant_embedding_objective(name: &str, weight: f32, value: f32) -> ScoringFunction {
    ScoringFunction::on_embeddings(name, weight, move |emb| {
        let n = emb.nrows();
        Ok(ScoreBatch {
            unscaled: vec![value; n],
            scaled: vec![value; n],
            desirability: vec![value; n],
            residues: vec![None; n],
        })
    })
}
