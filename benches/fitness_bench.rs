// ===== molswarm/benches/fitness_bench.rs =====
use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use molswarm::config::PsoParams;
use molswarm::embedding::{CodebookModel, EmbeddingModel};
use molswarm::scoring::{
    DesirabilityCurve, FitnessAggregator, ScoreBatch, ScoreCache, ScoringFunction,
};
use molswarm::swarm::Swarm;
use std::hint::black_box;

const NUM_PART: usize = 150;

fn setup_aggregator() -> FitnessAggregator {
    let size_curve = DesirabilityCurve::new(vec![(0.0, 0.0), (16.0, 1.0), (32.0, 0.2)])
        .expect("bad curve points");
    let size = ScoringFunction::on_molecules("size", 2.0, move |smiles: &[String]| {
        let unscaled: Vec<f32> = smiles.iter().map(|s| s.chars().count() as f32).collect();
        Ok(ScoreBatch::scaled_by(unscaled, &size_curve))
    });

    let drift_curve =
        DesirabilityCurve::new(vec![(0.0, 1.0), (1.0, 0.0)]).expect("bad curve points");
    let drift = ScoringFunction::on_embeddings("drift", 1.0, move |emb| {
        let unscaled: Vec<f32> = emb
            .rows()
            .into_iter()
            .map(|row| row.iter().map(|v| v.abs()).sum::<f32>() / row.len().max(1) as f32)
            .collect();
        Ok(ScoreBatch::scaled_by(unscaled, &drift_curve))
    });

    FitnessAggregator::new(vec![size, drift]).expect("aggregator rejected bench objectives")
}

/// Seeded swarm with 32 distinct molecules spread over the particles, so the
/// aggregator exercises both the novel path and the cached path.
fn setup_swarm(model: &CodebookModel) -> Swarm {
    let query = "c1ccccc1CO".to_string();
    let emb = model.seq_to_emb(&[query.clone()]).expect("encode failed");
    let params = PsoParams::default();
    let mut swarm =
        Swarm::seeded(&query, emb.row(0), NUM_PART, &params, 7).expect("swarm setup failed");
    swarm.smiles = (0..NUM_PART).map(|i| "C".repeat(i % 32 + 1)).collect();
    swarm
}

fn criterion_benchmark(c: &mut Criterion) {
    let model = CodebookModel::with_default_vocab(8).expect("codebook setup failed");
    let aggregator = setup_aggregator();

    c.bench_function("update_fitness cold cache (150 particles)", |b| {
        b.iter_batched(
            || (setup_swarm(&model), ScoreCache::new()),
            |(mut swarm, mut cache)| {
                aggregator
                    .update_fitness(black_box(&mut swarm), &mut cache)
                    .expect("fitness update failed")
            },
            BatchSize::SmallInput,
        )
    });

    let mut swarm = setup_swarm(&model);
    let mut cache = ScoreCache::new();
    aggregator
        .update_fitness(&mut swarm, &mut cache)
        .expect("cache warmup failed");
    c.bench_function("update_fitness warm cache (150 particles)", |b| {
        b.iter(|| {
            aggregator
                .update_fitness(black_box(&mut swarm), &mut cache)
                .expect("fitness update failed")
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
