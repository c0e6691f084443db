use molswarm::config::PsoParams;
use molswarm::optimizer::BestTracker;
use molswarm::scoring::{ScoreCache, ScoreRecord};
use molswarm::swarm::Swarm;
use ndarray::array;

fn swarm_with(smiles: &[&str], fitness: &[f32]) -> Swarm {
    let emb = array![0.0f32, 0.0];
    let mut swarm =
        Swarm::seeded("CCO", emb.view(), smiles.len(), &PsoParams::default(), 1).unwrap();
    swarm.smiles = smiles.iter().map(|s| s.to_string()).collect();
    swarm.fitness = fitness.to_vec();
    swarm
}

#[test]
fn test_table_is_ranked_and_truncated() {
    let mut tracker = BestTracker::new(3, &[]);
    let cache = ScoreCache::new();
    let swarm = swarm_with(
        &["CC", "CCC", "CCCC", "CCCCC", "CCCCCC"],
        &[0.1, 0.9, 0.5, 0.7, 0.3],
    );

    let summary = tracker.update_best_solutions(&[swarm], &cache);

    let fitness: Vec<f32> = tracker.solutions().iter().map(|s| s.fitness).collect();
    assert_eq!(fitness, vec![0.9, 0.7, 0.5]);
    assert_eq!(tracker.tracked_best().unwrap().smiles, "CCC");
    assert!((summary.max - 0.9).abs() < 1e-6);
    assert!((summary.min - 0.5).abs() < 1e-6);
    assert!((summary.mean - 0.7).abs() < 1e-6);
}

#[test]
fn test_duplicates_keep_the_earlier_entry() {
    let mut tracker = BestTracker::new(10, &[]);
    let cache = ScoreCache::new();

    tracker.update_best_solutions(&[swarm_with(&["CCO"], &[0.5])], &cache);
    tracker.update_best_solutions(&[swarm_with(&["CCO"], &[0.9])], &cache);

    assert_eq!(tracker.solutions().len(), 1);
    assert!(
        (tracker.solutions()[0].fitness - 0.5).abs() < 1e-6,
        "Rediscovery replaced the original entry!"
    );
}

#[test]
fn test_seed_molecules_are_excluded() {
    let mut tracker = BestTracker::new(10, &["[Na+].CCO".to_string()]);
    let cache = ScoreCache::new();
    let swarm = swarm_with(&["CCO.[Na+]", "CCN"], &[0.9, 0.4]);

    tracker.update_best_solutions(&[swarm], &cache);

    assert_eq!(tracker.solutions().len(), 1);
    assert_eq!(tracker.solutions()[0].smiles, "CCN");
}

#[test]
fn test_history_gets_one_row_per_swarm_per_step() {
    let mut tracker = BestTracker::new(10, &[]);
    let cache = ScoreCache::new();

    let mut a = swarm_with(&["CC"], &[0.2]);
    a.swarm_best_fitness = 0.2;
    a.best_smiles = "CC".to_string();
    let mut b = swarm_with(&["CCC"], &[0.6]);
    b.swarm_best_fitness = 0.6;
    b.best_smiles = "CCC".to_string();
    let swarms = vec![a, b];

    tracker.update_history(0, &swarms, &cache);
    tracker.update_history(1, &swarms, &cache);

    let history = tracker.history();
    assert_eq!(history.len(), 4);
    assert_eq!((history[0].step, history[0].swarm), (0, 0));
    assert_eq!((history[1].step, history[1].swarm), (0, 1));
    assert_eq!((history[3].step, history[3].swarm), (1, 1));
    assert!((history[1].fitness - 0.6).abs() < 1e-6);
    assert_eq!(history[1].smiles, "CCC");
}

#[test]
fn test_summary_is_nan_when_nothing_is_tracked() {
    let tracker = BestTracker::new(5, &[]);
    let summary = tracker.summary();
    assert!(summary.max.is_nan());
    assert!(summary.min.is_nan());
    assert!(summary.mean.is_nan());
}

#[test]
fn test_residues_flow_from_the_cache() {
    let mut tracker = BestTracker::new(5, &[]);
    let mut cache = ScoreCache::new();
    let mut rec = ScoreRecord::default();
    rec.residue = Some("aromatic".to_string());
    cache.record("CCN", rec);

    tracker.update_best_solutions(&[swarm_with(&["CCN"], &[0.8])], &cache);

    assert_eq!(
        tracker.solutions()[0].residue.as_deref(),
        Some("aromatic")
    );
}
