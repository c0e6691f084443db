use molswarm::scoring::{scoring_fingerprint, CacheDelta, ScoreCache, ScoreRecord};
use tempfile::tempdir;

mod common;
use common::{constant_objective, length_objective};

fn record_with(name: &str, value: f32) -> ScoreRecord {
    let mut rec = ScoreRecord::default();
    rec.unscaled.insert(name.to_string(), value);
    rec.scaled.insert(name.to_string(), value);
    rec.desirability.insert(name.to_string(), value);
    rec
}

#[test]
fn test_first_write_wins() {
    let mut cache = ScoreCache::new();
    cache.record("CCO", record_with("logp", 1.0));
    cache.record("CCO", record_with("logp", 9.0));

    assert_eq!(cache.len(), 1);
    assert_eq!(
        cache.get("CCO").unscaled["logp"],
        1.0,
        "Second write overwrote the cache!"
    );
}

#[test]
fn test_merge_keeps_existing_entries() {
    let mut cache = ScoreCache::new();
    cache.record("CCO", record_with("logp", 1.0));

    let mut delta = CacheDelta::default();
    delta.push("CCO".to_string(), record_with("logp", 9.0));
    delta.push("CCN".to_string(), record_with("logp", 2.0));
    cache.merge(delta);

    assert_eq!(cache.len(), 2);
    assert_eq!(cache.get("CCO").unscaled["logp"], 1.0);
    assert_eq!(cache.get("CCN").unscaled["logp"], 2.0);
}

#[test]
fn test_novel_preserves_first_seen_order_and_dedups() {
    let mut cache = ScoreCache::new();
    cache.record("CCO", ScoreRecord::default());

    let batch = vec![
        "CCN".to_string(),
        "CCO".to_string(),
        "CCC".to_string(),
        "CCN".to_string(),
    ];
    let novel = cache.novel(&batch);

    assert_eq!(novel, vec!["CCN".to_string(), "CCC".to_string()]);
}

#[test]
#[should_panic(expected = "score cache miss")]
fn test_get_panics_on_unrecorded_molecule() {
    let cache = ScoreCache::new();
    let _ = cache.get("CCO");
}

#[test]
fn test_residue_is_tolerant() {
    let mut cache = ScoreCache::new();
    assert_eq!(cache.residue("CCO"), None);

    let mut rec = ScoreRecord::default();
    rec.residue = Some("ring".to_string());
    cache.record("CCO", rec);
    assert_eq!(cache.residue("CCO"), Some("ring"));
    assert_eq!(cache.residue("CCN"), None);
}

#[test]
fn test_snapshot_roundtrip_and_fingerprint_check() {
    let mut cache = ScoreCache::new();
    cache.record("CCO", record_with("logp", 0.5));
    cache.record("CCN", record_with("logp", 0.8));

    let functions = vec![length_objective("logp", 1.0)];
    let fingerprint = scoring_fingerprint(&functions);
    let snapshot = cache.snapshot(&fingerprint);

    let dir = tempdir().unwrap();
    let path = dir.path().join("unscaled_scores.json");
    std::fs::write(&path, serde_json::to_vec_pretty(&snapshot).unwrap()).unwrap();

    let loaded = molswarm::scoring::CacheSnapshot::load(&path).unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded.unscaled_for("CCO", "logp"), Some(0.5));
    assert_eq!(loaded.unscaled_for("CCO", "qed"), None);
    assert!(loaded.verify(&fingerprint).is_ok());

    let other = scoring_fingerprint(&[length_objective("logp", 2.0)]);
    assert!(
        loaded.verify(&other).is_err(),
        "Fingerprint mismatch was not rejected!"
    );
}

#[test]
fn test_fingerprint_tracks_objective_configuration() {
    let base = scoring_fingerprint(&[constant_objective("a", 1.0, 0.5)]);

    assert_eq!(
        base,
        scoring_fingerprint(&[constant_objective("a", 1.0, 0.9)]),
        "Fingerprint depends on objective output, not configuration!"
    );
    assert_ne!(base, scoring_fingerprint(&[constant_objective("b", 1.0, 0.5)]));
    assert_ne!(base, scoring_fingerprint(&[constant_objective("a", 2.0, 0.5)]));
}
