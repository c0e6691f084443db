//! Textual molecule normalization. Full chemical canonicalization is the
//! decoder service's job; this layer only guarantees a stable cache key.

/// Normalizes a SMILES string into its cache/tracker key form.
///
/// Deterministic and idempotent: trims whitespace and sorts dot-separated
/// fragments lexicographically. A dotted SMILES is an unordered multiset of
/// fragments, so reordering preserves identity.
pub fn canonical(smiles: &str) -> String {
    let trimmed = smiles.trim();
    if !trimmed.contains('.') {
        return trimmed.to_string();
    }
    let mut fragments: Vec<&str> = trimmed.split('.').filter(|f| !f.is_empty()).collect();
    fragments.sort_unstable();
    fragments.join(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_is_idempotent() {
        let inputs = ["  CCO ", "CCO.[Na+]", "[Cl-].c1ccccc1.[Na+]", ""];
        for s in inputs {
            let once = canonical(s);
            assert_eq!(canonical(&once), once);
        }
    }

    #[test]
    fn test_fragments_sort_deterministically() {
        assert_eq!(canonical("[Na+].CCO"), "CCO.[Na+]");
        assert_eq!(canonical("CO.CC"), "CC.CO");
        assert_eq!(canonical("CC.CO"), "CC.CO");
    }

    #[test]
    fn test_single_fragment_passes_through() {
        assert_eq!(canonical("  c1ccccc1 "), "c1ccccc1");
        assert_eq!(canonical("C"), "C");
    }
}
