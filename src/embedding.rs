use crate::error::{MolSwarmError, MsResult};
use ndarray::{Array2, ArrayView2};

/// Translation layer between molecule strings and the continuous space the
/// swarms move in. Implementations may be stateful or remote; callers must
/// not assume concurrent invocation is safe unless the implementation is
/// `Sync` and documents that guarantee.
pub trait EmbeddingModel {
    /// Encodes a batch of SMILES into an `[N, D]` embedding matrix.
    fn seq_to_emb(&self, smiles: &[String]) -> MsResult<Array2<f32>>;

    /// Decodes an `[N, D]` embedding matrix into one SMILES per row.
    ///
    /// Decode followed by re-encode of the decoded string must be a fixed
    /// point: the swarm loop relies on resynchronization converging.
    fn emb_to_seq(&self, emb: ArrayView2<'_, f32>) -> MsResult<Vec<String>>;
}

/// Deterministic stand-in for a learned encoder service.
///
/// A molecule is a concatenation of up to `num_slots` vocabulary fragments.
/// Each slot occupies one embedding dimension holding a grid level in
/// [-1, 1]: level 0 is the empty slot, level k is fragment k-1. Decoding
/// snaps each dimension to the nearest level, so any position in the box
/// decodes, and encode(decode(x)) lands exactly on the grid.
pub struct CodebookModel {
    vocab: Vec<String>,
    by_len: Vec<usize>,
    num_slots: usize,
}

impl CodebookModel {
    pub fn new(vocab: Vec<String>, num_slots: usize) -> MsResult<Self> {
        if vocab.is_empty() {
            return Err(MolSwarmError::Config(
                "codebook vocabulary is empty".to_string(),
            ));
        }
        if num_slots == 0 {
            return Err(MolSwarmError::Config(
                "codebook needs at least one slot".to_string(),
            ));
        }
        if vocab.iter().any(|t| t.is_empty() || t.contains('.')) {
            return Err(MolSwarmError::Config(
                "codebook fragments must be non-empty and dot-free".to_string(),
            ));
        }
        let mut by_len: Vec<usize> = (0..vocab.len()).collect();
        by_len.sort_by(|&a, &b| {
            vocab[b]
                .len()
                .cmp(&vocab[a].len())
                .then_with(|| vocab[a].cmp(&vocab[b]))
        });
        Ok(Self {
            vocab,
            by_len,
            num_slots,
        })
    }

    /// Small organic-fragment vocabulary, enough to exercise a full run.
    pub fn with_default_vocab(num_slots: usize) -> MsResult<Self> {
        let vocab = [
            "C", "N", "O", "F", "S", "Cl", "Br", "CO", "CN", "C=C", "C#N", "C(=O)O", "C(=O)N",
            "c1ccccc1", "c1ccncc1",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        Self::new(vocab, num_slots)
    }

    pub fn dim(&self) -> usize {
        self.num_slots
    }

    fn levels(&self) -> usize {
        self.vocab.len() + 1
    }

    fn level_to_value(&self, level: usize) -> f32 {
        -1.0 + 2.0 * level as f32 / (self.levels() - 1) as f32
    }

    fn value_to_level(&self, value: f32) -> usize {
        let span = (self.levels() - 1) as f32;
        let raw = ((value.clamp(-1.0, 1.0) + 1.0) / 2.0 * span).round();
        (raw as usize).min(self.levels() - 1)
    }

    /// Greedy longest-match tokenization against the vocabulary.
    fn tokenize(&self, smiles: &str) -> MsResult<Vec<usize>> {
        let mut tokens = Vec::new();
        let mut rest = smiles.trim();
        'outer: while !rest.is_empty() {
            for &idx in &self.by_len {
                if let Some(tail) = rest.strip_prefix(self.vocab[idx].as_str()) {
                    tokens.push(idx);
                    rest = tail;
                    continue 'outer;
                }
            }
            return Err(MolSwarmError::Embedding(format!(
                "cannot tokenize '{}' at '{}'",
                smiles, rest
            )));
        }
        if tokens.len() > self.num_slots {
            return Err(MolSwarmError::Embedding(format!(
                "'{}' needs {} slots, model has {}",
                smiles,
                tokens.len(),
                self.num_slots
            )));
        }
        Ok(tokens)
    }
}

impl EmbeddingModel for CodebookModel {
    fn seq_to_emb(&self, smiles: &[String]) -> MsResult<Array2<f32>> {
        let mut emb = Array2::zeros((smiles.len(), self.num_slots));
        for (i, smi) in smiles.iter().enumerate() {
            let tokens = self.tokenize(smi)?;
            for slot in 0..self.num_slots {
                let level = tokens.get(slot).map_or(0, |&t| t + 1);
                emb[[i, slot]] = self.level_to_value(level);
            }
        }
        Ok(emb)
    }

    fn emb_to_seq(&self, emb: ArrayView2<'_, f32>) -> MsResult<Vec<String>> {
        if emb.ncols() != self.num_slots {
            return Err(MolSwarmError::Embedding(format!(
                "expected {} dims, got {}",
                self.num_slots,
                emb.ncols()
            )));
        }
        let mut out = Vec::with_capacity(emb.nrows());
        for row in emb.rows() {
            let mut smi = String::new();
            for &value in row {
                let level = self.value_to_level(value);
                if level > 0 {
                    smi.push_str(&self.vocab[level - 1]);
                }
            }
            out.push(smi);
        }
        Ok(out)
    }
}
