use crate::dto::Record;
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// `k` consecutive tokens borrowed from a record's text. Ordered token by
/// token, so sorting shingles sorts them lexicographically.
pub type Shingle<'a> = Vec<&'a str>;

/// The distinct shingles of one record.
pub type ShingleSet<'a> = FxHashSet<Shingle<'a>>;

/// How record text is cut into tokens.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tokenizer {
    /// Every character is a token.
    #[default]
    Chars,
    /// Whitespace separated words.
    Words,
}

impl Tokenizer {
    pub fn tokenize<'a>(&self, text: &'a str) -> Vec<&'a str> {
        match self {
            Tokenizer::Chars => text
                .char_indices()
                .map(|(start, c)| &text[start..start + c.len_utf8()])
                .collect(),
            Tokenizer::Words => text.split_whitespace().collect(),
        }
    }
}

/// Returns the set of `k`-token windows of `tokens`.
///
/// Windows start at offsets `0..n-k-1`, so the last full window is never
/// emitted and anything shorter than `k + 2` tokens yields an empty set.
pub fn kshingles<'a>(tokens: &[&'a str], k: usize) -> ShingleSet<'a> {
    let windows = tokens.len().saturating_sub(k.saturating_add(1));
    (0..windows).map(|start| tokens[start..start + k].to_vec()).collect()
}

/// Shingles every record, in parallel, preserving record order.
pub fn shingle_records<'a>(
    records: &'a [Record],
    tokenizer: Tokenizer,
    k: usize,
) -> Vec<ShingleSet<'a>> {
    records
        .par_iter()
        .map(|record| kshingles(&tokenizer.tokenize(&record.text), k))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shingle(tokens: &[&'static str]) -> Shingle<'static> {
        tokens.to_vec()
    }

    #[test]
    fn short_input_has_no_shingles() {
        let tokens = Tokenizer::Words.tokenize("draw a card");
        assert!(kshingles(&tokens, 3).is_empty());
        assert!(kshingles(&tokens[..2], 3).is_empty());
        assert!(kshingles(&[], 3).is_empty());
    }

    #[test]
    fn final_window_is_skipped() {
        let tokens = Tokenizer::Words.tokenize("a b c d e");
        let set = kshingles(&tokens, 3);
        assert_eq!(set.len(), 1);
        assert!(set.contains(&shingle(&["a", "b", "c"])));
        assert!(!set.contains(&shingle(&["b", "c", "d"])));
        assert!(!set.contains(&shingle(&["c", "d", "e"])));
    }

    #[test]
    fn huge_k_yields_nothing() {
        let tokens = Tokenizer::Chars.tokenize("flying haste");
        assert!(kshingles(&tokens, usize::MAX).is_empty());
        assert!(kshingles(&tokens, usize::MAX - 1).is_empty());
    }

    #[test]
    fn repeated_windows_collapse() {
        let tokens = Tokenizer::Chars.tokenize("abababab");
        let set = kshingles(&tokens, 2);
        assert_eq!(set.len(), 2);
        assert!(set.contains(&shingle(&["a", "b"])));
        assert!(set.contains(&shingle(&["b", "a"])));
    }

    #[test]
    fn char_tokens_respect_multibyte_text() {
        let tokens = Tokenizer::Chars.tokenize("Gríma");
        assert_eq!(tokens, vec!["G", "r", "í", "m", "a"]);
    }

    #[test]
    fn records_keep_their_order() {
        let records = vec![
            Record::new("a", "flying haste"),
            Record::new("b", ""),
            Record::new("c", "trample"),
        ];
        let sets = shingle_records(&records, Tokenizer::Chars, 3);
        assert_eq!(sets.len(), 3);
        assert_eq!(sets[0].len(), 8);
        assert!(sets[1].is_empty());
        assert!(sets[2].contains(&shingle(&["t", "r", "a"])));
    }
}
