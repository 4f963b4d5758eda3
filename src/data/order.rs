//! Ordering strategies for label domains.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// How the distinct values of a label domain are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelOrder {
    /// Order in which values first appear in the input.
    #[default]
    FirstAppearance,
    /// Plain byte-wise string ordering ("10" < "2").
    Lexical,
    /// Numeric-aware ordering ("2" < "10", "c2" < "c10").
    Natural,
}

impl LabelOrder {
    /// Get the descriptive name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::FirstAppearance => "first_appearance",
            Self::Lexical => "lexical",
            Self::Natural => "natural",
        }
    }

    /// Permutation that puts `labels` in this order.
    ///
    /// Entry `k` of the result is the current index of the label that
    /// should end up at position `k`. The sort is stable.
    pub fn permutation<S: AsRef<str>>(&self, labels: &[S]) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..labels.len()).collect();
        match self {
            Self::FirstAppearance => {}
            Self::Lexical => {
                indices.sort_by(|&a, &b| labels[a].as_ref().cmp(labels[b].as_ref()));
            }
            Self::Natural => {
                indices.sort_by(|&a, &b| natural_cmp(labels[a].as_ref(), labels[b].as_ref()));
            }
        }
        indices
    }
}

/// A run of either digits or non-digits inside a label.
enum Chunk<'a> {
    Digits(&'a str),
    Text(&'a str),
}

fn chunks(s: &str) -> Vec<Chunk<'_>> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut in_digits: Option<bool> = None;

    for (i, c) in s.char_indices() {
        let is_digit = c.is_ascii_digit();
        match in_digits {
            Some(prev) if prev != is_digit => {
                let piece = &s[start..i];
                out.push(if prev { Chunk::Digits(piece) } else { Chunk::Text(piece) });
                start = i;
            }
            _ => {}
        }
        in_digits = Some(is_digit);
    }
    if let Some(prev) = in_digits {
        let piece = &s[start..];
        out.push(if prev { Chunk::Digits(piece) } else { Chunk::Text(piece) });
    }
    out
}

fn cmp_digits(a: &str, b: &str) -> Ordering {
    let a_trim = a.trim_start_matches('0');
    let b_trim = b.trim_start_matches('0');
    a_trim
        .len()
        .cmp(&b_trim.len())
        .then_with(|| a_trim.cmp(b_trim))
}

/// Compare two labels treating embedded digit runs as numbers.
///
/// Falls back to plain string comparison to keep the order total, so
/// "01" and "1" are still distinct and ordered deterministically.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let ca = chunks(a);
    let cb = chunks(b);

    for (x, y) in ca.iter().zip(cb.iter()) {
        let ord = match (x, y) {
            (Chunk::Digits(x), Chunk::Digits(y)) => cmp_digits(x, y),
            (Chunk::Text(x), Chunk::Text(y)) => x.cmp(y),
            // Numbers sort before text at the same position
            (Chunk::Digits(_), Chunk::Text(_)) => Ordering::Less,
            (Chunk::Text(_), Chunk::Digits(_)) => Ordering::Greater,
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }

    ca.len().cmp(&cb.len()).then_with(|| a.cmp(b))
}
