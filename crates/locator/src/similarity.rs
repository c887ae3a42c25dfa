// ABOUTME: String similarity used to compare recorded id/class text against live attributes.
// ABOUTME: Defines the Similarity trait and the default normalized-Levenshtein implementation.

/// A normalized similarity ratio between two strings.
///
/// Implementations must return a value in `[0, 1]`, be symmetric, and return
/// `1.0` for equal inputs, including two empty strings. Scoring depends on the
/// empty-string behavior: an attribute left blank in the path matches a blank
/// attribute perfectly and any non-blank one poorly.
pub trait Similarity: Send + Sync {
    fn similarity(&self, a: &str, b: &str) -> f64;
}

/// Levenshtein distance normalized by the longer input's length.
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizedLevenshtein;

impl Similarity for NormalizedLevenshtein {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        strsim::normalized_levenshtein(a, b)
    }
}

/// Sørensen–Dice coefficient over character bigrams.
///
/// More forgiving than Levenshtein for reordered class lists
/// (`"card big"` vs `"big card"`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SorensenDice;

impl Similarity for SorensenDice {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        strsim::sorensen_dice(a, b)
    }
}

impl<F> Similarity for F
where
    F: Fn(&str, &str) -> f64 + Send + Sync,
{
    fn similarity(&self, a: &str, b: &str) -> f64 {
        self(a, b)
    }
}
