use crate::model::ScoreResult;

/// Scores a recognized utterance against the expected phrase.
///
/// Both inputs are lower-cased; whitespace and punctuation still count
/// towards the edit distance. The score is
/// `(1 - distance / max_len) * 100`, rounded to two decimals.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarityScorer;

impl SimilarityScorer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Similarity percentage in `[0, 100]`.
    ///
    /// Two empty inputs are identical and score `100.0`.
    #[must_use]
    pub fn score(&self, expected: &str, actual: &str) -> f64 {
        let expected: Vec<char> = expected.to_lowercase().chars().collect();
        let actual: Vec<char> = actual.to_lowercase().chars().collect();

        let max_len = expected.len().max(actual.len());
        if max_len == 0 {
            return 100.0;
        }

        let distance = levenshtein(&expected, &actual);
        #[allow(clippy::cast_precision_loss)]
        let similarity = 1.0 - distance as f64 / max_len as f64;
        round2(similarity * 100.0)
    }

    /// Like [`score`](Self::score), keeping the inputs alongside the result.
    #[must_use]
    pub fn score_result(&self, prompt: &str, transcript: &str) -> ScoreResult {
        ScoreResult {
            prompt: prompt.to_owned(),
            transcript: transcript.to_owned(),
            percent: self.score(prompt, transcript),
        }
    }
}

/// Levenshtein edit distance with unit insert/delete/substitute costs.
///
/// Keeps two rolling rows of the DP table, so memory is `O(len(b))`.
#[must_use]
pub fn levenshtein(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
