use std::collections::BTreeSet;

use crate::config::Limits;

/// Levenshtein distance over characters, compared case-insensitively.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().flat_map(char::to_lowercase).collect();
    let b: Vec<char> = b.chars().flat_map(char::to_lowercase).collect();

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Ranks known words by closeness to an unrecognized token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Suggester {
    max_distance: usize,
    max_results: usize,
}

impl Default for Suggester {
    fn default() -> Self {
        Self::from_limits(&Limits::default())
    }
}

impl Suggester {
    pub fn new(max_distance: usize, max_results: usize) -> Self {
        Self {
            max_distance,
            max_results,
        }
    }

    pub fn from_limits(limits: &Limits) -> Self {
        Self::new(limits.max_suggestion_distance, limits.max_suggestions)
    }

    /// Candidates within `max_distance`, nearest first, ties broken
    /// alphabetically, at most `max_results`.
    pub fn suggest<'a>(
        &self,
        input: &str,
        vocabulary: impl IntoIterator<Item = &'a str>,
    ) -> Vec<String> {
        let ranked: BTreeSet<(usize, &str)> = vocabulary
            .into_iter()
            .map(|word| (edit_distance(input, word), word))
            .filter(|(distance, _)| *distance <= self.max_distance)
            .collect();

        ranked
            .into_iter()
            .take(self.max_results)
            .map(|(_, word)| word.to_string())
            .collect()
    }
}
