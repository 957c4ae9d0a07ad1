//! Fuzzy matching algorithms.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Fold text for approximate comparison.
///
/// Decomposes (NFKD), drops combining marks and lowercases, so `Dvořák`
/// and `dvorak` compare equal.
pub fn normalize(text: &str) -> String {
    text.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Calculate Levenshtein edit distance between two strings.
///
/// # Arguments
/// * `a` - First string
/// * `b` - Second string
///
/// # Returns
/// Number of single-character edits needed to transform a into b
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    let m = a_chars.len();
    let n = b_chars.len();

    if m == 0 { return n; }
    if n == 0 { return m; }

    // Use two rows for space optimization
    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr = vec![0; n + 1];

    for i in 1..=m {
        curr[0] = i;
        for j in 1..=n {
            let cost = usize::from(a_chars[i - 1] != b_chars[j - 1]);
            curr[j] = (prev[j] + 1)
                .min(curr[j - 1] + 1)
                .min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}

/// Edit distance from `pattern` to the closest substring of `text` ending at
/// each position.
///
/// Entry `j` of the result is the fewest insertions, deletions,
/// substitutions or adjacent transpositions needed to turn `pattern` into
/// some substring `text[s..j]`. The vector has `text.len() + 1` entries; the
/// first is always `pattern.len()`.
pub fn substring_distances(pattern: &[char], text: &[char]) -> Vec<usize> {
    let m = pattern.len();
    let n = text.len();
    let mut ends = Vec::with_capacity(n + 1);

    // Columns of the DP table, one per text position
    let mut before_prev: Vec<usize> = (0..=m).collect();
    let mut prev: Vec<usize> = (0..=m).collect();
    let mut curr = vec![0; m + 1];
    ends.push(m);

    for j in 1..=n {
        // A match may start anywhere in the text
        curr[0] = 0;
        for i in 1..=m {
            let cost = usize::from(pattern[i - 1] != text[j - 1]);
            let mut best = (curr[i - 1] + 1)
                .min(prev[i] + 1)
                .min(prev[i - 1] + cost);

            if i > 1 && j > 1 && pattern[i - 1] == text[j - 2] && pattern[i - 2] == text[j - 1] {
                best = best.min(before_prev[i - 2] + 1);
            }
            curr[i] = best;
        }
        ends.push(curr[m]);

        std::mem::swap(&mut before_prev, &mut prev);
        std::mem::swap(&mut prev, &mut curr);
    }

    ends
}

/// Best approximate occurrence of `pattern` inside `text`.
///
/// Returns `(distance, end)` for the smallest distance; ties go to the
/// earliest end position.
pub fn best_substring_match(pattern: &[char], text: &[char]) -> (usize, usize) {
    substring_distances(pattern, text)
        .into_iter()
        .enumerate()
        .map(|(end, distance)| (distance, end))
        .min()
        .unwrap_or((pattern.len(), 0))
}
