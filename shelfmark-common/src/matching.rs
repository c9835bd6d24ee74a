//! Fuzzy duplicate detection for labelled catalogue entities
//!
//! Scores a requested name against the existing authors or tags before a new
//! row is created, so near-duplicates ("J.R.R. Tolkien" vs "Tolkien, J.R.R.")
//! surface in the create flow instead of landing as a second entry.
//!
//! Three similarity measures are computed per label and the best one wins:
//! plain edit-distance ratio, a windowed partial ratio for substring hits,
//! and a token-sort ratio for word-order-independent hits. All scores are on
//! a 0-100 integer scale.

use serde::Serialize;

/// Inclusive similarity floor for a candidate to count as a likely duplicate
pub const MATCH_THRESHOLD: u8 = 70;

/// Number of matches surfaced to the create flow
pub const MAX_MATCH_RESULTS: usize = 2;

/// Accessors for anything the matcher can score: a primary label plus zero
/// or more alternate labels
pub trait Matchable {
    fn match_id(&self) -> i64;
    fn primary_label(&self) -> &str;
    fn alternate_labels(&self) -> &[String];
}

/// One scored candidate; the strongest of its labels decided the score
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityMatch {
    pub id: i64,
    pub label: String,
    pub score: u8,
}

/// Score `query` against every candidate and return the strongest matches.
///
/// Each candidate is scored against its primary label and every alternate
/// label; the best label score is the candidate score. Candidates at or
/// above `threshold` are kept, ordered by score descending (ties keep the
/// candidate iteration order) and truncated to `max_results`.
///
/// The caller is expected to trim `query` and short-circuit on empty input;
/// an empty query is still valid here, it just scores 0 against every
/// non-empty label.
pub fn find_matches<E: Matchable>(
    query: &str,
    candidates: &[E],
    threshold: u8,
    max_results: usize,
) -> Vec<EntityMatch> {
    let mut matches: Vec<EntityMatch> = Vec::new();

    for candidate in candidates {
        let mut best = label_score(query, candidate.primary_label());
        for alt in candidate.alternate_labels() {
            best = best.max(label_score(query, alt));
        }

        if best >= threshold {
            matches.push(EntityMatch {
                id: candidate.match_id(),
                label: candidate.primary_label().to_string(),
                score: best,
            });
        }
    }

    // Stable sort: equal scores keep candidate order
    matches.sort_by_key(|m| std::cmp::Reverse(m.score));
    matches.truncate(max_results);
    matches
}

/// Best of the three measures for a single label
fn label_score(query: &str, label: &str) -> u8 {
    ratio(query, label)
        .max(partial_ratio(query, label))
        .max(token_sort_ratio(query, label))
}

/// Normalized edit-distance similarity on a 0-100 scale.
///
/// `100 * 2M / T`, where `M` is the number of matching characters after
/// alignment and `T` the combined character count, rounded to the nearest
/// integer. Case-insensitive; two empty strings are identical (100), an
/// empty string against a non-empty one shares nothing (0).
pub fn ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();
    ratio_chars(&a, &b)
}

/// Best `ratio` of the shorter string against every contiguous window of the
/// longer string with the shorter string's length.
///
/// Catches substring containment with minor typos: "tolkien" inside
/// "j.r.r. tolkien" scores 100 here while the plain ratio stays in the 60s.
pub fn partial_ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();

    let (short, long) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };
    if short.is_empty() {
        return if long.is_empty() { 100 } else { 0 };
    }

    let mut best = 0u8;
    for start in 0..=(long.len() - short.len()) {
        let window = &long[start..start + short.len()];
        best = best.max(ratio_chars(short, window));
        if best == 100 {
            break;
        }
    }
    best
}

/// `ratio` over whitespace-tokenized, alphabetically re-sorted forms.
///
/// Word order stops mattering: "Smith John" vs "John Smith" scores 100.
pub fn token_sort_ratio(a: &str, b: &str) -> u8 {
    ratio(&sort_tokens(&a.to_lowercase()), &sort_tokens(&b.to_lowercase()))
}

fn sort_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

fn ratio_chars(a: &[char], b: &[char]) -> u8 {
    let total = a.len() + b.len();
    if total == 0 {
        return 100;
    }
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let dist = indel_distance(a, b);
    (((total - dist) as f64 / total as f64) * 100.0).round() as u8
}

/// Edit distance with unit insert/delete cost and substitution counted as a
/// delete plus an insert, so `(T - distance) / 2` equals the aligned-match
/// count the ratio formula needs.
fn indel_distance(a: &[char], b: &[char]) -> usize {
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr: Vec<usize> = vec![0; b.len() + 1];

    for (i, &ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j]
            } else {
                1 + prev[j + 1].min(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Candidate {
        id: i64,
        name: String,
        alts: Vec<String>,
    }

    impl Candidate {
        fn new(id: i64, name: &str, alts: &[&str]) -> Self {
            Self {
                id,
                name: name.to_string(),
                alts: alts.iter().map(|s| s.to_string()).collect(),
            }
        }
    }

    impl Matchable for Candidate {
        fn match_id(&self) -> i64 {
            self.id
        }
        fn primary_label(&self) -> &str {
            &self.name
        }
        fn alternate_labels(&self) -> &[String] {
            &self.alts
        }
    }

    #[test]
    fn test_ratio_identical() {
        assert_eq!(ratio("Tolkien", "Tolkien"), 100);
        assert_eq!(ratio("", ""), 100);
    }

    #[test]
    fn test_ratio_symmetric() {
        assert_eq!(ratio("Tolkien", "Tolkein"), ratio("Tolkein", "Tolkien"));
        assert_eq!(
            token_sort_ratio("Ursula Le Guin", "Le Guin Ursula"),
            token_sort_ratio("Le Guin Ursula", "Ursula Le Guin")
        );
    }

    #[test]
    fn test_ratio_empty_vs_nonempty() {
        assert_eq!(ratio("", "Tolkien"), 0);
        assert_eq!(partial_ratio("", "Tolkien"), 0);
        assert_eq!(token_sort_ratio("", "Tolkien"), 0);
    }

    #[test]
    fn test_ratio_case_insensitive() {
        assert_eq!(ratio("TOLKIEN", "tolkien"), 100);
    }

    #[test]
    fn test_ratio_disjoint() {
        assert_eq!(ratio("xyz123", "Tolkien"), 0);
    }

    #[test]
    fn test_ratio_exact_value() {
        // "tolkien" (7) vs "j.r.r. tolkien" (14): 7 aligned chars of 21 total
        // -> 2 * 7 / 21 = 66.7, rounded
        assert_eq!(ratio("Tolkien", "J.R.R. Tolkien"), 67);
    }

    #[test]
    fn test_partial_ratio_substring() {
        assert_eq!(partial_ratio("Tolkien", "J.R.R. Tolkien"), 100);
        assert_eq!(partial_ratio("J.R.R. Tolkien", "Tolkien"), 100);
    }

    #[test]
    fn test_partial_ratio_equal_lengths_degenerates_to_ratio() {
        assert_eq!(partial_ratio("abcd", "abxd"), ratio("abcd", "abxd"));
    }

    #[test]
    fn test_token_sort_reordered_words() {
        assert_eq!(token_sort_ratio("Smith John", "John Smith"), 100);
    }

    #[test]
    fn test_find_matches_surname_against_full_name() {
        let candidates = vec![Candidate::new(1, "J.R.R. Tolkien", &[])];
        let matches = find_matches("Tolkien", &candidates, MATCH_THRESHOLD, MAX_MATCH_RESULTS);

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, 1);
        assert_eq!(matches[0].label, "J.R.R. Tolkien");
        assert!(matches[0].score >= MATCH_THRESHOLD);
    }

    #[test]
    fn test_find_matches_no_match_below_threshold() {
        let candidates = vec![Candidate::new(1, "Tolkien", &[])];
        let matches = find_matches("xyz123", &candidates, MATCH_THRESHOLD, MAX_MATCH_RESULTS);
        assert!(matches.is_empty());
    }

    #[test]
    fn test_find_matches_empty_candidates() {
        let candidates: Vec<Candidate> = vec![];
        let matches = find_matches("Tolkien", &candidates, MATCH_THRESHOLD, MAX_MATCH_RESULTS);
        assert!(matches.is_empty());
    }

    #[test]
    fn test_find_matches_alternate_label_wins() {
        // Primary label is nothing like the query but an alternate is exact
        let candidates = vec![Candidate::new(7, "Eric Arthur Blair", &["George Orwell"])];
        let matches = find_matches("George Orwell", &candidates, MATCH_THRESHOLD, 2);

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].score, 100);
        // The reported label is still the primary name
        assert_eq!(matches[0].label, "Eric Arthur Blair");
    }

    #[test]
    fn test_find_matches_caps_results_and_orders_by_score() {
        let candidates = vec![
            Candidate::new(1, "Tolkien", &[]),
            Candidate::new(2, "J.R.R. Tolkien", &[]),
            Candidate::new(3, "Tolkein", &[]),
        ];
        let matches = find_matches("Tolkien", &candidates, MATCH_THRESHOLD, 2);

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].id, 1);
        assert_eq!(matches[0].score, 100);
        assert!(matches[0].score >= matches[1].score);
        for m in &matches {
            assert!(m.score >= MATCH_THRESHOLD);
        }
    }

    #[test]
    fn test_find_matches_ties_keep_candidate_order() {
        let candidates = vec![
            Candidate::new(1, "Fantasy", &[]),
            Candidate::new(2, "Fantasy", &[]),
        ];
        let matches = find_matches("Fantasy", &candidates, MATCH_THRESHOLD, 2);

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].id, 1);
        assert_eq!(matches[1].id, 2);
    }

    #[test]
    fn test_find_matches_case_insensitive() {
        let candidates = vec![Candidate::new(1, "J.R.R. Tolkien", &[])];
        let upper = find_matches("TOLKIEN", &candidates, 0, 1);
        let lower = find_matches("tolkien", &candidates, 0, 1);
        assert_eq!(upper[0].score, lower[0].score);
    }
}
