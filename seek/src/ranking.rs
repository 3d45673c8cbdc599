//! Paragraph ranking by match counts.
//!
//! Implements a lexicographic key where higher-priority signals always dominate
//! lower ones: one more exact match ALWAYS beats any number of partial matches,
//! and ties fall back to insertion order (lower paragraph id first).

use std::cmp::Reverse;
use std::collections::HashMap;

use crate::interface::RankedParagraph;
use crate::models::{ParagraphId, WordMatch};

/// Rank key; derived Ord gives lexicographic comparison.
/// All components: higher = better.
///
/// Tuple order (most to least important):
/// 1. exact_matches: query tokens found verbatim in the paragraph
/// 2. partial_matches: partial-match occurrences in the paragraph
/// 3. paragraph_id: reversed, so earlier paragraphs win ties
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RankKey {
    pub exact_matches: u32,
    pub partial_matches: u32,
    pub paragraph_id: Reverse<ParagraphId>,
}

#[derive(Default)]
struct Tally<'a> {
    exact: u32,
    partial: u32,
    original_text: &'a str,
}

/// Aggregate the current token matches into an ordered result list.
pub fn rank<'a>(matches: impl IntoIterator<Item = &'a WordMatch>) -> Vec<RankedParagraph> {
    let mut tallies: HashMap<ParagraphId, Tally<'a>> = HashMap::new();

    for word_match in matches {
        for occ in &word_match.exact_data {
            let tally = tallies.entry(occ.paragraph_id).or_default();
            tally.exact += 1;
            if tally.original_text.is_empty() {
                tally.original_text = &occ.original_text;
            }
        }
        for occ in &word_match.partial_data {
            let tally = tallies.entry(occ.paragraph_id).or_default();
            tally.partial += 1;
            if tally.original_text.is_empty() {
                tally.original_text = &occ.original_text;
            }
        }
    }

    let mut ranked: Vec<(RankKey, &str)> = tallies
        .into_iter()
        .map(|(paragraph_id, tally)| {
            let key = RankKey {
                exact_matches: tally.exact,
                partial_matches: tally.partial,
                paragraph_id: Reverse(paragraph_id),
            };
            (key, tally.original_text)
        })
        .collect();

    // Keys are unique per paragraph, so an unstable sort is deterministic
    ranked.sort_unstable_by(|a, b| b.0.cmp(&a.0));

    ranked
        .into_iter()
        .map(|(key, text)| RankedParagraph {
            paragraph_id: key.paragraph_id.0,
            original_text: text.to_string(),
            exact_matches: key.exact_matches,
            partial_matches: key.partial_matches,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ParagraphOccurrence, WordId};

    fn occ(paragraph_id: ParagraphId, word: WordId) -> ParagraphOccurrence {
        ParagraphOccurrence {
            paragraph_id,
            original_text: format!("text {}", paragraph_id),
            matched_word_id: word,
            word_ids: vec![word],
        }
    }

    fn exact(token: &str, word: WordId, paragraphs: &[ParagraphId]) -> WordMatch {
        let data = paragraphs.iter().map(|&p| occ(p, word)).collect();
        WordMatch::new(token, Some((word, data)), Vec::new(), Vec::new())
    }

    fn with_partials(mut m: WordMatch, word: WordId, paragraphs: &[ParagraphId]) -> WordMatch {
        m.partial_ids.push(word);
        m.partial_data.extend(paragraphs.iter().map(|&p| occ(p, word)));
        m
    }

    fn ids(ranked: &[RankedParagraph]) -> Vec<ParagraphId> {
        ranked.iter().map(|r| r.paragraph_id).collect()
    }

    #[test]
    fn test_exact_before_partial() {
        // "cat": paragraph 7 has cat, paragraph 9 has catalog
        let m = with_partials(exact("cat", 1, &[7]), 2, &[9]);
        let ranked = rank([&m]);
        assert_eq!(ids(&ranked), vec![7, 9]);
        assert_eq!(ranked[0].exact_matches, 1);
        assert_eq!(ranked[1].partial_matches, 1);
        assert_eq!(ranked[0].original_text, "text 7");
    }

    #[test]
    fn test_more_exact_matches_win() {
        let a = exact("red", 1, &[3, 5]);
        let b = exact("fox", 2, &[5]);
        let ranked = rank([&a, &b]);
        assert_eq!(ids(&ranked), vec![5, 3]);
        assert_eq!(ranked[0].exact_matches, 2);
    }

    #[test]
    fn test_partial_count_breaks_exact_ties() {
        let a = with_partials(exact("red", 1, &[3, 5]), 9, &[5]);
        let ranked = rank([&a]);
        assert_eq!(ids(&ranked), vec![5, 3]);
    }

    #[test]
    fn test_one_exact_beats_many_partials() {
        let m = with_partials(with_partials(exact("cat", 1, &[8]), 2, &[4]), 3, &[4]);
        let ranked = rank([&m]);
        assert_eq!(ids(&ranked), vec![8, 4]);
        assert_eq!(ranked[1].partial_matches, 2);
    }

    #[test]
    fn test_ties_break_by_ascending_id() {
        let m = exact("cat", 1, &[12, 2, 30, 7]);
        assert_eq!(ids(&rank([&m])), vec![2, 7, 12, 30]);
    }

    #[test]
    fn test_rank_is_stable_across_calls() {
        let a = with_partials(exact("a", 1, &[1, 2, 3]), 4, &[2, 5, 6]);
        let b = with_partials(exact("b", 2, &[3, 6]), 5, &[1, 7]);
        let first = rank([&a, &b]);
        for _ in 0..10 {
            assert_eq!(rank([&a, &b]), first);
        }
    }

    #[test]
    fn test_empty_session_has_no_results() {
        assert!(rank(std::iter::empty()).is_empty());
        let degraded = WordMatch::degraded("cat");
        assert!(rank([&degraded]).is_empty());
    }

    #[test]
    fn test_rank_key_ordering() {
        let high = RankKey { exact_matches: 1, partial_matches: 0, paragraph_id: Reverse(9) };
        let low = RankKey { exact_matches: 0, partial_matches: 5, paragraph_id: Reverse(1) };
        assert!(high > low);

        let earlier = RankKey { exact_matches: 1, partial_matches: 1, paragraph_id: Reverse(1) };
        let later = RankKey { exact_matches: 1, partial_matches: 1, paragraph_id: Reverse(2) };
        assert!(earlier > later);
    }
}
