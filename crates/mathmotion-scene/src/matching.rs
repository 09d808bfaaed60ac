//! Substring correspondence between two strings.
//!
//! Resolution runs in three passes over char indices:
//!
//! 1. every `matched_keys` entry claims its first unclaimed occurrence in
//!    both strings,
//! 2. every `key_map` pair claims the first unclaimed occurrence of its
//!    source key and of its target key,
//! 3. whatever is left is tiled greedily by longest common substring,
//!    leftmost in the source on ties, recursing left and right of each pick.
//!
//! Unclaimed runs become unmatched fragments. The result covers every char
//! of both strings exactly once.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::debug;

use mathmotion_core::{MatchSide, SceneError, SceneResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Identical text on both sides.
    Matched,
    /// Explicit key substitution from `key_map`.
    Remapped,
    /// Source-only text; fades out.
    UnmatchedOut,
    /// Target-only text; fades in.
    UnmatchedIn,
}

/// A pairing of char spans. Unmatched fragments have only one side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub kind: MatchKind,
    pub source: Option<Range<usize>>,
    pub target: Option<Range<usize>>,
}

impl Match {
    fn paired(kind: MatchKind, source: Range<usize>, target: Range<usize>) -> Self {
        Self {
            kind,
            source: Some(source),
            target: Some(target),
        }
    }

    fn sort_key(&self) -> (usize, usize) {
        (
            self.source.as_ref().map_or(usize::MAX, |r| r.start),
            self.target.as_ref().map_or(usize::MAX, |r| r.start),
        )
    }
}

/// All matches between a source and a target string, ordered by source
/// position (target-only fragments last, by target position).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSet {
    pub matches: Vec<Match>,
    pub source_len: usize,
    pub target_len: usize,
}

impl MatchSet {
    pub fn iter(&self) -> impl Iterator<Item = &Match> {
        self.matches.iter()
    }

    pub fn of_kind(&self, kind: MatchKind) -> impl Iterator<Item = &Match> {
        self.matches.iter().filter(move |m| m.kind == kind)
    }

    /// True if every char of both strings lies in exactly one match.
    pub fn covers_exactly_once(&self) -> bool {
        let mut source = vec![0u32; self.source_len];
        let mut target = vec![0u32; self.target_len];
        for m in &self.matches {
            for (span, counts) in [(&m.source, &mut source), (&m.target, &mut target)] {
                if let Some(span) = span {
                    if span.end > counts.len() {
                        return false;
                    }
                    counts[span.clone()].iter_mut().for_each(|c| *c += 1);
                }
            }
        }
        source.iter().chain(&target).all(|c| *c == 1)
    }
}

/// Compute the match set for `source` → `target`.
///
/// A matched key missing from either string is skipped. A key found but
/// with no unclaimed occurrence left fails with `UnresolvedMatch`, as does
/// any `key_map` key that cannot be claimed. Empty keys are rejected.
pub fn resolve_matches(
    source: &str,
    target: &str,
    matched_keys: &[String],
    key_map: &[(String, String)],
) -> SceneResult<MatchSet> {
    let src: Vec<char> = source.chars().collect();
    let tgt: Vec<char> = target.chars().collect();
    let mut src_claimed = vec![false; src.len()];
    let mut tgt_claimed = vec![false; tgt.len()];
    let mut matches = Vec::new();

    for key in matched_keys {
        let key: Vec<char> = non_empty(key)?;
        if !occurs(&src, &key) || !occurs(&tgt, &key) {
            debug!(key = %key.iter().collect::<String>(), "matched key absent, skipping");
            continue;
        }
        let s = claim(&src, &key, &mut src_claimed, MatchSide::Source)?;
        let t = claim(&tgt, &key, &mut tgt_claimed, MatchSide::Target)?;
        matches.push(Match::paired(MatchKind::Matched, s, t));
    }

    for (from, to) in key_map {
        let from = non_empty(from)?;
        let to = non_empty(to)?;
        let s = claim(&src, &from, &mut src_claimed, MatchSide::Source)?;
        let t = claim(&tgt, &to, &mut tgt_claimed, MatchSide::Target)?;
        matches.push(Match::paired(MatchKind::Remapped, s, t));
    }

    let mut work = vec![(0..src.len(), 0..tgt.len())];
    while let Some((s_range, t_range)) = work.pop() {
        let Some((s, t, len)) =
            longest_common(&src, &tgt, &src_claimed, &tgt_claimed, &s_range, &t_range)
        else {
            continue;
        };
        src_claimed[s..s + len].fill(true);
        tgt_claimed[t..t + len].fill(true);
        matches.push(Match::paired(MatchKind::Matched, s..s + len, t..t + len));
        work.push((s_range.start..s, t_range.start..t));
        work.push((s + len..s_range.end, t + len..t_range.end));
    }

    for run in unclaimed_runs(&src_claimed) {
        matches.push(Match {
            kind: MatchKind::UnmatchedOut,
            source: Some(run),
            target: None,
        });
    }
    for run in unclaimed_runs(&tgt_claimed) {
        matches.push(Match {
            kind: MatchKind::UnmatchedIn,
            source: None,
            target: Some(run),
        });
    }

    matches.sort_by_key(Match::sort_key);
    debug!(
        source,
        target,
        matches = matches.len(),
        "resolved string matches"
    );
    Ok(MatchSet {
        matches,
        source_len: src.len(),
        target_len: tgt.len(),
    })
}

fn non_empty(key: &str) -> SceneResult<Vec<char>> {
    if key.is_empty() {
        return Err(SceneError::InvalidArgument("empty match key".into()));
    }
    Ok(key.chars().collect())
}

fn occurs(text: &[char], key: &[char]) -> bool {
    text.windows(key.len()).any(|w| w == key)
}

/// First occurrence of `key` in `text` that touches no claimed char.
fn find(text: &[char], key: &[char], claimed: &[bool]) -> Option<Range<usize>> {
    if key.len() > text.len() {
        return None;
    }
    (0..=text.len() - key.len())
        .find(|&i| text[i..i + key.len()] == *key && !claimed[i..i + key.len()].contains(&true))
        .map(|i| i..i + key.len())
}

fn claim(
    text: &[char],
    key: &[char],
    claimed: &mut [bool],
    side: MatchSide,
) -> SceneResult<Range<usize>> {
    let span = find(text, key, claimed)
        .ok_or_else(|| SceneError::unresolved(key.iter().collect::<String>(), side))?;
    claimed[span.clone()].fill(true);
    Ok(span)
}

/// Longest run common to `src[s_range]` and `tgt[t_range]` made only of
/// unclaimed chars. Ties go to the leftmost source start, then the leftmost
/// target start. Returns `(source start, target start, length)`.
fn longest_common(
    src: &[char],
    tgt: &[char],
    src_claimed: &[bool],
    tgt_claimed: &[bool],
    s_range: &Range<usize>,
    t_range: &Range<usize>,
) -> Option<(usize, usize, usize)> {
    let width = t_range.len() + 1;
    // Rolling rows of the common-suffix table.
    let mut prev = vec![0usize; width];
    let mut row = vec![0usize; width];
    let mut best: Option<(usize, usize, usize)> = None;
    for i in s_range.clone() {
        for (col, j) in t_range.clone().enumerate() {
            row[col + 1] = if !src_claimed[i] && !tgt_claimed[j] && src[i] == tgt[j] {
                prev[col] + 1
            } else {
                0
            };
            let len = row[col + 1];
            if len > best.map_or(0, |b| b.2) {
                best = Some((i + 1 - len, j + 1 - len, len));
            }
        }
        std::mem::swap(&mut prev, &mut row);
    }
    best
}

fn unclaimed_runs(claimed: &[bool]) -> Vec<Range<usize>> {
    let mut runs = Vec::new();
    let mut start = None;
    for (i, c) in claimed.iter().enumerate() {
        match (c, start) {
            (false, None) => start = Some(i),
            (true, Some(s)) => {
                runs.push(s..i);
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push(s..claimed.len());
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn map(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect()
    }

    fn span_text(text: &str, range: &Range<usize>) -> String {
        text.chars().skip(range.start).take(range.len()).collect()
    }

    #[test]
    fn test_matched_keys_override_greedy_run() {
        let (s, t) = ("A^2 = C^2", "A^2 = C^2 - B^2");
        let set = resolve_matches(s, t, &keys(&["A^2", "B^2", "C^2"]), &[]).unwrap();
        assert!(set.covers_exactly_once());
        assert_eq!(set.of_kind(MatchKind::UnmatchedOut).count(), 0);

        let matched: Vec<(String, String)> = set
            .of_kind(MatchKind::Matched)
            .map(|m| {
                (
                    span_text(s, m.source.as_ref().unwrap()),
                    span_text(t, m.target.as_ref().unwrap()),
                )
            })
            .collect();
        assert!(matched.contains(&("A^2".into(), "A^2".into())));
        assert!(matched.contains(&("C^2".into(), "C^2".into())));

        let incoming: Vec<String> = set
            .of_kind(MatchKind::UnmatchedIn)
            .map(|m| span_text(t, m.target.as_ref().unwrap()))
            .collect();
        assert_eq!(incoming, vec![" - B^2".to_string()]);
    }

    #[test]
    fn test_key_map_remaps_operator() {
        let (s, t) = ("A^2+B^2=C^2", "A^2-B^2=C^2");
        let set = resolve_matches(s, t, &[], &map(&[("+", "-")])).unwrap();
        assert!(set.covers_exactly_once());
        let remapped: Vec<&Match> = set.of_kind(MatchKind::Remapped).collect();
        assert_eq!(remapped.len(), 1);
        assert_eq!(remapped[0].source, Some(3..4));
        assert_eq!(remapped[0].target, Some(3..4));

        let matched: Vec<String> = set
            .of_kind(MatchKind::Matched)
            .map(|m| span_text(s, m.source.as_ref().unwrap()))
            .collect();
        assert_eq!(matched, vec!["A^2".to_string(), "B^2=C^2".to_string()]);
    }

    #[test]
    fn test_greedy_tiling_without_keys() {
        // Without overrides the longest run straddles two terms.
        let (s, t) = ("A^2 = C^2", "C^2 = A^2 - B^2");
        let set = resolve_matches(s, t, &[], &[]).unwrap();
        assert!(set.covers_exactly_once());
        let longest = set
            .of_kind(MatchKind::Matched)
            .max_by_key(|m| m.source.as_ref().unwrap().len())
            .unwrap();
        assert_eq!(span_text(s, longest.source.as_ref().unwrap()), "^2 = ");
    }

    #[test]
    fn test_tie_break_leftmost_source() {
        let set = resolve_matches("abXab", "ab", &[], &[]).unwrap();
        let matched: Vec<&Match> = set.of_kind(MatchKind::Matched).collect();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].source, Some(0..2));
        let out: Vec<_> = set.of_kind(MatchKind::UnmatchedOut).map(|m| m.source.clone().unwrap()).collect();
        assert_eq!(out, vec![2..5]);
    }

    #[test]
    fn test_key_map_unresolved() {
        let err = resolve_matches("a+b", "a-b", &[], &map(&[("*", "-")])).unwrap_err();
        assert!(matches!(
            err,
            SceneError::UnresolvedMatch {
                side: MatchSide::Source,
                ..
            }
        ));
        let err = resolve_matches("a+b", "a-b", &[], &map(&[("+", "/")])).unwrap_err();
        assert!(matches!(
            err,
            SceneError::UnresolvedMatch {
                side: MatchSide::Target,
                ..
            }
        ));
    }

    #[test]
    fn test_matched_key_exhausted() {
        // The second "x" has nothing left to claim in the target.
        let err = resolve_matches("x x", "x", &keys(&["x", "x"]), &[]).unwrap_err();
        assert!(matches!(err, SceneError::UnresolvedMatch { .. }));
    }

    #[test]
    fn test_empty_key_rejected() {
        assert!(matches!(
            resolve_matches("a", "a", &keys(&[""]), &[]),
            Err(SceneError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_empty_strings() {
        let set = resolve_matches("", "abc", &[], &[]).unwrap();
        assert_eq!(set.matches.len(), 1);
        assert_eq!(set.matches[0].kind, MatchKind::UnmatchedIn);
        assert!(set.covers_exactly_once());
        assert!(resolve_matches("", "", &[], &[]).unwrap().matches.is_empty());
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let run = || {
            resolve_matches(
                "a^2 + b^2 = c^2",
                "a^2 = c^2 - b^2",
                &keys(&["a^2", "b^2", "c^2"]),
                &map(&[("+", "-")]),
            )
            .unwrap()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_unicode_by_char() {
        let set = resolve_matches("√x", "√y", &[], &[]).unwrap();
        assert!(set.covers_exactly_once());
        let m = set.of_kind(MatchKind::Matched).next().unwrap();
        assert_eq!(m.source, Some(0..1));
    }
}
