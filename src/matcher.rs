//! Title matching and overlap resolution.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use regex::Regex;

use crate::candidate::Candidate;

/// Marker that explicitly suppresses linking when written around a title,
/// e.g. `##用語##`.
const ESCAPE_MARKER: &str = "##";

/// A located occurrence of a candidate title.
///
/// Offsets are byte offsets into the string that was scanned, end-exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match<'c> {
    candidate: &'c Candidate,
    start: usize,
    end: usize,
}

impl<'c> Match<'c> {
    /// Creates a match for `candidate` starting at `start`.
    #[must_use]
    pub fn new(candidate: &'c Candidate, start: usize) -> Self {
        Self {
            candidate,
            start,
            end: start + candidate.title().len(),
        }
    }

    #[must_use]
    pub const fn candidate(&self) -> &'c Candidate {
        self.candidate
    }

    #[must_use]
    pub const fn start(&self) -> usize {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> usize {
        self.end
    }

    /// Returns the matched text, which is always the candidate title.
    #[must_use]
    pub fn text(&self) -> &'c str {
        self.candidate.title()
    }

    const fn contains(&self, other: &Self) -> bool {
        self.start <= other.start && self.end >= other.end
    }
}

/// Finds every occurrence of every candidate title in `html`.
///
/// The scan is literal and case-sensitive with no word-boundary check.
/// Occurrences may overlap each other. An occurrence directly preceded or
/// followed by `##` is skipped.
///
/// Matches are returned grouped by candidate in iteration order, and by
/// position within each candidate.
pub fn find_matches<'c, I>(html: &str, candidates: I) -> Vec<Match<'c>>
where
    I: IntoIterator<Item = &'c Candidate>,
{
    let mut matches = Vec::new();

    for candidate in candidates {
        if candidate.title().is_empty() {
            continue;
        }

        let Some(regex) = build_title_regex(candidate.title()) else {
            continue;
        };

        let mut pos = 0;
        while let Some(found) = regex.find_at(html, pos) {
            let (start, end) = (found.start(), found.end());
            if !is_escaped(html, start, end) {
                matches.push(Match::new(candidate, start));
            }
            // Step one character so overlapping occurrences are found too
            pos = start + html[start..].chars().next().map_or(1, char::len_utf8);
        }
    }

    matches
}

/// Builds a literal regex for a title.
fn build_title_regex(title: &str) -> Option<Regex> {
    match Regex::new(&regex::escape(title)) {
        Ok(regex) => Some(regex),
        Err(e) => {
            log::warn!("Skipping candidate title '{title}': {e}");
            None
        }
    }
}

/// Returns true if the span is wrapped by the `##` suppression marker.
fn is_escaped(html: &str, start: usize, end: usize) -> bool {
    html[..start].ends_with(ESCAPE_MARKER) || html[end..].starts_with(ESCAPE_MARKER)
}

/// Removes matches subsumed by larger ones and returns a non-overlapping set.
///
/// A match is dropped when another match covers its whole span and is either
/// longer, or has the identical span and came earlier in `matches`. Matches
/// that still partially overlap afterwards are settled greedily: longer
/// titles first, then input order.
///
/// The result is ordered by start offset.
#[must_use]
pub fn resolve_overlaps(matches: Vec<Match<'_>>) -> Vec<Match<'_>> {
    let maximal = drop_contained(matches);

    let mut by_priority: Vec<(usize, Match<'_>)> = maximal.into_iter().enumerate().collect();
    by_priority.sort_by_key(|(index, m)| (Reverse(m.text().chars().count()), *index));

    // accepted spans keyed by start offset
    let mut accepted: BTreeMap<usize, Match<'_>> = BTreeMap::new();
    for (_, m) in by_priority {
        let clashes_before = accepted
            .range(..=m.start)
            .next_back()
            .is_some_and(|(_, prev)| prev.end > m.start);
        let clashes_after = accepted
            .range(m.start..)
            .next()
            .is_some_and(|(&next_start, _)| next_start < m.end);

        if clashes_before || clashes_after {
            log::trace!(
                "Dropping '{}' at {} overlapping a longer match",
                m.text(),
                m.start
            );
            continue;
        }
        accepted.insert(m.start, m);
    }

    accepted.into_values().collect()
}

/// Keeps only maximal spans; among identical spans the first one wins.
///
/// Survivors keep their relative input order.
fn drop_contained(matches: Vec<Match<'_>>) -> Vec<Match<'_>> {
    let mut order: Vec<usize> = (0..matches.len()).collect();
    order.sort_by_key(|&i| (matches[i].start, Reverse(matches[i].end), i));

    let mut keep = vec![false; matches.len()];
    let mut widest: Option<usize> = None;
    for i in order {
        match widest {
            Some(w) if matches[w].contains(&matches[i]) => {}
            _ => {
                keep[i] = true;
                if widest.is_none_or(|w| matches[i].end > matches[w].end) {
                    widest = Some(i);
                }
            }
        }
    }

    matches
        .into_iter()
        .zip(keep)
        .filter_map(|(m, keep)| keep.then_some(m))
        .collect()
}
