//! Page-range expressions: `1-3,5`, `2-`, `-`.
//!
//! Parsing is forgiving: unparsable numbers read as 0 and are
//! clamped to page 1, so a malformed range never aborts the viewer. Use
//! [`parse_strict`] to reject such tokens instead.
//!
//! A token starting with `-` selects only the final page, whatever follows
//! the dash (`-5` on a 10-page document is page 10).

use log::debug;

use crate::error::{Result, ViewerError};

/// One inclusive, 1-based page interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInterval {
    pub start: usize,
    pub end: usize,
}

impl PageInterval {
    pub fn contains(&self, page: usize) -> bool {
        (self.start..=self.end).contains(&page)
    }
}

/// Ordered page intervals for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRangeSpec {
    intervals: Vec<PageInterval>,
}

impl PageRangeSpec {
    pub fn intervals(&self) -> &[PageInterval] {
        &self.intervals
    }

    pub fn get(&self, idx: usize) -> Option<PageInterval> {
        self.intervals.get(idx).copied()
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Pages in display order, produced lazily one interval at a time.
    pub fn pages(&self) -> impl Iterator<Item = usize> + '_ {
        self.intervals.iter().flat_map(|iv| iv.start..=iv.end)
    }
}

/// Whether a command-line argument looks like a page range rather than a path.
pub fn is_range(arg: &str) -> bool {
    !arg.is_empty() && arg.chars().all(|c| c.is_ascii_digit() || c == '-' || c == ',')
}

/// Parse a range expression against a document with `page_count` pages.
pub fn parse(spec: &str, page_count: usize) -> PageRangeSpec {
    if spec.is_empty() || page_count == 0 {
        return PageRangeSpec::default();
    }
    let intervals = spec
        .split(',')
        .filter_map(|token| interval_for(token, page_count))
        .collect();
    PageRangeSpec { intervals }
}

/// Like [`parse`], but rejects tokens that are not `N`, `N-`, `N-M` or `-`.
pub fn parse_strict(spec: &str, page_count: usize) -> Result<PageRangeSpec> {
    for token in spec.split(',').filter(|_| !spec.is_empty()) {
        if !is_well_formed(token) {
            return Err(ViewerError::InvalidRangeToken(token.to_string()));
        }
    }
    Ok(parse(spec, page_count))
}

fn is_well_formed(token: &str) -> bool {
    match token.split_once('-') {
        None => !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()),
        Some((before, after)) => {
            before.bytes().all(|b| b.is_ascii_digit()) && after.bytes().all(|b| b.is_ascii_digit())
        }
    }
}

fn interval_for(token: &str, page_count: usize) -> Option<PageInterval> {
    let (start, end) = match token.find('-') {
        Some(0) => (page_count as i64, page_count as i64),
        None => {
            let n = atoi(token);
            (n, n)
        }
        Some(dash) => {
            let rest = &token[dash + 1..];
            let end = if rest.is_empty() {
                page_count as i64
            } else {
                atoi(rest)
            };
            (atoi(&token[..dash]), end)
        }
    };

    let start = clamp_page(start, page_count);
    let end = clamp_page(end, page_count);
    if start > end {
        debug!("range: dropping reversed interval '{token}' ({start} > {end})");
        return None;
    }
    Some(PageInterval { start, end })
}

fn clamp_page(n: i64, page_count: usize) -> usize {
    n.clamp(1, page_count as i64) as usize
}

/// C `atoi`: leading whitespace, optional sign, then as many digits as present.
fn atoi(s: &str) -> i64 {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let mut value: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        value = value.saturating_mul(10).saturating_add(i64::from(b - b'0'));
    }
    if negative { -value } else { value }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(spec: &PageRangeSpec) -> Vec<(usize, usize)> {
        spec.intervals().iter().map(|iv| (iv.start, iv.end)).collect()
    }

    #[test]
    fn list_of_interval_and_single() {
        assert_eq!(pairs(&parse("1-3,5", 10)), vec![(1, 3), (5, 5)]);
    }

    #[test]
    fn lone_dash_is_final_page() {
        assert_eq!(pairs(&parse("-", 7)), vec![(7, 7)]);
    }

    #[test]
    fn leading_dash_ignores_following_digits() {
        assert_eq!(pairs(&parse("-5", 10)), vec![(10, 10)]);
    }

    #[test]
    fn open_ended_interval_runs_to_last_page() {
        assert_eq!(pairs(&parse("2-", 7)), vec![(2, 7)]);
    }

    #[test]
    fn empty_spec_is_empty() {
        assert!(parse("", 7).is_empty());
    }

    #[test]
    fn zero_page_document_is_empty() {
        assert!(parse("1-", 0).is_empty());
    }

    #[test]
    fn bounds_are_clamped() {
        assert_eq!(pairs(&parse("0-99", 4)), vec![(1, 4)]);
        assert_eq!(pairs(&parse("12", 4)), vec![(4, 4)]);
    }

    #[test]
    fn garbage_reads_as_first_page() {
        assert_eq!(pairs(&parse("abc", 4)), vec![(1, 1)]);
        assert_eq!(pairs(&parse("3x", 4)), vec![(3, 3)]);
    }

    #[test]
    fn reversed_interval_is_dropped() {
        assert_eq!(pairs(&parse("5-2,1", 10)), vec![(1, 1)]);
    }

    #[test]
    fn order_is_preserved() {
        assert_eq!(pairs(&parse("8,2-3,8", 10)), vec![(8, 8), (2, 3), (8, 8)]);
    }

    #[test]
    fn pages_walks_each_interval_ascending() {
        let spec = parse("3-4,1", 5);
        assert_eq!(spec.pages().collect::<Vec<_>>(), vec![3, 4, 1]);
    }

    #[test]
    fn intervals_always_within_document() {
        let specs = ["", "-", "--", "1--3", ",,", "0", "9-", "-0", "2-1", "1-3,5,-,7-", "99999999999999999999"];
        for count in 1..6 {
            for spec in specs {
                for iv in parse(spec, count).intervals() {
                    assert!(1 <= iv.start && iv.start <= iv.end && iv.end <= count, "{spec} / {count}: {iv:?}");
                }
            }
        }
    }

    #[test]
    fn strict_accepts_well_formed() {
        let spec = parse_strict("1-3,5,-,7-", 10).unwrap();
        assert_eq!(pairs(&spec), vec![(1, 3), (5, 5), (10, 10), (7, 10)]);
    }

    #[test]
    fn strict_rejects_garbage() {
        let err = parse_strict("1,x3", 10).unwrap_err();
        assert!(matches!(err, ViewerError::InvalidRangeToken(t) if t == "x3"));
        assert!(parse_strict("1,,2", 10).is_err());
        assert!(parse_strict("1--3", 10).is_err());
    }

    #[test]
    fn strict_empty_spec_is_empty() {
        assert!(parse_strict("", 10).unwrap().is_empty());
    }

    #[test]
    fn range_token_detection() {
        assert!(is_range("1-3,5"));
        assert!(is_range("-"));
        assert!(!is_range(""));
        assert!(!is_range("doc.typ"));
        assert!(!is_range("12a"));
    }
}
