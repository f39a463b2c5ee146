//! Deterministic code point assignment.
//!
//! Glyph sources are sorted with a case-insensitive natural comparator
//! (`glyph2` before `glyph10`) and numbered from the configured start code
//! point. The same file set always produces the same mapping, whatever order
//! the filesystem listed it in.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use crate::error::{BuildError, PipelineResult};
use crate::glyph::Glyph;

/// Default first code point, the start of a quiet stretch of the BMP
/// private-use area.
pub const DEFAULT_START_CODEPOINT: u32 = 0xEA01;

/// Largest Unicode scalar value.

/// Compares two strings case-insensitively, ordering embedded digit runs by
/// numeric value.
///
/// Strings that compare equal under those rules fall back to plain byte
/// order so the result is a total order.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = Chunks::new(a);
    let mut right = Chunks::new(b);

    loop {
        match (left.next(), right.next()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => {
                let ord = match (l, r) {
                    (Chunk::Number(l), Chunk::Number(r)) => cmp_digits(l, r),
                    (l, r) => cmp_text(l.as_str(), r.as_str()),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

/// Compares two paths with [`natural_cmp`].
pub fn natural_path_cmp(a: &Path, b: &Path) -> Ordering {
    natural_cmp(&a.to_string_lossy(), &b.to_string_lossy())
}

/// Sorts `files` naturally and assigns consecutive code points.
///
/// With `prepend` the code points count down from `start` instead of up.
pub fn assign_codepoints(
    files: &[PathBuf],
    start: u32,
    prepend: bool,
) -> PipelineResult<Vec<Glyph>> {
    let mut sorted: Vec<&PathBuf> = files.iter().collect();
    sorted.sort_by(|a, b| natural_path_cmp(a, b));

    sorted
        .into_iter()
        .enumerate()
        .map(|(index, file)| {
            let name = glyph_name(file);
            let codepoint = offset_codepoint(start, index, prepend).ok_or_else(|| {
                BuildError::CodepointOutOfRange {
                    glyph: name.clone(),
                    start,
                    index,
                }
            })?;
            Ok(Glyph::new(name, file.clone(), codepoint))
        })
        .collect()
}

/// Glyph name for a source file: its stem.
pub fn glyph_name(file: &Path) -> String {
    file.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn offset_codepoint(start: u32, index: usize, prepend: bool) -> Option<u32> {
    let index = u32::try_from(index).ok()?;
    let codepoint = if prepend {
        start.checked_sub(index)?
    } else {
        start.checked_add(index)?
    };
    // Unicode scalar values only: no surrogates, nothing past U+10FFFF
    char::from_u32(codepoint).map(|_| codepoint)
}

enum Chunk<'a> {
    Number(&'a str),
    Text(&'a str),
}

impl<'a> Chunk<'a> {
    fn as_str(&self) -> &'a str {
        match self {
            Chunk::Number(s) | Chunk::Text(s) => s,
        }
    }
}

/// Splits a string into alternating digit and non-digit runs.
struct Chunks<'a> {
    rest: &'a str,
}

impl<'a> Chunks<'a> {
    fn new(s: &'a str) -> Self {
        Self { rest: s }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.rest.chars().next()?;
        let numeric = first.is_ascii_digit();
        let end = self
            .rest
            .find(|c: char| c.is_ascii_digit() != numeric)
            .unwrap_or(self.rest.len());
        let (chunk, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(if numeric {
            Chunk::Number(chunk)
        } else {
            Chunk::Text(chunk)
        })
    }
}

/// Compares digit runs by value without parsing, so arbitrarily long runs
/// cannot overflow.
fn cmp_digits(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn cmp_text(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn names(glyphs: &[Glyph]) -> Vec<(&str, u32)> {
        glyphs
            .iter()
            .map(|g| (g.name.as_str(), g.codepoint))
            .collect()
    }

    #[test]
    fn test_natural_cmp_numeric_runs() {
        assert_eq!(natural_cmp("glyph2", "glyph10"), Ordering::Less);
        assert_eq!(natural_cmp("glyph10", "glyph2"), Ordering::Greater);
        assert_eq!(natural_cmp("m2.svg", "m10.svg"), Ordering::Less);
        assert_eq!(natural_cmp("a100b", "a100c"), Ordering::Less);
    }

    #[test]
    fn test_natural_cmp_case_insensitive() {
        assert_eq!(natural_cmp("Arrow.svg", "bell.svg"), Ordering::Less);
        assert_eq!(natural_cmp("arrow.svg", "Bell.svg"), Ordering::Less);
    }

    #[test]
    fn test_natural_cmp_total_on_case_and_zero_ties() {
        assert_ne!(natural_cmp("A.svg", "a.svg"), Ordering::Equal);
        assert_ne!(natural_cmp("icon01", "icon1"), Ordering::Equal);
        assert_eq!(natural_cmp("same", "same"), Ordering::Equal);
    }

    #[test]
    fn test_natural_cmp_long_digit_runs() {
        let a = "x99999999999999999999999999";
        let b = "x100000000000000000000000000";
        assert_eq!(natural_cmp(a, b), Ordering::Less);
    }

    #[test]
    fn test_assign_codepoints_reference_order() {
        let files: Vec<PathBuf> = ["z.svg", "a.svg", "m2.svg", "m10.svg"]
            .iter()
            .map(|n| PathBuf::from("/icons").join(n))
            .collect();

        let glyphs = assign_codepoints(&files, DEFAULT_START_CODEPOINT, false).unwrap();

        assert_eq!(
            names(&glyphs),
            vec![("a", 0xEA01), ("m2", 0xEA02), ("m10", 0xEA03), ("z", 0xEA04)]
        );
        assert_eq!(glyphs[0].source_file, PathBuf::from("/icons/a.svg"));
    }

    #[test]
    fn test_assign_codepoints_prepend_counts_down() {
        let files = vec![PathBuf::from("/i/b.svg"), PathBuf::from("/i/a.svg")];
        let glyphs = assign_codepoints(&files, 0xF000, true).unwrap();
        assert_eq!(names(&glyphs), vec![("a", 0xF000), ("b", 0xEFFF)]);
    }

    #[test]
    fn test_assign_codepoints_underflow() {
        let files = vec![PathBuf::from("/i/a.svg"), PathBuf::from("/i/b.svg")];
        let err = assign_codepoints(&files, 0, true).unwrap_err();
        assert!(matches!(
            err,
            BuildError::CodepointOutOfRange { index: 1, .. }
        ));
    }

    #[test]
    fn test_assign_codepoints_beyond_unicode() {
        let files = vec![PathBuf::from("/i/a.svg"), PathBuf::from("/i/b.svg")];
        let err = assign_codepoints(&files, char::MAX as u32, false).unwrap_err();
        assert!(matches!(err, BuildError::CodepointOutOfRange { .. }));
    }

    #[test]
    fn test_assign_codepoints_rejects_surrogates() {
        let files = vec![PathBuf::from("/i/a.svg"), PathBuf::from("/i/b.svg")];

        let err = assign_codepoints(&files, 0xD7FF, false).unwrap_err();
        assert!(matches!(
            err,
            BuildError::CodepointOutOfRange { ref glyph, index: 1, .. } if glyph == "b"
        ));

        let err = assign_codepoints(&files, 0xE000, true).unwrap_err();
        assert!(matches!(err, BuildError::CodepointOutOfRange { index: 1, .. }));
    }

    #[test]
    fn test_assign_codepoints_empty() {
        let glyphs = assign_codepoints(&[], DEFAULT_START_CODEPOINT, false).unwrap();
        assert!(glyphs.is_empty());
    }

    proptest! {
        #[test]
        fn prop_assignment_independent_of_input_order(
            stems in proptest::collection::btree_set("[a-zA-Z]{1,4}[0-9]{0,3}", 1..20),
            seed in any::<u64>(),
        ) {
            let files: Vec<PathBuf> = stems
                .iter()
                .map(|s| PathBuf::from(format!("/icons/{s}.svg")))
                .collect();

            let mut shuffled = files.clone();
            // Deterministic rotation + reversal driven by the seed
            let len = shuffled.len();
            shuffled.rotate_left((seed as usize) % len);
            if seed % 2 == 0 {
                shuffled.reverse();
            }

            let a = assign_codepoints(&files, DEFAULT_START_CODEPOINT, false).unwrap();
            let b = assign_codepoints(&shuffled, DEFAULT_START_CODEPOINT, false).unwrap();
            prop_assert_eq!(a.clone(), b);

            for (i, glyph) in a.iter().enumerate() {
                prop_assert_eq!(glyph.codepoint, DEFAULT_START_CODEPOINT + i as u32);
            }
        }
    }
}
