/*!
# Codepoint tables for the XML 1.0 character classes

Each class is a sorted list of disjoint, inclusive codepoint ranges, looked up
by binary search. The lexer queries these once per input char.

The contents of this module are implementation details of `xmlex` and
`xmlex_validation` and should not be relied upon.
*/
use std::cmp::Ordering;

/**
# Predicate trait for matching chars
*/
pub trait CharSelector {
	/// Return true if the given char is selected by the selector
	fn select(&self, c: char) -> bool;
}

/// Inclusive range of codepoints.
///
/// Both ends are included because some edge points (U+10FFFF) have no
/// successor.
pub type CodepointRange = (char, char);

/// Char (XML 1.0 § 2.2 \[2\]), minus the surrogates which `char` cannot hold
const CHAR: &'static [CodepointRange] = &[
	('\x09', '\x0a'),
	('\x0d', '\x0d'),
	('\u{20}', '\u{d7ff}'),
	('\u{e000}', '\u{fffd}'),
	('\u{10000}', '\u{10ffff}'),
];

/// S (XML 1.0 § 2.3 \[3\])
const SPACE: &'static [CodepointRange] = &[('\x09', '\x0a'), ('\x0d', '\x0d'), (' ', ' ')];

/// NameStartChar (XML 1.0 § 2.3 \[4\])
const NAME_START: &'static [CodepointRange] = &[
	(':', ':'),
	('A', 'Z'),
	('_', '_'),
	('a', 'z'),
	('\u{c0}', '\u{d6}'),
	('\u{d8}', '\u{f6}'),
	('\u{f8}', '\u{2ff}'),
	('\u{370}', '\u{37d}'),
	('\u{37f}', '\u{1fff}'),
	('\u{200c}', '\u{200d}'),
	('\u{2070}', '\u{218f}'),
	('\u{2c00}', '\u{2fef}'),
	('\u{3001}', '\u{d7ff}'),
	('\u{f900}', '\u{fdcf}'),
	('\u{fdf0}', '\u{fffd}'),
	('\u{10000}', '\u{effff}'),
];

/// NameChar (XML 1.0 § 2.3 \[4a\]), merged with NameStartChar
const NAME: &'static [CodepointRange] = &[
	('-', '.'),
	('0', ':'),
	('A', 'Z'),
	('_', '_'),
	('a', 'z'),
	('\u{b7}', '\u{b7}'),
	('\u{c0}', '\u{d6}'),
	('\u{d8}', '\u{f6}'),
	('\u{f8}', '\u{37d}'),
	('\u{37f}', '\u{1fff}'),
	('\u{200c}', '\u{200d}'),
	('\u{203f}', '\u{2040}'),
	('\u{2070}', '\u{218f}'),
	('\u{2c00}', '\u{2fef}'),
	('\u{3001}', '\u{d7ff}'),
	('\u{f900}', '\u{fdcf}'),
	('\u{fdf0}', '\u{fffd}'),
	('\u{10000}', '\u{effff}'),
];

/// Selects all chars from a sorted table of disjoint ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodepointRanges(&'static [CodepointRange]);

impl CodepointRanges {
	/// The ranges of this class, in ascending order.
	pub fn ranges(&self) -> &'static [CodepointRange] {
		self.0
	}
}

impl CharSelector for CodepointRanges {
	fn select(&self, c: char) -> bool {
		// most markup is ASCII, and every table starts below U+80
		if let Some(&(lo, hi)) = self.0.first() {
			if c < lo {
				return false;
			}
			if c <= hi {
				return true;
			}
		}
		self.0
			.binary_search_by(|&(lo, hi)| {
				if hi < c {
					Ordering::Less
				} else if lo > c {
					Ordering::Greater
				} else {
					Ordering::Equal
				}
			})
			.is_ok()
	}
}

pub static XML_CHAR: CodepointRanges = CodepointRanges(CHAR);
pub static XML_SPACE: CodepointRanges = CodepointRanges(SPACE);
pub static XML_NAME_START: CodepointRanges = CodepointRanges(NAME_START);
pub static XML_NAME: CodepointRanges = CodepointRanges(NAME);
