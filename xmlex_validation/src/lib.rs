/*!
# Character classes and validator functions for XML 1.0

This is a supplementary crate for `xmlex`. It provides the four character
class predicates the lexer is built on and a few string validators which
downstream consumers of the token stream may find useful.

```rust
use xmlex_validation::{is_name_start_char, is_name_char, is_whitespace, is_char};

assert!(is_name_start_char('x'));
assert!(!is_name_start_char('-'));
assert!(is_name_char('-'));
assert!(is_whitespace('\t'));
assert!(!is_char('\u{fffe}'));
```
*/
use std::fmt;

pub mod selectors;

use selectors::CharSelector;

/**
Error condition from validating an XML string.
*/
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
	/// A Name was empty.
	EmptyName,
	/// An invalid character was encountered.
	///
	/// This variant contains the character as data.
	InvalidChar(char),
	/// A sequence which must not occur was encountered.
	ForbiddenSequence(&'static str),
}

impl fmt::Display for Error {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::EmptyName => f.write_str("Name must not be empty"),
			Self::InvalidChar(c) => write!(f, "character U+{:04x} is not allowed", *c as u32),
			Self::ForbiddenSequence(s) => write!(f, "sequence {:?} is not allowed", s),
		}
	}
}

impl std::error::Error for Error {}

/// XML 1.0 § 2.3 \[3\] S
#[inline]
pub fn is_whitespace(c: char) -> bool {
	selectors::XML_SPACE.select(c)
}

/// XML 1.0 § 2.3 \[4\] NameStartChar
#[inline]
pub fn is_name_start_char(c: char) -> bool {
	selectors::XML_NAME_START.select(c)
}

/// XML 1.0 § 2.3 \[4a\] NameChar
#[inline]
pub fn is_name_char(c: char) -> bool {
	selectors::XML_NAME.select(c)
}

/// XML 1.0 § 2.2 \[2\] Char
///
/// Surrogates cannot be represented as `char`, so only the non-characters
/// U+FFFE and U+FFFF and the C0 controls other than tab, LF and CR are
/// rejected in practice.
#[inline]
pub fn is_char(c: char) -> bool {
	selectors::XML_CHAR.select(c)
}

/**
Check whether a str is a valid XML 1.0 Name

# Example

```rust
use xmlex_validation::{validate_name, Error};

assert!(validate_name("foobar").is_ok());
assert!(validate_name("foo:bar").is_ok());
assert!(matches!(validate_name("foo bar"), Err(Error::InvalidChar(' '))));
assert!(matches!(validate_name(""), Err(Error::EmptyName)));
```
*/
pub fn validate_name(s: &str) -> Result<(), Error> {
	let mut chars = s.chars();
	match chars.next() {
		// must have at least one char
		None => return Err(Error::EmptyName),
		Some(c) => if !is_name_start_char(c) {
			return Err(Error::InvalidChar(c))
		}
	}
	for ch in chars {
		if !is_name_char(ch) {
			return Err(Error::InvalidChar(ch))
		}
	}
	Ok(())
}

/**
Check whether a str is valid XML 1.0 character data

This implements production \[14\] CharData: all chars must be `Char`s, and
neither `<` nor `&` nor the sequence `]]>` may occur. Character data as
emitted by the lexer may legitimately contain `&` (references are not
resolved there), so this is meant for consumers which have resolved
references already.

# Example

```rust
use xmlex_validation::{validate_char_data, Error};

assert!(validate_char_data("foo bar ]]").is_ok());
assert!(matches!(validate_char_data("a<b"), Err(Error::InvalidChar('<'))));
assert!(matches!(validate_char_data("a]]>b"), Err(Error::ForbiddenSequence("]]>"))));
```
*/
pub fn validate_char_data(s: &str) -> Result<(), Error> {
	let mut brackets = 0usize;
	for ch in s.chars() {
		match ch {
			'<' | '&' => return Err(Error::InvalidChar(ch)),
			'>' if brackets >= 2 => return Err(Error::ForbiddenSequence("]]>")),
			']' => {
				brackets += 1;
				continue;
			},
			ch if !is_char(ch) => return Err(Error::InvalidChar(ch)),
			_ => (),
		}
		brackets = 0;
	}
	Ok(())
}
