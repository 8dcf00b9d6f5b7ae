/*!
# Error types

This module holds the error types returned by the various functions of this
crate.
*/
use std::error;
use std::fmt;
use std::io;
use std::ops::Deref;
use std::result::Result as StdResult;
use std::sync::Arc;

pub use crate::errctx::*;

/// Violation of the XML 1.0 lexical grammar.
#[derive(Debug, Clone, PartialEq, Copy)]
pub enum WFError {
	/// The sequence `]]>` was encountered in character data outside of a
	/// CDATA section.
	IllegalCDataEnd,

	/// Unicode codepoint which was not expected at that point in the
	/// grammar.
	///
	/// The first member is a static string describing where in the grammar
	/// the character was found, the last member optionally lists what would
	/// have been acceptable instead. The contents are implementation details.
	UnexpectedChar(&'static str, char, Option<&'static [&'static str]>),
}

impl error::Error for WFError {}

impl fmt::Display for WFError {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self {
			WFError::IllegalCDataEnd => f.write_str("illegal sequence ']]>' in text"),
			WFError::UnexpectedChar(ctx, ch, Some(opts)) if opts.len() > 0 => {
				write!(f, "U+{:x} not allowed {} (expected ", *ch as u32, ctx)?;
				if opts.len() == 1 {
					f.write_str(opts[0])?;
					f.write_str(")")
				} else {
					f.write_str("one of: ")?;
					for (i, opt) in opts.iter().enumerate() {
						if i > 0 {
							f.write_str(", ")?;
						}
						f.write_str(*opt)?;
					}
					f.write_str(")")
				}
			}
			WFError::UnexpectedChar(ctx, ch, _) => {
				write!(f, "U+{:x} not allowed {}", *ch as u32, ctx)
			}
		}
	}
}

/// [`std::sync::Arc`]-based around [`std::io::Error`] to allow cloning.
#[derive(Clone)]
pub struct IOErrorWrapper(Arc<io::Error>);

impl IOErrorWrapper {
	fn wrap(e: io::Error) -> IOErrorWrapper {
		IOErrorWrapper(Arc::new(e))
	}
}

impl fmt::Debug for IOErrorWrapper {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		fmt::Debug::fmt(&**self, f)
	}
}

impl fmt::Display for IOErrorWrapper {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		fmt::Display::fmt(&**self, f)
	}
}

impl PartialEq for IOErrorWrapper {
	fn eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.0, &other.0)
	}
}

impl AsRef<io::Error> for IOErrorWrapper {
	fn as_ref(&self) -> &io::Error {
		&*self.0
	}
}

impl Deref for IOErrorWrapper {
	type Target = io::Error;

	fn deref(&self) -> &io::Error {
		&*self.0
	}
}

/// Error types which may be returned from the lexer or its drivers.
///
/// With the exception of [`Error::IO`], all errors are fatal and will be
/// returned indefinitely from the lexer or driver after the first encounter.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
	/// An I/O error was encountered while reading input for the lexer.
	///
	/// I/O errors are not fatal and may be retried. This is especially
	/// important for (but not limited to)
	/// [`std::io::ErrorKind::WouldBlock`] errors, which the drivers use to
	/// signal that more data is needed.
	IO(IOErrorWrapper),

	/// An invalid UTF-8 byte was encountered during decoding.
	///
	/// This is also returned if the input ends in the middle of a UTF-8
	/// sequence; the byte is then the start byte of that sequence.
	InvalidUtf8Byte(u8),

	/// A violation of the XML 1.0 lexical grammar was encountered.
	NotWellFormed(WFError),

	/// A configured limit was exceeded.
	///
	/// The string indicates the context and should not be interpreted by user
	/// code.
	RestrictedXml(&'static str),
}

pub type Result<T> = StdResult<T, Error>;

impl Error {
	pub fn io(e: io::Error) -> Error {
		Error::IO(IOErrorWrapper::wrap(e))
	}

	/// Return true if this is an I/O error of kind
	/// [`std::io::ErrorKind::WouldBlock`].
	pub fn is_wouldblock(&self) -> bool {
		match self {
			Error::IO(e) => e.kind() == io::ErrorKind::WouldBlock,
			_ => false,
		}
	}
}

impl From<io::Error> for Error {
	fn from(e: io::Error) -> Error {
		Error::io(e)
	}
}

impl From<WFError> for Error {
	fn from(e: WFError) -> Error {
		Error::NotWellFormed(e)
	}
}

impl fmt::Display for Error {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self {
			Error::NotWellFormed(e) => write!(f, "not-well-formed: {}", e),
			Error::RestrictedXml(msg) => write!(f, "restricted xml: {}", msg),
			Error::InvalidUtf8Byte(b) => write!(f, "invalid utf-8 byte: \\x{:02x}", b),
			Error::IO(e) => write!(f, "I/O error: {}", e),
		}
	}
}

impl error::Error for Error {
	fn source(&self) -> Option<&(dyn error::Error + 'static)> {
		match self {
			Error::IO(e) => Some(&**e),
			Error::NotWellFormed(e) => Some(e),
			Error::RestrictedXml(_) | Error::InvalidUtf8Byte(_) => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn unexpected_char_lists_single_alternative() {
		let e = WFError::UnexpectedChar(ERRCTX_COMMENT_END, 'x', Some(&[">"]));
		assert_eq!(e.to_string(), "U+78 not allowed after '--' in comment (expected >)");
	}

	#[test]
	fn unexpected_char_lists_multiple_alternatives() {
		let e = WFError::UnexpectedChar(ERRCTX_TAG_OPEN, ' ', Some(&["Name", "/"]));
		assert_eq!(e.to_string(), "U+20 not allowed after '<' (expected one of: Name, /)");
	}

	#[test]
	fn unexpected_char_without_alternatives() {
		let e = WFError::UnexpectedChar(ERRCTX_ELEMENT, '\u{e9}', None);
		assert_eq!(e.to_string(), "U+e9 not allowed in element");
	}

	#[test]
	fn error_display_wraps_wferror() {
		let e: Error = WFError::IllegalCDataEnd.into();
		assert_eq!(e.to_string(), "not-well-formed: illegal sequence ']]>' in text");
	}

	#[test]
	fn io_errors_compare_by_identity() {
		let wouldblock = || Error::io(io::Error::new(io::ErrorKind::WouldBlock, "foo"));
		let e1 = wouldblock();
		let e2 = e1.clone();
		let e3 = wouldblock();
		assert_eq!(e1, e2);
		assert_ne!(e1, e3);
		assert!(e1.is_wouldblock());
		assert!(!Error::InvalidUtf8Byte(0xff).is_wouldblock());
	}
}
