/*!
# Token catalog

Every token emitted by the [`Lexer`](crate::Lexer) is one of eighteen
[`TokenKind`]s. Five of them carry a text payload, the others are plain
markers.
*/
use std::fmt;

use smartstring::alias::String as SmartString;

/// The kind of a [`Token`].
///
/// The declaration order is the catalog order, which is stable and is used
/// by [`TokenKind::index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TokenKind {
	/// `<` followed by a name start character
	ElementStartOpen,
	/// `</`
	ElementEndOpen,
	/// `<!` followed by a name start character
	DeclOpen,
	/// Reserved, never emitted
	DeclClose,
	/// `<!--`
	CommentOpen,
	/// `-->`
	CommentClose,
	/// `>` closing an element start or end tag
	ElementClose,
	/// `/>`
	EmptyElementClose,
	/// A run of name characters
	Name,
	/// `=` inside a tag
	Eq,
	/// The contents of a quoted attribute value, without the quotes
	AttributeValue,
	/// A piece of comment text
	CommentFragment,
	/// `<?`
	PiOpen,
	/// `?>`
	PiClose,
	/// A piece of character data
	CharDataFragment,
	/// Reserved, never emitted
	CDataOpen,
	/// A piece of CDATA section content
	CDataFragment,
	/// `]]>` closing a CDATA section
	CDataClose,
}

impl TokenKind {
	/// All token kinds in catalog order.
	pub const ALL: [TokenKind; 18] = [
		Self::ElementStartOpen,
		Self::ElementEndOpen,
		Self::DeclOpen,
		Self::DeclClose,
		Self::CommentOpen,
		Self::CommentClose,
		Self::ElementClose,
		Self::EmptyElementClose,
		Self::Name,
		Self::Eq,
		Self::AttributeValue,
		Self::CommentFragment,
		Self::PiOpen,
		Self::PiClose,
		Self::CharDataFragment,
		Self::CDataOpen,
		Self::CDataFragment,
		Self::CDataClose,
	];

	/// Return the display name of the kind, as used in the line protocol.
	pub fn name(&self) -> &'static str {
		match self {
			Self::ElementStartOpen => "ELEMENT_START_OPEN",
			Self::ElementEndOpen => "ELEMENT_END_OPEN",
			Self::DeclOpen => "DECL_OPEN",
			Self::DeclClose => "DECL_CLOSE",
			Self::CommentOpen => "COMMENT_OPEN",
			Self::CommentClose => "COMMENT_CLOSE",
			Self::ElementClose => "ELEMENT_CLOSE",
			Self::EmptyElementClose => "EMPTY_ELEMENT_CLOSE",
			Self::Name => "NAME",
			Self::Eq => "EQ",
			Self::AttributeValue => "ATTRIBUTE_VALUE",
			Self::CommentFragment => "COMMENT_FRAGMENT",
			Self::PiOpen => "PI_OPEN",
			Self::PiClose => "PI_CLOSE",
			Self::CharDataFragment => "CHAR_DATA_FRAGMENT",
			Self::CDataOpen => "CDATA_OPEN",
			Self::CDataFragment => "CDATA_FRAGMENT",
			Self::CDataClose => "CDATA_CLOSE",
		}
	}

	/// Position of the kind in the catalog.
	#[inline]
	pub fn index(&self) -> usize {
		*self as usize
	}

	/// Whether tokens of this kind carry a text payload.
	pub fn has_payload(&self) -> bool {
		match self {
			Self::Name
			| Self::AttributeValue
			| Self::CommentFragment
			| Self::CharDataFragment
			| Self::CDataFragment => true,
			_ => false,
		}
	}
}

impl fmt::Display for TokenKind {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		f.write_str(self.name())
	}
}

/**
A single lexical token

Marker tokens only carry their [`TokenKind`]. Spanning tokens additionally
carry the text they were derived from; for fragments, that is a piece of a
possibly longer run of text. Fragments are not merged: one run of character
data may be reported as several consecutive
[`TokenKind::CharDataFragment`] tokens.

The [`Display`](fmt::Display) implementation renders the line protocol
without the trailing newline:

```
use xmlex::{Token, TokenKind};
assert_eq!(Token::marker(TokenKind::Eq).to_string(), "EQ");
assert_eq!(Token::spanning(TokenKind::Name, "foo").to_string(), "NAME: foo");
```
*/
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
	kind: TokenKind,
	text: Option<SmartString>,
}

impl Token {
	/// Create a marker token.
	///
	/// # Panics
	///
	/// In debug builds, if the kind carries a payload.
	pub fn marker(kind: TokenKind) -> Self {
		debug_assert!(!kind.has_payload(), "{} requires a payload", kind);
		Self { kind, text: None }
	}

	/// Create a spanning token.
	///
	/// # Panics
	///
	/// In debug builds, if the kind does not carry a payload.
	pub fn spanning<T: Into<SmartString>>(kind: TokenKind, text: T) -> Self {
		debug_assert!(kind.has_payload(), "{} does not carry a payload", kind);
		Self {
			kind,
			text: Some(text.into()),
		}
	}

	#[inline]
	pub fn kind(&self) -> TokenKind {
		self.kind
	}

	/// The text payload, if the token carries one.
	#[inline]
	pub fn text(&self) -> Option<&str> {
		self.text.as_ref().map(|s| s.as_str())
	}

	/// Consume the token and return its payload.
	pub fn into_text(self) -> Option<SmartString> {
		self.text
	}
}

impl fmt::Display for Token {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self.text.as_ref() {
			Some(text) => write!(f, "{}: {}", self.kind, text),
			None => f.write_str(self.kind.name()),
		}
	}
}
