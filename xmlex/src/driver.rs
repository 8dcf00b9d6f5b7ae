/*!
Wrappers around the lexer to drive it from byte sources.

The [`Lexer`] itself works on `&str` chunks. The drivers in this module
decode UTF-8 input, feed it to the lexer and hand out the resulting tokens
one by one. For most uses, [`FeedLexer`] (push-based) and [`PullLexer`]
(blocking, from an [`io::BufRead`]) are the things to look at.
*/

use std::borrow::Cow;
use std::collections::VecDeque;
use std::io;

use crate::bufq::BufferQueue;
use crate::error::{Error, Result};
use crate::lexer::{Lexer, LexerOptions, Utf8Decoder};
use crate::token::Token;

/**
# Source for individual tokens

This trait is implemented by the different lexer frontends. It is analogous
to the [`std::io::Read`] trait, but for [`Token`]s instead of bytes.
*/
pub trait TokenRead {
	/// Read a single token.
	///
	/// If the end of the input has been reached, `None` is returned.
	///
	/// I/O errors may be retried, all other errors are fatal (and will be
	/// returned again on the next invocation without reading further data
	/// from the source).
	fn read(&mut self) -> Result<Option<Token>>;

	/// Read all tokens which can be produced from the data source (at this
	/// point in time).
	///
	/// The given `cb` is invoked for each token.
	///
	/// I/O errors may be retried, all other errors are fatal (and will be
	/// returned again on the next invocation without reading further data
	/// from the source).
	fn read_all<F>(&mut self, mut cb: F) -> Result<()>
	where
		F: FnMut(Token) -> (),
	{
		loop {
			match self.read()? {
				None => return Ok(()),
				Some(tok) => cb(tok),
			}
		}
	}

	/// Read all tokens which can be produced from the data source (at this
	/// point in time).
	///
	/// The given `cb` is invoked for each token.
	///
	/// If the data source indicates that it needs to block to read further
	/// data, `false` is returned. If the end of the input is reached
	/// successfully, `true` is returned.
	fn read_all_eof<F>(&mut self, cb: F) -> Result<bool>
	where
		F: FnMut(Token) -> (),
	{
		as_eof_flag(self.read_all(cb))
	}
}

/// Convert end-of-file-ness of a result to a boolean flag.
///
/// If the result is ok, return true (EOF). If the result is not ok, but the
/// error is an I/O error indicating that the data source would have to block
/// to read further data, return false ("Ok, but not at eof yet").
///
/// All other errors are passed through.
pub fn as_eof_flag(r: Result<()>) -> Result<bool> {
	match r {
		Err(Error::IO(ioerr)) if ioerr.kind() == io::ErrorKind::WouldBlock => Ok(false),
		Err(e) => Err(e),
		Ok(()) => Ok(true),
	}
}

/// Lexer with UTF-8 decoding in front and a token queue behind.
///
/// Decoding and lexing errors are cached here, so that the drivers return
/// them again on every read.
pub(crate) struct DecodingLexer {
	lexer: Lexer,
	decoder: Utf8Decoder,
	scratch: String,
	tokens: VecDeque<Token>,
	eof: bool,
	err: Option<Error>,
}

impl DecodingLexer {
	pub(crate) fn new(lexer: Lexer) -> Self {
		Self {
			lexer,
			decoder: Utf8Decoder::new(),
			scratch: String::new(),
			tokens: VecDeque::new(),
			eof: false,
			err: None,
		}
	}

	/// Return what the next read should produce, or `None` if more input is
	/// needed for that.
	pub(crate) fn next(&mut self) -> Option<Result<Option<Token>>> {
		if let Some(tok) = self.tokens.pop_front() {
			return Some(Ok(Some(tok)));
		}
		if let Some(e) = self.err.as_ref() {
			return Some(Err(e.clone()));
		}
		if self.eof {
			return Some(Ok(None));
		}
		None
	}

	pub(crate) fn push_bytes(&mut self, data: &[u8]) {
		if self.err.is_some() || self.eof {
			return;
		}
		self.scratch.clear();
		// text decoded before an invalid byte is lexed nonetheless
		let decoded = self.decoder.decode(data, &mut self.scratch);
		let lexed = self.lexer.lex_into(&self.scratch, &mut self.tokens);
		self.scratch.clear();
		if let Err(e) = lexed.and(decoded) {
			self.err = Some(e);
		}
	}

	fn finish(&mut self) -> Result<Option<Token>> {
		self.decoder.finish()?;
		self.lexer.flush()
	}

	pub(crate) fn push_eof(&mut self) {
		if self.err.is_some() || self.eof {
			return;
		}
		self.eof = true;
		match self.finish() {
			Ok(Some(tok)) => self.tokens.push_back(tok),
			Ok(None) => (),
			Err(e) => self.err = Some(e),
		}
	}

	/// Read the next token, pulling data from `src` as needed.
	///
	/// I/O errors from the source are returned as they are and not cached.
	pub(crate) fn read_from<R: io::BufRead + ?Sized>(&mut self, src: &mut R) -> Result<Option<Token>> {
		loop {
			if let Some(result) = self.next() {
				return result;
			}
			let buf = src.fill_buf()?;
			if buf.len() == 0 {
				self.push_eof();
				continue;
			}
			let n = buf.len();
			self.push_bytes(buf);
			src.consume(n);
		}
	}

	pub(crate) fn get_lexer(&self) -> &Lexer {
		&self.lexer
	}

	pub(crate) fn get_lexer_mut(&mut self) -> &mut Lexer {
		&mut self.lexer
	}

	pub(crate) fn into_lexer(self) -> Lexer {
		self.lexer
	}

	pub(crate) fn release_temporaries(&mut self) {
		self.scratch.shrink_to_fit();
		self.tokens.shrink_to_fit();
		self.lexer.release_temporaries();
	}
}

/**
# Non-blocking driver for the lexer

Data is pushed into the driver with [`PushDriver::feed`] and tokens are read
via the [`TokenRead`] trait. If the buffered data does not suffice to
produce another token, reading returns an I/O error of kind
[`std::io::ErrorKind::WouldBlock`].

In general, it is advised to use the [`FeedLexer`] alias.
*/
pub struct PushDriver<'x> {
	source: BufferQueue<'x>,
	lexer: DecodingLexer,
}

impl<'x> Default for PushDriver<'x> {
	/// Create a new push driver using the lexer defaults.
	fn default() -> Self {
		Self::wrap(Lexer::new())
	}
}

impl<'x> PushDriver<'x> {
	pub fn new() -> Self {
		Self::default()
	}

	/// Create a new push driver while configuring the lexer with the given
	/// options.
	pub fn with_options(options: LexerOptions) -> Self {
		Self::wrap(Lexer::with_options(options))
	}

	/// Create a push driver around an existing lexer.
	pub fn wrap(lexer: Lexer) -> Self {
		Self {
			source: BufferQueue::new(),
			lexer: DecodingLexer::new(lexer),
		}
	}

	/// Feed a chunk of data to the driver.
	///
	/// This enqueues the data for processing, but does not process it right
	/// away.
	///
	/// To process data, call [`read()`] or [`read_all()`].
	///
	/// # Panics
	///
	/// If [`feed_eof()`] has been called before.
	///
	///    [`read()`]: TokenRead::read()
	///    [`read_all()`]: TokenRead::read_all()
	///    [`feed_eof()`]: Self::feed_eof()
	pub fn feed<'a: 'x, T: Into<Cow<'a, [u8]>>>(&mut self, data: T) {
		self.source.push(data);
	}

	/// Feed the eof marker to the driver.
	///
	/// This is a prerequisite for reading to terminate with an eof signal
	/// (returning `true`). Otherwise, `false` will be returned indefinitely
	/// once all tokens have been read.
	///
	/// After the eof marker has been fed, no further data can be fed.
	pub fn feed_eof(&mut self) {
		self.source.push_eof();
	}

	/// Return the amount of bytes which have not been read from the buffer
	/// yet.
	pub fn buffered(&self) -> usize {
		self.source.len()
	}

	/// Return a reference to the internal buffer BufferQueue
	///
	/// This can be used to force dropping of all memory in case of error
	/// conditions.
	pub fn get_buffer_mut(&mut self) -> &mut BufferQueue<'x> {
		&mut self.source
	}

	/// Access the lexer
	pub fn get_lexer(&self) -> &Lexer {
		self.lexer.get_lexer()
	}

	/// Access the lexer, mutably
	pub fn get_lexer_mut(&mut self) -> &mut Lexer {
		self.lexer.get_lexer_mut()
	}

	/// Decompose the driver, returning the lexer.
	///
	/// Buffered data and tokens which have not been read are dropped.
	pub fn into_inner(self) -> Lexer {
		self.lexer.into_lexer()
	}

	/// Release all temporary buffers
	///
	/// This is sensible to call when it is expected that no more data will be
	/// processed by the driver for a while and the memory is better used
	/// elsewhere.
	pub fn release_temporaries(&mut self) {
		self.lexer.release_temporaries();
	}
}

impl TokenRead for PushDriver<'_> {
	/// Read a single token.
	///
	/// If the end of the input has been reached, `None` is returned.
	///
	/// If the buffered data is not sufficient to produce a token, an I/O
	/// error of [`std::io::ErrorKind::WouldBlock`] is returned.
	fn read(&mut self) -> Result<Option<Token>> {
		self.lexer.read_from(&mut self.source)
	}
}

/**
# Blocking driver for the lexer

Reads bytes from an [`io::BufRead`] as needed to produce tokens.

In general, it is advised to use the [`PullLexer`] alias.
*/
pub struct PullDriver<T: io::BufRead> {
	inner: T,
	lexer: DecodingLexer,
}

impl<T: io::BufRead> PullDriver<T> {
	/// Create a new driver with default options, wrapping the given reader.
	pub fn new(inner: T) -> Self {
		Self::with_options(inner, LexerOptions::default())
	}

	/// Create a new driver while configuring the lexer with the given
	/// options.
	pub fn with_options(inner: T, options: LexerOptions) -> Self {
		Self::wrap(inner, Lexer::with_options(options))
	}

	/// Create a driver from a reader and an existing lexer.
	pub fn wrap(inner: T, lexer: Lexer) -> Self {
		Self {
			inner,
			lexer: DecodingLexer::new(lexer),
		}
	}

	/// Access the inner BufRead
	pub fn get_inner(&self) -> &T {
		&self.inner
	}

	/// Access the inner BufRead, mutably
	pub fn get_inner_mut(&mut self) -> &mut T {
		&mut self.inner
	}

	/// Access the lexer
	pub fn get_lexer(&self) -> &Lexer {
		self.lexer.get_lexer()
	}

	/// Access the lexer, mutably
	pub fn get_lexer_mut(&mut self) -> &mut Lexer {
		self.lexer.get_lexer_mut()
	}

	/// Decompose the driver into the reader and the lexer.
	pub fn into_inner(self) -> (T, Lexer) {
		(self.inner, self.lexer.into_lexer())
	}
}

impl<T: io::BufRead> TokenRead for PullDriver<T> {
	/// Read a single token.
	///
	/// If the end of the input has been reached, `None` is returned.
	///
	/// All I/O errors from the source are passed on without modification.
	fn read(&mut self) -> Result<Option<Token>> {
		self.lexer.read_from(&mut self.inner)
	}
}

/**
# Non-blocking lexing

The [`FeedLexer`] allows lexing XML documents as they arrive in the
application, giving back control to the caller immediately when not enough
data is available for processing. This is especially useful when streaming
data from sockets.

This is a type alias around a [`PushDriver`] and documentation for the API is
found there.

## Example

```
use xmlex::{FeedLexer, Error, Token, TokenKind, TokenRead};
use std::io;
let doc = b"<hello>World!</hello>";
let mut fl = FeedLexer::new();
fl.feed(&doc[..9]);
// the start tag is complete, but the text may continue
let tok = fl.read().unwrap().unwrap();
assert_eq!(tok.kind(), TokenKind::ElementStartOpen);
fl.read().unwrap();
fl.read().unwrap();
assert!(matches!(
	fl.read().err().unwrap(),
	Error::IO(e) if e.kind() == io::ErrorKind::WouldBlock
));

fl.feed(&doc[9..]);
let tok = fl.read().unwrap().unwrap();
assert_eq!(tok, Token::spanning(TokenKind::CharDataFragment, "World!"));
```
*/
pub type FeedLexer<'x> = PushDriver<'x>;

/**
# Blocking lexing

The [`PullLexer`] lexes XML documents from an [`io::BufRead`] blockingly.
It will block until the backing reader has enough data available (or
returns an error).

This is a type alias around a [`PullDriver`] and documentation for the API
is found there.

Interaction with a `PullLexer` should happen exclusively via the
[`TokenRead`] trait.

## Blocking I/O

Text runs are only complete once the markup following them has been seen.
With a source which may block for a significant amount of time (e.g. a
network socket), the last character data of a "stanza" is thus only emitted
once the next `<` is available through the BufRead.

## Example

```
use xmlex::{PullLexer, TokenKind, TokenRead};
let mut doc = &b"<hello>World!</hello>"[..];
let mut pl = PullLexer::new(&mut doc);
let mut kinds = Vec::new();
pl.read_all(|tok| kinds.push(tok.kind())).unwrap();
assert_eq!(kinds[0], TokenKind::ElementStartOpen);
assert_eq!(kinds.len(), 7);
```
*/
pub type PullLexer<T> = PullDriver<T>;
