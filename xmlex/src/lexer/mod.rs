/*!
# Streaming XML 1.0 lexer

The [`Lexer`] turns a sequence of `&str` chunks into a flat sequence of
[`Token`]s. Chunk boundaries may fall anywhere (including in the middle of
delimiters such as `-->` or `]]>`); the emitted tokens do not depend on
where they fall.
*/
use std::collections::VecDeque;
use std::fmt;

use log::{debug, trace};
use smartstring::alias::String as SmartString;

use xmlex_validation::{is_name_char, is_name_start_char, is_whitespace};

use crate::errctx::*;
use crate::error::{Error, Result, WFError};
use crate::token::{Token, TokenKind};

mod read;

pub use read::Utf8Decoder;

const LOG_TARGET: &'static str = "xmlex::lexer";

const CDATA_SECTION_START: &'static [u8] = b"CDATA[";
const CDATA_SECTION_START_EXPECTED: [&'static [&'static str]; 6] =
	[&["C"], &["D"], &["A"], &["T"], &["A"], &["["]];

#[derive(Debug, Clone, Copy, PartialEq)]
enum ContentState {
	Text,
	/// Encountered `]`
	Bracket,
	/// Encountered `]]`, a `>` now would be illegal
	BracketBracket,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum TagOpenState {
	/// Encountered `<`
	Initial,
	/// Encountered `<!`
	Excl,
	/// Encountered `<!-`
	ExclDash,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ElementState {
	Blank,
	/// Encountered `/`
	MaybeEmptyClose,
	/// Encountered `?`
	MaybePiClose,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum CommentState {
	Text,
	/// Encountered `-`
	Dash,
	/// Encountered `--`, only `>` may follow
	DashDash,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum CDataState {
	Text,
	/// Encountered `]`
	Bracket,
	/// Encountered two or more `]`
	BracketBracket,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum State {
	Content(ContentState),
	TagOpen(TagOpenState),
	Element(ElementState),
	/// Delimiter of the value
	AttributeValue(char),
	Name,
	Comment(CommentState),
	/// Number of correct CDATA section start characters after `[`
	CDataMarker(usize),
	CDataSection(CDataState),
	Eof,
}

impl State {
	/// States in which the text since the span start belongs to a token
	/// which has not been emitted yet.
	fn tracks_text(&self) -> bool {
		match self {
			Self::Content(_)
			| Self::Comment(_)
			| Self::CDataSection(_)
			| Self::Name
			| Self::AttributeValue(_) => true,
			_ => false,
		}
	}

	/// Number of trailing delimiter bytes of the pending span which may yet
	/// be dropped instead of becoming part of the payload.
	fn lookahead_len(&self) -> usize {
		match self {
			Self::Comment(CommentState::Dash) | Self::CDataSection(CDataState::Bracket) => 1,
			Self::Comment(CommentState::DashDash) | Self::CDataSection(CDataState::BracketBracket) => 2,
			_ => 0,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Advance {
	Consume,
	/// Feed the same character again in the new state.
	Reprocess,
}

struct ST(State, Advance);

impl ST {
	fn splice<'a>(self, st: &'a mut State) -> Advance {
		*st = self.0;
		self.1
	}
}

/// The character under inspection and where it is.
struct Cursor<'c> {
	chunk: &'c str,
	pos: usize,
	ch: char,
}

impl<'c> Cursor<'c> {
	#[inline]
	fn next_pos(&self) -> usize {
		self.pos + self.ch.len_utf8()
	}
}

/// Receiver for the tokens produced by [`Lexer::lex_into`].
pub trait Sink {
	fn token(&mut self, token: Token);
}

impl Sink for Vec<Token> {
	fn token(&mut self, token: Token) {
		self.push(token);
	}
}

impl Sink for VecDeque<Token> {
	fn token(&mut self, token: Token) {
		self.push_back(token);
	}
}

/// Hold options to configure a [`Lexer`].
///
/// See also [`Lexer::with_options()`].
#[derive(Debug, Clone, PartialEq, Copy)]
pub struct LexerOptions {
	/// Maximum number of bytes in a token payload.
	///
	/// This exists to limit the memory use of the Lexer for text which
	/// arrives in many small chunks and has to be carried over between
	/// them. If a payload exceeds this limit, lexing fails with
	/// [`Error::RestrictedXml`](crate::Error::RestrictedXml).
	pub max_token_length: usize,

	/// Number of bytes to reserve for carried-over text when the lexer is
	/// created or reset.
	pub initial_capacity: usize,
}

impl LexerOptions {
	/// Set the [`LexerOptions::max_token_length`] value.
	///
	/// # Example
	///
	/// ```
	/// use xmlex::{Lexer, LexerOptions};
	/// let mut lexer = Lexer::with_options(LexerOptions::default().max_token_length(1024));
	/// ```
	pub fn max_token_length(mut self, v: usize) -> LexerOptions {
		self.max_token_length = v;
		self
	}

	/// Set the [`LexerOptions::initial_capacity`] value.
	pub fn initial_capacity(mut self, v: usize) -> LexerOptions {
		self.initial_capacity = v;
		self
	}
}

impl Default for LexerOptions {
	/// Constructs default lexer options.
	///
	/// By default, token length is not limited and no memory is reserved
	/// up front.
	fn default() -> Self {
		Self {
			max_token_length: usize::MAX,
			initial_capacity: 0,
		}
	}
}

/**
# Chunk-oriented XML 1.0 lexer

The lexer is fed with successive chunks of text via [`Lexer::lex_into`] (or
[`Lexer::feed`]) and told about the end of the input via [`Lexer::flush`].
Each call scans its chunk completely. Text which may still become part of a
token (character data, names, attribute values, comment and CDATA text) is
carried over to the next chunk.

Character data, comment and CDATA text are emitted as fragments. The
fragmentation is a function of the markup only, not of the chunking.

Entity and character references are not resolved; `&` is passed through as
part of the text.

## Example

```
use xmlex::{Lexer, Token, TokenKind};
let mut lexer = Lexer::new();
let mut tokens = lexer.feed("<a x='1'>h").unwrap();
tokens.extend(lexer.feed("i</a>").unwrap());
tokens.extend(lexer.flush().unwrap());
assert_eq!(tokens[0].kind(), TokenKind::ElementStartOpen);
assert_eq!(tokens[6], Token::spanning(TokenKind::CharDataFragment, "hi"));
assert_eq!(tokens.len(), 10);
```
*/
pub struct Lexer {
	state: State,
	/// Start of the pending span within the current chunk
	start: usize,
	/// Part of the pending span from previous chunks
	carry: String,
	opts: LexerOptions,
	err: Option<Error>,
}

impl Lexer {
	/// Construct a new Lexer based on [`LexerOptions::default()`].
	pub fn new() -> Self {
		Self::with_options(LexerOptions::default())
	}

	/// Construct a new Lexer with the given options.
	pub fn with_options(opts: LexerOptions) -> Self {
		Self {
			state: State::Content(ContentState::Text),
			start: 0,
			carry: String::with_capacity(opts.initial_capacity),
			opts,
			err: None,
		}
	}

	fn token_length_error() -> Error {
		Error::RestrictedXml("long token")
	}

	#[inline]
	fn begin_span(&mut self, at: usize) {
		self.start = at;
		self.carry.clear();
	}

	/// Build the token for the pending span ending at `end`, without the
	/// last `trim` bytes.
	///
	/// An empty payload produces no token.
	fn take_span(&mut self, kind: TokenKind, chunk: &str, end: usize, trim: usize) -> Result<Option<Token>> {
		let tail = &chunk[self.start..end];
		let len = self.carry.len() + tail.len() - trim;
		let token = if len == 0 {
			None
		} else if len > self.opts.max_token_length {
			return Err(Self::token_length_error())
		} else {
			let mut text = SmartString::new();
			if trim <= tail.len() {
				text.push_str(&self.carry);
				text.push_str(&tail[..tail.len() - trim]);
			} else {
				text.push_str(&self.carry[..len]);
			}
			Some(Token::spanning(kind, text))
		};
		self.carry.clear();
		Ok(token)
	}

	fn emit_span<S: Sink + ?Sized>(
		&mut self,
		kind: TokenKind,
		at: &Cursor,
		trim: usize,
		sink: &mut S,
	) -> Result<()> {
		if let Some(tok) = self.take_span(kind, at.chunk, at.pos, trim)? {
			trace!(target: LOG_TARGET, "emit {:?}", tok);
			sink.token(tok);
		}
		Ok(())
	}

	fn emit<S: Sink + ?Sized>(&self, kind: TokenKind, sink: &mut S) {
		trace!(target: LOG_TARGET, "emit {}", kind);
		sink.token(Token::marker(kind));
	}

	fn lex_content<S: Sink + ?Sized>(&mut self, state: ContentState, at: &Cursor, sink: &mut S) -> Result<ST> {
		match state {
			ContentState::Text => match at.ch {
				'<' => {
					self.emit_span(TokenKind::CharDataFragment, at, 0, sink)?;
					Ok(ST(State::TagOpen(TagOpenState::Initial), Advance::Consume))
				},
				']' => Ok(ST(State::Content(ContentState::Bracket), Advance::Consume)),
				// `&` included: references stay in the text as they are
				_ => Ok(ST(State::Content(ContentState::Text), Advance::Consume)),
			},
			ContentState::Bracket => match at.ch {
				']' => Ok(ST(State::Content(ContentState::BracketBracket), Advance::Consume)),
				_ => Ok(ST(State::Content(ContentState::Text), Advance::Reprocess)),
			},
			ContentState::BracketBracket => match at.ch {
				// stays armed, so that `]]]>` is rejected like `]]>`
				']' => Ok(ST(State::Content(ContentState::BracketBracket), Advance::Consume)),
				'>' => Err(WFError::IllegalCDataEnd.into()),
				_ => Ok(ST(State::Content(ContentState::Text), Advance::Reprocess)),
			},
		}
	}

	fn lex_tag_open<S: Sink + ?Sized>(&mut self, state: TagOpenState, at: &Cursor, sink: &mut S) -> Result<ST> {
		match state {
			TagOpenState::Initial => match at.ch {
				'?' => {
					self.emit(TokenKind::PiOpen, sink);
					Ok(ST(State::Element(ElementState::Blank), Advance::Consume))
				},
				'!' => Ok(ST(State::TagOpen(TagOpenState::Excl), Advance::Consume)),
				'/' => {
					self.emit(TokenKind::ElementEndOpen, sink);
					Ok(ST(State::Element(ElementState::Blank), Advance::Consume))
				},
				ch if is_name_start_char(ch) => {
					self.emit(TokenKind::ElementStartOpen, sink);
					self.begin_span(at.pos);
					Ok(ST(State::Name, Advance::Consume))
				},
				ch => Err(WFError::UnexpectedChar(ERRCTX_TAG_OPEN, ch, Some(&["Name", "/", "!", "?"])).into()),
			},
			TagOpenState::Excl => match at.ch {
				'-' => Ok(ST(State::TagOpen(TagOpenState::ExclDash), Advance::Consume)),
				'[' => Ok(ST(State::CDataMarker(0), Advance::Consume)),
				ch if is_name_start_char(ch) => {
					self.emit(TokenKind::DeclOpen, sink);
					self.begin_span(at.pos);
					Ok(ST(State::Name, Advance::Consume))
				},
				ch => Err(WFError::UnexpectedChar(ERRCTX_MARKUP_DECL, ch, Some(&["-"])).into()),
			},
			TagOpenState::ExclDash => match at.ch {
				'-' => {
					self.emit(TokenKind::CommentOpen, sink);
					self.begin_span(at.next_pos());
					Ok(ST(State::Comment(CommentState::Text), Advance::Consume))
				},
				ch => Err(WFError::UnexpectedChar(ERRCTX_COMMENT_START, ch, Some(&["-"])).into()),
			},
		}
	}

	fn lex_element<S: Sink + ?Sized>(&mut self, state: ElementState, at: &Cursor, sink: &mut S) -> Result<ST> {
		match state {
			ElementState::Blank => match at.ch {
				ch if is_whitespace(ch) => Ok(ST(State::Element(ElementState::Blank), Advance::Consume)),
				'=' => {
					self.emit(TokenKind::Eq, sink);
					Ok(ST(State::Element(ElementState::Blank), Advance::Consume))
				},
				'"' | '\'' => {
					self.begin_span(at.next_pos());
					Ok(ST(State::AttributeValue(at.ch), Advance::Consume))
				},
				'>' => {
					self.emit(TokenKind::ElementClose, sink);
					self.begin_span(at.next_pos());
					Ok(ST(State::Content(ContentState::Text), Advance::Consume))
				},
				'/' => Ok(ST(State::Element(ElementState::MaybeEmptyClose), Advance::Consume)),
				'?' => Ok(ST(State::Element(ElementState::MaybePiClose), Advance::Consume)),
				'[' => Ok(ST(State::CDataMarker(0), Advance::Consume)),
				ch if is_name_start_char(ch) => {
					self.begin_span(at.pos);
					Ok(ST(State::Name, Advance::Consume))
				},
				ch => Err(WFError::UnexpectedChar(ERRCTX_ELEMENT, ch, None).into()),
			},
			ElementState::MaybeEmptyClose => match at.ch {
				'>' => {
					self.emit(TokenKind::EmptyElementClose, sink);
					self.begin_span(at.next_pos());
					Ok(ST(State::Content(ContentState::Text), Advance::Consume))
				},
				ch => Err(WFError::UnexpectedChar(ERRCTX_EMPTY_ELEMENT_CLOSE, ch, Some(&[">"])).into()),
			},
			ElementState::MaybePiClose => match at.ch {
				'>' => {
					self.emit(TokenKind::PiClose, sink);
					self.begin_span(at.next_pos());
					Ok(ST(State::Content(ContentState::Text), Advance::Consume))
				},
				ch => Err(WFError::UnexpectedChar(ERRCTX_PI_CLOSE, ch, Some(&[">"])).into()),
			},
		}
	}

	fn lex_attval<S: Sink + ?Sized>(&mut self, delim: char, at: &Cursor, sink: &mut S) -> Result<ST> {
		match at.ch {
			ch if ch == delim => {
				self.emit_span(TokenKind::AttributeValue, at, 0, sink)?;
				Ok(ST(State::Element(ElementState::Blank), Advance::Consume))
			},
			'<' => Err(WFError::UnexpectedChar(ERRCTX_ATTVAL, '<', None).into()),
			_ => Ok(ST(State::AttributeValue(delim), Advance::Consume)),
		}
	}

	fn lex_name<S: Sink + ?Sized>(&mut self, at: &Cursor, sink: &mut S) -> Result<ST> {
		if is_name_char(at.ch) {
			return Ok(ST(State::Name, Advance::Consume));
		}
		self.emit_span(TokenKind::Name, at, 0, sink)?;
		Ok(ST(State::Element(ElementState::Blank), Advance::Reprocess))
	}

	fn lex_comment<S: Sink + ?Sized>(&mut self, state: CommentState, at: &Cursor, sink: &mut S) -> Result<ST> {
		match state {
			CommentState::Text => match at.ch {
				'-' => {
					self.emit_span(TokenKind::CommentFragment, at, 0, sink)?;
					// the dash goes to the next fragment unless it turns out
					// to be part of `-->`
					self.begin_span(at.pos);
					Ok(ST(State::Comment(CommentState::Dash), Advance::Consume))
				},
				_ => Ok(ST(State::Comment(CommentState::Text), Advance::Consume)),
			},
			CommentState::Dash => match at.ch {
				'-' => Ok(ST(State::Comment(CommentState::DashDash), Advance::Consume)),
				_ => Ok(ST(State::Comment(CommentState::Text), Advance::Consume)),
			},
			CommentState::DashDash => match at.ch {
				'>' => {
					self.emit(TokenKind::CommentClose, sink);
					self.begin_span(at.next_pos());
					Ok(ST(State::Content(ContentState::Text), Advance::Consume))
				},
				ch => Err(WFError::UnexpectedChar(ERRCTX_COMMENT_END, ch, Some(&[">"])).into()),
			},
		}
	}

	fn lex_cdata_marker(&mut self, nmatched: usize, at: &Cursor) -> Result<ST> {
		if at.ch != CDATA_SECTION_START[nmatched] as char {
			return Err(WFError::UnexpectedChar(
				ERRCTX_CDATA_SECTION_START,
				at.ch,
				Some(CDATA_SECTION_START_EXPECTED[nmatched]),
			).into());
		}
		let nmatched = nmatched + 1;
		if nmatched < CDATA_SECTION_START.len() {
			return Ok(ST(State::CDataMarker(nmatched), Advance::Consume));
		}
		self.begin_span(at.next_pos());
		Ok(ST(State::CDataSection(CDataState::Text), Advance::Consume))
	}

	fn lex_cdata_section<S: Sink + ?Sized>(&mut self, state: CDataState, at: &Cursor, sink: &mut S) -> Result<ST> {
		match state {
			CDataState::Text => match at.ch {
				']' => Ok(ST(State::CDataSection(CDataState::Bracket), Advance::Consume)),
				_ => Ok(ST(State::CDataSection(CDataState::Text), Advance::Consume)),
			},
			CDataState::Bracket => match at.ch {
				']' => Ok(ST(State::CDataSection(CDataState::BracketBracket), Advance::Consume)),
				_ => Ok(ST(State::CDataSection(CDataState::Text), Advance::Consume)),
			},
			CDataState::BracketBracket => match at.ch {
				// the earliest brackets are content
				']' => Ok(ST(State::CDataSection(CDataState::BracketBracket), Advance::Consume)),
				'>' => {
					self.emit_span(TokenKind::CDataFragment, at, 2, sink)?;
					self.emit(TokenKind::CDataClose, sink);
					self.begin_span(at.next_pos());
					Ok(ST(State::Content(ContentState::Text), Advance::Consume))
				},
				_ => Ok(ST(State::CDataSection(CDataState::Text), Advance::Consume)),
			},
		}
	}

	/// Carry the pending span over to the next chunk.
	fn save_span(&mut self, chunk: &str) -> Result<()> {
		if !self.state.tracks_text() {
			return Ok(());
		}
		let tail = &chunk[self.start..];
		let pending = self.carry.len() + tail.len();
		if pending - pending.min(self.state.lookahead_len()) > self.opts.max_token_length {
			return Err(Self::token_length_error());
		}
		self.carry.push_str(tail);
		Ok(())
	}

	fn lex_chunk<S: Sink + ?Sized>(&mut self, chunk: &str, sink: &mut S) -> Result<()> {
		self.start = 0;
		let mut chars = chunk.char_indices();
		let mut next = chars.next();
		while let Some((pos, ch)) = next {
			let at = Cursor { chunk, pos, ch };
			let st = match self.state {
				State::Content(substate) => self.lex_content(substate, &at, sink)?,
				State::TagOpen(substate) => self.lex_tag_open(substate, &at, sink)?,
				State::Element(substate) => self.lex_element(substate, &at, sink)?,
				State::AttributeValue(delim) => self.lex_attval(delim, &at, sink)?,
				State::Name => self.lex_name(&at, sink)?,
				State::Comment(substate) => self.lex_comment(substate, &at, sink)?,
				State::CDataMarker(nmatched) => self.lex_cdata_marker(nmatched, &at)?,
				State::CDataSection(substate) => self.lex_cdata_section(substate, &at, sink)?,
				State::Eof => unreachable!(),
			};
			let prev = self.state;
			let advance = st.splice(&mut self.state);
			if prev != self.state {
				trace!(target: LOG_TARGET, "state {:?} -> {:?} @{}", prev, self.state, pos);
			}
			match advance {
				Advance::Consume => next = chars.next(),
				Advance::Reprocess => debug_assert!(prev != self.state, "reprocessing {:?} without state change", ch),
			}
		}
		self.save_span(chunk)
	}

	fn cache_err<T>(&mut self, r: Result<T>) -> Result<T> {
		if let Err(e) = r.as_ref() {
			debug!(target: LOG_TARGET, "lexer failed in state {:?}: {}", self.state, e);
			self.err = Some(e.clone());
		}
		r
	}

	/// Lex a chunk of text, handing all tokens to the sink.
	///
	/// The chunk is consumed completely. Text which may still become part
	/// of a token is kept until the token is complete.
	///
	/// All errors are fatal: once an error has been returned, it is
	/// returned again by every further call without looking at the input.
	/// Tokens produced before the error in the same chunk have been handed
	/// to the sink.
	///
	/// # Panics
	///
	/// If [`Lexer::flush`] has been called before.
	pub fn lex_into<S: Sink + ?Sized>(&mut self, chunk: &str, sink: &mut S) -> Result<()> {
		if let Some(e) = self.err.as_ref() {
			return Err(e.clone());
		}
		if self.state == State::Eof {
			panic!("cannot lex behind eof");
		}
		let result = self.lex_chunk(chunk, sink);
		self.cache_err(result)
	}

	/// Lex a chunk of text and return the tokens it produced.
	///
	/// See [`Lexer::lex_into`] for details. On error, tokens produced before
	/// the error are dropped.
	pub fn feed(&mut self, chunk: &str) -> Result<Vec<Token>> {
		let mut tokens = Vec::new();
		self.lex_into(chunk, &mut tokens)?;
		Ok(tokens)
	}

	/// Signal the end of the input.
	///
	/// If the input ends in character data, a comment or a CDATA section,
	/// the pending text is returned as a final fragment (including any
	/// brackets or dashes which did not form a delimiter). A partial name or
	/// attribute value is dropped without error; use
	/// [`Lexer::is_in_content`] before flushing to detect input which ends
	/// inside markup.
	///
	/// Calling `flush` again returns `Ok(None)`.
	pub fn flush(&mut self) -> Result<Option<Token>> {
		if let Some(e) = self.err.as_ref() {
			return Err(e.clone());
		}
		let kind = match self.state {
			State::Eof => return Ok(None),
			State::Content(_) => Some(TokenKind::CharDataFragment),
			State::Comment(_) => Some(TokenKind::CommentFragment),
			State::CDataSection(_) => Some(TokenKind::CDataFragment),
			State::Name | State::AttributeValue(_) => {
				debug!(target: LOG_TARGET, "dropping partial token at end of input in state {:?}: {:?}", self.state, self.carry);
				None
			},
			_ => None,
		};
		self.state = State::Eof;
		self.start = 0;
		let result = match kind {
			Some(kind) => self.take_span(kind, "", 0, 0),
			None => {
				self.carry.clear();
				Ok(None)
			},
		};
		let result = self.cache_err(result);
		if let Ok(Some(tok)) = result.as_ref() {
			trace!(target: LOG_TARGET, "emit {:?}", tok);
		}
		result
	}

	/// Return true if the lexer is between markup constructs, i.e. in
	/// character data.
	///
	/// Input which ends while this returns false ends inside markup.
	pub fn is_in_content(&self) -> bool {
		match self.state {
			State::Content(_) => true,
			_ => false,
		}
	}

	/// Return the lexer to its initial state for use with a new stream.
	///
	/// This also clears a cached error.
	pub fn reset(&mut self) {
		self.state = State::Content(ContentState::Text);
		self.start = 0;
		self.carry.clear();
		self.carry.reserve(self.opts.initial_capacity);
		self.err = None;
	}

	/// Release all temporary buffers
	///
	/// This is sensible to call when it is expected that no more data will be
	/// processed by the lexer for a while and the memory is better used
	/// elsewhere.
	pub fn release_temporaries(&mut self) {
		self.carry.shrink_to_fit();
	}
}

impl Default for Lexer {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Debug for Lexer {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		f.debug_struct("Lexer")
			.field("state", &self.state)
			.field("carried", &self.carry.len())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn m(kind: TokenKind) -> Token {
		Token::marker(kind)
	}

	fn s(kind: TokenKind, text: &str) -> Token {
		Token::spanning(kind, text)
	}

	fn lex_chunked_with(opts: LexerOptions, chunks: &[&str]) -> (Vec<Token>, Result<()>) {
		let mut lexer = Lexer::with_options(opts);
		let mut sink = Vec::new();
		for chunk in chunks.iter() {
			if let Err(e) = lexer.lex_into(chunk, &mut sink) {
				return (sink, Err(e));
			}
		}
		match lexer.flush() {
			Ok(Some(tok)) => sink.push(tok),
			Ok(None) => (),
			Err(e) => return (sink, Err(e)),
		}
		(sink, Ok(()))
	}

	fn lex_chunked(chunks: &[&str]) -> (Vec<Token>, Result<()>) {
		lex_chunked_with(LexerOptions::default(), chunks)
	}

	fn lex(data: &str) -> (Vec<Token>, Result<()>) {
		lex_chunked(&[data])
	}

	fn lex_ok(data: &str) -> Vec<Token> {
		let (toks, r) = lex(data);
		r.unwrap();
		toks
	}

	fn lex_err(data: &str) -> Error {
		lex(data).1.err().unwrap()
	}

	/// Lex the input with every possible two-way split and byte-wise, and
	/// assert that the result never differs from the unsplit run.
	fn assert_chunking_invariant_with(opts: LexerOptions, data: &str) -> (Vec<Token>, Result<()>) {
		let reference = lex_chunked_with(opts, &[data]);
		for (i, _) in data.char_indices() {
			let split = lex_chunked_with(opts, &[&data[..i], &data[i..]]);
			assert_eq!(split, reference, "split at {} of {:?}", i, data);
		}
		let single: Vec<&str> = data.char_indices().map(|(i, ch)| &data[i..i + ch.len_utf8()]).collect();
		let singles = lex_chunked_with(opts, &single[..]);
		assert_eq!(singles, reference, "char-wise lexing of {:?}", data);
		reference
	}

	fn assert_chunking_invariant(data: &str) -> (Vec<Token>, Result<()>) {
		assert_chunking_invariant_with(LexerOptions::default(), data)
	}

	fn assert_unexpected_char(e: Error, exp_ctx: &'static str, exp_ch: char) {
		match e {
			Error::NotWellFormed(WFError::UnexpectedChar(ctx, ch, _)) if ctx == exp_ctx && ch == exp_ch => (),
			other => panic!("unexpected error: {:?}", other),
		}
	}

	#[test]
	fn lexer_lex_simple_element_with_text() {
		assert_eq!(
			lex_ok("<a>hi</a>"),
			vec![
				m(TokenKind::ElementStartOpen),
				s(TokenKind::Name, "a"),
				m(TokenKind::ElementClose),
				s(TokenKind::CharDataFragment, "hi"),
				m(TokenKind::ElementEndOpen),
				s(TokenKind::Name, "a"),
				m(TokenKind::ElementClose),
			]
		);
	}

	#[test]
	fn lexer_lex_comment() {
		assert_eq!(
			lex_ok("<!--x-->"),
			vec![
				m(TokenKind::CommentOpen),
				s(TokenKind::CommentFragment, "x"),
				m(TokenKind::CommentClose),
			]
		);
	}

	#[test]
	fn lexer_lex_cdata_section() {
		assert_eq!(
			lex_ok("<![CDATA[ab]]>"),
			vec![
				s(TokenKind::CDataFragment, "ab"),
				m(TokenKind::CDataClose),
			]
		);
	}

	#[test]
	fn lexer_lex_attributes() {
		assert_eq!(
			lex_ok("<a b=\"c\" d='e'/>"),
			vec![
				m(TokenKind::ElementStartOpen),
				s(TokenKind::Name, "a"),
				s(TokenKind::Name, "b"),
				m(TokenKind::Eq),
				s(TokenKind::AttributeValue, "c"),
				s(TokenKind::Name, "d"),
				m(TokenKind::Eq),
				s(TokenKind::AttributeValue, "e"),
				m(TokenKind::EmptyElementClose),
			]
		);
	}

	#[test]
	fn lexer_lex_attribute_delimiters_do_not_terminate_each_other() {
		assert_eq!(
			lex_ok("<a b=\"it's\" c='say \"hi\"'>"),
			vec![
				m(TokenKind::ElementStartOpen),
				s(TokenKind::Name, "a"),
				s(TokenKind::Name, "b"),
				m(TokenKind::Eq),
				s(TokenKind::AttributeValue, "it's"),
				s(TokenKind::Name, "c"),
				m(TokenKind::Eq),
				s(TokenKind::AttributeValue, "say \"hi\""),
				m(TokenKind::ElementClose),
			]
		);
	}

	#[test]
	fn lexer_suppresses_empty_attribute_value() {
		let expected = vec![
			m(TokenKind::ElementStartOpen),
			s(TokenKind::Name, "a"),
			s(TokenKind::Name, "b"),
			m(TokenKind::Eq),
			m(TokenKind::ElementClose),
		];
		assert_eq!(lex_ok("<a b=''>"), expected);
		let (toks, r) = lex_chunked(&["<a b='", "'>"]);
		r.unwrap();
		assert_eq!(toks, expected);
	}

	#[test]
	fn lexer_carries_long_non_ascii_payload_across_chunks() {
		let text = "text ] with ]] brackets &lt; and \u{fc}n\u{ef}c\u{f6}d\u{e9} \u{1f389}";
		let (toks, r) = lex_chunked(&["<a>", text, "</a>"]);
		r.unwrap();
		assert_eq!(toks[3], s(TokenKind::CharDataFragment, text));
		let doc = format!("<a>{}</a>", text);
		let expected = lex_ok(&doc);
		for (i, _) in doc.char_indices() {
			let (toks, r) = lex_chunked(&[&doc[..i], &doc[i..]]);
			r.unwrap();
			assert_eq!(toks, expected, "split at {}", i);
		}
	}

	#[test]
	fn lexer_skips_all_xml_whitespace_in_element() {
		assert_eq!(
			lex_ok("<a\t\r\n b\n=\r'1' \t/>"),
			vec![
				m(TokenKind::ElementStartOpen),
				s(TokenKind::Name, "a"),
				s(TokenKind::Name, "b"),
				m(TokenKind::Eq),
				s(TokenKind::AttributeValue, "1"),
				m(TokenKind::EmptyElementClose),
			]
		);
	}

	#[test]
	fn lexer_lex_processing_instruction() {
		assert_eq!(
			lex_ok("<?xml version=\"1.0\"?>"),
			vec![
				m(TokenKind::PiOpen),
				s(TokenKind::Name, "xml"),
				s(TokenKind::Name, "version"),
				m(TokenKind::Eq),
				s(TokenKind::AttributeValue, "1.0"),
				m(TokenKind::PiClose),
			]
		);
	}

	#[test]
	fn lexer_lex_declaration() {
		assert_eq!(
			lex_ok("<!DOCTYPE html>"),
			vec![
				m(TokenKind::DeclOpen),
				s(TokenKind::Name, "DOCTYPE"),
				s(TokenKind::Name, "html"),
				m(TokenKind::ElementClose),
			]
		);
	}

	#[test]
	fn lexer_name_is_maximal_run_and_terminator_is_reprocessed() {
		assert_eq!(
			lex_ok("<x:a-b.c_1=/>"),
			vec![
				m(TokenKind::ElementStartOpen),
				s(TokenKind::Name, "x:a-b.c_1"),
				m(TokenKind::Eq),
				m(TokenKind::EmptyElementClose),
			]
		);
	}

	#[test]
	fn lexer_accepts_non_ascii_names_and_text() {
		assert_eq!(
			lex_ok("<bär größe='🎉'>Ünïcödé 🎉</bär>"),
			vec![
				m(TokenKind::ElementStartOpen),
				s(TokenKind::Name, "bär"),
				s(TokenKind::Name, "größe"),
				m(TokenKind::Eq),
				s(TokenKind::AttributeValue, "🎉"),
				m(TokenKind::ElementClose),
				s(TokenKind::CharDataFragment, "Ünïcödé 🎉"),
				m(TokenKind::ElementEndOpen),
				s(TokenKind::Name, "bär"),
				m(TokenKind::ElementClose),
			]
		);
	}

	#[test]
	fn lexer_passes_references_through_as_text() {
		assert_eq!(
			lex_ok("<a b='&lt;'>x &amp; y</a>"),
			vec![
				m(TokenKind::ElementStartOpen),
				s(TokenKind::Name, "a"),
				s(TokenKind::Name, "b"),
				m(TokenKind::Eq),
				s(TokenKind::AttributeValue, "&lt;"),
				m(TokenKind::ElementClose),
				s(TokenKind::CharDataFragment, "x &amp; y"),
				m(TokenKind::ElementEndOpen),
				s(TokenKind::Name, "a"),
				m(TokenKind::ElementClose),
			]
		);
	}

	#[test]
	fn lexer_does_not_emit_empty_char_data() {
		assert_eq!(
			lex_ok("<a></a>"),
			vec![
				m(TokenKind::ElementStartOpen),
				s(TokenKind::Name, "a"),
				m(TokenKind::ElementClose),
				m(TokenKind::ElementEndOpen),
				s(TokenKind::Name, "a"),
				m(TokenKind::ElementClose),
			]
		);
	}

	#[test]
	fn lexer_keeps_brackets_in_char_data() {
		assert_eq!(lex_ok("a]b"), vec![s(TokenKind::CharDataFragment, "a]b")]);
		assert_eq!(lex_ok("a]]b"), vec![s(TokenKind::CharDataFragment, "a]]b")]);
		assert_eq!(lex_ok("a]]]b]"), vec![s(TokenKind::CharDataFragment, "a]]]b]")]);
	}

	#[test]
	fn lexer_reprocesses_char_after_bracket_lookahead() {
		assert_eq!(
			lex_ok("a]<b/>"),
			vec![
				s(TokenKind::CharDataFragment, "a]"),
				m(TokenKind::ElementStartOpen),
				s(TokenKind::Name, "b"),
				m(TokenKind::EmptyElementClose),
			]
		);
		assert_eq!(
			lex_ok("]]<b/>"),
			vec![
				s(TokenKind::CharDataFragment, "]]"),
				m(TokenKind::ElementStartOpen),
				s(TokenKind::Name, "b"),
				m(TokenKind::EmptyElementClose),
			]
		);
	}

	#[test]
	fn lexer_rejects_cdata_end_in_text() {
		let (toks, r) = lex("<a>foo]]>bar</a>");
		assert_eq!(r.err().unwrap(), Error::NotWellFormed(WFError::IllegalCDataEnd));
		assert_eq!(
			toks,
			vec![
				m(TokenKind::ElementStartOpen),
				s(TokenKind::Name, "a"),
				m(TokenKind::ElementClose),
			]
		);
		assert_eq!(lex_err("]]]>"), Error::NotWellFormed(WFError::IllegalCDataEnd));
	}

	#[test]
	fn lexer_lex_comment_with_single_dashes() {
		assert_eq!(
			lex_ok("<!--a-b-->"),
			vec![
				m(TokenKind::CommentOpen),
				s(TokenKind::CommentFragment, "a"),
				s(TokenKind::CommentFragment, "-b"),
				m(TokenKind::CommentClose),
			]
		);
	}

	#[test]
	fn lexer_lex_empty_comment() {
		assert_eq!(
			lex_ok("<!---->"),
			vec![m(TokenKind::CommentOpen), m(TokenKind::CommentClose)]
		);
	}

	#[test]
	fn lexer_lex_comment_keeps_markup_verbatim() {
		assert_eq!(
			lex_ok("<!-- <a b='c'> ]]> -->x"),
			vec![
				m(TokenKind::CommentOpen),
				s(TokenKind::CommentFragment, " <a b='c'> ]]> "),
				m(TokenKind::CommentClose),
				s(TokenKind::CharDataFragment, "x"),
			]
		);
	}

	#[test]
	fn lexer_lex_cdata_section_keeps_markup_verbatim() {
		assert_eq!(
			lex_ok("<![CDATA[<a>&amp;]]>"),
			vec![
				s(TokenKind::CDataFragment, "<a>&amp;"),
				m(TokenKind::CDataClose),
			]
		);
	}

	#[test]
	fn lexer_lex_cdata_section_degenerate() {
		assert_eq!(lex_ok("<![CDATA[]]>"), vec![m(TokenKind::CDataClose)]);
	}

	#[test]
	fn lexer_handles_closing_brackets_in_cdata_section() {
		assert_eq!(
			lex_ok("<![CDATA[a]]]>"),
			vec![
				s(TokenKind::CDataFragment, "a]"),
				m(TokenKind::CDataClose),
			]
		);
		assert_eq!(
			lex_ok("<![CDATA[]]]]>"),
			vec![
				s(TokenKind::CDataFragment, "]]"),
				m(TokenKind::CDataClose),
			]
		);
		assert_eq!(
			lex_ok("<![CDATA[a]b]]c]]>"),
			vec![
				s(TokenKind::CDataFragment, "a]b]]c"),
				m(TokenKind::CDataClose),
			]
		);
	}

	#[test]
	fn lexer_returns_to_content_after_cdata_section() {
		assert_eq!(
			lex_ok("<![CDATA[x]]>y<a/>"),
			vec![
				s(TokenKind::CDataFragment, "x"),
				m(TokenKind::CDataClose),
				s(TokenKind::CharDataFragment, "y"),
				m(TokenKind::ElementStartOpen),
				s(TokenKind::Name, "a"),
				m(TokenKind::EmptyElementClose),
			]
		);
	}

	#[test]
	fn lexer_accepts_cdata_marker_inside_element() {
		assert_eq!(
			lex_ok("<a [CDATA[x]]>"),
			vec![
				m(TokenKind::ElementStartOpen),
				s(TokenKind::Name, "a"),
				s(TokenKind::CDataFragment, "x"),
				m(TokenKind::CDataClose),
			]
		);
	}

	#[test]
	fn lexer_rejects_each_cdata_marker_mismatch() {
		let marker = "CDATA[";
		for i in 0..marker.len() {
			let doc = format!("<![{}x", &marker[..i]);
			match lex_err(&doc) {
				Error::NotWellFormed(WFError::UnexpectedChar(ctx, 'x', Some(exp))) => {
					assert_eq!(ctx, ERRCTX_CDATA_SECTION_START);
					assert_eq!(exp, &[&marker[i..i + 1]][..]);
				},
				other => panic!("unexpected error for {:?}: {:?}", doc, other),
			}
		}
	}

	#[test]
	fn lexer_rejects_invalid_tag_open() {
		assert_unexpected_char(lex_err("<1"), ERRCTX_TAG_OPEN, '1');
		assert_unexpected_char(lex_err("< a"), ERRCTX_TAG_OPEN, ' ');
		assert_unexpected_char(lex_err("<-"), ERRCTX_TAG_OPEN, '-');
	}

	#[test]
	fn lexer_rejects_invalid_markup_declaration() {
		assert_unexpected_char(lex_err("<!1"), ERRCTX_MARKUP_DECL, '1');
		assert_unexpected_char(lex_err("<!-x"), ERRCTX_COMMENT_START, 'x');
	}

	#[test]
	fn lexer_rejects_double_dash_in_comment() {
		let (toks, r) = lex("<!--a--b-->");
		assert_unexpected_char(r.err().unwrap(), ERRCTX_COMMENT_END, 'b');
		assert_eq!(
			toks,
			vec![m(TokenKind::CommentOpen), s(TokenKind::CommentFragment, "a")]
		);
	}

	#[test]
	fn lexer_rejects_invalid_chars_in_element() {
		assert_unexpected_char(lex_err("<a %>"), ERRCTX_ELEMENT, '%');
		assert_unexpected_char(lex_err("<a b=1>"), ERRCTX_ELEMENT, '1');
		assert_unexpected_char(lex_err("<a b='1'<"), ERRCTX_ELEMENT, '<');
	}

	#[test]
	fn lexer_rejects_lt_in_attribute_value() {
		assert_unexpected_char(lex_err("<a b='<'/>"), ERRCTX_ATTVAL, '<');
	}

	#[test]
	fn lexer_rejects_missing_gt_after_slash_or_question_mark() {
		assert_unexpected_char(lex_err("<a/b>"), ERRCTX_EMPTY_ELEMENT_CLOSE, 'b');
		assert_unexpected_char(lex_err("<?a?b"), ERRCTX_PI_CLOSE, 'b');
	}

	#[test]
	fn lexer_re_emits_error_on_next_call() {
		let mut lexer = Lexer::new();
		let mut sink = Vec::new();
		let e1 = lexer.lex_into("<a>\n<1", &mut sink).err().unwrap();
		let e2 = lexer.lex_into("</a>", &mut sink).err().unwrap();
		let e3 = lexer.flush().err().unwrap();
		assert_eq!(e1, e2);
		assert_eq!(e1, e3);
		assert_eq!(
			sink,
			vec![
				m(TokenKind::ElementStartOpen),
				s(TokenKind::Name, "a"),
				m(TokenKind::ElementClose),
				s(TokenKind::CharDataFragment, "\n"),
			]
		);
	}

	#[test]
	fn lexer_flush_emits_trailing_char_data() {
		assert_eq!(lex_ok("hello"), vec![s(TokenKind::CharDataFragment, "hello")]);
		assert_eq!(lex_ok("hello]]"), vec![s(TokenKind::CharDataFragment, "hello]]")]);
	}

	#[test]
	fn lexer_flush_emits_trailing_comment_and_cdata_text() {
		assert_eq!(
			lex_ok("<!--abc"),
			vec![m(TokenKind::CommentOpen), s(TokenKind::CommentFragment, "abc")]
		);
		assert_eq!(
			lex_ok("<!--ab-"),
			vec![
				m(TokenKind::CommentOpen),
				s(TokenKind::CommentFragment, "ab"),
				s(TokenKind::CommentFragment, "-"),
			]
		);
		assert_eq!(lex_ok("<![CDATA[ab]"), vec![s(TokenKind::CDataFragment, "ab]")]);
	}

	#[test]
	fn lexer_flush_drops_partial_name_and_value() {
		assert_eq!(lex_ok("<ab"), vec![m(TokenKind::ElementStartOpen)]);
		assert_eq!(
			lex_ok("<a b='xyz"),
			vec![
				m(TokenKind::ElementStartOpen),
				s(TokenKind::Name, "a"),
				s(TokenKind::Name, "b"),
				m(TokenKind::Eq),
			]
		);
		assert_eq!(lex_ok("<a "), vec![m(TokenKind::ElementStartOpen), s(TokenKind::Name, "a")]);
	}

	#[test]
	fn lexer_flush_twice_returns_none() {
		let mut lexer = Lexer::new();
		lexer.feed("x").unwrap();
		assert_eq!(lexer.flush().unwrap(), Some(s(TokenKind::CharDataFragment, "x")));
		assert_eq!(lexer.flush().unwrap(), None);
	}

	#[test]
	#[should_panic(expected = "cannot lex behind eof")]
	fn lexer_does_not_allow_feeding_after_flush() {
		let mut lexer = Lexer::new();
		lexer.feed("<a/>").unwrap();
		lexer.flush().unwrap();
		let _ = lexer.feed("<b/>");
	}

	#[test]
	fn lexer_reports_whether_it_is_in_content() {
		let mut lexer = Lexer::new();
		assert!(lexer.is_in_content());
		lexer.feed("<a").unwrap();
		assert!(!lexer.is_in_content());
		lexer.feed(">x").unwrap();
		assert!(lexer.is_in_content());
		lexer.feed("]").unwrap();
		assert!(lexer.is_in_content());
		lexer.feed("<!--").unwrap();
		assert!(!lexer.is_in_content());
	}

	#[test]
	fn lexer_reset_clears_state_and_error() {
		let mut lexer = Lexer::new();
		lexer.feed("<a b='partial").unwrap();
		lexer.feed("<").err().unwrap();
		lexer.reset();
		assert!(lexer.is_in_content());
		let mut toks = lexer.feed("<c/>x").unwrap();
		toks.extend(lexer.flush().unwrap());
		assert_eq!(
			toks,
			vec![
				m(TokenKind::ElementStartOpen),
				s(TokenKind::Name, "c"),
				m(TokenKind::EmptyElementClose),
				s(TokenKind::CharDataFragment, "x"),
			]
		);
	}

	#[test]
	fn lexer_release_temporaries_keeps_pending_text() {
		let mut lexer = Lexer::with_options(LexerOptions::default().initial_capacity(1024));
		lexer.feed("<a>foo").unwrap();
		lexer.release_temporaries();
		lexer.feed("bar").unwrap();
		assert_eq!(lexer.flush().unwrap(), Some(s(TokenKind::CharDataFragment, "foobar")));
	}

	#[test]
	fn lexer_carries_text_across_chunks() {
		let (toks, r) = lex_chunked(&["<a>he", "ll", "o</a", ">"]);
		r.unwrap();
		assert_eq!(
			toks,
			vec![
				m(TokenKind::ElementStartOpen),
				s(TokenKind::Name, "a"),
				m(TokenKind::ElementClose),
				s(TokenKind::CharDataFragment, "hello"),
				m(TokenKind::ElementEndOpen),
				s(TokenKind::Name, "a"),
				m(TokenKind::ElementClose),
			]
		);
	}

	#[test]
	fn lexer_ignores_empty_chunks() {
		let (toks, r) = lex_chunked(&["", "<a", "", "/>", ""]);
		r.unwrap();
		assert_eq!(
			toks,
			vec![
				m(TokenKind::ElementStartOpen),
				s(TokenKind::Name, "a"),
				m(TokenKind::EmptyElementClose),
			]
		);
	}

	#[test]
	fn lexer_comment_is_resilient_to_chunking() {
		let (toks, r) = assert_chunking_invariant("<!--comment-->");
		r.unwrap();
		assert_eq!(
			toks,
			vec![
				m(TokenKind::CommentOpen),
				s(TokenKind::CommentFragment, "comment"),
				m(TokenKind::CommentClose),
			]
		);
	}

	#[test]
	fn lexer_is_resilient_to_chunking() {
		let doc = concat!(
			"<?xml version='1.0'?>\n",
			"<!DOCTYPE root>",
			"<root xmlns=\"urn:x\" a='1' b = \"t&amp;wo\">",
			"text ] with ]] brackets &lt; and ünïcödé 🎉",
			"<!-- a - comment - -->",
			"<![CDATA[ some ]] <cdata> ]]]>",
			"<child/><?pi x?>tail]]",
			"</root>\r\n",
		);
		let (_, r) = assert_chunking_invariant(doc);
		r.unwrap();
	}

	#[test]
	fn lexer_errors_are_resilient_to_chunking() {
		for doc in &["<a>x]]>", "<a b='<'>", "<!--a--b", "<![CDAT", "<![CDATx", "<a/ >"] {
			let (_, r) = assert_chunking_invariant(doc);
			assert!(r.is_err() || *doc == "<![CDAT", "{:?}", doc);
		}
	}

	#[test]
	fn lexer_restricts_name_by_token_length() {
		let opts = LexerOptions::default().max_token_length(3);
		let (_, r) = assert_chunking_invariant_with(opts, "<abcd/>");
		assert_eq!(r.err().unwrap(), Error::RestrictedXml("long token"));
		let (_, r) = assert_chunking_invariant_with(opts, "<abc/>");
		r.unwrap();
	}

	#[test]
	fn lexer_restricts_text_by_token_length() {
		let opts = LexerOptions::default().max_token_length(3);
		let (toks, r) = assert_chunking_invariant_with(opts, "<a>abcd</a>");
		assert_eq!(r.err().unwrap(), Error::RestrictedXml("long token"));
		assert_eq!(toks.len(), 3);
	}

	#[test]
	fn lexer_token_length_ignores_closing_delimiters() {
		let opts = LexerOptions::default().max_token_length(2);
		let (toks, r) = assert_chunking_invariant_with(opts, "<![CDATA[ab]]><!--cd-->");
		r.unwrap();
		assert_eq!(
			toks,
			vec![
				s(TokenKind::CDataFragment, "ab"),
				m(TokenKind::CDataClose),
				m(TokenKind::CommentOpen),
				s(TokenKind::CommentFragment, "cd"),
				m(TokenKind::CommentClose),
			]
		);
	}

	#[test]
	fn lexer_default_options_do_not_limit() {
		let opts = LexerOptions::default();
		assert_eq!(opts.max_token_length, usize::MAX);
		assert_eq!(opts.initial_capacity, 0);
		let text = "x".repeat(100000);
		assert_eq!(lex_ok(&text), vec![s(TokenKind::CharDataFragment, &text)]);
	}

	#[test]
	fn lexer_feeds_into_deque_sink() {
		let mut lexer = Lexer::new();
		let mut q = VecDeque::new();
		lexer.lex_into("<a>", &mut q).unwrap();
		assert_eq!(q.pop_front().unwrap(), m(TokenKind::ElementStartOpen));
		assert_eq!(q.len(), 2);
	}
}
