use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::AsyncBufRead;

#[cfg(feature = "stream")]
use futures_core::stream::Stream;

use crate::driver::DecodingLexer;
use crate::lexer::{Lexer, LexerOptions};
use crate::token::Token;
use crate::Result;

use pin_project_lite::pin_project;

pin_project! {
	pub struct ReadToken<T: ?Sized>{
		#[pin]
		inner: T,
	}
}

impl<T: AsyncTokenRead + Unpin> Future for ReadToken<T> {
	type Output = Result<Option<Token>>;

	fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		self.project().inner.poll_read(cx)
	}
}

pin_project! {
	pub struct ReadAll<T: ?Sized, F> {
		cb: F,
		#[pin]
		inner: T,
	}
}

impl<T: AsyncTokenRead + Unpin, F: FnMut(Token) -> () + Send> Future for ReadAll<T, F> {
	type Output = Result<()>;

	fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<()>> {
		let mut this = self.project();
		loop {
			match this.inner.as_mut().poll_read(cx) {
				Poll::Ready(Ok(Some(tok))) => {
					(this.cb)(tok);
				}
				Poll::Ready(Ok(None)) => return Poll::Ready(Ok(())),
				Poll::Ready(Err(e)) => return Poll::Ready(Err(e)),
				Poll::Pending => return Poll::Pending,
			}
		}
	}
}

/**
Asynchronous source of individual tokens

This trait is implemented by the asynchronous lexer frontend. It is
analogous to the [`tokio::io::AsyncRead`] trait, but for [`Token`]s instead
of bytes.

Usually, one interacts with this trait through the helpers available in
[`AsyncTokenReadExt`].
*/
pub trait AsyncTokenRead {
	/// Poll for a single token.
	fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<Option<Token>>>;
}

impl<T: AsyncTokenRead + Unpin + ?Sized> AsyncTokenRead for &mut T {
	fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<Option<Token>>> {
		let this: &mut &mut T = Pin::into_inner(self);
		let this: &mut T = *this;
		let this = Pin::new(this);
		this.poll_read(cx)
	}
}

#[cfg(feature = "stream")]
#[cfg_attr(docsrs, doc(cfg(all(feature = "stream", feature = "async"))))]
impl<T: AsyncBufRead> Stream for AsyncDriver<T> {
	type Item = Result<Token>;

	fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
		match self.poll_read(cx) {
			Poll::Pending => Poll::Pending,
			Poll::Ready(Ok(Some(v))) => Poll::Ready(Some(Ok(v))),
			Poll::Ready(Ok(None)) => Poll::Ready(None),
			Poll::Ready(Err(e)) => Poll::Ready(Some(Err(e))),
		}
	}
}

/**
Helper trait for asynchronous sources of individual tokens

This helper trait is automatically implemented for all [`AsyncTokenRead`].
*/
pub trait AsyncTokenReadExt: AsyncTokenRead {
	/// Read a single token.
	///
	/// If the end of the input has been reached, `None` is returned.
	///
	/// I/O errors may be retried, all other errors are fatal (and will be
	/// returned again on the next invocation without reading further data
	/// from the source).
	///
	/// Equivalent to:
	///
	/// ```ignore
	/// async fn read(&mut self) -> Result<Option<Token>>;
	/// ```
	fn read(&mut self) -> ReadToken<&mut Self> {
		ReadToken { inner: self }
	}

	/// Read all tokens which can be produced from the data source.
	///
	/// The given `cb` is invoked for each token.
	///
	/// Equivalent to:
	///
	/// ```ignore
	///     async fn read_all<F>(&mut self, mut cb: F) -> Result<()>
	///            where F: FnMut(Token) -> () + Send
	/// ```
	fn read_all<F>(&mut self, cb: F) -> ReadAll<&mut Self, F> {
		ReadAll { inner: self, cb }
	}
}

impl<T: AsyncTokenRead> AsyncTokenReadExt for T {}

pin_project! {
	/**
	# Asynchronous driver for the lexer

	Reads bytes from a [`tokio::io::AsyncBufRead`] as needed to produce
	tokens.

	In general, it is advised to use the [`AsyncLexer`] alias.
	*/
	pub struct AsyncDriver<T>{
		#[pin]
		inner: T,
		lexer: DecodingLexer,
	}
}

impl<T: AsyncBufRead> AsyncDriver<T> {
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

	/// Decompose the AsyncDriver into its parts
	pub fn into_inner(self) -> (T, Lexer) {
		(self.inner, self.lexer.into_lexer())
	}

	/// Access the inner AsyncBufRead
	pub fn get_inner(&self) -> &T {
		&self.inner
	}

	/// Access the inner AsyncBufRead, mutably
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

	/// Release temporary buffers and other ephemeral allocations.
	///
	/// This is sensible to call when it is expected that no more data will be
	/// processed by the lexer for a while and the memory is better used
	/// elsewhere.
	#[inline(always)]
	pub fn release_temporaries(&mut self) {
		self.lexer.release_temporaries();
	}
}

impl<T: AsyncBufRead> AsyncTokenRead for AsyncDriver<T> {
	fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<Option<Token>>> {
		let mut this = self.project();
		loop {
			if let Some(result) = this.lexer.next() {
				return Poll::Ready(result);
			}
			let buf = match this.inner.as_mut().poll_fill_buf(cx) {
				// a.k.a. WouldBlock
				Poll::Pending => return Poll::Pending,
				Poll::Ready(Ok(buf)) => buf,
				Poll::Ready(Err(e)) => return Poll::Ready(Err(e.into())),
			};
			if buf.len() == 0 {
				this.lexer.push_eof();
				continue;
			}
			let n = buf.len();
			this.lexer.push_bytes(buf);
			this.inner.as_mut().consume(n);
		}
	}
}

/**
Tokio-compatible asynchronous lexer

The [`AsyncLexer`] lexes XML documents from a [`tokio::io::AsyncBufRead`],
asynchronously. It operates similarly as the [`PullLexer`] does, but instead
of blocking the task, it will yield control to other tasks if the backend is
not able to supply data immediately.

This is a type alias around a [`AsyncDriver`] and documentation for the API
is found there.

Interaction with a `AsyncLexer` should happen exclusively via the
[`AsyncTokenReadExt`] trait.

## Example

```
use xmlex::{AsyncLexer, AsyncTokenReadExt, Token, TokenKind};
# tokio_test::block_on(async {
let mut doc = &b"<hello>World!</hello>"[..];
let mut al = AsyncLexer::new(&mut doc);
let tok = al.read().await;
assert_eq!(tok.unwrap().unwrap(), Token::marker(TokenKind::ElementStartOpen));
# })
```

   [`PullLexer`]: crate::PullLexer
*/
pub type AsyncLexer<T> = AsyncDriver<T>;
