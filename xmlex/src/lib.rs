/*!
# Streaming XML 1.0 lexing

This crate provides a lexer which turns XML 1.0 text into a flat stream of
tokens, without building a tree and without validating the nesting of
elements. It is meant as the first stage of a streaming XML pipeline.

## Features

* Input may be split into chunks at arbitrary points; the tokens do not
  depend on the chunking
* Character data, comments and CDATA sections are emitted as fragments as
  soon as they are complete, long text is never buffered as a whole unless
  it is split across chunks
* Entity and character references are passed through verbatim
* UTF-8 input only
* Can be driven push- and pull-based
* Tokio-based asynchronicity supported via the `async` feature and
  [`AsyncLexer`].

## Example

```
use xmlex::{TokenKind, TokenRead};
let doc = b"<?xml version='1.0'?><hello>World!</hello>";
let mut fl = xmlex::FeedLexer::new();
fl.feed(&doc[..]);
fl.feed_eof();
let mut kinds = Vec::new();
let result = fl.read_all_eof(|tok| {
	println!("got token: {}", tok);
	kinds.push(tok.kind());
});
// true indicates eof
assert_eq!(result.unwrap(), true);
assert_eq!(kinds[0], TokenKind::PiOpen);
```

## High-level usage

### Push-based usage

The [`FeedLexer`] allows to push bits of XML into the lexer as they arrive
in the application and process the resulting [`Token`]s as they happen.

### Pull-based usage

If the lexer should block while waiting for more data to arrive, a
[`PullLexer`] can be used instead. The `PullLexer` requires a source which
implements [`std::io::BufRead`].

### Usage with Tokio

Tokio is supported with the `async` feature. It offers the [`AsyncLexer`]
and the [`AsyncTokenRead`] trait, which work similar to the `PullLexer`.
Instead of blocking, however, the async lexer will yield control to other
tasks.

### Lexing text directly

The [`Lexer`] can also be used on `&str` chunks directly, skipping the UTF-8
decoding of the drivers.
*/
mod bufq;
pub mod driver;
mod errctx;
pub mod error;
#[cfg(feature = "async")]
pub mod future;
pub mod lexer;
pub mod token;
pub mod writer;


#[doc(inline)]
pub use bufq::BufferQueue;
#[doc(inline)]
pub use driver::{as_eof_flag, FeedLexer, PullDriver, PullLexer, PushDriver, TokenRead};
#[doc(inline)]
pub use error::{Error, Result};
#[doc(inline)]
pub use lexer::{Lexer, LexerOptions, Sink, Utf8Decoder};
#[doc(inline)]
pub use token::{Token, TokenKind};
#[doc(inline)]
pub use writer::Encoder;

#[cfg(feature = "async")]
#[doc(inline)]
pub use future::{AsyncDriver, AsyncLexer, AsyncTokenRead, AsyncTokenReadExt};

pub const VERSION: &'static str = env!("CARGO_PKG_VERSION");
