/*!
# Line protocol for token streams

Each token is written as one line: the kind name for marker tokens, or the
kind name, `": "` and the raw payload for spanning tokens.

Payloads are written as they are, without any escaping. A payload which
contains a line feed thus spans multiple lines; consumers of the protocol
cannot tell such a payload apart from a following token.
*/
use bytes::{BufMut, BytesMut};

use crate::token::Token;

/**
# Encodes tokens into the line protocol

## Example

```
use bytes::BytesMut;
use xmlex::{Encoder, Token, TokenKind};
let enc = Encoder::new();
let mut buf = BytesMut::new();
enc.encode(&Token::marker(TokenKind::ElementStartOpen), &mut buf);
enc.encode(&Token::spanning(TokenKind::Name, "a"), &mut buf);
assert_eq!(&buf[..], b"ELEMENT_START_OPEN\nNAME: a\n");
```
*/
#[derive(Debug, Clone, Copy, Default)]
pub struct Encoder {}

impl Encoder {
	pub fn new() -> Self {
		Self {}
	}

	/// Encode a single token into a buffer.
	pub fn encode<O: BufMut>(&self, token: &Token, output: &mut O) {
		output.put_slice(token.kind().name().as_bytes());
		if let Some(text) = token.text() {
			output.put_slice(b": ");
			output.put_slice(text.as_bytes());
		}
		output.put_u8(b'\n');
	}

	/// Encode a single token into a BytesMut.
	///
	/// This is a shorthand for [`Encoder::encode`] which reserves the space
	/// needed up front.
	pub fn encode_into_bytes(&self, token: &Token, output: &mut BytesMut) {
		let payload = token.text().map(|t| t.len() + 2).unwrap_or(0);
		output.reserve(token.kind().name().len() + payload + 1);
		self.encode(token, output)
	}
}
