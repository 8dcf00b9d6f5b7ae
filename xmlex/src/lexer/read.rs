use crate::error::{Error, Result};

/// Length of the sequence started by a lead byte which
/// [`std::str::from_utf8`] considered a valid prefix.
fn sequence_len(starter: u8) -> usize {
	if starter & 0xe0 == 0xc0 {
		2
	} else if starter & 0xf0 == 0xe0 {
		3
	} else {
		4
	}
}

/**
# Incremental UTF-8 decoder

Decodes byte chunks into `&str`-compatible text, keeping an incomplete
multi-byte sequence at the end of a chunk until the next chunk completes it.

Errors are reported as [`Error::InvalidUtf8Byte`]. For a broken or dangling
multi-byte sequence, the reported byte is the start byte of the sequence,
independent of how the input was chunked.

## Example

```
use xmlex::lexer::Utf8Decoder;
let mut dec = Utf8Decoder::new();
let mut out = String::new();
dec.decode(b"gr\xc3", &mut out).unwrap();
assert_eq!(out, "gr");
dec.decode(b"\xbc\xc3\x9f", &mut out).unwrap();
assert_eq!(out, "gr\u{fc}\u{df}");
dec.finish().unwrap();
```
*/
#[derive(Debug, Clone, Default)]
pub struct Utf8Decoder {
	pending: [u8; 4],
	npending: usize,
	seqlen: usize,
}

impl Utf8Decoder {
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of bytes of an incomplete sequence held back from the
	/// previous chunk.
	pub fn pending(&self) -> usize {
		self.npending
	}

	fn complete_pending<'a>(&mut self, mut src: &'a [u8], into: &mut String) -> Result<&'a [u8]> {
		let starter = self.pending[0];
		while self.npending < self.seqlen {
			match src.split_first() {
				None => return Ok(src),
				Some((&b, rest)) => {
					if b & 0xc0 != 0x80 {
						return Err(Error::InvalidUtf8Byte(starter));
					}
					self.pending[self.npending] = b;
					self.npending += 1;
					src = rest;
				},
			}
		}
		match std::str::from_utf8(&self.pending[..self.seqlen]) {
			Ok(s) => into.push_str(s),
			// overlong encodings, surrogates and the like
			Err(_) => return Err(Error::InvalidUtf8Byte(starter)),
		}
		self.npending = 0;
		Ok(src)
	}

	/// Decode a chunk of bytes and append the text to `into`.
	///
	/// On error, the text up to the offending sequence has been appended.
	pub fn decode(&mut self, src: &[u8], into: &mut String) -> Result<()> {
		let src = if self.npending > 0 {
			let rest = self.complete_pending(src, into)?;
			if self.npending > 0 {
				return Ok(());
			}
			rest
		} else {
			src
		};

		let e = match std::str::from_utf8(src) {
			Ok(s) => {
				into.push_str(s);
				return Ok(());
			},
			Err(e) => e,
		};
		let valid = e.valid_up_to();
		// valid_up_to marks the longest valid prefix
		into.push_str(unsafe { std::str::from_utf8_unchecked(&src[..valid]) });
		match e.error_len() {
			Some(_) => Err(Error::InvalidUtf8Byte(src[valid])),
			None => {
				let tail = &src[valid..];
				debug_assert!(tail.len() > 0 && tail.len() < 4);
				self.pending[..tail.len()].copy_from_slice(tail);
				self.npending = tail.len();
				self.seqlen = sequence_len(tail[0]);
				Ok(())
			},
		}
	}

	/// Signal the end of the input.
	///
	/// Fails if an incomplete sequence is still pending.
	pub fn finish(&mut self) -> Result<()> {
		if self.npending > 0 {
			self.npending = 0;
			return Err(Error::InvalidUtf8Byte(self.pending[0]));
		}
		Ok(())
	}

	/// Drop any pending partial sequence.
	pub fn reset(&mut self) {
		self.npending = 0;
	}
}
