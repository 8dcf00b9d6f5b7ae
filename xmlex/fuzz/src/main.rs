#[macro_use]
extern crate afl;
extern crate xmlex;

use xmlex::{Token, TokenRead};

fn lex_chunked<'c, 'cc>(chunks: &'c [&'cc [u8]]) -> (Vec<Token>, xmlex::Result<()>) {
	let mut tokens = Vec::new();
	let mut lexer = xmlex::FeedLexer::new();

	for chunk in chunks {
		lexer.feed(*chunk);

		match lexer.read_all_eof(|tok| tokens.push(tok)) {
			Ok(false) => (),
			Ok(true) => panic!("eof reached before eof"),
			Err(e) => return (tokens, Err(e)),
		}
	}

	lexer.feed_eof();
	let result = lexer.read_all(|tok| tokens.push(tok));
	(tokens, result)
}

fn main() {
	fuzz!(|data: &[u8]| {
		let mut chunks = Vec::<&[u8]>::new();
		let zero = &b"\0"[..];
		for chunk in data.split(|b| *b == b'\0') {
			if chunk.len() == 0 {
				chunks.push(zero)
			} else {
				chunks.push(chunk)
			}
		}
		let (chunked_tokens, chunked_result) = lex_chunked(&chunks);
		let buf = chunks.join(&b""[..]);
		let (tokens, result) = lex_chunked(&[&buf[..]]);

		if chunked_result.is_err() != result.is_err() {
			panic!("error state depends on chunking")
		}
		if result.is_ok() && chunked_tokens != tokens {
			panic!("tokens depend on chunking")
		}
	});
}
