use std::io;
use std::io::Write;

use bytes::BytesMut;

use xmlex::{Encoder, Error, PullLexer, TokenRead};

fn main() {
	let stdin = io::BufReader::new(io::stdin());
	let mut stdout = io::stdout();
	let enc = Encoder::new();
	let mut lexer = PullLexer::new(stdin);
	let mut buf = BytesMut::with_capacity(8192);
	let result = lexer.read_all(|tok| {
		enc.encode_into_bytes(&tok, &mut buf);
		stdout
			.write_all(&buf[..])
			.expect("failed to write to stdout");
		buf.clear();
	});
	match result {
		Ok(()) => (),
		Err(Error::IO(e)) => panic!("I/O error: {}", e),
		Err(e) => panic!("invalid XML on input: {}", e),
	}
}
