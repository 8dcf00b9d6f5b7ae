use criterion::{black_box, criterion_group, criterion_main, Criterion};

use xmlex::{FeedLexer, Lexer, PullLexer, TokenRead};

fn build_document(nitems: usize) -> String {
	let mut doc = String::from("<?xml version='1.0'?>\n<feed xmlns='urn:example:feed'>");
	for i in 0..nitems {
		doc.push_str(&format!(
			"<item id='{}' kind=\"entry\"><!-- item {} --><title>Entry &amp; title {}</title>\
			<body><![CDATA[<p>raw ]] body</p>]]> and some trailing text</body></item>\n",
			i, i, i
		));
	}
	doc.push_str("</feed>");
	doc
}

fn short_document(c: &mut Criterion) {
	c.bench_function("short_document", |bench| {
		let doc = b"<?xml version='1.0'?>\n<root a=\"foo\" b='bar'><child>with some text</child></root>";
		let mut toks = Vec::with_capacity(1024);

		bench.iter(|| {
			toks.clear();
			let mut doc = &doc[..];
			let mut p = PullLexer::new(black_box(&mut doc));
			assert!(p.read_all_eof(|tok| {
				toks.push(tok);
			}).unwrap());
		});
	});
}

fn huge_document(c: &mut Criterion) {
	let mut group = c.benchmark_group("huge_document");
	let doc = build_document(1000);

	group.bench_function("lexer", |b| {
		let mut toks = Vec::with_capacity(1024);

		b.iter(|| {
			toks.clear();
			let mut lexer = Lexer::new();
			lexer.lex_into(black_box(&doc[..]), &mut toks).unwrap();
			toks.extend(lexer.flush().unwrap());
		});
	});

	group.bench_function("singleuse_pull", |b| {
		let mut toks = Vec::with_capacity(1024);

		b.iter(|| {
			toks.clear();
			let mut data = doc.as_bytes();
			let mut p = PullLexer::new(&mut data);
			assert!(p
				.read_all_eof(|tok| {
					toks.push(tok);
				})
				.unwrap());
		});
	});

	group.bench_function("small_chunks_feed", |b| {
		let mut toks = Vec::with_capacity(1024);

		b.iter(|| {
			toks.clear();
			let mut p = FeedLexer::default();
			for chunk in doc.as_bytes().chunks(7) {
				p.feed(chunk);
			}
			p.feed_eof();
			assert!(p
				.read_all_eof(|tok| {
					toks.push(tok);
				})
				.unwrap());
		});
	});
}

criterion_group!{
	name = benches;
	config = Criterion::default().sample_size(300);
	targets = short_document, huge_document
}
criterion_main!(benches);
