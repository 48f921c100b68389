use criterion::{black_box, criterion_group, criterion_main, Criterion};

use picoxml::{parse_str, read_events, DefaultHandler, Writer};

fn build_document(items: usize) -> String {
	let mut doc = String::from(
		"<?xml version='1.0'?>\n<catalog xmlns='urn:example:catalog' xmlns:p='urn:example:price'>\n",
	);
	for i in 0..items {
		doc.push_str(&format!(
			"  <item id='{}' p:currency='EUR'><name>Item &amp; number {}</name><!-- note --><p:price>{}.99</p:price><desc><![CDATA[<b>bold</b>]]> &#x2014; text</desc></item>\n",
			i, i, i % 100,
		));
	}
	doc.push_str("</catalog>\n");
	doc
}

fn short_document(c: &mut Criterion) {
	c.bench_function("short_document", |bench| {
		let doc = "<?xml version='1.0'?>\n<root xmlns='urn:uuid:fab98e86-7c09-477c-889c-0313d9877bb4' a=\"foo\" b='bar'><child>with some text</child></root>";

		bench.iter(|| {
			parse_str(black_box(doc)).unwrap();
		});
	});
}

fn large_document(c: &mut Criterion) {
	let doc = build_document(2000);
	let mut group = c.benchmark_group("large_document");

	group.bench_function("tree", |b| {
		b.iter(|| {
			parse_str(black_box(&doc)).unwrap();
		});
	});

	group.bench_function("stream", |b| {
		b.iter(|| {
			read_events(black_box(doc.as_bytes()), &mut DefaultHandler).unwrap();
		});
	});

	let tree = parse_str(&doc).unwrap();
	group.bench_function("write", |b| {
		let mut out = Vec::with_capacity(doc.len());

		b.iter(|| {
			out.clear();
			let mut w = Writer::new(&mut out);
			w.write_document(black_box(&tree)).unwrap();
			w.flush().unwrap();
		});
	});
}

criterion_group!{
	name = benches;
	config = Criterion::default().sample_size(100);
	targets = short_document, large_document
}
criterion_main!(benches);
