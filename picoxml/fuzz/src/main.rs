#[macro_use]
extern crate afl;
extern crate picoxml;

use picoxml::{read_document, read_events, ContentHandler, Writer};

#[derive(Default)]
struct Count(usize);

impl ContentHandler for Count {
	fn start_element(&mut self, _: &picoxml::Name, _: Option<&str>, _: &picoxml::Attributes) {
		self.0 += 1;
	}
}

fn main() {
	fuzz!(|data: &[u8]| {
		let mut count = Count::default();
		let streamed = read_events(data, &mut count);
		let tree = read_document(data);

		let doc = match (streamed, tree) {
			(Ok(()), Ok(doc)) => doc,
			(Err(_), Err(_)) => return,
			(s, t) => panic!("stream and tree disagree: {:?} vs {:?}", s, t.map(|_| ())),
		};

		let mut w = Writer::new(Vec::new());
		w.write_document(&doc).expect("failed to serialize parsed document");
		let out = w.into_inner().expect("failed to serialize parsed document");
		match read_document(&out[..]) {
			Ok(again) => {
				if again != doc {
					panic!("round trip changed the document")
				}
			}
			Err(e) => panic!("serialized document does not parse: {}", e),
		}
	});
}
