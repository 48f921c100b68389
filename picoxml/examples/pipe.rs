use std::io;

use picoxml::{read_document, Error, Writer};

fn main() {
	let stdin = io::BufReader::new(io::stdin());
	let doc = match read_document(stdin) {
		Ok(doc) => doc,
		Err(Error::IO(e)) => panic!("I/O error: {}", e),
		Err(e) => panic!("invalid XML on input: {}", e),
	};
	let stdout = io::stdout();
	let mut writer = Writer::new(stdout.lock());
	writer
		.write_document(&doc)
		.expect("failed to write to stdout");
	writer.close().expect("failed to write to stdout");
}
