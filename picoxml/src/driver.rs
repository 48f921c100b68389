/*!
Front-ends which connect a byte source, the [`Parser`] and a sink.

For most uses, [`read_document`] (tree) and [`read_events`] (streaming) are
the things to look at; [`TreeReader`] and [`StreamReader`] additionally
accept [`ParserOptions`].
*/
use std::io;

use crate::error::{Error, Result, SyntaxError, ERRCTX_DOCBEGIN};
use crate::handler::{ContentHandler, HandlerSink};
use crate::model::{Document, TreeBuilder};
use crate::parser::{Parser, ParserOptions};

#[cfg(feature = "async")]
use tokio::io::{AsyncRead, AsyncReadExt};

/**
# Parse a document into a tree

```
use picoxml::TreeReader;

let doc = TreeReader::new(&b"<a><b>text</b></a>"[..]).unwrap().read().unwrap();
assert_eq!(doc.root().child("b").unwrap().text(), "text");
```
*/
pub struct TreeReader<R> {
	parser: Parser<R>,
}

impl<R: io::Read> TreeReader<R> {
	pub fn new(reader: R) -> Result<Self> {
		Self::with_options(reader, ParserOptions::default())
	}

	pub fn with_options(reader: R, options: ParserOptions) -> Result<Self> {
		Ok(Self {
			parser: Parser::with_options(reader, options)?,
		})
	}

	/// Parse the whole input.
	pub fn read(mut self) -> Result<Document> {
		let mut builder = TreeBuilder::new();
		self.parser.parse(&mut builder)?;
		match builder.into_document() {
			Some(doc) => Ok(doc),
			None => Err(Error::syntax(
				self.parser.location(),
				SyntaxError::InvalidEof(ERRCTX_DOCBEGIN),
			)),
		}
	}
}

/**
# Stream a document into a [`ContentHandler`]

```
use picoxml::{ContentHandler, StreamReader};

#[derive(Default)]
struct Chars(String);

impl ContentHandler for Chars {
	fn characters(&mut self, text: &str) {
		self.0.push_str(text);
	}
}

let mut chars = Chars::default();
StreamReader::new(&b"<a>1 &lt; <b>2</b></a>"[..]).unwrap().read_events(&mut chars).unwrap();
assert_eq!(chars.0, "1 < 2");
```
*/
pub struct StreamReader<R> {
	parser: Parser<R>,
}

impl<R: io::Read> StreamReader<R> {
	pub fn new(reader: R) -> Result<Self> {
		Self::with_options(reader, ParserOptions::default())
	}

	pub fn with_options(reader: R, options: ParserOptions) -> Result<Self> {
		Ok(Self {
			parser: Parser::with_options(reader, options)?,
		})
	}

	/// Parse the whole input, calling `handler` along the way.
	///
	/// Returns the maximum element depth of the document.
	pub fn read_events<H: ContentHandler + ?Sized>(mut self, handler: &mut H) -> Result<usize> {
		self.parser.parse(&mut HandlerSink(handler))?;
		Ok(self.parser.max_depth())
	}
}

/// Parse a document from `reader` with default options.
pub fn read_document<R: io::Read>(reader: R) -> Result<Document> {
	TreeReader::new(reader)?.read()
}

/// Parse a document held in memory.
///
/// The string is handed to the parser as UTF-8 bytes, so the encoding
/// detection sees UTF-8 regardless of any declaration.
pub fn parse_str(doc: &str) -> Result<Document> {
	read_document(doc.as_bytes())
}

/// Stream a document from `reader` into `handler` with default options.
pub fn read_events<R: io::Read, H: ContentHandler + ?Sized>(reader: R, handler: &mut H) -> Result<()> {
	StreamReader::new(reader)?.read_events(handler)?;
	Ok(())
}

/// Parse a document from an async reader.
///
/// The input is read completely before parsing starts.
#[cfg(feature = "async")]
pub async fn read_document_async<R: AsyncRead + Unpin>(mut reader: R) -> Result<Document> {
	let mut buf = Vec::new();
	reader.read_to_end(&mut buf).await?;
	read_document(&buf[..])
}
