/*!
# Permissive XML 1.0 processing

This crate reads and writes XML 1.0 documents without validating them against
a DTD. It offers two ways to consume a document and one way to produce one:

* a streaming, SAX-style [`ContentHandler`] fed by [`read_events`],
* an in-memory [`Document`](model::Document) built by [`read_document`],
* a [`Writer`] which serializes call by call or from a `Document`.

## Features (and non-features)

* Byte order mark and UTF-16 detection; any encoding known to
  `encoding_rs` can be chosen as the fallback
* Namespace resolution with prefix mapping events
* Comments, processing instructions and CDATA sections are kept
* The DOCTYPE declaration is recognized and skipped
* No entities apart from the five predefined ones and character references;
  unknown entities are reported, never expanded
* No attribute value normalization
* Tokio-based input supported via the `async` feature and
  [`read_document_async`].

## Example

```
let doc = picoxml::parse_str("<?xml version='1.0'?><hello who='World'>!</hello>").unwrap();
assert_eq!(doc.root().local_name(), "hello");
assert_eq!(doc.root().attributes().value("who"), Some("World"));

let mut out = picoxml::Writer::new(Vec::new());
out.write_document(&doc).unwrap();
assert_eq!(
	out.into_inner().unwrap(),
	&b"<?xml version=\"1.0\"?><hello who=\"World\">!</hello>"[..]
);
```

## Low-level usage

The [`Parser`] reports everything it finds to an [`EventSink`]; the
[`TreeBuilder`](model::TreeBuilder) and the streaming adapter are both
implemented on top of it. The [`CharSource`](source::CharSource) and
[`EncodingDetector`](encoding::EncodingDetector) below it can be used on
their own.
*/
pub mod driver;
pub mod encoding;
pub mod error;
pub mod escape;
pub mod handler;
pub mod model;
pub mod parser;
pub mod source;
pub mod strings;
pub mod writer;


#[doc(inline)]
pub use driver::{parse_str, read_document, read_events, StreamReader, TreeReader};
#[cfg(feature = "async")]
#[doc(inline)]
pub use driver::read_document_async;
#[doc(inline)]
pub use encoding::EncodingDetector;
#[doc(inline)]
pub use error::{Error, Location, Result, StateError, SyntaxError};
#[doc(inline)]
pub use escape::{escape, unescape, Unescaped, PREDEFINED_ENTITIES};
#[doc(inline)]
pub use handler::{ContentHandler, DefaultHandler};
#[doc(inline)]
pub use model::{Attribute, Attributes, Document, Element, Node};
#[doc(inline)]
pub use parser::{EventSink, Parser, ParserOptions};
pub use source::CharSource;
pub use strings::{Name, NamespaceName, XMLNS_XML, XMLNS_XMLNS};
#[doc(inline)]
pub use writer::{Writer, WriterOptions};

pub use picoxml_validation as validation;

pub const VERSION: &'static str = env!("CARGO_PKG_VERSION");
