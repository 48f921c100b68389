/*!
# Streaming content handler

[`ContentHandler`] is the SAX-style callback interface of this crate. Feed a
document into one with [`StreamReader`](crate::StreamReader) or
[`read_events`](crate::read_events).

The handler sees less than an [`EventSink`]: character references, CDATA
sections and predefined entities all arrive as plain
[`characters`](ContentHandler::characters), comments and the XML
declaration are dropped, and unknown entities (in content as well as in
attribute values) are reported through
[`skipped_entity`](ContentHandler::skipped_entity).
*/
use crate::model::{Attributes, CharRef};
use crate::parser::EventSink;
use crate::strings::{Name, NamespaceName};

/// Callbacks for a streamed document; every method defaults to doing
/// nothing.
#[allow(unused_variables)]
pub trait ContentHandler {
	fn start_document(&mut self) {}

	/// Called only if the whole document was well-formed.
	fn end_document(&mut self) {}

	/// Precedes the `start_element` of the element declaring the binding.
	/// The default namespace has the empty prefix.
	fn start_prefix_mapping(&mut self, prefix: &str, uri: &str) {}

	/// Follows the `end_element` of the element which declared the binding.
	fn end_prefix_mapping(&mut self, prefix: &str) {}

	fn start_element(&mut self, name: &Name, namespace: Option<&str>, attributes: &Attributes) {}

	fn end_element(&mut self, name: &Name, namespace: Option<&str>) {}

	/// Character data; a single text run may be delivered in several calls.
	fn characters(&mut self, text: &str) {}

	/// Whitespace outside of the root element.
	fn ignorable_whitespace(&mut self, whitespace: &str) {}

	fn processing_instruction(&mut self, target: &str, data: &str) {}

	/// A reference to an entity which is not predefined.
	fn skipped_entity(&mut self, name: &str) {}
}

/// A [`ContentHandler`] which ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHandler;

impl ContentHandler for DefaultHandler {}

/// Adapts a [`ContentHandler`] to the parser's [`EventSink`].
pub(crate) struct HandlerSink<'h, H: ?Sized>(pub(crate) &'h mut H);

impl<'h, H: ContentHandler + ?Sized> EventSink for HandlerSink<'h, H> {
	fn start_document(&mut self) {
		self.0.start_document();
	}

	fn start_prefix_mapping(&mut self, prefix: &str, uri: &NamespaceName) {
		self.0.start_prefix_mapping(prefix, uri);
	}

	fn start_element(
		&mut self,
		name: &Name,
		namespace: Option<&NamespaceName>,
		attributes: Attributes,
	) {
		self.0
			.start_element(name, namespace.map(|ns| &**ns), &attributes);
	}

	fn end_element(&mut self, name: &Name, namespace: Option<&NamespaceName>) {
		self.0.end_element(name, namespace.map(|ns| &**ns));
	}

	fn end_prefix_mapping(&mut self, prefix: &str) {
		self.0.end_prefix_mapping(prefix);
	}

	fn text(&mut self, text: &str) {
		self.0.characters(text);
	}

	fn whitespace(&mut self, whitespace: &str) {
		self.0.ignorable_whitespace(whitespace);
	}

	fn cdata(&mut self, data: &str) {
		self.0.characters(data);
	}

	fn processing_instruction(&mut self, target: &str, data: &str) {
		self.0.processing_instruction(target, data);
	}

	fn entity_ref(&mut self, name: &str) {
		self.0.skipped_entity(name);
	}

	fn char_ref(&mut self, _reference: &CharRef, ch: char) {
		let mut buf = [0u8; 4];
		self.0.characters(ch.encode_utf8(&mut buf));
	}

	fn attribute_entity(&mut self, name: &str) {
		self.0.skipped_entity(name);
	}

	fn end_document(&mut self) {
		self.0.end_document();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	use crate::parser::Parser;

	#[derive(Default)]
	struct Collect(Vec<String>);

	impl ContentHandler for Collect {
		fn characters(&mut self, text: &str) {
			self.0.push(format!("chars {:?}", text));
		}

		fn skipped_entity(&mut self, name: &str) {
			self.0.push(format!("skipped {}", name));
		}

		fn start_prefix_mapping(&mut self, prefix: &str, uri: &str) {
			self.0.push(format!("map {:?}={}", prefix, uri));
		}

		fn start_element(&mut self, name: &Name, namespace: Option<&str>, _: &Attributes) {
			self.0.push(format!("start {} {:?}", name, namespace));
		}
	}

	#[test]
	fn maps_parser_events() {
		let mut parser =
			Parser::new(&b"<a xmlns='urn:a' k='&e1;'><!--c--><![CDATA[x]]>&#66;&e2;</a>"[..])
				.unwrap();
		let mut h = Collect::default();
		parser.parse(&mut HandlerSink(&mut h)).unwrap();
		assert_eq!(h.0, vec![
			"skipped e1".to_string(),
			"map \"\"=urn:a".to_string(),
			"start a Some(\"urn:a\")".to_string(),
			"chars \"x\"".to_string(),
			"chars \"B\"".to_string(),
			"skipped e2".to_string(),
		]);
	}

	#[test]
	fn default_handler_accepts_everything() {
		let mut parser = Parser::new(&b"<?p?><a>t</a>"[..]).unwrap();
		parser.parse(&mut HandlerSink(&mut DefaultHandler)).unwrap();
	}
}
