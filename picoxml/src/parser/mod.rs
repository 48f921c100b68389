/*!
# Recursive-descent XML 1.0 parser

The [`Parser`] reads a whole document from a [`CharSource`] and reports what
it finds to an [`EventSink`]. It is permissive: it checks the grammar and the
well-formedness constraints which can be checked without a DTD, but skips the
DOCTYPE declaration and never expands entities other than the predefined ones
and character references.

Both front-ends of this crate sit on top of this parser: the streaming
[`ContentHandler`](crate::ContentHandler) adapter and the
[`TreeBuilder`](crate::model::TreeBuilder).
*/
use std::io;

use encoding_rs::{Encoding, UTF_8};
use log::debug;

use picoxml_validation::is_char;
use picoxml_validation::selectors::{
	CharSelector, CLASS_XML_DIGIT, CLASS_XML_HEXDIGIT, CLASS_XML_NAME, CLASS_XML_NAMESTART,
	CLASS_XML_SPACE,
};

use crate::encoding::EncodingDetector;
use crate::error::*;
use crate::escape::PREDEFINED_ENTITIES;
use crate::model::{Attribute, Attributes, CharRef, CharRefBase, XmlDeclaration};
use crate::source::CharSource;
use crate::strings::{Name, NamespaceName};

pub mod namespaces;

pub use namespaces::{NamespaceScope, PrefixMapping};

const QUOTES: &'static [char] = &['"', '\''];

// matches every character except the listed ones
struct NoneOf(&'static [char]);

impl CharSelector for NoneOf {
	fn select(&self, c: char) -> bool {
		!self.0.contains(&c)
	}
}

const CHAR_DATA: NoneOf = NoneOf(&['<', '&', ']']);

/**
# Parser configuration

```rust
use picoxml::ParserOptions;

let options = ParserOptions::default()
	.check_end_tags(false)
	.reject_undeclared_prefixes(true);
```
*/
#[derive(Debug, Clone, Copy)]
pub struct ParserOptions {
	default_encoding: &'static Encoding,
	check_end_tags: bool,
	reject_undeclared_prefixes: bool,
	use_declared_encoding: bool,
}

impl Default for ParserOptions {
	fn default() -> Self {
		Self {
			default_encoding: UTF_8,
			check_end_tags: true,
			reject_undeclared_prefixes: false,
			use_declared_encoding: false,
		}
	}
}

impl ParserOptions {
	/// Encoding to use when neither a byte order mark nor the UTF-16
	/// pattern of `<` identifies one.
	pub fn default_encoding(mut self, encoding: &'static Encoding) -> Self {
		self.default_encoding = encoding;
		self
	}

	/// Reject end tags whose name differs from the start tag.
	pub fn check_end_tags(mut self, enabled: bool) -> Self {
		self.check_end_tags = enabled;
		self
	}

	/// Fail on element or attribute prefixes without a binding in scope,
	/// instead of leaving their namespace absent.
	///
	/// This also rejects element and attribute names which are not
	/// qualified names (see [`Name::is_qname`]).
	pub fn reject_undeclared_prefixes(mut self, enabled: bool) -> Self {
		self.reject_undeclared_prefixes = enabled;
		self
	}

	/// See [`EncodingDetector::use_declared_encoding`].
	pub fn use_declared_encoding(mut self, enabled: bool) -> Self {
		self.use_declared_encoding = enabled;
		self
	}

	pub fn detector(&self) -> EncodingDetector {
		EncodingDetector::new(self.default_encoding).use_declared_encoding(self.use_declared_encoding)
	}
}

/**
# Receiver of parser events

All methods have empty default implementations, so implementors only need
to override what they are interested in.

Events arrive in document order. For every element the parser calls, in
this order: [`attribute_entity`](Self::attribute_entity) for each unknown
entity in its attribute values, [`start_prefix_mapping`](Self::start_prefix_mapping)
for each namespace declaration, [`start_element`](Self::start_element), the
content events, [`end_element`](Self::end_element) and finally
[`end_prefix_mapping`](Self::end_prefix_mapping) in reverse declaration
order.
*/
#[allow(unused_variables)]
pub trait EventSink {
	fn start_document(&mut self) {}

	/// The `<?xml ... ?>` declaration at the very start of the document.
	fn xml_declaration(&mut self, declaration: XmlDeclaration) {}

	/// A namespace binding; `prefix` is empty for the default namespace.
	fn start_prefix_mapping(&mut self, prefix: &str, uri: &NamespaceName) {}

	fn start_element(
		&mut self,
		name: &Name,
		namespace: Option<&NamespaceName>,
		attributes: Attributes,
	) {
	}

	fn end_element(&mut self, name: &Name, namespace: Option<&NamespaceName>) {}

	fn end_prefix_mapping(&mut self, prefix: &str) {}

	/// Character data inside the root element.
	///
	/// A text run may be split over several calls; each expanded predefined
	/// entity is passed on its own.
	fn text(&mut self, text: &str) {}

	/// Whitespace before or after the root element.
	fn whitespace(&mut self, whitespace: &str) {}

	fn cdata(&mut self, data: &str) {}

	fn comment(&mut self, data: &str) {}

	fn processing_instruction(&mut self, target: &str, data: &str) {}

	/// Reference to an entity which is not predefined, in content.
	fn entity_ref(&mut self, name: &str) {}

	/// A character reference in content, with the character it denotes.
	fn char_ref(&mut self, reference: &CharRef, ch: char) {}

	/// Reference to an entity which is not predefined, in an attribute value.
	///
	/// The reference is kept literally in the value.
	fn attribute_entity(&mut self, name: &str) {}

	/// Called after the document parsed successfully.
	fn end_document(&mut self) {}
}

#[derive(Debug)]
struct OpenElement {
	name: Name,
	namespace: Option<NamespaceName>,
}

enum Reference {
	Predefined(char),
	Char(CharRef, char),
	Entity(String),
}

/**
# XML 1.0 parser

```rust
use picoxml::{EventSink, Name, NamespaceName, Attributes, Parser};

#[derive(Default)]
struct Counter(usize);

impl EventSink for Counter {
	fn start_element(&mut self, _: &Name, _: Option<&NamespaceName>, _: Attributes) {
		self.0 += 1;
	}
}

let mut parser = Parser::new(&b"<a><b/><c><d/></c></a>"[..]).unwrap();
let mut counter = Counter::default();
parser.parse(&mut counter).unwrap();
assert_eq!(counter.0, 4);
assert_eq!(parser.max_depth(), 3);
```
*/
pub struct Parser<R> {
	src: CharSource<R>,
	options: ParserOptions,
	scope: NamespaceScope,
	stack: Vec<OpenElement>,
	max_depth: usize,
}

impl<R: io::Read> Parser<R> {
	/// Detect the encoding of `reader` and prepare a parser with default
	/// options.
	pub fn new(reader: R) -> Result<Self> {
		Self::with_options(reader, ParserOptions::default())
	}

	pub fn with_options(reader: R, options: ParserOptions) -> Result<Self> {
		let src = options.detector().open(reader)?;
		Ok(Self::from_source(src, options))
	}

	/// Parse from an already opened character source.
	pub fn from_source(src: CharSource<R>, options: ParserOptions) -> Self {
		Self {
			src,
			options,
			scope: NamespaceScope::new(),
			stack: Vec::new(),
			max_depth: 0,
		}
	}

	/// Deepest element nesting seen so far.
	pub fn max_depth(&self) -> usize {
		self.max_depth
	}

	/// Location of the next character to be read.
	pub fn location(&self) -> Location {
		self.src.location()
	}

	pub fn encoding(&self) -> &'static Encoding {
		self.src.encoding()
	}

	/// Parse the complete document, reporting it to `sink`.
	///
	/// On error, parsing stops immediately and
	/// [`EventSink::end_document`] is not called.
	pub fn parse<S: EventSink + ?Sized>(&mut self, sink: &mut S) -> Result<()> {
		sink.start_document();
		self.prolog(sink)?;
		self.root(sink)?;
		self.epilog(sink)?;
		sink.end_document();
		Ok(())
	}

	fn err<T>(&self, e: SyntaxError) -> Result<T> {
		Err(self.src.error(e))
	}

	fn read_name(&mut self, ctx: &'static str) -> Result<String> {
		let mut name = String::new();
		name.push(self.src.expect(&CLASS_XML_NAMESTART, ctx, None)?);
		self.src.take(&CLASS_XML_NAME, &mut name)?;
		Ok(name)
	}

	fn skip_space(&mut self) -> Result<usize> {
		self.src.skip(&CLASS_XML_SPACE)
	}

	// consume up to and including `delim`
	fn skip_past(&mut self, delim: &str, ctx: &'static str) -> Result<()> {
		while !self.src.attempt_str(delim)? {
			if self.src.read()?.is_none() {
				return self.err(SyntaxError::InvalidEof(ctx));
			}
		}
		Ok(())
	}

	fn prolog<S: EventSink + ?Sized>(&mut self, sink: &mut S) -> Result<()> {
		if self.src.lookahead_str("<?xml")? {
			match self.src.peek_nth(5)? {
				Some(ch) if ch == '?' || CLASS_XML_SPACE.select(ch) => {
					self.src.expect_str("<?xml", ERRCTX_XML_DECL)?;
					let declaration = self.xml_declaration()?;
					sink.xml_declaration(declaration);
				}
				_ => (),
			}
		}

		let mut seen_doctype = false;
		let mut ws = String::new();
		loop {
			ws.clear();
			if self.src.take(&CLASS_XML_SPACE, &mut ws)? > 0 {
				sink.whitespace(&ws);
			}
			match self.src.peek()? {
				None => return self.err(SyntaxError::InvalidEof(ERRCTX_DOCBEGIN)),
				Some('<') => (),
				Some(ch) => {
					return self.err(SyntaxError::UnexpectedChar(
						ERRCTX_DOCBEGIN,
						ch,
						Some(&["'<'"]),
					))
				}
			}
			if self.src.attempt_str("<?")? {
				self.processing_instruction(sink)?;
			} else if self.src.attempt_str("<!--")? {
				self.comment(sink)?;
			} else if self.src.lookahead_str("<!DOCTYPE")? {
				if seen_doctype {
					return self.err(SyntaxError::InvalidSyntax(
						"only one DOCTYPE declaration is allowed",
					));
				}
				self.src.expect_str("<!DOCTYPE", ERRCTX_DOCTYPE)?;
				self.skip_doctype()?;
				seen_doctype = true;
			} else {
				return Ok(());
			}
		}
	}

	// everything after `<?xml`
	fn xml_declaration(&mut self) -> Result<XmlDeclaration> {
		let mut attributes = Attributes::new();
		let mut ignored = Vec::new();
		loop {
			let ws = self.skip_space()?;
			if self.src.attempt_str("?>")? {
				return Ok(XmlDeclaration::new(attributes));
			}
			if ws == 0 {
				return self.err(SyntaxError::MissingWhitespace(ERRCTX_XML_DECL));
			}
			let name = self.read_name(ERRCTX_XML_DECL)?;
			self.skip_space()?;
			self.src.expect(&'=', ERRCTX_XML_DECL, Some(&["'='"]))?;
			self.skip_space()?;
			let value = self.attribute_value(&mut ignored)?;
			attributes.push(Attribute::new(Name::parse(&name), value));
		}
	}

	// everything after `<!DOCTYPE`
	fn skip_doctype(&mut self) -> Result<()> {
		let mut depth = 0usize;
		loop {
			let ch = match self.src.read()? {
				Some(ch) => ch,
				None => return self.err(SyntaxError::InvalidEof(ERRCTX_DOCTYPE)),
			};
			match ch {
				'"' | '\'' => {
					let mut buf = [0u8; 4];
					self.skip_past(ch.encode_utf8(&mut buf), ERRCTX_DOCTYPE)?;
				}
				'[' => depth += 1,
				']' => depth = depth.saturating_sub(1),
				'<' if depth > 0 => {
					if self.src.attempt_str("!--")? {
						self.skip_past("-->", ERRCTX_DOCTYPE)?;
					} else if self.src.attempt('?')? {
						self.skip_past("?>", ERRCTX_DOCTYPE)?;
					}
				}
				'>' if depth == 0 => break,
				_ => (),
			}
		}
		debug!("skipped DOCTYPE declaration, ending at {}", self.src.location());
		Ok(())
	}

	fn root<S: EventSink + ?Sized>(&mut self, sink: &mut S) -> Result<()> {
		self.src.expect(&'<', ERRCTX_DOCBEGIN, Some(&["'<'"]))?;
		self.start_tag(sink)?;

		let mut text = String::new();
		while self.stack.len() > 0 {
			match self.src.peek()? {
				None => return self.err(SyntaxError::InvalidEof(ERRCTX_TEXT)),
				Some('<') => {
					flush_text(sink, &mut text);
					if self.src.attempt_str("</")? {
						self.end_tag(sink)?;
					} else if self.src.attempt_str("<!--")? {
						self.comment(sink)?;
					} else if self.src.attempt_str("<![CDATA[")? {
						self.cdata_section(sink)?;
					} else if self.src.attempt_str("<?")? {
						self.processing_instruction(sink)?;
					} else {
						self.src.read()?;
						self.start_tag(sink)?;
					}
				}
				Some('&') => {
					flush_text(sink, &mut text);
					self.src.read()?;
					match self.reference(ERRCTX_TEXT)? {
						Reference::Predefined(ch) => {
							let mut buf = [0u8; 4];
							sink.text(ch.encode_utf8(&mut buf));
						}
						Reference::Char(reference, ch) => sink.char_ref(&reference, ch),
						Reference::Entity(name) => sink.entity_ref(&name),
					}
				}
				Some(']') => {
					if self.src.lookahead_str("]]>")? {
						return self.err(SyntaxError::CDataEndInText);
					}
					self.src.read()?;
					text.push(']');
				}
				Some(_) => {
					self.src.take(&CHAR_DATA, &mut text)?;
				}
			}
		}
		Ok(())
	}

	// everything after `<`
	fn start_tag<S: EventSink + ?Sized>(&mut self, sink: &mut S) -> Result<()> {
		let name = Name::parse(&self.read_name(ERRCTX_ELEMENT)?);
		self.check_qname(&name)?;
		let mut attributes = Attributes::new();
		let mut entities = Vec::new();
		let empty = loop {
			let ws = self.skip_space()?;
			match self.src.peek()? {
				None => return self.err(SyntaxError::InvalidEof(ERRCTX_ELEMENT)),
				Some('/') => {
					self.src.read()?;
					self.src.expect(&'>', ERRCTX_ELEMENT, Some(&["'>'"]))?;
					break true;
				}
				Some('>') => {
					self.src.read()?;
					break false;
				}
				Some(_) => {
					if ws == 0 {
						return self.err(SyntaxError::MissingWhitespace(ERRCTX_ELEMENT));
					}
					let attr_name = Name::parse(&self.read_name(ERRCTX_ATTNAME)?);
					self.check_qname(&attr_name)?;
					if attributes.iter().any(|a| a.name() == &attr_name) {
						return self.err(SyntaxError::DuplicateAttribute(attr_name.to_string()));
					}
					self.skip_space()?;
					self.src.expect(&'=', ERRCTX_ATTNAME, Some(&["'='"]))?;
					self.skip_space()?;
					let value = self.attribute_value(&mut entities)?;
					attributes.push(Attribute::new(attr_name, value));
				}
			}
		};

		let location = self.src.location();
		let mappings = self
			.scope
			.push(&attributes)
			.map_err(|e| Error::syntax(location, e))?;
		for entity in entities.iter() {
			sink.attribute_entity(entity);
		}
		for mapping in mappings.iter() {
			sink.start_prefix_mapping(&mapping.prefix, &mapping.uri);
		}

		let namespace = self.scope.resolve_element(&name);
		self.check_resolved(&name, namespace.is_some())?;
		let mut resolved = Attributes::new();
		for attr in attributes {
			let namespace = self.scope.resolve_attribute(attr.name());
			if !attr.is_namespace_declaration() {
				self.check_resolved(attr.name(), namespace.is_some())?;
			}
			resolved.push(attr.with_namespace(namespace));
		}

		sink.start_element(&name, namespace.as_ref(), resolved);
		self.stack.push(OpenElement { name, namespace });
		if self.stack.len() > self.max_depth {
			self.max_depth = self.stack.len();
		}
		if empty {
			self.close_element(sink);
		}
		Ok(())
	}

	fn check_qname(&self, name: &Name) -> Result<()> {
		if self.options.reject_undeclared_prefixes && !name.is_qname() {
			return self.err(SyntaxError::InvalidQName(name.to_string()));
		}
		Ok(())
	}

	fn check_resolved(&self, name: &Name, resolved: bool) -> Result<()> {
		let prefix = match name.prefix() {
			Some(prefix) if !resolved => prefix,
			_ => return Ok(()),
		};
		if self.options.reject_undeclared_prefixes {
			return self.err(SyntaxError::UndeclaredPrefix(prefix.to_string()));
		}
		debug!(
			"prefix {:?} of {} is not bound at {}, leaving namespace absent",
			prefix,
			name,
			self.src.location()
		);
		Ok(())
	}

	// everything after `</`
	fn end_tag<S: EventSink + ?Sized>(&mut self, sink: &mut S) -> Result<()> {
		let raw = self.read_name(ERRCTX_ELEMENT_FOOT)?;
		self.skip_space()?;
		self.src.expect(&'>', ERRCTX_ELEMENT_FOOT, Some(&["'>'"]))?;
		if self.options.check_end_tags {
			if let Some(open) = self.stack.last() {
				if !open.name.matches_raw(&raw) {
					return self.err(SyntaxError::ElementMismatch {
						expected: open.name.to_string(),
						found: raw,
					});
				}
			}
		}
		self.close_element(sink);
		Ok(())
	}

	fn close_element<S: EventSink + ?Sized>(&mut self, sink: &mut S) {
		let open = match self.stack.pop() {
			Some(open) => open,
			None => return,
		};
		sink.end_element(&open.name, open.namespace.as_ref());
		for prefix in self.scope.pop() {
			sink.end_prefix_mapping(&prefix);
		}
	}

	fn attribute_value(&mut self, entities: &mut Vec<String>) -> Result<String> {
		let quote = self
			.src
			.expect(&QUOTES, ERRCTX_ATTVAL, Some(&["'\"'", "\"'\""]))?;
		let mut value = String::new();
		loop {
			match self.src.read()? {
				None => return self.err(SyntaxError::InvalidEof(ERRCTX_ATTVAL)),
				Some(ch) if ch == quote => return Ok(value),
				Some('<') => {
					self.src.unread('<');
					return self.err(SyntaxError::UnexpectedChar(ERRCTX_ATTVAL, '<', None));
				}
				Some('&') => match self.reference(ERRCTX_ATTVAL)? {
					Reference::Predefined(ch) | Reference::Char(_, ch) => value.push(ch),
					Reference::Entity(name) => {
						value.push('&');
						value.push_str(&name);
						value.push(';');
						entities.push(name);
					}
				},
				Some(ch) => value.push(ch),
			}
		}
	}

	// everything after `&`
	fn reference(&mut self, ctx: &'static str) -> Result<Reference> {
		if self.src.attempt('#')? {
			let mut digits = String::new();
			let base = if self.src.attempt('x')? {
				self.src.take(&CLASS_XML_HEXDIGIT, &mut digits)?;
				CharRefBase::Hexadecimal
			} else {
				self.src.take(&CLASS_XML_DIGIT, &mut digits)?;
				CharRefBase::Decimal
			};
			if digits.len() == 0 {
				return self.err(SyntaxError::InvalidReference(ctx));
			}
			self.src.expect(&';', ERRCTX_REF, Some(&["';'"]))?;
			let reference = CharRef::new(base, &digits);
			return match (reference.codepoint(), reference.value()) {
				(_, Some(ch)) if is_char(ch) => Ok(Reference::Char(reference, ch)),
				(Some(cp), _) => self.err(SyntaxError::InvalidChar(ctx, cp, true)),
				(None, _) => self.err(SyntaxError::InvalidReference(ctx)),
			};
		}

		let name = self.read_name(ERRCTX_REF)?;
		self.src.expect(&';', ERRCTX_REF, Some(&["';'"]))?;
		Ok(match PREDEFINED_ENTITIES.replacement(&name) {
			Some(ch) => Reference::Predefined(ch),
			None => Reference::Entity(name),
		})
	}

	// everything after `<!--`
	fn comment<S: EventSink + ?Sized>(&mut self, sink: &mut S) -> Result<()> {
		let mut data = String::new();
		loop {
			self.src.take(&NoneOf(&['-']), &mut data)?;
			if self.src.attempt_str("-->")? {
				break;
			}
			if self.src.lookahead_str("--")? {
				return self.err(SyntaxError::DoubleHyphenInComment);
			}
			match self.src.read()? {
				Some(ch) => data.push(ch),
				None => return self.err(SyntaxError::InvalidEof(ERRCTX_COMMENT)),
			}
		}
		sink.comment(&data);
		Ok(())
	}

	// everything after `<![CDATA[`
	fn cdata_section<S: EventSink + ?Sized>(&mut self, sink: &mut S) -> Result<()> {
		let mut data = String::new();
		loop {
			self.src.take(&NoneOf(&[']']), &mut data)?;
			if self.src.attempt_str("]]>")? {
				break;
			}
			match self.src.read()? {
				Some(ch) => data.push(ch),
				None => return self.err(SyntaxError::InvalidEof(ERRCTX_CDATA_SECTION)),
			}
		}
		sink.cdata(&data);
		Ok(())
	}

	// everything after `<?`
	fn processing_instruction<S: EventSink + ?Sized>(&mut self, sink: &mut S) -> Result<()> {
		let target = self.read_name(ERRCTX_PI)?;
		if target.len() == 3 && target.eq_ignore_ascii_case("xml") {
			return self.err(SyntaxError::ReservedPiTarget);
		}
		let mut data = String::new();
		if self.skip_space()? == 0 {
			if !self.src.attempt_str("?>")? {
				return match self.src.peek()? {
					None => self.err(SyntaxError::InvalidEof(ERRCTX_PI)),
					Some(_) => self.err(SyntaxError::MissingWhitespace(ERRCTX_PI)),
				};
			}
		} else {
			loop {
				self.src.take(&NoneOf(&['?']), &mut data)?;
				if self.src.attempt_str("?>")? {
					break;
				}
				match self.src.read()? {
					Some(ch) => data.push(ch),
					None => return self.err(SyntaxError::InvalidEof(ERRCTX_PI)),
				}
			}
		}
		sink.processing_instruction(&target, &data);
		Ok(())
	}

	fn epilog<S: EventSink + ?Sized>(&mut self, sink: &mut S) -> Result<()> {
		let mut ws = String::new();
		loop {
			ws.clear();
			if self.src.take(&CLASS_XML_SPACE, &mut ws)? > 0 {
				sink.whitespace(&ws);
			}
			match self.src.peek()? {
				None => return Ok(()),
				Some('<') => (),
				Some(ch) => {
					return self.err(SyntaxError::UnexpectedChar(
						ERRCTX_DOCEND,
						ch,
						Some(&["'<'"]),
					))
				}
			}
			if self.src.attempt_str("<?")? {
				self.processing_instruction(sink)?;
			} else if self.src.attempt_str("<!--")? {
				self.comment(sink)?;
			} else {
				return self.err(SyntaxError::InvalidSyntax(
					"only comments, processing instructions and whitespace may follow the root element",
				));
			}
		}
	}
}

fn flush_text<S: EventSink + ?Sized>(sink: &mut S, text: &mut String) {
	if text.len() > 0 {
		sink.text(text.as_str());
		text.clear();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[derive(Debug, Clone, PartialEq)]
	enum Ev {
		Decl(XmlDeclaration),
		StartNs(String, String),
		Start(String, Option<String>, Vec<(String, String, Option<String>)>),
		End(String),
		EndNs(String),
		Text(String),
		Ws(String),
		CData(String),
		Comment(String),
		Pi(String, String),
		EntityRef(String),
		CharRef(String, char),
		AttrEntity(String),
	}

	#[derive(Default)]
	struct Recorder {
		events: Vec<Ev>,
		ended: bool,
	}

	impl EventSink for Recorder {
		fn xml_declaration(&mut self, d: XmlDeclaration) {
			self.events.push(Ev::Decl(d));
		}

		fn start_prefix_mapping(&mut self, prefix: &str, uri: &NamespaceName) {
			self.events.push(Ev::StartNs(prefix.into(), uri.to_string()));
		}

		fn start_element(
			&mut self,
			name: &Name,
			namespace: Option<&NamespaceName>,
			attributes: Attributes,
		) {
			self.events.push(Ev::Start(
				name.to_string(),
				namespace.map(|ns| ns.to_string()),
				attributes
					.iter()
					.map(|a| {
						(
							a.name().to_string(),
							a.value().to_string(),
							a.namespace().map(str::to_string),
						)
					})
					.collect(),
			));
		}

		fn end_element(&mut self, name: &Name, _: Option<&NamespaceName>) {
			self.events.push(Ev::End(name.to_string()));
		}

		fn end_prefix_mapping(&mut self, prefix: &str) {
			self.events.push(Ev::EndNs(prefix.into()));
		}

		fn text(&mut self, text: &str) {
			self.events.push(Ev::Text(text.into()));
		}

		fn whitespace(&mut self, ws: &str) {
			self.events.push(Ev::Ws(ws.into()));
		}

		fn cdata(&mut self, data: &str) {
			self.events.push(Ev::CData(data.into()));
		}

		fn comment(&mut self, data: &str) {
			self.events.push(Ev::Comment(data.into()));
		}

		fn processing_instruction(&mut self, target: &str, data: &str) {
			self.events.push(Ev::Pi(target.into(), data.into()));
		}

		fn entity_ref(&mut self, name: &str) {
			self.events.push(Ev::EntityRef(name.into()));
		}

		fn char_ref(&mut self, reference: &CharRef, ch: char) {
			self.events.push(Ev::CharRef(reference.digits().into(), ch));
		}

		fn attribute_entity(&mut self, name: &str) {
			self.events.push(Ev::AttrEntity(name.into()));
		}

		fn end_document(&mut self) {
			self.ended = true;
		}
	}

	fn parse_with(doc: &str, options: ParserOptions) -> Result<Recorder> {
		let mut parser = Parser::with_options(doc.as_bytes(), options)?;
		let mut rec = Recorder::default();
		parser.parse(&mut rec)?;
		Ok(rec)
	}

	fn parse(doc: &str) -> Result<Vec<Ev>> {
		parse_with(doc, ParserOptions::default()).map(|rec| {
			assert!(rec.ended);
			rec.events
		})
	}

	fn syntax_error(doc: &str) -> (Location, SyntaxError) {
		match parse(doc) {
			Err(Error::InvalidSyntax(loc, e)) => (loc, e),
			other => panic!("unexpected result: {:?}", other),
		}
	}

	fn start(name: &str) -> Ev {
		Ev::Start(name.into(), None, Vec::new())
	}

	#[test]
	fn minimal_document() {
		assert_eq!(parse("<x/>").unwrap(), vec![start("x"), Ev::End("x".into())]);
	}

	#[test]
	fn xml_declaration_is_reported() {
		let evs = parse("<?xml version='1.0' encoding=\"utf-8\" ?><x/>").unwrap();
		match &evs[0] {
			Ev::Decl(d) => {
				assert_eq!(d.version(), Some("1.0"));
				assert_eq!(d.encoding(), Some("utf-8"));
				assert_eq!(d.standalone(), None);
			}
			other => panic!("unexpected event: {:?}", other),
		}
	}

	#[test]
	fn pi_named_like_declaration_prefix_is_not_a_declaration() {
		let evs = parse("<?xml-stylesheet href='a.css'?><x/>").unwrap();
		assert_eq!(evs[0], Ev::Pi("xml-stylesheet".into(), "href='a.css'".into()));
	}

	#[test]
	fn reserved_pi_target_is_rejected() {
		let (_, e) = syntax_error("<x><?XmL data?></x>");
		assert_eq!(e, SyntaxError::ReservedPiTarget);
		let (_, e) = syntax_error("<!-- c --><?xml version='1.0'?><x/>");
		assert_eq!(e, SyntaxError::ReservedPiTarget);
	}

	#[test]
	fn pi_data_follows_whitespace() {
		let evs = parse("<x><?t   some data ?><?u?></x>").unwrap();
		assert_eq!(evs[1], Ev::Pi("t".into(), "some data ".into()));
		assert_eq!(evs[2], Ev::Pi("u".into(), "".into()));
	}

	#[test]
	fn attributes_and_references() {
		let evs = parse("<x a=\"1 &lt; 2\" b='&#65;&#x42;' c=\"&foo;\"/>").unwrap();
		assert_eq!(evs[0], Ev::AttrEntity("foo".into()));
		assert_eq!(
			evs[1],
			Ev::Start(
				"x".into(),
				None,
				vec![
					("a".into(), "1 < 2".into(), None),
					("b".into(), "AB".into(), None),
					("c".into(), "&foo;".into(), None),
				]
			)
		);
	}

	#[test]
	fn text_references_are_split_out() {
		let evs = parse("<x>a&amp;b&#65;&bar;</x>").unwrap();
		assert_eq!(&evs[1..evs.len() - 1], &[
			Ev::Text("a".into()),
			Ev::Text("&".into()),
			Ev::Text("b".into()),
			Ev::CharRef("65".into(), 'A'),
			Ev::EntityRef("bar".into()),
		]);
	}

	#[test]
	fn invalid_char_reference() {
		let (_, e) = syntax_error("<x>&#0;</x>");
		assert_eq!(e, SyntaxError::InvalidChar(ERRCTX_TEXT, 0, true));
		let (_, e) = syntax_error("<x>&#xd800;</x>");
		assert_eq!(e, SyntaxError::InvalidChar(ERRCTX_TEXT, 0xd800, true));
		let (_, e) = syntax_error("<x>&#;</x>");
		assert_eq!(e, SyntaxError::InvalidReference(ERRCTX_TEXT));
	}

	#[test]
	fn cdata_end_in_text() {
		let (loc, e) = syntax_error("<r>]]></r>");
		assert_eq!(e, SyntaxError::CDataEndInText);
		assert_eq!(loc, Location { line: 1, column: 3 });
		// a lone bracket is fine
		let evs = parse("<r>a]b]]c</r>").unwrap();
		assert_eq!(evs[1], Ev::Text("a]b]]c".into()));
	}

	#[test]
	fn cdata_section_is_verbatim() {
		let evs = parse("<r><![CDATA[<&]]]]></r>").unwrap();
		assert_eq!(evs[1], Ev::CData("<&]]".into()));
	}

	#[test]
	fn comments() {
		let evs = parse("<!--a-b--><r><!----></r>").unwrap();
		assert_eq!(evs[0], Ev::Comment("a-b".into()));
		assert_eq!(evs[2], Ev::Comment("".into()));
		let (_, e) = syntax_error("<r><!-- a -- b --></r>");
		assert_eq!(e, SyntaxError::DoubleHyphenInComment);
		let (_, e) = syntax_error("<r><!-- a ---></r>");
		assert_eq!(e, SyntaxError::DoubleHyphenInComment);
	}

	#[test]
	fn doctype_is_skipped() {
		let doc = "<!DOCTYPE r SYSTEM \"r.dtd\" [\n<!ENTITY e \"]>\">\n<!-- ] > -->\n<?p ]>?>\n]>\n<r/>";
		let evs = parse(doc).unwrap();
		assert_eq!(evs, vec![Ev::Ws("\n".into()), start("r"), Ev::End("r".into())]);
	}

	#[test]
	fn second_doctype_is_rejected() {
		let (_, e) = syntax_error("<!DOCTYPE a><!DOCTYPE a><a/>");
		match e {
			SyntaxError::InvalidSyntax(_) => (),
			other => panic!("unexpected error: {:?}", other),
		}
	}

	#[test]
	fn mismatched_end_tag() {
		let (_, e) = syntax_error("<a><b></a></b>");
		assert_eq!(e, SyntaxError::ElementMismatch {
			expected: "b".into(),
			found: "a".into(),
		});
		let rec = parse_with("<a></b>", ParserOptions::default().check_end_tags(false)).unwrap();
		assert_eq!(rec.events, vec![start("a"), Ev::End("a".into())]);
	}

	#[test]
	fn duplicate_attribute() {
		let (_, e) = syntax_error("<a x='1' x='2'/>");
		assert_eq!(e, SyntaxError::DuplicateAttribute("x".into()));
	}

	#[test]
	fn attributes_need_whitespace() {
		let (_, e) = syntax_error("<a x='1'y='2'/>");
		assert_eq!(e, SyntaxError::MissingWhitespace(ERRCTX_ELEMENT));
	}

	#[test]
	fn lt_in_attribute_value() {
		let (loc, e) = syntax_error("<a x='<'/>");
		assert_eq!(e, SyntaxError::UnexpectedChar(ERRCTX_ATTVAL, '<', None));
		assert_eq!(loc, Location { line: 1, column: 6 });
	}

	#[test]
	fn eof_inside_element() {
		let (_, e) = syntax_error("<a><b>text");
		assert_eq!(e, SyntaxError::InvalidEof(ERRCTX_TEXT));
		let (_, e) = syntax_error("");
		assert_eq!(e, SyntaxError::InvalidEof(ERRCTX_DOCBEGIN));
	}

	#[test]
	fn no_end_document_on_error() {
		let mut parser = Parser::new(&b"<a>"[..]).unwrap();
		let mut rec = Recorder::default();
		assert!(parser.parse(&mut rec).is_err());
		assert!(!rec.ended);
	}

	#[test]
	fn content_after_root() {
		let evs = parse("<a/>\n<!--c--><?p?>\n").unwrap();
		assert_eq!(&evs[2..], &[
			Ev::Ws("\n".into()),
			Ev::Comment("c".into()),
			Ev::Pi("p".into(), "".into()),
			Ev::Ws("\n".into()),
		]);
		let (_, e) = syntax_error("<a/><b/>");
		match e {
			SyntaxError::InvalidSyntax(_) => (),
			other => panic!("unexpected error: {:?}", other),
		}
		let (_, e) = syntax_error("<a/>text");
		assert_eq!(e, SyntaxError::UnexpectedChar(ERRCTX_DOCEND, 't', Some(&["'<'"])));
	}

	#[test]
	fn prefix_mappings_bracket_elements() {
		let evs = parse("<a xmlns='urn:d' xmlns:p='urn:p'><p:b p:c='1'/></a>").unwrap();
		assert_eq!(evs, vec![
			Ev::StartNs("".into(), "urn:d".into()),
			Ev::StartNs("p".into(), "urn:p".into()),
			Ev::Start(
				"a".into(),
				Some("urn:d".into()),
				vec![
					("xmlns".into(), "urn:d".into(), None),
					("xmlns:p".into(), "urn:p".into(), None),
				]
			),
			Ev::Start(
				"p:b".into(),
				Some("urn:p".into()),
				vec![("p:c".into(), "1".into(), Some("urn:p".into()))]
			),
			Ev::End("p:b".into()),
			Ev::End("a".into()),
			Ev::EndNs("p".into()),
			Ev::EndNs("".into()),
		]);
	}

	#[test]
	fn undeclared_prefix_handling() {
		let evs = parse("<p:a/>").unwrap();
		assert_eq!(evs[0], Ev::Start("p:a".into(), None, Vec::new()));
		match parse_with("<p:a/>", ParserOptions::default().reject_undeclared_prefixes(true)) {
			Err(Error::InvalidSyntax(_, SyntaxError::UndeclaredPrefix(p))) => assert_eq!(p, "p"),
			other => panic!("unexpected result: {:?}", other.map(|r| r.events)),
		}
		match parse_with(
			"<a q:x='1'/>",
			ParserOptions::default().reject_undeclared_prefixes(true),
		) {
			Err(Error::InvalidSyntax(_, SyntaxError::UndeclaredPrefix(p))) => assert_eq!(p, "q"),
			other => panic!("unexpected result: {:?}", other.map(|r| r.events)),
		}
	}

	#[test]
	fn names_which_are_not_qnames() {
		let evs = parse("<a:b:c xmlns:a='urn:a' :='1'/>").unwrap();
		assert_eq!(evs[1], Ev::Start(
			"a:b:c".into(),
			Some("urn:a".into()),
			vec![
				("xmlns:a".into(), "urn:a".into(), None),
				(":".into(), "1".into(), None),
			]
		));
		let doc = crate::parse_str("<a:b:c xmlns:a='urn:a'/>").unwrap();
		assert_eq!(doc.root().prefix(), Some("a"));
		assert_eq!(doc.root().local_name(), "b:c");
		let strict = || ParserOptions::default().reject_undeclared_prefixes(true);
		match parse_with("<a:b:c xmlns:a='urn:a'/>", strict()) {
			Err(Error::InvalidSyntax(_, SyntaxError::InvalidQName(n))) => assert_eq!(n, "a:b:c"),
			other => panic!("unexpected result: {:?}", other.map(|r| r.events)),
		}
		match parse_with("<a x:='1'/>", strict()) {
			Err(Error::InvalidSyntax(_, SyntaxError::InvalidQName(n))) => assert_eq!(n, "x:"),
			other => panic!("unexpected result: {:?}", other.map(|r| r.events)),
		}
	}

	#[test]
	fn empty_prefixed_namespace_uri() {
		let (_, e) = syntax_error("<a xmlns:p=''/>");
		assert_eq!(e, SyntaxError::EmptyNamespaceUri("p".into()));
	}

	#[test]
	fn max_depth_tracks_nesting() {
		let mut parser = Parser::new(&b"<a><b><c/></b><b/></a>"[..]).unwrap();
		parser.parse(&mut Recorder::default()).unwrap();
		assert_eq!(parser.max_depth(), 3);
	}

	#[test]
	fn deep_nesting_does_not_recurse() {
		let depth = 100_000;
		let mut doc = String::new();
		for _ in 0..depth {
			doc.push_str("<a>");
		}
		for _ in 0..depth {
			doc.push_str("</a>");
		}
		struct Nothing;
		impl EventSink for Nothing {}
		let mut parser = Parser::new(doc.as_bytes()).unwrap();
		parser.parse(&mut Nothing).unwrap();
		assert_eq!(parser.max_depth(), depth);
	}

	#[test]
	fn error_location_spans_lines() {
		let (loc, e) = syntax_error("<a>\r\n  <b>]]></b></a>");
		assert_eq!(e, SyntaxError::CDataEndInText);
		assert_eq!(loc, Location { line: 2, column: 5 });
	}
}
