/*!
# Building a document tree from parser events
*/
use picoxml_validation::is_space;

use crate::parser::EventSink;
use crate::strings::{Name, NamespaceName};

use super::{
	Attributes, CharRef, Document, Element, Misc, Miscs, Node, ProcessingInstruction,
	XmlDeclaration,
};

struct Frame {
	name: Name,
	namespace: Option<NamespaceName>,
	attributes: Attributes,
	children: Vec<Node>,
}

/**
# Tree-building event sink

Collects parser events into a [`Document`]. Adjacent text fragments are
coalesced into one node: a node which consists only of XML whitespace becomes
[`Node::WhiteSpace`], anything else [`Node::Text`].

```rust
use picoxml::{Parser, model::{Node, TreeBuilder}};

let mut parser = Parser::new(&b"<a>x &amp; y<b/> </a>"[..]).unwrap();
let mut builder = TreeBuilder::new();
parser.parse(&mut builder).unwrap();
let doc = builder.into_document().unwrap();
let children: Vec<_> = doc.root().children().iter().collect();
assert_eq!(children[0], &Node::Text("x & y".into()));
assert_eq!(children[2], &Node::WhiteSpace(" ".into()));
```
*/
#[derive(Default)]
pub struct TreeBuilder {
	declaration: Option<XmlDeclaration>,
	before: Vec<Misc>,
	after: Vec<Misc>,
	root: Option<Element>,
	stack: Vec<Frame>,
	pending: String,
}

impl TreeBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	/// The finished document, or `None` if no root element was completed.
	pub fn into_document(self) -> Option<Document> {
		let root = self.root?;
		Some(Document::new(
			self.declaration,
			Miscs::from(self.before),
			root,
			Miscs::from(self.after),
		))
	}

	fn flush_text(&mut self) {
		if self.pending.len() == 0 {
			return;
		}
		let text = std::mem::replace(&mut self.pending, String::new());
		let node = if text.chars().all(is_space) {
			Node::WhiteSpace(text)
		} else {
			Node::Text(text)
		};
		if let Some(frame) = self.stack.last_mut() {
			frame.children.push(node);
		}
	}

	// append to the open element, or to the misc list before or after the
	// root
	fn push_node(&mut self, node: Node, misc: impl FnOnce() -> Misc) {
		self.flush_text();
		match self.stack.last_mut() {
			Some(frame) => frame.children.push(node),
			None if self.root.is_none() => self.before.push(misc()),
			None => self.after.push(misc()),
		}
	}
}

impl EventSink for TreeBuilder {
	fn xml_declaration(&mut self, declaration: XmlDeclaration) {
		self.declaration = Some(declaration);
	}

	fn start_element(
		&mut self,
		name: &Name,
		namespace: Option<&NamespaceName>,
		attributes: Attributes,
	) {
		self.flush_text();
		self.stack.push(Frame {
			name: name.clone(),
			namespace: namespace.cloned(),
			attributes,
			children: Vec::new(),
		});
	}

	fn end_element(&mut self, _name: &Name, _namespace: Option<&NamespaceName>) {
		self.flush_text();
		let frame = match self.stack.pop() {
			Some(frame) => frame,
			None => return,
		};
		let element = Element::new(
			frame.name,
			frame.attributes,
			frame.children.into(),
			frame.namespace,
		);
		match self.stack.last_mut() {
			Some(parent) => parent.children.push(Node::Element(element)),
			None => self.root = Some(element),
		}
	}

	fn text(&mut self, text: &str) {
		self.pending.push_str(text);
	}

	fn whitespace(&mut self, whitespace: &str) {
		let ws = whitespace.to_string();
		self.push_node(Node::WhiteSpace(ws.clone()), move || Misc::WhiteSpace(ws));
	}

	fn cdata(&mut self, data: &str) {
		self.flush_text();
		if let Some(frame) = self.stack.last_mut() {
			frame.children.push(Node::CData(data.into()));
		}
	}

	fn comment(&mut self, data: &str) {
		let data = data.to_string();
		self.push_node(Node::Comment(data.clone()), move || Misc::Comment(data));
	}

	fn processing_instruction(&mut self, target: &str, data: &str) {
		let pi = ProcessingInstruction::new(target, data);
		self.push_node(Node::ProcessingInstruction(pi.clone()), move || {
			Misc::ProcessingInstruction(pi)
		});
	}

	fn entity_ref(&mut self, name: &str) {
		self.flush_text();
		if let Some(frame) = self.stack.last_mut() {
			frame.children.push(Node::EntityRef(name.into()));
		}
	}

	fn char_ref(&mut self, reference: &CharRef, _ch: char) {
		self.flush_text();
		if let Some(frame) = self.stack.last_mut() {
			frame.children.push(Node::CharRef(reference.clone()));
		}
	}
}
