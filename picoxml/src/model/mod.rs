/*!
# In-memory document model

A [`Document`] holds the optional XML declaration, the miscellaneous nodes
before and after the root element, and the root [`Element`] itself. All
types are plain owned data; the parser assigns namespaces while building them
and nothing changes afterwards.
*/
use std::iter::FromIterator;
use std::slice;
use std::vec;

use smartstring::alias::String as SmartString;

use crate::strings::{Name, NamespaceName};

pub mod builder;

pub use builder::TreeBuilder;

/// An attribute with its already unescaped value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
	name: Name,
	value: String,
	namespace: Option<NamespaceName>,
}

impl Attribute {
	pub fn new<V: Into<String>>(name: Name, value: V) -> Self {
		Self {
			name,
			value: value.into(),
			namespace: None,
		}
	}

	pub fn with_namespace(mut self, namespace: Option<NamespaceName>) -> Self {
		self.namespace = namespace;
		self
	}

	pub fn name(&self) -> &Name {
		&self.name
	}

	pub fn prefix(&self) -> Option<&str> {
		self.name.prefix()
	}

	pub fn local_name(&self) -> &str {
		self.name.local_name()
	}

	pub fn value(&self) -> &str {
		&self.value
	}

	/// Namespace URI; always `None` for unprefixed and `xmlns` attributes.
	pub fn namespace(&self) -> Option<&str> {
		self.namespace.as_deref()
	}

	pub fn is_namespace_declaration(&self) -> bool {
		self.name.is_namespace_declaration()
	}
}

/// Attributes of one element in document order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Attributes(Vec<Attribute>);

impl Attributes {
	pub const EMPTY: Attributes = Attributes(Vec::new());

	pub fn new() -> Self {
		Self(Vec::new())
	}

	pub fn push(&mut self, attribute: Attribute) {
		self.0.push(attribute);
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn iter(&self) -> slice::Iter<'_, Attribute> {
		self.0.iter()
	}

	/// First unprefixed attribute with the given local name.
	pub fn get(&self, local_name: &str) -> Option<&Attribute> {
		self.iter()
			.find(|a| a.prefix().is_none() && a.local_name() == local_name)
	}

	/// First attribute with the given prefix and local name.
	pub fn get_prefixed(&self, prefix: &str, local_name: &str) -> Option<&Attribute> {
		self.iter()
			.find(|a| a.prefix() == Some(prefix) && a.local_name() == local_name)
	}

	/// First attribute in the given namespace with the given local name.
	pub fn get_namespaced(&self, namespace: &str, local_name: &str) -> Option<&Attribute> {
		self.iter()
			.find(|a| a.namespace() == Some(namespace) && a.local_name() == local_name)
	}

	/// Value of the first unprefixed attribute with the given local name.
	pub fn value(&self, local_name: &str) -> Option<&str> {
		self.get(local_name).map(|a| a.value())
	}
}

impl FromIterator<Attribute> for Attributes {
	fn from_iter<I: IntoIterator<Item = Attribute>>(iter: I) -> Self {
		Self(iter.into_iter().collect())
	}
}

impl IntoIterator for Attributes {
	type Item = Attribute;
	type IntoIter = vec::IntoIter<Attribute>;

	fn into_iter(self) -> Self::IntoIter {
		self.0.into_iter()
	}
}

impl<'a> IntoIterator for &'a Attributes {
	type Item = &'a Attribute;
	type IntoIter = slice::Iter<'a, Attribute>;

	fn into_iter(self) -> Self::IntoIter {
		self.0.iter()
	}
}

/// Radix of a character reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharRefBase {
	/// `&#N;`
	Decimal,
	/// `&#xH;`
	Hexadecimal,
}

impl CharRefBase {
	pub fn radix(&self) -> u32 {
		match self {
			Self::Decimal => 10,
			Self::Hexadecimal => 16,
		}
	}
}

/// A character reference as written in the source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CharRef {
	base: CharRefBase,
	digits: SmartString,
}

impl CharRef {
	pub fn new(base: CharRefBase, digits: &str) -> Self {
		Self {
			base,
			digits: digits.into(),
		}
	}

	/// Reference denoting `ch` in the given base.
	pub fn from_char(ch: char, base: CharRefBase) -> Self {
		let digits = match base {
			CharRefBase::Decimal => format!("{}", ch as u32),
			CharRefBase::Hexadecimal => format!("{:x}", ch as u32),
		};
		Self::new(base, &digits)
	}

	pub fn base(&self) -> CharRefBase {
		self.base
	}

	pub fn digits(&self) -> &str {
		&self.digits
	}

	/// Code point denoted by the digits, `None` on overflow.
	pub fn codepoint(&self) -> Option<u32> {
		u32::from_str_radix(&self.digits, self.base.radix()).ok()
	}

	/// Character denoted by the reference, if it is a Unicode scalar value.
	pub fn value(&self) -> Option<char> {
		self.codepoint().and_then(std::char::from_u32)
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingInstruction {
	target: String,
	data: String,
}

impl ProcessingInstruction {
	pub fn new<T: Into<String>, D: Into<String>>(target: T, data: D) -> Self {
		Self {
			target: target.into(),
			data: data.into(),
		}
	}

	pub fn target(&self) -> &str {
		&self.target
	}

	/// Everything between the whitespace after the target and `?>`.
	pub fn data(&self) -> &str {
		&self.data
	}
}

/// Content of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
	Element(Element),
	/// Character data with predefined entities expanded.
	Text(String),
	/// A run of `S` characters.
	WhiteSpace(String),
	/// Contents of a CDATA section.
	CData(String),
	/// Contents of a comment.
	Comment(String),
	ProcessingInstruction(ProcessingInstruction),
	/// Reference to an entity other than the predefined ones.
	EntityRef(String),
	CharRef(CharRef),
}

impl Node {
	pub fn as_element(&self) -> Option<&Element> {
		match self {
			Self::Element(el) => Some(el),
			_ => None,
		}
	}
}

/// Ordered children of an element.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Nodes(Vec<Node>);

impl Nodes {
	pub const EMPTY: Nodes = Nodes(Vec::new());

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn get(&self, index: usize) -> Option<&Node> {
		self.0.get(index)
	}

	pub fn iter(&self) -> slice::Iter<'_, Node> {
		self.0.iter()
	}
}

impl From<Vec<Node>> for Nodes {
	fn from(other: Vec<Node>) -> Self {
		Self(other)
	}
}

impl FromIterator<Node> for Nodes {
	fn from_iter<I: IntoIterator<Item = Node>>(iter: I) -> Self {
		Self(iter.into_iter().collect())
	}
}

impl<'a> IntoIterator for &'a Nodes {
	type Item = &'a Node;
	type IntoIter = slice::Iter<'a, Node>;

	fn into_iter(self) -> Self::IntoIter {
		self.0.iter()
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
	name: Name,
	attributes: Attributes,
	children: Nodes,
	namespace: Option<NamespaceName>,
}

impl Element {
	pub fn new(
		name: Name,
		attributes: Attributes,
		children: Nodes,
		namespace: Option<NamespaceName>,
	) -> Self {
		Self {
			name,
			attributes,
			children,
			namespace,
		}
	}

	pub fn name(&self) -> &Name {
		&self.name
	}

	pub fn prefix(&self) -> Option<&str> {
		self.name.prefix()
	}

	pub fn local_name(&self) -> &str {
		self.name.local_name()
	}

	pub fn attributes(&self) -> &Attributes {
		&self.attributes
	}

	pub fn children(&self) -> &Nodes {
		&self.children
	}

	pub fn namespace(&self) -> Option<&str> {
		self.namespace.as_deref()
	}

	/// Direct child elements in document order.
	pub fn child_elements(&self) -> impl Iterator<Item = &Element> + '_ {
		self.children.iter().filter_map(Node::as_element)
	}

	/// First direct child element with the given local name.
	pub fn child(&self, local_name: &str) -> Option<&Element> {
		self.child_elements().find(|el| el.local_name() == local_name)
	}

	/// Concatenated character data of the direct children.
	///
	/// Character references contribute their character; entity references
	/// and nested elements contribute nothing.
	pub fn text(&self) -> String {
		let mut out = String::new();
		for child in self.children.iter() {
			match child {
				Node::Text(s) | Node::WhiteSpace(s) | Node::CData(s) => out.push_str(s),
				Node::CharRef(r) => {
					if let Some(ch) = r.value() {
						out.push(ch);
					}
				}
				_ => (),
			}
		}
		out
	}
}

/// Node allowed outside of the root element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Misc {
	Comment(String),
	ProcessingInstruction(ProcessingInstruction),
	WhiteSpace(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Miscs(Vec<Misc>);

impl Miscs {
	pub const EMPTY: Miscs = Miscs(Vec::new());

	pub fn push(&mut self, misc: Misc) {
		self.0.push(misc);
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn iter(&self) -> slice::Iter<'_, Misc> {
		self.0.iter()
	}
}

impl From<Vec<Misc>> for Miscs {
	fn from(other: Vec<Misc>) -> Self {
		Self(other)
	}
}

impl<'a> IntoIterator for &'a Miscs {
	type Item = &'a Misc;
	type IntoIter = slice::Iter<'a, Misc>;

	fn into_iter(self) -> Self::IntoIter {
		self.0.iter()
	}
}

/// The `<?xml ... ?>` declaration.
///
/// Pseudo-attributes are stored as written; their values are not checked.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlDeclaration {
	attributes: Attributes,
}

impl XmlDeclaration {
	pub fn new(attributes: Attributes) -> Self {
		Self { attributes }
	}

	pub fn attributes(&self) -> &Attributes {
		&self.attributes
	}

	pub fn version(&self) -> Option<&str> {
		self.attributes.value("version")
	}

	pub fn encoding(&self) -> Option<&str> {
		self.attributes.value("encoding")
	}

	pub fn standalone(&self) -> Option<&str> {
		self.attributes.value("standalone")
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
	declaration: Option<XmlDeclaration>,
	before: Miscs,
	root: Element,
	after: Miscs,
}

impl Document {
	pub fn new(
		declaration: Option<XmlDeclaration>,
		before: Miscs,
		root: Element,
		after: Miscs,
	) -> Self {
		Self {
			declaration,
			before,
			root,
			after,
		}
	}

	pub fn declaration(&self) -> Option<&XmlDeclaration> {
		self.declaration.as_ref()
	}

	/// Miscellaneous nodes between the declaration and the root element.
	pub fn before(&self) -> &Miscs {
		&self.before
	}

	pub fn root(&self) -> &Element {
		&self.root
	}

	/// Miscellaneous nodes after the root element.
	pub fn after(&self) -> &Miscs {
		&self.after
	}
}
