/*!
# Namespace scope tracking

[`NamespaceScope`] keeps the prefix bindings which are visible at the current
element. Each element gets a frame recording what its start tag declared;
lookups go through a per-prefix stack of URIs, so neither push, pop nor lookup
need to walk the frames.
*/
use std::collections::HashMap;
use std::sync::Arc;

use log::trace;
use smartstring::alias::String as SmartString;

use crate::error::SyntaxError;
use crate::model::Attributes;
use crate::strings::{Name, NamespaceName, PREFIX_XML, XMLNS_XML};

/// A prefix binding introduced by a start tag.
///
/// The default namespace uses the empty prefix. An empty URI on the default
/// namespace means that the default namespace is undeclared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixMapping {
	pub prefix: SmartString,
	pub uri: NamespaceName,
}

#[derive(Debug, Default)]
struct Frame {
	// prefixes in declaration order; "" is the default namespace
	declared: Vec<SmartString>,
}

/**
# Namespace binding stack

Usage protocol: call [`push`](Self::push) with the raw attributes of each
start tag, resolve names while the frame is on top, and call
[`pop`](Self::pop) once the element ends.
*/
#[derive(Debug)]
pub struct NamespaceScope {
	fixed_xml_namespace: NamespaceName,
	frames: Vec<Frame>,
	prefixes: HashMap<SmartString, Vec<NamespaceName>>,
	defaults: Vec<NamespaceName>,
}

impl Default for NamespaceScope {
	fn default() -> Self {
		Self::new()
	}
}

impl NamespaceScope {
	pub fn new() -> Self {
		Self {
			fixed_xml_namespace: Arc::from(XMLNS_XML),
			frames: Vec::new(),
			prefixes: HashMap::new(),
			defaults: Vec::new(),
		}
	}

	/// Number of open frames.
	pub fn depth(&self) -> usize {
		self.frames.len()
	}

	/// Open a frame for a start tag and return the bindings it declares, in
	/// attribute order.
	pub fn push(&mut self, attributes: &Attributes) -> Result<Vec<PrefixMapping>, SyntaxError> {
		let mut frame = Frame::default();
		let mut mappings = Vec::new();
		for attr in attributes.iter() {
			let prefix: SmartString = match attr.prefix() {
				None if attr.local_name() == "xmlns" => SmartString::new(),
				Some("xmlns") => {
					if attr.value().is_empty() {
						self.discard(frame);
						return Err(SyntaxError::EmptyNamespaceUri(attr.local_name().to_string()));
					}
					attr.local_name().into()
				}
				_ => continue,
			};
			let uri: NamespaceName = Arc::from(attr.value());
			if prefix.is_empty() {
				self.defaults.push(uri.clone());
			} else {
				self.prefixes
					.entry(prefix.clone())
					.or_insert_with(Vec::new)
					.push(uri.clone());
			}
			frame.declared.push(prefix.clone());
			mappings.push(PrefixMapping { prefix, uri });
		}
		trace!(
			"namespace frame {} declares {} binding(s)",
			self.frames.len() + 1,
			mappings.len()
		);
		self.frames.push(frame);
		Ok(mappings)
	}

	// undo the bindings of a frame which was never pushed
	fn discard(&mut self, frame: Frame) {
		for prefix in frame.declared.iter().rev() {
			self.unbind(prefix);
		}
	}

	fn unbind(&mut self, prefix: &str) {
		if prefix.is_empty() {
			self.defaults.pop();
			return;
		}
		let now_empty = match self.prefixes.get_mut(prefix) {
			Some(stack) => {
				stack.pop();
				stack.is_empty()
			}
			None => false,
		};
		if now_empty {
			self.prefixes.remove(prefix);
		}
	}

	/// Close the innermost frame.
	///
	/// Returns the prefixes it declared in reverse declaration order.
	pub fn pop(&mut self) -> Vec<SmartString> {
		let mut frame = match self.frames.pop() {
			Some(frame) => frame,
			None => return Vec::new(),
		};
		frame.declared.reverse();
		for prefix in frame.declared.iter() {
			self.unbind(prefix);
		}
		trace!("namespace frame {} closed", self.frames.len() + 1);
		frame.declared
	}

	/// URI bound to `prefix`, or the default namespace for `None`.
	pub fn lookup_prefix(&self, prefix: Option<&str>) -> Option<&NamespaceName> {
		match prefix {
			None => self.defaults.last().filter(|uri| uri.len() > 0),
			Some(prefix) => match self.prefixes.get(prefix).and_then(|stack| stack.last()) {
				Some(uri) => Some(uri),
				None if prefix == PREFIX_XML => Some(&self.fixed_xml_namespace),
				None => None,
			},
		}
	}

	/// Namespace of an element name: its prefix binding, or the default
	/// namespace when unprefixed.
	pub fn resolve_element(&self, name: &Name) -> Option<NamespaceName> {
		self.lookup_prefix(name.prefix()).cloned()
	}

	/// Namespace of an attribute name.
	///
	/// Unprefixed attributes and namespace declarations have none.
	pub fn resolve_attribute(&self, name: &Name) -> Option<NamespaceName> {
		if name.is_namespace_declaration() {
			return None;
		}
		match name.prefix() {
			None => None,
			Some(prefix) => self.lookup_prefix(Some(prefix)).cloned(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	use crate::model::Attribute;

	fn attrs(pairs: &[(&str, &str)]) -> Attributes {
		pairs
			.iter()
			.map(|(k, v)| Attribute::new(Name::parse(k), *v))
			.collect()
	}

	#[test]
	fn default_namespace_applies_to_elements_only() {
		let mut scope = NamespaceScope::new();
		let mappings = scope.push(&attrs(&[("xmlns", "urn:d1"), ("a", "b")])).unwrap();
		assert_eq!(mappings.len(), 1);
		assert_eq!(mappings[0].prefix, "");
		assert_eq!(&*mappings[0].uri, "urn:d1");
		assert_eq!(scope.resolve_element(&Name::local("x")).as_deref(), Some("urn:d1"));
		assert_eq!(scope.resolve_attribute(&Name::local("a")), None);
	}

	#[test]
	fn prefixes_shadow_and_restore() {
		let mut scope = NamespaceScope::new();
		scope.push(&attrs(&[("xmlns:x", "urn:outer")])).unwrap();
		scope.push(&attrs(&[("xmlns:x", "urn:inner")])).unwrap();
		assert_eq!(scope.resolve_element(&Name::parse("x:a")).as_deref(), Some("urn:inner"));
		assert_eq!(scope.pop(), vec![SmartString::from("x")]);
		assert_eq!(scope.resolve_element(&Name::parse("x:a")).as_deref(), Some("urn:outer"));
		scope.pop();
		assert_eq!(scope.resolve_element(&Name::parse("x:a")), None);
		assert_eq!(scope.depth(), 0);
	}

	#[test]
	fn empty_default_undeclares() {
		let mut scope = NamespaceScope::new();
		scope.push(&attrs(&[("xmlns", "urn:d")])).unwrap();
		let mappings = scope.push(&attrs(&[("xmlns", "")])).unwrap();
		assert_eq!(&*mappings[0].uri, "");
		assert_eq!(scope.resolve_element(&Name::local("e")), None);
		scope.pop();
		assert_eq!(scope.resolve_element(&Name::local("e")).as_deref(), Some("urn:d"));
	}

	#[test]
	fn empty_prefixed_uri_is_rejected() {
		let mut scope = NamespaceScope::new();
		match scope.push(&attrs(&[("xmlns", "urn:d"), ("xmlns:p", "")])) {
			Err(SyntaxError::EmptyNamespaceUri(p)) => assert_eq!(p, "p"),
			other => panic!("unexpected result: {:?}", other),
		}
		// the partial frame must not leak
		assert_eq!(scope.resolve_element(&Name::local("e")), None);
		assert_eq!(scope.depth(), 0);
	}

	#[test]
	fn pop_reverses_declaration_order() {
		let mut scope = NamespaceScope::new();
		scope
			.push(&attrs(&[("xmlns:a", "urn:a"), ("xmlns", "urn:d"), ("xmlns:b", "urn:b")]))
			.unwrap();
		let ended = scope.pop();
		assert_eq!(ended, vec![
			SmartString::from("b"),
			SmartString::from(""),
			SmartString::from("a"),
		]);
	}

	#[test]
	fn xml_prefix_is_predeclared() {
		let scope = NamespaceScope::new();
		assert_eq!(
			scope.resolve_attribute(&Name::parse("xml:lang")).as_deref(),
			Some(XMLNS_XML)
		);
	}

	#[test]
	fn namespace_declarations_have_no_namespace() {
		let mut scope = NamespaceScope::new();
		scope.push(&attrs(&[("xmlns:x", "urn:x")])).unwrap();
		assert_eq!(scope.resolve_attribute(&Name::parse("xmlns:x")), None);
		assert_eq!(scope.resolve_attribute(&Name::parse("x:c")).as_deref(), Some("urn:x"));
	}
}
