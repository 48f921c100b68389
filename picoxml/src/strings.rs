/*!
# Names and namespace URIs

[`Name`] is the `(prefix?, localName)` pair used for elements and attributes.
It is produced by splitting a raw XML `Name` token at its first colon.
Namespace URIs are carried as [`NamespaceName`], a shared string, because the
same URI is usually attached to many elements of one document.
*/
use std::convert::TryFrom;
use std::fmt;
use std::sync::Arc;

use smartstring::alias::String as SmartString;

use picoxml_validation::{validate_name, Error as ValidationError};

/// Shared namespace URI.
pub type NamespaceName = Arc<str>;

/// XML namespace URI (for the `xml:` prefix)
pub const XMLNS_XML: &'static str = "http://www.w3.org/XML/1998/namespace";

/// XMLNS namespace URI (for the `xmlns:` prefix)
pub const XMLNS_XMLNS: &'static str = "http://www.w3.org/2000/xmlns/";

pub const PREFIX_XML: &'static str = "xml";
pub const PREFIX_XMLNS: &'static str = "xmlns";

/**
An element or attribute name, split into optional prefix and local name.

Equality is structural.

The local name of a well-formed qualified name contains no colon. Names which
are not qualified names are still accepted by [`Name::parse`]: everything
after the first colon becomes the local name (`a:b:c` has the local name
`b:c`), and a token with a leading or trailing colon is kept whole. Use
[`Name::is_qname`] to tell these apart.

```rust
use picoxml::Name;

let nm = Name::parse("x:delta");
assert_eq!(nm.prefix(), Some("x"));
assert_eq!(nm.local_name(), "delta");
assert_eq!(nm.to_string(), "x:delta");
```
*/
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name {
	prefix: Option<SmartString>,
	local_name: SmartString,
}

impl Name {
	/// Construct a name from its parts without validation.
	pub fn new(prefix: Option<&str>, local_name: &str) -> Name {
		Name {
			prefix: prefix.map(SmartString::from),
			local_name: SmartString::from(local_name),
		}
	}

	/// Construct an unprefixed name without validation.
	pub fn local(local_name: &str) -> Name {
		Name::new(None, local_name)
	}

	/// Split a raw name token on its first colon.
	///
	/// A token whose colon is leading or trailing does not form a qualified
	/// name; such a token is kept whole as the local name.
	pub fn parse(raw: &str) -> Name {
		match raw.find(':') {
			Some(pos) if pos > 0 && pos < raw.len() - 1 => {
				Name::new(Some(&raw[..pos]), &raw[pos + 1..])
			}
			_ => Name::local(raw),
		}
	}

	pub fn prefix(&self) -> Option<&str> {
		self.prefix.as_deref()
	}

	pub fn local_name(&self) -> &str {
		&self.local_name
	}

	/// True if prefix (when present) and local name are non-empty and free
	/// of colons, as required by the namespaces recommendation.
	pub fn is_qname(&self) -> bool {
		let part_ok = |s: &str| s.len() > 0 && !s.contains(':');
		self.prefix().map(part_ok).unwrap_or(true) && part_ok(self.local_name())
	}

	/// True if the name carries a prefix.
	pub fn is_qualified(&self) -> bool {
		self.prefix.is_some()
	}

	/// True for `xmlns` and `xmlns:*` attribute names.
	pub fn is_namespace_declaration(&self) -> bool {
		match self.prefix() {
			None => self.local_name() == PREFIX_XMLNS,
			Some(prefix) => prefix == PREFIX_XMLNS,
		}
	}

	/// Compare against a raw `prefix:local` token without allocating.
	pub fn matches_raw(&self, raw: &str) -> bool {
		match self.prefix() {
			None => self.local_name() == raw,
			Some(prefix) => {
				raw.len() == prefix.len() + 1 + self.local_name.len()
					&& raw.starts_with(prefix)
					&& raw[prefix.len()..].starts_with(':')
					&& raw.ends_with(self.local_name())
			}
		}
	}
}

impl fmt::Display for Name {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		if let Some(prefix) = self.prefix() {
			f.write_str(prefix)?;
			f.write_str(":")?;
		}
		f.write_str(&self.local_name)
	}
}

impl TryFrom<&str> for Name {
	type Error = ValidationError;

	/// Validate the token against the `Name` production, then split it.
	fn try_from(other: &str) -> Result<Self, Self::Error> {
		validate_name(other)?;
		Ok(Name::parse(other))
	}
}
