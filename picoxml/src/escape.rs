/*!
# Predefined entities, escaping and unescaping

Only the five entities predefined by XML 1.0 are known: `amp`, `lt`, `gt`,
`quot` and `apos`. Anything else is reported, never resolved.
*/
use std::borrow::Cow;

use bytes::BufMut;

/// Bijection between the predefined entity names and their replacement
/// characters.
#[derive(Debug)]
pub struct EntityTable {
	entries: &'static [(&'static str, char)],
}

/// The five entities every XML processor must know.
pub static PREDEFINED_ENTITIES: EntityTable = EntityTable {
	entries: &[
		("amp", '&'),
		("lt", '<'),
		("gt", '>'),
		("quot", '"'),
		("apos", '\''),
	],
};

impl EntityTable {
	/// Replacement character for an entity name.
	pub fn replacement(&self, name: &str) -> Option<char> {
		self.entries
			.iter()
			.find(|(entity, _)| *entity == name)
			.map(|(_, ch)| *ch)
	}

	/// Entity name for a replacement character.
	pub fn entity_name(&self, ch: char) -> Option<&'static str> {
		self.entries
			.iter()
			.find(|(_, replacement)| *replacement == ch)
			.map(|(entity, _)| *entity)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&'static str, char)> + '_ {
		self.entries.iter().copied()
	}
}

/// Characters replaced by [`escape`].
pub(crate) const TEXT_SPECIALS: &'static [u8] = b"&<>\"'";

/// Characters replaced in attribute values; whitespace other than the space
/// is written as a character reference so that it survives a re-parse.
pub(crate) const ATTR_SPECIALS: &'static [u8] = b"&<>\"'\r\n\t";

// all replacement characters are ASCII, so a byte scan is safe
fn is_special(b: u8) -> bool {
	TEXT_SPECIALS.contains(&b)
}

fn entity_ref(b: u8) -> &'static str {
	match b {
		b'&' => "&amp;",
		b'<' => "&lt;",
		b'>' => "&gt;",
		b'"' => "&quot;",
		b'\'' => "&apos;",
		b'\r' => "&#xd;",
		b'\n' => "&#xa;",
		b'\t' => "&#x9;",
		_ => panic!("unexpected special character?!"),
	}
}

/// Escape the `specials` found in `data` into a byte buffer.
pub(crate) fn escape_into<B: BufMut>(out: &mut B, data: &str, specials: &[u8]) {
	let data = data.as_bytes();
	let mut last_index = 0;
	for i in 0..data.len() {
		let ch = data[i];
		if !specials.contains(&ch) {
			continue;
		}
		if i > last_index {
			out.put_slice(&data[last_index..i]);
		}
		out.put_slice(entity_ref(ch).as_bytes());
		last_index = i + 1;
	}
	out.put_slice(&data[last_index..data.len()]);
}

/**
Replace `&`, `<`, `>`, `"` and `'` with references to the predefined
entities.

Escaping is not idempotent: an already escaped string has its `&` escaped
again.

```rust
use picoxml::escape;

assert_eq!(escape("a&b<c>d\"e'f"), "a&amp;b&lt;c&gt;d&quot;e&apos;f");
assert_eq!(escape("&amp;"), "&amp;amp;");
```
*/
pub fn escape(data: &str) -> Cow<'_, str> {
	if !data.bytes().any(is_special) {
		return Cow::Borrowed(data);
	}
	let mut out = String::with_capacity(data.len() + 16);
	let mut last_index = 0;
	for (i, b) in data.bytes().enumerate() {
		if is_special(b) {
			out.push_str(&data[last_index..i]);
			out.push_str(entity_ref(b));
			last_index = i + 1;
		}
	}
	out.push_str(&data[last_index..]);
	Cow::Owned(out)
}

/// Result of [`unescape`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Unescaped {
	/// The unescaped text.
	pub value: String,
	/// Names of entities which are not predefined, in order of appearance.
	///
	/// These references are copied into `value` unchanged.
	pub unrecognized_entities: Vec<String>,
	/// True if an `&` without a terminating `;` was found.
	///
	/// Such an ampersand is treated as if it had been written as `&amp;`.
	pub contains_unterminated_ampersand: bool,
}

/**
Replace references to the predefined entities with their characters.

Unknown entities and unterminated ampersands are reported in the result
instead of failing.

```rust
use picoxml::unescape;

let u = unescape("1 &lt; 2 &foo; &");
assert_eq!(u.value, "1 < 2 &foo; &");
assert_eq!(u.unrecognized_entities, vec!["foo".to_string()]);
assert!(u.contains_unterminated_ampersand);
```
*/
pub fn unescape(data: &str) -> Unescaped {
	let mut result = Unescaped::default();
	result.value.reserve(data.len());
	let mut rest = data;
	while let Some(amp) = rest.find('&') {
		result.value.push_str(&rest[..amp]);
		let after = &rest[amp + 1..];
		match after.find(';') {
			None => {
				result.contains_unterminated_ampersand = true;
				result.value.push('&');
				rest = after;
			}
			Some(semi) => {
				let name = &after[..semi];
				match PREDEFINED_ENTITIES.replacement(name) {
					Some(ch) => result.value.push(ch),
					None => {
						result.unrecognized_entities.push(name.to_string());
						result.value.push('&');
						result.value.push_str(name);
						result.value.push(';');
					}
				}
				rest = &after[semi + 1..];
			}
		}
	}
	result.value.push_str(rest);
	result
}

#[cfg(test)]
mod tests {
	use super::*;

	const PLAIN: &'static str = "alpha \" bravo ' charlie & delta < echo > foxtrot \" golf \" hotel \" india";
	const ESCAPED: &'static str = "alpha &quot; bravo &apos; charlie &amp; delta &lt; echo &gt; foxtrot &quot; golf &quot; hotel &quot; india";

	#[test]
	fn entity_table_is_a_bijection() {
		for (name, ch) in PREDEFINED_ENTITIES.iter() {
			assert_eq!(PREDEFINED_ENTITIES.replacement(name), Some(ch));
			assert_eq!(PREDEFINED_ENTITIES.entity_name(ch), Some(name));
		}
		assert_eq!(PREDEFINED_ENTITIES.replacement("nbsp"), None);
		assert_eq!(PREDEFINED_ENTITIES.entity_name('x'), None);
	}

	#[test]
	fn escape_replaces_all_specials_left_to_right() {
		assert_eq!(escape(PLAIN), ESCAPED);
	}

	#[test]
	fn escape_borrows_when_nothing_to_do() {
		assert!(matches!(escape("nothing special here"), Cow::Borrowed(_)));
	}

	#[test]
	fn escape_keeps_non_ascii_intact() {
		assert_eq!(escape("äöü <€>"), "äöü &lt;€&gt;");
	}

	#[test]
	fn escape_into_buffer() {
		let mut buf = bytes::BytesMut::new();
		escape_into(&mut buf, "x<y\n", TEXT_SPECIALS);
		assert_eq!(&buf[..], b"x&lt;y\n");
		buf.clear();
		escape_into(&mut buf, "x<y\n", ATTR_SPECIALS);
		assert_eq!(&buf[..], b"x&lt;y&#xa;");
	}

	#[test]
	fn unescape_reverses_escape() {
		let u = unescape(ESCAPED);
		assert_eq!(u.value, PLAIN);
		assert!(u.unrecognized_entities.is_empty());
		assert!(!u.contains_unterminated_ampersand);
	}

	#[test]
	fn unescape_reports_unknown_entities() {
		let u = unescape("&foo; and &bar;");
		assert_eq!(u.value, "&foo; and &bar;");
		assert_eq!(u.unrecognized_entities, vec!["foo".to_string(), "bar".to_string()]);
	}

	#[test]
	fn unescape_treats_naked_ampersand_as_amp() {
		let u = unescape("fish & chips");
		assert_eq!(u.value, "fish & chips");
		assert!(u.contains_unterminated_ampersand);
		assert!(u.unrecognized_entities.is_empty());
	}

	#[test]
	fn unescape_without_references_is_identity() {
		let u = unescape("plain text");
		assert_eq!(u, Unescaped {
			value: "plain text".to_string(),
			unrecognized_entities: Vec::new(),
			contains_unterminated_ampersand: false,
		});
	}

	#[test]
	fn escape_round_trip_over_char_set() {
		let samples = [
			"",
			"<<>>",
			"\"quoted\" and 'single'",
			"tab\tnewline\ncr\r",
			"\u{10000}\u{fffd}<",
			"]]>",
		];
		for s in samples.iter() {
			let u = unescape(&escape(s));
			assert_eq!(u.value, *s);
			assert!(u.unrecognized_entities.is_empty());
		}
	}
}
