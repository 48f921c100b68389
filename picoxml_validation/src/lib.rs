/*!
# Character classes and validators for XML 1.0 strings

This is a supplementary crate for `picoxml`. It holds the code point
predicates the parser and the writer use to recognize the `Char`, `S`,
`NameStartChar`, `NameChar` and `PubidChar` productions, plus a few string
validators built on top of them.
*/
use std::fmt;

pub mod selectors;

use selectors::CharSelector;

/**
Error condition from validating an XML string.
*/
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
	/// A Name or NCName was empty.
	EmptyName,
	/// An invalid character was encountered.
	///
	/// This variant contains the character as data.
	InvalidChar(char),
}

impl fmt::Display for Error {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::EmptyName => f.write_str("Name and NCName must not be empty"),
			Self::InvalidChar(c) => write!(f, "character U+{:04x} is not allowed", *c as u32),
		}
	}
}

impl std::error::Error for Error {}

/// `Char` (XML 1.0 § 2.2 \[2\])
#[inline]
pub fn is_char(c: char) -> bool {
	selectors::CLASS_XML_CHAR.select(c)
}

/// `S` (XML 1.0 § 2.3 \[3\])
#[inline]
pub fn is_space(c: char) -> bool {
	selectors::CLASS_XML_SPACE.select(c)
}

/// `NameStartChar` (XML 1.0 § 2.3 \[4\])
#[inline]
pub fn is_name_start_char(c: char) -> bool {
	selectors::CLASS_XML_NAMESTART.select(c)
}

/// `NameChar` (XML 1.0 § 2.3 \[4a\])
#[inline]
pub fn is_name_char(c: char) -> bool {
	selectors::CLASS_XML_NAME.select(c)
}

/// `PubidChar` (XML 1.0 § 2.3 \[13\])
#[inline]
pub fn is_pubid_char(c: char) -> bool {
	selectors::CLASS_XML_PUBID.select(c)
}

#[inline]
pub fn is_digit(c: char) -> bool {
	selectors::CLASS_XML_DIGIT.select(c)
}

#[inline]
pub fn is_hex_digit(c: char) -> bool {
	selectors::CLASS_XML_HEXDIGIT.select(c)
}

/**
Check whether a str is a valid XML 1.0 Name

# Example

```rust
use picoxml_validation::{validate_name, Error};

assert!(validate_name("foobar").is_ok());
assert!(validate_name("foo:bar").is_ok());
assert!(matches!(validate_name("foo bar"), Err(Error::InvalidChar(' '))));
assert!(matches!(validate_name(""), Err(Error::EmptyName)));
```
*/
pub fn validate_name(s: &str) -> Result<(), Error> {
	let mut chars = s.chars();
	match chars.next() {
		// must have at least one char
		None => return Err(Error::EmptyName),
		Some(c) => if !is_name_start_char(c) {
			return Err(Error::InvalidChar(c))
		}
	}
	for ch in chars {
		if !is_name_char(ch) {
			return Err(Error::InvalidChar(ch))
		}
	}
	Ok(())
}


/**
Check whether a str is a valid XML 1.0 Name, without colons.

# Example

```rust
use picoxml_validation::{validate_ncname, Error};

assert!(validate_ncname("foobar").is_ok());
assert!(matches!(validate_ncname("foo:bar"), Err(Error::InvalidChar(':'))));
assert!(matches!(validate_ncname(""), Err(Error::EmptyName)));
```
*/
pub fn validate_ncname(s: &str) -> Result<(), Error> {
	let mut chars = s.chars();
	match chars.next() {
		None => return Err(Error::EmptyName),
		Some(c) => if !is_name_start_char(c) || c == ':' {
			return Err(Error::InvalidChar(c))
		}
	}
	for ch in chars {
		if !is_name_char(ch) || ch == ':' {
			return Err(Error::InvalidChar(ch))
		}
	}
	Ok(())
}

/**
Check whether a str is valid XML 1.0 CData

# Example

```rust
use picoxml_validation::{validate_cdata, Error};

assert!(validate_cdata("foo bar baz <fnord!>").is_ok());
assert!(matches!(validate_cdata("\x01"), Err(Error::InvalidChar('\x01'))));
```
*/
pub fn validate_cdata(s: &str) -> Result<(), Error> {
	for ch in s.chars() {
		if selectors::CLASS_XML_NONCHAR.select(ch) {
			return Err(Error::InvalidChar(ch))
		}
	}
	Ok(())
}

/// Check whether a str consists only of `S` characters.
///
/// The empty string is accepted.
pub fn validate_space(s: &str) -> Result<(), Error> {
	for ch in s.chars() {
		if !is_space(ch) {
			return Err(Error::InvalidChar(ch))
		}
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_cdata_smoketest() {
		assert!(validate_cdata("foo bar baz http://<xyz>").is_ok());
		assert!(validate_cdata("\u{ffff}").is_err());
	}

	#[test]
	fn test_name_smoketest() {
		assert!(validate_name("foobar").is_ok());
		assert!(validate_name("foo:bar").is_ok());
		assert!(validate_name("").is_err());
		assert!(validate_name("foo bar baz http://<xyz>").is_err());
		assert!(validate_name("\u{ffff}").is_err());
		assert!(validate_name("-foo").is_err());
		assert!(validate_name("foo-1.2").is_ok());
	}

	#[test]
	fn test_ncname_smoketest() {
		assert!(validate_ncname("foobar").is_ok());
		assert!(validate_ncname("foo:bar").is_err());
		assert!(validate_ncname("").is_err());
		assert!(validate_ncname("foo bar baz http://<xyz>").is_err());
		assert!(validate_ncname("\u{ffff}").is_err());
	}

	#[test]
	fn test_space_smoketest() {
		assert!(validate_space("").is_ok());
		assert!(validate_space(" \t\r\n").is_ok());
		assert_eq!(validate_space(" x "), Err(Error::InvalidChar('x')));
		// no-break space is not S
		assert!(validate_space("\u{a0}").is_err());
	}

	#[test]
	fn test_predicates() {
		assert!(is_char('\t'));
		assert!(!is_char('\x0b'));
		assert!(is_char('\u{10ffff}'));
		assert!(is_space('\r'));
		assert!(!is_space('\x0c'));
		assert!(is_name_start_char('_'));
		assert!(!is_name_start_char('1'));
		assert!(is_name_char('1'));
		assert!(is_name_char('\u{b7}'));
		assert!(is_pubid_char('%'));
		assert!(!is_pubid_char('"'));
		assert!(is_digit('9'));
		assert!(is_hex_digit('c'));
	}
}
