/*!
# Character source

[`CharSource`] decodes a byte stream into `char`s, normalizes line ends and
keeps track of the location of the next character. The parser reads from it
through a small set of primitives: read, unread, peek, lookahead, attempt,
expect and take.
*/
use std::collections::VecDeque;
use std::io;

use encoding_rs::{Decoder, DecoderResult, Encoding};

use picoxml_validation::is_char;
use picoxml_validation::selectors::CharSelector;

use crate::encoding::ByteSource;
use crate::error::{Error, Location, MalformedInput, Result, SyntaxError, ERRCTX_UNKNOWN};

const RAW_BUFFER_SIZE: usize = 8192;
const DECODED_BUFFER_SIZE: usize = 8192;

/// Number of consumed characters whose location can be restored by
/// [`CharSource::unread`].
pub const PUSHBACK_LIMIT: usize = 16;

/**
Decoded, line-end normalized character stream.

`\r\n` and lone `\r` are both delivered as a single `\n`. Every consumed
character must be an XML `Char`.

```rust
use picoxml::encoding::EncodingDetector;

let mut src = EncodingDetector::default().open(&b"a\r\nb"[..]).unwrap();
assert_eq!(src.read().unwrap(), Some('a'));
assert_eq!(src.read().unwrap(), Some('\n'));
assert_eq!(src.location().line, 2);
assert!(src.attempt('b').unwrap());
assert_eq!(src.read().unwrap(), None);
```
*/
pub struct CharSource<R> {
	bytes: ByteSource<R>,
	encoding: &'static Encoding,
	decoder: Decoder,
	raw: Box<[u8]>,
	raw_pos: usize,
	raw_len: usize,
	bytes_eof: bool,
	decoded: String,
	decoded_pos: usize,
	decoder_done: bool,
	/// normalized characters which have been looked at but not consumed
	ahead: VecDeque<char>,
	location: Location,
	/// locations of the most recently consumed characters
	trail: VecDeque<Location>,
}

impl<R: io::Read> CharSource<R> {
	/// Decode `bytes` with `encoding`; no byte order mark handling is done.
	pub fn new(bytes: ByteSource<R>, encoding: &'static Encoding) -> Self {
		Self {
			bytes,
			encoding,
			decoder: encoding.new_decoder_without_bom_handling(),
			raw: vec![0u8; RAW_BUFFER_SIZE].into_boxed_slice(),
			raw_pos: 0,
			raw_len: 0,
			bytes_eof: false,
			decoded: String::with_capacity(DECODED_BUFFER_SIZE),
			decoded_pos: 0,
			decoder_done: false,
			ahead: VecDeque::new(),
			location: Location::START,
			trail: VecDeque::with_capacity(PUSHBACK_LIMIT),
		}
	}

	pub fn encoding(&self) -> &'static Encoding {
		self.encoding
	}

	/// Location of the next character to be read.
	pub fn location(&self) -> Location {
		self.location
	}

	/// Build a syntax error at the current location.
	pub fn error(&self, e: SyntaxError) -> Error {
		Error::syntax(self.location, e)
	}

	fn read_raw(&mut self) -> io::Result<usize> {
		loop {
			match io::Read::read(&mut self.bytes, &mut self.raw[..]) {
				Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
				other => return other,
			}
		}
	}

	// decode the next batch of characters; false once the stream is done
	fn fill(&mut self) -> Result<bool> {
		if self.decoder_done {
			return Ok(false);
		}
		self.decoded.clear();
		self.decoded_pos = 0;
		loop {
			if self.raw_pos == self.raw_len && !self.bytes_eof {
				self.raw_pos = 0;
				self.raw_len = self.read_raw()?;
				if self.raw_len == 0 {
					self.bytes_eof = true;
				}
			}
			let (result, read) = self.decoder.decode_to_string_without_replacement(
				&self.raw[self.raw_pos..self.raw_len],
				&mut self.decoded,
				self.bytes_eof,
			);
			self.raw_pos += read;
			match result {
				DecoderResult::Malformed(_, _) => {
					return Err(MalformedInput::InvalidSequence {
						encoding: self.encoding.name(),
					}
					.into())
				}
				DecoderResult::OutputFull => return Ok(true),
				DecoderResult::InputEmpty => {
					if self.bytes_eof {
						self.decoder_done = true;
						return Ok(self.decoded.len() > 0);
					}
					if self.decoded.len() > 0 {
						return Ok(true);
					}
				}
			}
		}
	}

	fn peek_decoded(&mut self) -> Result<Option<char>> {
		loop {
			if let Some(ch) = self.decoded[self.decoded_pos..].chars().next() {
				return Ok(Some(ch));
			}
			if !self.fill()? {
				return Ok(None);
			}
		}
	}

	// next character after line-end normalization, bypassing the lookahead
	fn pull(&mut self) -> Result<Option<char>> {
		let ch = match self.peek_decoded()? {
			Some(ch) => ch,
			None => return Ok(None),
		};
		self.decoded_pos += ch.len_utf8();
		if ch != '\r' {
			return Ok(Some(ch));
		}
		if self.peek_decoded()? == Some('\n') {
			self.decoded_pos += 1;
		}
		Ok(Some('\n'))
	}

	// make sure that at least n characters are in the lookahead buffer,
	// unless the stream ends earlier
	fn fill_ahead(&mut self, n: usize) -> Result<usize> {
		while self.ahead.len() < n {
			match self.pull()? {
				Some(ch) => self.ahead.push_back(ch),
				None => break,
			}
		}
		Ok(self.ahead.len().min(n))
	}

	/// Consume and return the next character, or `None` at the end of the
	/// stream.
	pub fn read(&mut self) -> Result<Option<char>> {
		let ch = match self.ahead.pop_front() {
			Some(ch) => ch,
			None => match self.pull()? {
				Some(ch) => ch,
				None => return Ok(None),
			},
		};
		if !is_char(ch) {
			self.ahead.push_front(ch);
			return Err(self.error(SyntaxError::InvalidChar(ERRCTX_UNKNOWN, ch as u32, false)));
		}
		if self.trail.len() == PUSHBACK_LIMIT {
			self.trail.pop_front();
		}
		self.trail.push_back(self.location);
		self.location = self.location.advance(ch);
		Ok(Some(ch))
	}

	/// Return a character to the head of the stream.
	///
	/// The location is restored for up to [`PUSHBACK_LIMIT`] characters.
	pub fn unread(&mut self, ch: char) {
		self.ahead.push_front(ch);
		if let Some(loc) = self.trail.pop_back() {
			self.location = loc;
		}
	}

	/// Return a string to the head of the stream, so that its first
	/// character is read next.
	pub fn unread_str(&mut self, s: &str) {
		for ch in s.chars().rev() {
			self.unread(ch);
		}
	}

	/// Look at the next character without consuming it.
	pub fn peek(&mut self) -> Result<Option<char>> {
		self.peek_nth(0)
	}

	/// Look at the character `n` positions ahead (0 is the next one).
	pub fn peek_nth(&mut self, n: usize) -> Result<Option<char>> {
		self.fill_ahead(n + 1)?;
		Ok(self.ahead.get(n).copied())
	}

	/// Copy up to `n` upcoming characters into `into` without consuming
	/// them; returns the number copied.
	pub fn peek_str(&mut self, n: usize, into: &mut String) -> Result<usize> {
		let avail = self.fill_ahead(n)?;
		into.extend(self.ahead.iter().take(avail));
		Ok(avail)
	}

	/// True if the next character is `ch`.
	pub fn lookahead(&mut self, ch: char) -> Result<bool> {
		Ok(self.peek()? == Some(ch))
	}

	/// True if the next characters spell `s`.
	pub fn lookahead_str(&mut self, s: &str) -> Result<bool> {
		let n = s.chars().count();
		if self.fill_ahead(n)? < n {
			return Ok(false);
		}
		Ok(self.ahead.iter().zip(s.chars()).all(|(a, b)| *a == b))
	}

	/// Consume `ch` if it is next.
	pub fn attempt(&mut self, ch: char) -> Result<bool> {
		if self.lookahead(ch)? {
			self.read()?;
			Ok(true)
		} else {
			Ok(false)
		}
	}

	/// Consume `s` if it is next.
	pub fn attempt_str(&mut self, s: &str) -> Result<bool> {
		if !self.lookahead_str(s)? {
			return Ok(false);
		}
		for _ in s.chars() {
			self.read()?;
		}
		Ok(true)
	}

	/// Consume one character matching `selector` or fail with a syntax error
	/// in context `ctx`.
	pub fn expect<S: CharSelector + ?Sized>(
		&mut self,
		selector: &S,
		ctx: &'static str,
		expected: Option<&'static [&'static str]>,
	) -> Result<char> {
		match self.peek()? {
			None => Err(self.error(SyntaxError::InvalidEof(ctx))),
			Some(ch) if selector.select(ch) => {
				self.read()?;
				Ok(ch)
			}
			Some(ch) => Err(self.error(SyntaxError::UnexpectedChar(ctx, ch, expected))),
		}
	}

	/// Consume the string `s` or fail at the first mismatching character.
	pub fn expect_str(&mut self, s: &str, ctx: &'static str) -> Result<()> {
		for ch in s.chars() {
			self.expect(&ch, ctx, None)?;
		}
		Ok(())
	}

	/// Consume all upcoming characters matching `selector` into `into`;
	/// returns their count.
	pub fn take<S: CharSelector + ?Sized>(&mut self, selector: &S, into: &mut String) -> Result<usize> {
		let mut n = 0;
		while let Some(ch) = self.peek()? {
			if !selector.select(ch) {
				break;
			}
			self.read()?;
			into.push(ch);
			n += 1;
		}
		Ok(n)
	}

	/// Like [`take`](Self::take), but discards the characters.
	pub fn skip<S: CharSelector + ?Sized>(&mut self, selector: &S) -> Result<usize> {
		let mut n = 0;
		while let Some(ch) = self.peek()? {
			if !selector.select(ch) {
				break;
			}
			self.read()?;
			n += 1;
		}
		Ok(n)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	use encoding_rs::{UTF_16LE, UTF_8};
	use picoxml_validation::selectors::{CLASS_XML_NAME, CLASS_XML_SPACE};

	fn src(s: &str) -> CharSource<&[u8]> {
		CharSource::new(ByteSource::new(s.as_bytes()), UTF_8)
	}

	fn drain<R: io::Read>(src: &mut CharSource<R>) -> String {
		let mut out = String::new();
		while let Some(ch) = src.read().unwrap() {
			out.push(ch);
		}
		out
	}

	#[test]
	fn normalizes_line_ends() {
		let mut s = src("a\r\nb\rc\n\r\r\nd");
		assert_eq!(drain(&mut s), "a\nb\nc\n\n\nd");
	}

	#[test]
	fn tracks_location() {
		let mut s = src("ab\ncd");
		assert_eq!(s.location(), Location { line: 1, column: 0 });
		s.read().unwrap();
		s.read().unwrap();
		assert_eq!(s.location(), Location { line: 1, column: 2 });
		s.read().unwrap();
		assert_eq!(s.location(), Location { line: 2, column: 0 });
		s.read().unwrap();
		assert_eq!(s.location(), Location { line: 2, column: 1 });
	}

	#[test]
	fn unread_restores_characters_and_location() {
		let mut s = src("ab\ncd");
		let mut consumed = String::new();
		for _ in 0..4 {
			consumed.push(s.read().unwrap().unwrap());
		}
		assert_eq!(s.location(), Location { line: 2, column: 1 });
		s.unread_str(&consumed[2..]);
		assert_eq!(s.location(), Location { line: 1, column: 2 });
		assert_eq!(drain(&mut s), "\ncd");
	}

	#[test]
	fn unread_single_char() {
		let mut s = src("xy");
		let ch = s.read().unwrap().unwrap();
		s.unread(ch);
		assert_eq!(s.location(), Location::START);
		assert_eq!(drain(&mut s), "xy");
	}

	#[test]
	fn peek_and_lookahead_do_not_consume() {
		let mut s = src("<!--x");
		assert_eq!(s.peek().unwrap(), Some('<'));
		assert_eq!(s.peek_nth(3).unwrap(), Some('-'));
		assert_eq!(s.peek_nth(10).unwrap(), None);
		assert!(s.lookahead('<').unwrap());
		assert!(s.lookahead_str("<!--").unwrap());
		assert!(!s.lookahead_str("<![CDATA[").unwrap());
		let mut buf = String::new();
		assert_eq!(s.peek_str(3, &mut buf).unwrap(), 3);
		assert_eq!(buf, "<!-");
		assert_eq!(s.location(), Location::START);
		assert_eq!(drain(&mut s), "<!--x");
	}

	#[test]
	fn attempt_consumes_only_on_match() {
		let mut s = src("<?xml");
		assert!(!s.attempt('x').unwrap());
		assert!(!s.attempt_str("<?xmx").unwrap());
		assert!(s.attempt_str("<?").unwrap());
		assert!(s.attempt('x').unwrap());
		assert_eq!(drain(&mut s), "ml");
	}

	#[test]
	fn expect_reports_location() {
		let mut s = src("ab\nc");
		s.expect_str("ab\n", ERRCTX_UNKNOWN).unwrap();
		match s.expect(&'x', ERRCTX_UNKNOWN, None) {
			Err(Error::InvalidSyntax(loc, SyntaxError::UnexpectedChar(_, 'c', None))) => {
				assert_eq!(loc, Location { line: 2, column: 0 });
			}
			other => panic!("unexpected result: {:?}", other),
		}
		assert_eq!(s.expect(&'c', ERRCTX_UNKNOWN, None).unwrap(), 'c');
		match s.expect(&'c', ERRCTX_UNKNOWN, None) {
			Err(Error::InvalidSyntax(_, SyntaxError::InvalidEof(_))) => (),
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[test]
	fn take_and_skip() {
		let mut s = src("  \tname-1 rest");
		assert_eq!(s.skip(&CLASS_XML_SPACE).unwrap(), 3);
		let mut name = String::new();
		assert_eq!(s.take(&CLASS_XML_NAME, &mut name).unwrap(), 6);
		assert_eq!(name, "name-1");
		assert_eq!(s.take(&CLASS_XML_NAME, &mut name).unwrap(), 0);
		assert_eq!(drain(&mut s), " rest");
	}

	#[test]
	fn rejects_non_chars() {
		let mut s = src("a\u{1}");
		s.read().unwrap();
		match s.read() {
			Err(Error::InvalidSyntax(loc, SyntaxError::InvalidChar(_, 1, false))) => {
				assert_eq!(loc, Location { line: 1, column: 1 });
			}
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[test]
	fn decodes_utf16() {
		let bytes: Vec<u8> = "<x>ä\r\n</x>"
			.encode_utf16()
			.flat_map(|u| u.to_le_bytes().to_vec())
			.collect();
		let mut s = CharSource::new(ByteSource::new(&bytes[..]), UTF_16LE);
		assert_eq!(drain(&mut s), "<x>ä\n</x>");
	}

	#[test]
	fn invalid_utf8_is_malformed() {
		let mut s = CharSource::new(ByteSource::new(&b"ab\xff"[..]), UTF_8);
		let mut result = Ok(None);
		for _ in 0..4 {
			result = s.read();
			if result.is_err() {
				break;
			}
		}
		match result {
			Err(Error::MalformedInput(MalformedInput::InvalidSequence { encoding })) => {
				assert_eq!(encoding, "UTF-8");
			}
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[test]
	fn decodes_across_buffer_boundaries() {
		let text: String = std::iter::repeat("äöü€\r\n").take(3000).collect();
		let mut s = src(&text);
		let out = drain(&mut s);
		assert_eq!(out, text.replace("\r\n", "\n"));
		assert_eq!(s.location().line, 3001);
	}
}
