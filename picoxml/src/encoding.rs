/*!
# Encoding detection

The detector looks at the first bytes of the input for a byte order mark or
the UTF-16 form of `<` and selects the decoder accordingly. Everything else is
decoded with a caller-supplied default.
*/
use std::io;

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};
use log::debug;

use crate::error::{MalformedInput, Result};
use crate::source::CharSource;

const BOM_UTF8: &'static [u8] = b"\xef\xbb\xbf";
const BOM_UTF16BE: &'static [u8] = b"\xfe\xff";
const BOM_UTF16LE: &'static [u8] = b"\xff\xfe";

/// Longest byte order mark which is recognized.
pub const MAX_BOM_LENGTH: usize = 3;

// upper bound for looking for a declared encoding
const DECLARATION_SNIFF_LENGTH: usize = 1024;

/**
Byte reader with unbounded pushback.

Bytes which have been peeked or unread are served before the inner reader is
consulted again.
*/
pub struct ByteSource<R> {
	inner: R,
	pending: Vec<u8>,
}

impl<R: io::Read> ByteSource<R> {
	pub fn new(inner: R) -> Self {
		Self {
			inner,
			pending: Vec::new(),
		}
	}

	/// Make up to `n` bytes available without consuming them.
	///
	/// Fewer bytes are returned only if the inner reader reached its end.
	pub fn peek(&mut self, n: usize) -> io::Result<&[u8]> {
		while self.pending.len() < n {
			let have = self.pending.len();
			self.pending.resize(n, 0);
			match self.inner.read(&mut self.pending[have..]) {
				Ok(0) => {
					self.pending.truncate(have);
					break;
				}
				Ok(got) => self.pending.truncate(have + got),
				Err(e) if e.kind() == io::ErrorKind::Interrupted => {
					self.pending.truncate(have);
				}
				Err(e) => {
					self.pending.truncate(have);
					return Err(e);
				}
			}
		}
		let n = n.min(self.pending.len());
		Ok(&self.pending[..n])
	}

	/// Drop `n` already peeked bytes.
	pub fn consume(&mut self, n: usize) {
		let n = n.min(self.pending.len());
		self.pending.drain(..n);
	}

	/// Return bytes to the head of the stream.
	pub fn unread(&mut self, bytes: &[u8]) {
		self.pending.splice(0..0, bytes.iter().copied());
	}

	pub fn into_inner(self) -> R {
		self.inner
	}
}

impl<R: io::Read> io::Read for ByteSource<R> {
	fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		if self.pending.len() > 0 {
			let n = buf.len().min(self.pending.len());
			buf[..n].copy_from_slice(&self.pending[..n]);
			self.pending.drain(..n);
			return Ok(n);
		}
		self.inner.read(buf)
	}
}

/// Outcome of encoding detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detected {
	/// The encoding the rest of the stream is decoded with.
	pub encoding: &'static Encoding,
	/// Number of byte order mark bytes which were consumed.
	pub bom_length: usize,
	/// True if the encoding was derived from the input rather than taken
	/// from the default.
	pub sniffed: bool,
}

/**
Selects the character encoding of an XML byte stream.

```rust
use picoxml::encoding::{ByteSource, EncodingDetector};

let mut src = ByteSource::new(&b"\xff\xfe<\x00x\x00/\x00>\x00"[..]);
let detected = EncodingDetector::default().detect(&mut src).unwrap();
assert_eq!(detected.encoding, encoding_rs::UTF_16LE);
assert_eq!(detected.bom_length, 2);
```
*/
#[derive(Debug, Clone, Copy)]
pub struct EncodingDetector {
	default: &'static Encoding,
	use_declared: bool,
}

impl Default for EncodingDetector {
	fn default() -> Self {
		Self::new(UTF_8)
	}
}

impl EncodingDetector {
	pub fn new(default: &'static Encoding) -> Self {
		Self {
			default,
			use_declared: false,
		}
	}

	/// Honour the `encoding` pseudo-attribute of an XML declaration when no
	/// byte order mark or UTF-16 pattern matched.
	///
	/// Only labels of ASCII-compatible encodings are honoured.
	pub fn use_declared_encoding(mut self, enabled: bool) -> Self {
		self.use_declared = enabled;
		self
	}

	/// Inspect the head of `src`, consuming a byte order mark if one is
	/// present.
	pub fn detect<R: io::Read>(&self, src: &mut ByteSource<R>) -> Result<Detected> {
		let head = src.peek(MAX_BOM_LENGTH)?.to_vec();
		let (encoding, bom_length) = if head.starts_with(BOM_UTF8) {
			(UTF_8, BOM_UTF8.len())
		} else if head.starts_with(BOM_UTF16BE) {
			(UTF_16BE, BOM_UTF16BE.len())
		} else if head.starts_with(BOM_UTF16LE) {
			(UTF_16LE, BOM_UTF16LE.len())
		} else if head.starts_with(b"\x00<") {
			(UTF_16BE, 0)
		} else if head.starts_with(b"<\x00") {
			(UTF_16LE, 0)
		} else {
			if head.len() < MAX_BOM_LENGTH && is_bom_prefix(&head) {
				return Err(MalformedInput::TruncatedByteOrderMark.into());
			}
			let encoding = if self.use_declared {
				self.declared_encoding(src)?.unwrap_or(self.default)
			} else {
				self.default
			};
			debug!("no byte order mark, decoding as {}", encoding.name());
			return Ok(Detected {
				encoding,
				bom_length: 0,
				sniffed: encoding != self.default,
			});
		};
		src.consume(bom_length);
		debug!(
			"detected {} ({} byte order mark bytes)",
			encoding.name(),
			bom_length
		);
		Ok(Detected {
			encoding,
			bom_length,
			sniffed: true,
		})
	}

	/// Detect the encoding of `reader` and wrap it into a character source.
	pub fn open<R: io::Read>(&self, reader: R) -> Result<CharSource<R>> {
		let mut src = ByteSource::new(reader);
		let detected = self.detect(&mut src)?;
		Ok(CharSource::new(src, detected.encoding))
	}

	fn declared_encoding<R: io::Read>(
		&self,
		src: &mut ByteSource<R>,
	) -> Result<Option<&'static Encoding>> {
		let head = src.peek(DECLARATION_SNIFF_LENGTH)?;
		let label = match declared_label(head) {
			Some(label) => label,
			None => return Ok(None),
		};
		match Encoding::for_label(label) {
			Some(encoding) if encoding.is_ascii_compatible() => {
				debug!(
					"using declared encoding {}",
					encoding.name()
				);
				Ok(Some(encoding))
			}
			_ => {
				debug!(
					"ignoring declared encoding label {:?}",
					String::from_utf8_lossy(label)
				);
				Ok(None)
			}
		}
	}
}

fn is_bom_prefix(head: &[u8]) -> bool {
	head.len() > 0
		&& (BOM_UTF8.starts_with(head)
			|| BOM_UTF16BE.starts_with(head)
			|| BOM_UTF16LE.starts_with(head))
}

fn is_space_byte(b: u8) -> bool {
	matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

// extracts the value of encoding="..." from an ASCII XML declaration
fn declared_label(head: &[u8]) -> Option<&[u8]> {
	if !head.starts_with(b"<?xml") || head.len() < 6 || !is_space_byte(head[5]) {
		return None;
	}
	let end = head.windows(2).position(|w| w == b"?>")?;
	let decl = &head[..end];
	let at = decl.windows(8).position(|w| w == b"encoding")?;
	let mut rest = &decl[at + 8..];
	while rest.first().map(|b| is_space_byte(*b)).unwrap_or(false) {
		rest = &rest[1..];
	}
	rest = rest.strip_prefix(b"=")?;
	while rest.first().map(|b| is_space_byte(*b)).unwrap_or(false) {
		rest = &rest[1..];
	}
	let quote = *rest.first()?;
	if quote != b'"' && quote != b'\'' {
		return None;
	}
	let rest = &rest[1..];
	let close = rest.iter().position(|b| *b == quote)?;
	Some(&rest[..close])
}
