/*!
# Error types

This module holds the error types returned by the various functions of this
crate.
*/
use std::error;
use std::fmt;
use std::io;
use std::ops::Deref;
use std::result::Result as StdResult;
use std::sync::Arc;

pub const ERRCTX_UNKNOWN: &'static str = "in unknown context";
pub const ERRCTX_DOCBEGIN: &'static str = "before root element";
pub const ERRCTX_DOCEND: &'static str = "after root element";
pub const ERRCTX_XML_DECL: &'static str = "in XML declaration";
pub const ERRCTX_DOCTYPE: &'static str = "in DOCTYPE declaration";
pub const ERRCTX_ELEMENT: &'static str = "in element header";
pub const ERRCTX_ELEMENT_FOOT: &'static str = "in element footer";
pub const ERRCTX_ATTNAME: &'static str = "in attribute name";
pub const ERRCTX_ATTVAL: &'static str = "in attribute value";
pub const ERRCTX_TEXT: &'static str = "in text";
pub const ERRCTX_CDATA_SECTION: &'static str = "in CDATA section";
pub const ERRCTX_COMMENT: &'static str = "in comment";
pub const ERRCTX_PI: &'static str = "in processing instruction";
pub const ERRCTX_REF: &'static str = "in entity or character reference";
pub const ERRCTX_NAME: &'static str = "in name";

/// Position in the decoded character stream.
///
/// Lines are counted from 1, columns from 0. The location refers to the
/// position after line-end normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location {
	pub line: usize,
	pub column: usize,
}

impl Location {
	pub const START: Location = Location { line: 1, column: 0 };

	pub(crate) fn advance(self, ch: char) -> Location {
		if ch == '\n' {
			Location {
				line: self.line + 1,
				column: 0,
			}
		} else {
			Location {
				line: self.line,
				column: self.column + 1,
			}
		}
	}
}

impl Default for Location {
	fn default() -> Self {
		Self::START
	}
}

impl fmt::Display for Location {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		write!(f, "line {} column {}", self.line, self.column)
	}
}

/// Violation of a well-formedness constraint, the XML 1.0 grammar or (when
/// enabled) a namespace constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum SyntaxError {
	/// End-of-file encountered during a construct where more data was
	/// expected.
	InvalidEof(&'static str),

	/// Unicode codepoint which is not allowed in XML 1.0 encountered.
	///
	/// The flag is true if the codepoint was produced by a character
	/// reference.
	InvalidChar(&'static str, u32, bool),

	/// Unicode codepoint which was not expected at that point in the
	/// grammar.
	UnexpectedChar(&'static str, char, Option<&'static [&'static str]>),

	/// Whitespace was required but not found.
	MissingWhitespace(&'static str),

	/// Malformed entity or character reference.
	InvalidReference(&'static str),

	/// `]]>` in character data outside of a CDATA section.
	CDataEndInText,

	/// `--` inside a comment.
	DoubleHyphenInComment,

	/// Processing instruction with a target matching `[Xx][Mm][Ll]`.
	ReservedPiTarget,

	/// Attribute was declared multiple times in the same element.
	DuplicateAttribute(String),

	/// Ending tag name does not match opening tag.
	ElementMismatch { expected: String, found: String },

	/// Use of a namespace prefix without an xmlns binding in scope.
	UndeclaredPrefix(String),

	/// Prefixed namespace declaration with an empty URI.
	EmptyNamespaceUri(String),

	/// Name with an empty prefix or local part, or with more than one
	/// colon (only raised when undeclared prefixes are rejected).
	InvalidQName(String),

	/// Generalized invalid syntactic construct which does not fit into any
	/// of the other categories.
	InvalidSyntax(&'static str),
}

impl error::Error for SyntaxError {}

fn write_alternatives<'f>(f: &'f mut fmt::Formatter, opts: &[&str]) -> fmt::Result {
	if opts.len() == 1 {
		f.write_str(opts[0])?;
		return f.write_str(")");
	}
	f.write_str("one of: ")?;
	for (i, opt) in opts.iter().enumerate() {
		if i > 0 {
			f.write_str(", ")?;
		}
		f.write_str(*opt)?;
	}
	f.write_str(")")
}

impl fmt::Display for SyntaxError {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::InvalidEof(ctx) => write!(f, "invalid eof {}", ctx),
			Self::InvalidChar(ctx, cp, false) => {
				write!(f, "invalid codepoint U+{:x} {}", cp, ctx)
			}
			Self::InvalidChar(ctx, cp, true) => write!(
				f,
				"character reference expanded to invalid codepoint U+{:x} {}",
				cp, ctx
			),
			Self::UnexpectedChar(ctx, ch, Some(opts)) if opts.len() > 0 => {
				write!(f, "U+{:x} not allowed {} (expected ", *ch as u32, ctx)?;
				write_alternatives(f, opts)
			}
			Self::UnexpectedChar(ctx, ch, _) => {
				write!(f, "U+{:x} not allowed {}", *ch as u32, ctx)
			}
			Self::MissingWhitespace(ctx) => write!(f, "whitespace required {}", ctx),
			Self::InvalidReference(ctx) => write!(f, "malformed reference {}", ctx),
			Self::CDataEndInText => f.write_str("']]>' not allowed in character data"),
			Self::DoubleHyphenInComment => f.write_str("'--' not allowed in comment"),
			Self::ReservedPiTarget => {
				f.write_str("processing instruction target 'xml' is reserved")
			}
			Self::DuplicateAttribute(name) => write!(f, "duplicate attribute '{}'", name),
			Self::ElementMismatch { expected, found } => write!(
				f,
				"end tag '{}' does not match start tag '{}'",
				found, expected
			),
			Self::UndeclaredPrefix(prefix) => {
				write!(f, "use of undeclared namespace prefix '{}'", prefix)
			}
			Self::EmptyNamespaceUri(prefix) => {
				write!(f, "namespace URI for prefix '{}' is empty", prefix)
			}
			Self::InvalidQName(name) => write!(f, "'{}' is not a qualified name", name),
			Self::InvalidSyntax(msg) => write!(f, "invalid syntax: {}", msg),
		}
	}
}

/// The byte stream could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedInput {
	/// The stream ended after a proper prefix of a byte order mark.
	TruncatedByteOrderMark,
	/// A byte sequence is not valid in the selected encoding.
	InvalidSequence { encoding: &'static str },
}

impl error::Error for MalformedInput {}

impl fmt::Display for MalformedInput {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::TruncatedByteOrderMark => f.write_str("input ends inside byte order mark"),
			Self::InvalidSequence { encoding } => {
				write!(f, "malformed byte sequence for encoding {}", encoding)
			}
		}
	}
}

/// A writer call was made in a state which does not permit it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateError {
	/// The document was opened twice.
	DocumentAlreadyOpen,
	/// Output was requested before the document was opened.
	DocumentNotOpen,
	/// Output was requested after the document was ended.
	DocumentClosed,
	/// Attribute or namespace declaration outside of an element header.
	AttributeNotAllowed,
	/// Content outside of an element.
	ContentNotAllowed,
	/// A second root element.
	ElementNotAllowed,
	/// End of an element without a matching start.
	NoOpenElement,
	/// The writer was closed while elements were still open.
	UnclosedElements(usize),
	/// An element or attribute prefix has no binding in scope.
	UnknownPrefix(String),
	/// Whitespace output contained non-whitespace characters.
	NotWhitespace,
	/// The open start tag already has an attribute or namespace
	/// declaration of that name.
	DuplicateAttribute(String),
	/// A prefix was bound to the empty URI.
	EmptyNamespaceUri(String),
	/// Comment, CDATA or processing instruction content which would not
	/// parse back.
	MalformedContent(&'static str),
}

impl error::Error for StateError {}

impl fmt::Display for StateError {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::DocumentAlreadyOpen => f.write_str("document already open"),
			Self::DocumentNotOpen => f.write_str("document not open"),
			Self::DocumentClosed => f.write_str("document already closed"),
			Self::AttributeNotAllowed => {
				f.write_str("attributes are only allowed inside element headers")
			}
			Self::ContentNotAllowed => f.write_str("content is only allowed inside elements"),
			Self::ElementNotAllowed => f.write_str("document already has a root element"),
			Self::NoOpenElement => f.write_str("no open element to end"),
			Self::UnclosedElements(n) => write!(f, "{} element(s) still open", n),
			Self::UnknownPrefix(prefix) => write!(f, "prefix '{}' is not bound", prefix),
			Self::NotWhitespace => f.write_str("text is not whitespace"),
			Self::DuplicateAttribute(name) => {
				write!(f, "attribute '{}' already written for this element", name)
			}
			Self::EmptyNamespaceUri(prefix) => {
				write!(f, "prefix '{}' cannot be bound to the empty URI", prefix)
			}
			Self::MalformedContent(what) => f.write_str(what),
		}
	}
}

/// [`std::sync::Arc`]-based around [`std::io::Error`] to allow cloning.
#[derive(Clone)]
pub struct IOErrorWrapper(Arc<io::Error>);

impl IOErrorWrapper {
	fn wrap(e: io::Error) -> IOErrorWrapper {
		IOErrorWrapper(Arc::new(e))
	}
}

impl fmt::Debug for IOErrorWrapper {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		fmt::Debug::fmt(&**self, f)
	}
}

impl fmt::Display for IOErrorWrapper {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		fmt::Display::fmt(&**self, f)
	}
}

impl PartialEq for IOErrorWrapper {
	fn eq(&self, other: &Self) -> bool {
		Arc::ptr_eq(&self.0, &other.0)
	}
}

impl AsRef<io::Error> for IOErrorWrapper {
	fn as_ref(&self) -> &io::Error {
		&*self.0
	}
}

impl Deref for IOErrorWrapper {
	type Target = io::Error;

	fn deref(&self) -> &io::Error {
		&*self.0
	}
}

/// Error types which may be returned from the reader and writer.
///
/// All errors are fatal: the parser does not attempt to recover.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
	/// An I/O error was returned by the underlying byte source or sink.
	IO(IOErrorWrapper),

	/// The byte stream could not be decoded into characters.
	MalformedInput(MalformedInput),

	/// A violation of the XML 1.0 grammar or a well-formedness constraint,
	/// with the location at which it was detected.
	InvalidSyntax(Location, SyntaxError),

	/// A writer call was made in the wrong state.
	InvalidState(StateError),
}

pub type Result<T> = StdResult<T, Error>;

impl Error {
	pub fn io(e: io::Error) -> Error {
		Error::IO(IOErrorWrapper::wrap(e))
	}

	pub(crate) fn syntax(at: Location, e: SyntaxError) -> Error {
		Error::InvalidSyntax(at, e)
	}

	/// Location of a syntax error, if this is one.
	pub fn location(&self) -> Option<Location> {
		match self {
			Error::InvalidSyntax(at, _) => Some(*at),
			_ => None,
		}
	}
}

impl From<io::Error> for Error {
	fn from(e: io::Error) -> Error {
		Error::io(e)
	}
}

impl From<MalformedInput> for Error {
	fn from(e: MalformedInput) -> Error {
		Error::MalformedInput(e)
	}
}

impl From<StateError> for Error {
	fn from(e: StateError) -> Error {
		Error::InvalidState(e)
	}
}

impl fmt::Display for Error {
	fn fmt<'f>(&self, f: &'f mut fmt::Formatter) -> fmt::Result {
		match self {
			Error::IO(e) => write!(f, "I/O error: {}", e),
			Error::MalformedInput(e) => write!(f, "malformed input: {}", e),
			Error::InvalidSyntax(at, e) => {
				write!(f, "syntax error on line {} column {}: {}", at.line, at.column, e)
			}
			Error::InvalidState(e) => write!(f, "invalid writer state: {}", e),
		}
	}
}

impl error::Error for Error {
	fn source(&self) -> Option<&(dyn error::Error + 'static)> {
		match self {
			Error::IO(e) => Some(&**e),
			Error::MalformedInput(e) => Some(e),
			Error::InvalidSyntax(_, e) => Some(e),
			Error::InvalidState(e) => Some(e),
		}
	}
}
