use std::fmt::Display;
use std::ops::Range;

/// Tokens found between `${` and `}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
	/// `|`
	Pipe,
	/// `(`
	ParenOpen,
	/// `)`
	ParenClose,
	/// `,`
	Comma,
	/// `=`
	Equals,
	/// ` ` | `\t` | `\r` | `\n`
	Whitespace(u8),
	/// A bare run of characters, e.g. `DB_HOST`, `multiply` or `2`.
	Word(String),
	/// Quoted parameter value with its delimiter, e.g. `"a, b"`. The content is
	/// stored unescaped.
	String(String, u8),
}

impl Token {
	pub fn is_whitespace(&self) -> bool {
		matches!(self, Token::Whitespace(_))
	}

	/// Short description used in parse errors.
	pub fn describe(&self) -> String {
		match self {
			Token::Pipe => "`|`".to_string(),
			Token::ParenOpen => "`(`".to_string(),
			Token::ParenClose => "`)`".to_string(),
			Token::Comma => "`,`".to_string(),
			Token::Equals => "`=`".to_string(),
			Token::Whitespace(_) => "whitespace".to_string(),
			Token::Word(word) => format!("`{word}`"),
			Token::String(..) => format!("string {self}"),
		}
	}
}

impl Display for Token {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Token::Pipe => write!(f, "|"),
			Token::ParenOpen => write!(f, "("),
			Token::ParenClose => write!(f, ")"),
			Token::Comma => write!(f, ","),
			Token::Equals => write!(f, "="),
			Token::Whitespace(byte) => write!(f, "{}", *byte as char),
			Token::Word(word) => write!(f, "{word}"),
			Token::String(string, ch) => {
				let ch = *ch as char;
				write!(f, "{ch}{string}{ch}")
			}
		}
	}
}

/// A token and the byte range it was read from, relative to the expression
/// body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpannedToken {
	pub token: Token,
	pub span: Range<usize>,
}

/// Location of one `${…}` occurrence inside a templated string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpressionSpan {
	/// Bytes from `$` up to and including `}`.
	pub outer: Range<usize>,
	/// Bytes between `${` and `}`.
	pub body: Range<usize>,
}
