use logos::Logos;
use snailquote::unescape;

use crate::ConfixError;
use crate::ConfixResult;
use crate::tokens::ExpressionSpan;
use crate::tokens::SpannedToken;
use crate::tokens::Token;

pub const EXPRESSION_OPEN: &str = "${";
pub const EXPRESSION_CLOSE: char = '}';

/// Raw tokens produced by logos for the body of a single expression.
#[derive(Logos, Debug, PartialEq)]
enum RawToken {
	#[token("|")]
	Pipe,
	#[token("(")]
	ParenOpen,
	#[token(")")]
	ParenClose,
	#[token(",")]
	Comma,
	#[token("=")]
	Equals,
	#[regex(r"[ \t\r\n]")]
	Whitespace,
	#[regex(r#"[^ \t\r\n|(),="']+"#)]
	Word,
	#[regex(r#""([^"\\]|\\.)*""#)]
	DoubleQuotedString,
	#[regex(r"'[^']*'")]
	SingleQuotedString,
}

/// Find every `${…}` occurrence in `input`, left to right.
///
/// Expressions do not nest: the first `}` after `${` closes the expression.
/// A `${` without a closing `}` is an error.
pub fn scan_expressions(input: &str) -> ConfixResult<Vec<ExpressionSpan>> {
	let mut spans = Vec::new();
	let mut cursor = 0;

	while let Some(found) = input[cursor..].find(EXPRESSION_OPEN) {
		let start = cursor + found;
		let body_start = start + EXPRESSION_OPEN.len();

		let Some(close) = input[body_start..].find(EXPRESSION_CLOSE) else {
			return Err(ConfixError::Parse {
				input: input.to_string(),
				reason: format!("`${{` at byte {start} is never closed with `}}`"),
			});
		};

		let end = body_start + close;
		spans.push(ExpressionSpan {
			outer: start..end + 1,
			body: body_start..end,
		});
		cursor = end + 1;
	}

	tracing::trace!(count = spans.len(), "scanned template expressions");
	Ok(spans)
}

/// Split an expression body into tokens. Quoted strings are unescaped.
pub fn tokenize(body: &str) -> ConfixResult<Vec<SpannedToken>> {
	let mut tokens = Vec::new();

	for (result, span) in RawToken::lexer(body).spanned() {
		let slice = &body[span.clone()];
		let invalid = |reason: String| {
			ConfixError::Parse {
				input: body.to_string(),
				reason,
			}
		};

		let Ok(raw) = result else {
			return Err(invalid(format!(
				"unexpected `{slice}` at byte {}",
				span.start
			)));
		};

		let token = match raw {
			RawToken::Pipe => Token::Pipe,
			RawToken::ParenOpen => Token::ParenOpen,
			RawToken::ParenClose => Token::ParenClose,
			RawToken::Comma => Token::Comma,
			RawToken::Equals => Token::Equals,
			RawToken::Whitespace => Token::Whitespace(slice.as_bytes()[0]),
			RawToken::Word => Token::Word(slice.to_string()),
			RawToken::DoubleQuotedString => {
				Token::String(process_string(slice).map_err(invalid)?, b'"')
			}
			RawToken::SingleQuotedString => Token::String(slice[1..slice.len() - 1].to_string(), b'\''),
		};

		tokens.push(SpannedToken { token, span });
	}

	Ok(tokens)
}

/// Strip the surrounding double quotes and unescape if needed. Single quoted
/// strings are taken literally.
fn process_string(slice: &str) -> Result<String, String> {
	let inner = &slice[1..slice.len() - 1];

	if !inner.contains('\\') {
		return Ok(inner.to_string());
	}

	unescape(slice).map_err(|e| format!("invalid escape in {slice}: {e}"))
}
