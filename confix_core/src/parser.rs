use std::iter::Peekable;
use std::ops::Range;

use crate::ConfixError;
use crate::ConfixResult;
use crate::FilterParams;
use crate::lexer::scan_expressions;
use crate::lexer::tokenize;
use crate::tokens::SpannedToken;
use crate::tokens::Token;

/// A filter invocation inside an expression, e.g. `multiply(m=2)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCall {
	pub name: String,
	pub params: FilterParams,
}

impl FilterCall {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			params: FilterParams::new(),
		}
	}

	pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.params.insert(key.into(), value.into());
		self
	}
}

/// One parsed `${source|filter|…}` occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
	/// Variable name the chain starts from.
	pub source: String,
	/// Filters in the order they are applied.
	pub filters: Vec<FilterCall>,
	/// Byte range of the whole expression, `${` through `}`, in the templated
	/// string.
	pub span: Range<usize>,
}

impl Expression {
	/// Whether this expression covers all of `input`.
	pub fn is_whole(&self, input: &str) -> bool {
		self.span.start == 0 && self.span.end == input.len()
	}
}

/// Parse every expression in `input`. Strings without `${` produce an empty
/// list.
pub fn parse_template(input: &str) -> ConfixResult<Vec<Expression>> {
	let mut expressions = vec![];

	for span in scan_expressions(input)? {
		let body = &input[span.body.clone()];
		let (source, filters) = parse_expression(body).map_err(|reason| {
			ConfixError::Parse {
				input: input.to_string(),
				reason,
			}
		})?;

		expressions.push(Expression {
			source,
			filters,
			span: span.outer,
		});
	}

	Ok(expressions)
}

type TokenIter<'a> = Peekable<std::slice::Iter<'a, SpannedToken>>;

/// Parse the text between `${` and `}` into its source and filter chain.
fn parse_expression(body: &str) -> Result<(String, Vec<FilterCall>), String> {
	let tokens: Vec<SpannedToken> = tokenize(body)
		.map_err(|e| {
			match e {
				ConfixError::Parse { reason, .. } => reason,
				other => other.to_string(),
			}
		})?
		.into_iter()
		.filter(|spanned| !spanned.token.is_whitespace())
		.collect();

	let mut iter = tokens.iter().peekable();

	let source = match iter.next() {
		Some(SpannedToken {
			token: Token::Word(word),
			..
		}) => word.clone(),
		Some(SpannedToken { token, span }) => {
			return Err(format!(
				"expected a variable name, found {} at byte {}",
				token.describe(),
				span.start
			));
		}
		None => return Err("expected a variable name, found an empty expression".to_string()),
	};

	let mut filters = vec![];

	while let Some(spanned) = iter.next() {
		if spanned.token != Token::Pipe {
			return Err(format!(
				"expected `|` before {} at byte {}",
				spanned.token.describe(),
				spanned.span.start
			));
		}

		filters.push(parse_filter_call(&mut iter)?);
	}

	Ok((source, filters))
}

/// Parse a single filter invocation from the token stream (after the pipe).
fn parse_filter_call(iter: &mut TokenIter<'_>) -> Result<FilterCall, String> {
	let name = match iter.next() {
		Some(SpannedToken {
			token: Token::Word(name),
			..
		}) => name.clone(),
		Some(SpannedToken { token, span }) => {
			return Err(format!(
				"expected a filter name after `|`, found {} at byte {}",
				token.describe(),
				span.start
			));
		}
		None => return Err("expected a filter name after `|`".to_string()),
	};

	let mut call = FilterCall::new(name);

	if matches!(
		iter.peek(),
		Some(SpannedToken {
			token: Token::ParenOpen,
			..
		})
	) {
		iter.next();
		call.params = parse_filter_params(iter, &call.name)?;
	}

	Ok(call)
}

/// Parse `key=value` pairs up to and including the closing `)`.
fn parse_filter_params(iter: &mut TokenIter<'_>, filter: &str) -> Result<FilterParams, String> {
	let mut params = FilterParams::new();
	let unclosed = || format!("parameter list of `{filter}` is missing its closing `)`");

	loop {
		let key = match iter.next() {
			Some(SpannedToken {
				token: Token::ParenClose,
				..
			}) if params.is_empty() => return Ok(params),
			Some(SpannedToken {
				token: Token::Word(key),
				..
			}) => key.clone(),
			Some(SpannedToken { token, span }) => {
				return Err(format!(
					"expected a parameter name for `{filter}`, found {} at byte {}",
					token.describe(),
					span.start
				));
			}
			None => return Err(unclosed()),
		};

		match iter.next() {
			Some(SpannedToken {
				token: Token::Equals,
				..
			}) => {}
			Some(SpannedToken { token, span }) => {
				return Err(format!(
					"expected `=` after parameter `{key}`, found {} at byte {}",
					token.describe(),
					span.start
				));
			}
			None => return Err(unclosed()),
		}

		let value = match iter.next() {
			Some(SpannedToken {
				token: Token::Word(value) | Token::String(value, _),
				..
			}) => value.clone(),
			Some(SpannedToken { token, span }) => {
				return Err(format!(
					"expected a value for parameter `{key}`, found {} at byte {}",
					token.describe(),
					span.start
				));
			}
			None => return Err(unclosed()),
		};

		params.insert(key, value);

		match iter.next() {
			Some(SpannedToken {
				token: Token::Comma,
				..
			}) => {}
			Some(SpannedToken {
				token: Token::ParenClose,
				..
			}) => return Ok(params),
			Some(SpannedToken { token, span }) => {
				return Err(format!(
					"expected `,` or `)` in parameters of `{filter}`, found {} at byte {}",
					token.describe(),
					span.start
				));
			}
			None => return Err(unclosed()),
		}
	}
}
