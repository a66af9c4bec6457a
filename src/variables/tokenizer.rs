//! Character-level lexer that separates literal text from `${...}` expressions.

// self
use crate::{_prelude::*, error::EvalError};

/// Kind of span produced by [`tokenize`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenKind {
	/// Text copied to the output unchanged.
	Literal,
	/// Body of a `${...}` marker, without the delimiters.
	Expression,
}

/// Span of the input with its byte offset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
	/// Literal or expression.
	pub kind: TokenKind,
	/// Span text (for expressions, the part between `${` and `}`).
	pub text: String,
	/// Byte offset of the span in the input (for expressions, the offset of `$`).
	pub position: usize,
}
impl Token {
	fn literal(text: impl Into<String>, position: usize) -> Self {
		Self { kind: TokenKind::Literal, text: text.into(), position }
	}

	fn expression(text: impl Into<String>, position: usize) -> Self {
		Self { kind: TokenKind::Expression, text: text.into(), position }
	}
}

/// Forward-only cursor over an input string.
///
/// The position only ever moves forward.
#[derive(Clone, Debug)]
pub struct VariablesTokenizer<'a> {
	input: &'a str,
	position: usize,
}
impl<'a> VariablesTokenizer<'a> {
	/// Creates a tokenizer positioned at the start of `input`.
	pub fn new(input: &'a str) -> Self {
		Self { input, position: 0 }
	}

	/// Current byte offset.
	pub fn position(&self) -> usize {
		self.position
	}

	/// Returns true once every character has been consumed.
	pub fn is_eof(&self) -> bool {
		self.position >= self.input.len()
	}

	/// Returns the next character without consuming it.
	pub fn peek(&self) -> Option<char> {
		self.input[self.position..].chars().next()
	}

	/// Consumes one character.
	#[allow(clippy::should_implement_trait)]
	pub fn next(&mut self) -> Result<char, EvalError> {
		let ch = self.peek().ok_or(EvalError::Eof)?;

		self.position += ch.len_utf8();

		Ok(ch)
	}

	/// Consumes everything up to and including `terminator`, returning the text before it.
	///
	/// When the terminator never appears, nothing is consumed and `None` is returned.
	pub fn next_until(&mut self, terminator: char) -> Option<&'a str> {
		let rest = &self.input[self.position..];
		let end = rest.find(terminator)?;

		self.position += end + terminator.len_utf8();

		Some(&rest[..end])
	}

	/// Consumes and returns the remainder of the input.
	pub fn eof(&mut self) -> &'a str {
		let rest = &self.input[self.position..];

		self.position = self.input.len();

		rest
	}
}

/// Splits `input` into literal and expression tokens.
///
/// An unterminated `${` is kept as literal text. Adjacent literal characters are merged.
pub fn tokenize(input: &str) -> Vec<Token> {
	let mut tokenizer = VariablesTokenizer::new(input);
	let mut tokens = Vec::new();
	let mut literal = String::new();
	let mut literal_start = 0;

	while let Ok(ch) = tokenizer.next() {
		if ch != '$' || tokenizer.peek() != Some('{') {
			literal.push(ch);

			continue;
		}

		let marker = tokenizer.position() - ch.len_utf8();

		// Skip the opening brace.
		let _ = tokenizer.next();

		match tokenizer.next_until('}') {
			Some(body) => {
				if !literal.is_empty() {
					tokens.push(Token::literal(std::mem::take(&mut literal), literal_start));
				}

				tokens.push(Token::expression(body, marker));

				literal_start = tokenizer.position();
			},
			None => {
				literal.push_str("${");
				literal.push_str(tokenizer.eof());
			},
		}
	}

	if !literal.is_empty() {
		tokens.push(Token::literal(literal, literal_start));
	}

	tokens
}
