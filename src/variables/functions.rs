//! Pure text transforms callable from `${fn(arg)}` expressions.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
// self
use crate::{_prelude::*, encoding, error::EvalError};

/// Functions known to the evaluator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Function {
	/// `encodeURIComponent(value)`.
	EncodeUriComponent,
	/// `decodeURIComponent(value)`.
	DecodeUriComponent,
	/// `btoa(value)`: base64 encode.
	Btoa,
	/// `atob(value)`: base64 decode.
	Atob,
	/// `now(group?)`: epoch milliseconds, memoized per group.
	Now,
	/// `random(group?)`: random integer, memoized per group.
	Random,
}
impl Function {
	/// Every function, in lookup order.
	pub const ALL: [Function; 6] = [
		Function::EncodeUriComponent,
		Function::DecodeUriComponent,
		Function::Btoa,
		Function::Atob,
		Function::Now,
		Function::Random,
	];

	/// Name used in expressions.
	pub const fn name(self) -> &'static str {
		match self {
			Function::EncodeUriComponent => "encodeURIComponent",
			Function::DecodeUriComponent => "decodeURIComponent",
			Function::Btoa => "btoa",
			Function::Atob => "atob",
			Function::Now => "now",
			Function::Random => "random",
		}
	}

	/// Looks up a function by its expression name.
	pub fn from_name(name: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|function| function.name() == name)
	}

	/// Returns true for functions whose result depends only on the arguments.
	pub const fn is_pure(self) -> bool {
		!matches!(self, Function::Now | Function::Random)
	}

	/// Applies a pure function. `now` and `random` are resolved by the evaluator instead.
	pub fn apply(self, args: &[String]) -> Result<String, EvalError> {
		match self {
			Function::EncodeUriComponent => encode_uri_component(args),
			Function::DecodeUriComponent => decode_uri_component(args),
			Function::Btoa => btoa(args),
			Function::Atob => atob(args),
			Function::Now | Function::Random =>
				Err(EvalError::UnknownFunction { name: self.name().to_owned() }),
		}
	}
}
impl Display for Function {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.name())
	}
}

/// Percent-encodes the first argument.
pub fn encode_uri_component(args: &[String]) -> Result<String, EvalError> {
	let value = first(args, Function::EncodeUriComponent)?;

	Ok(encoding::encode_uri_component(value))
}

/// Percent-decodes the first argument.
pub fn decode_uri_component(args: &[String]) -> Result<String, EvalError> {
	let value = first(args, Function::DecodeUriComponent)?;

	encoding::decode_uri_component(value)
}

/// Base64-encodes the UTF-8 bytes of the first argument.
pub fn btoa(args: &[String]) -> Result<String, EvalError> {
	let value = first(args, Function::Btoa)?;

	Ok(STANDARD.encode(value.as_bytes()))
}

/// Base64-decodes the first argument into UTF-8 text.
pub fn atob(args: &[String]) -> Result<String, EvalError> {
	let value = first(args, Function::Atob)?;
	let bytes = STANDARD.decode(value.trim()).map_err(|_| EvalError::InvalidBase64)?;

	String::from_utf8(bytes).map_err(|_| EvalError::InvalidUtf8)
}

fn first(args: &[String], function: Function) -> Result<&str, EvalError> {
	args.first().map(String::as_str).ok_or(EvalError::MissingArgument { function: function.name() })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn args(values: &[&str]) -> Vec<String> {
		values.iter().map(|value| value.to_string()).collect()
	}

	#[test]
	fn empty_argument_lists_fail() {
		for function in [
			Function::EncodeUriComponent,
			Function::DecodeUriComponent,
			Function::Btoa,
			Function::Atob,
		] {
			assert_eq!(
				function.apply(&[]),
				Err(EvalError::MissingArgument { function: function.name() })
			);
		}
	}

	#[test]
	fn uri_component_round_trip() {
		let encoded = encode_uri_component(&args(&["a b&c=d/é"]))
			.expect("Encoding a plain string should succeed.");

		assert_eq!(encoded, "a%20b%26c%3Dd%2F%C3%A9");
		assert_eq!(
			decode_uri_component(&args(&[&encoded])).expect("Decoding should succeed."),
			"a b&c=d/é"
		);
	}

	#[test]
	fn base64_transforms() {
		assert_eq!(btoa(&args(&["user:pass"])), Ok("dXNlcjpwYXNz".into()));
		assert_eq!(atob(&args(&["dXNlcjpwYXNz"])), Ok("user:pass".into()));
		assert_eq!(atob(&args(&["%%%"])), Err(EvalError::InvalidBase64));
	}

	#[test]
	fn names_resolve_and_extra_arguments_are_ignored() {
		assert_eq!(Function::from_name("btoa"), Some(Function::Btoa));
		assert_eq!(Function::from_name("eval"), None);
		assert_eq!(btoa(&args(&["a", "ignored"])), Ok("YQ==".into()));
		assert!(!Function::Random.is_pure());
	}
}
