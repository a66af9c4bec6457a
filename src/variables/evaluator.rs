//! Expression evaluator that resolves `${name}` and `${fn(args)}` markers.

// crates.io
use rand::Rng;
// self
use crate::{
	_prelude::*,
	cache::{Cache, CacheOwner, CacheValue},
	error::EvalError,
	variables::{Function, TokenKind, Variables, tokenize},
};

/// Substitutes variables and function calls inside request text.
///
/// `now(group)` and `random(group)` memoize their result in the shared [`Cache`] under this
/// evaluator's owner, so every occurrence of `${random(1)}` in one request resolves to the same
/// number until [`Evaluator::reset`] is called.
#[derive(Clone, Debug)]
pub struct Evaluator {
	cache: Cache,
	owner: CacheOwner,
}
impl Evaluator {
	/// Maximum nesting of variables that reference other variables.
	pub const MAX_DEPTH: usize = 8;

	/// Creates an evaluator that memoizes into `cache` as `owner`.
	pub fn new(cache: Cache, owner: CacheOwner) -> Self {
		Self { cache, owner }
	}

	/// Owner identity used for cache entries.
	pub fn owner(&self) -> &CacheOwner {
		&self.owner
	}

	/// Forgets every memoized `now`/`random` value of this evaluator.
	pub fn reset(&self) {
		self.cache.clear(&self.owner);
	}

	/// Evaluates every `${...}` marker in `input`.
	///
	/// Unknown variables are left in place as written.
	pub fn evaluate(&self, input: &str, variables: &Variables) -> Result<String> {
		Ok(self.evaluate_at(input, variables, 0)?)
	}

	/// Evaluates the value of every variable against the whole set.
	///
	/// Each value gets the same depth budget as [`Self::evaluate`] would give it.
	pub fn evaluate_variables(&self, variables: &Variables) -> Result<Variables> {
		let mut resolved = Variables::new();

		for (name, value) in variables {
			resolved.insert(name.clone(), self.evaluate_at(value, variables, 0)?);
		}

		Ok(resolved)
	}

	fn evaluate_at(
		&self,
		input: &str,
		variables: &Variables,
		depth: usize,
	) -> Result<String, EvalError> {
		if depth > Self::MAX_DEPTH {
			return Err(EvalError::RecursionLimit { depth: Self::MAX_DEPTH });
		}

		let mut output = String::with_capacity(input.len());

		for token in tokenize(input) {
			match token.kind {
				TokenKind::Literal => output.push_str(&token.text),
				TokenKind::Expression =>
					output.push_str(&self.expression(&token.text, variables, depth)?),
			}
		}

		Ok(output)
	}

	fn expression(
		&self,
		body: &str,
		variables: &Variables,
		depth: usize,
	) -> Result<String, EvalError> {
		let trimmed = body.trim();

		if let Some((name, args)) = parse_call(trimmed) {
			let function = Function::from_name(name)
				.ok_or_else(|| EvalError::UnknownFunction { name: name.to_owned() })?;

			return match function {
				Function::Now => Ok(self.memoized("now", args.first(), now_millis).to_string()),
				Function::Random =>
					Ok(self.memoized("random", args.first(), random_number).to_string()),
				_ => function.apply(&args),
			};
		}

		match variables.get(trimmed) {
			Some(value) => self.evaluate_at(value, variables, depth + 1),
			None => Ok(format!("${{{body}}}")),
		}
	}

	fn memoized(&self, key: &str, group: Option<&String>, init: fn() -> i64) -> CacheValue {
		match group {
			Some(group) =>
				self.cache.find_or_store_with(&self.owner, key, group, || CacheValue::Number(init())),
			None => CacheValue::Number(init()),
		}
	}
}

fn parse_call(body: &str) -> Option<(&str, Vec<String>)> {
	let inner = body.strip_suffix(')')?;
	let (name, raw_args) = inner.split_once('(')?;

	if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
		return None;
	}

	let args = if raw_args.trim().is_empty() {
		Vec::new()
	} else {
		raw_args.split(',').map(|arg| unquote(arg.trim()).to_owned()).collect()
	};

	Some((name, args))
}

fn unquote(arg: &str) -> &str {
	for quote in ['"', '\''] {
		if let Some(inner) = arg.strip_prefix(quote).and_then(|rest| rest.strip_suffix(quote)) {
			return inner;
		}
	}

	arg
}

fn now_millis() -> i64 {
	let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;

	i64::try_from(nanos).unwrap_or(i64::MAX)
}

fn random_number() -> i64 {
	i64::from(rand::rng().random::<u32>())
}
