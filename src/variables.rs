//! Variable substitution for request text.
//!
//! [`tokenize`] splits text into literal and `${...}` spans, [`Function`] holds the built-in
//! transforms, and [`Evaluator`] walks the tokens, resolving variables and calling functions.

pub mod evaluator;
pub mod functions;
pub mod tokenizer;

pub use evaluator::*;
pub use functions::Function;
pub use tokenizer::*;

// self
use crate::_prelude::*;

/// Named variable values available to an evaluation.
pub type Variables = BTreeMap<String, String>;
