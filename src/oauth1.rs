//! OAuth 1.0a: request signing and the three-legged credential dance.

pub mod flow;
pub mod signature;

pub use flow::*;
pub use signature::*;
