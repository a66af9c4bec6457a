//! URL rewrite rules applied before a request is sent.
//!
//! A rule's `from` is a case-insensitive regular expression in which `*` stands for any run of
//! characters. Rules are tried in list order and the first enabled match wins.

// crates.io
use regex::{Regex, RegexBuilder};
// self
use crate::{_prelude::*, error::ConfigError};

/// One rewrite rule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRule {
	/// Pattern matched against the URL.
	pub from: String,
	/// Replacement; may reference capture groups (`$1`).
	pub to: String,
	/// Disabled rules are skipped.
	#[serde(default = "enabled_default")]
	pub enabled: bool,
	/// Free-form note shown in the rules editor.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub comment: Option<String>,
}
impl HostRule {
	/// Creates an enabled rule.
	pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
		Self { from: from.into(), to: to.into(), enabled: true, comment: None }
	}
}

fn enabled_default() -> bool {
	true
}

/// Ordered rule list with a cache of compiled patterns.
#[derive(Debug, Default)]
pub struct HostRulesTester {
	rules: Vec<HostRule>,
	compiled: RwLock<HashMap<String, Regex>>,
}
impl HostRulesTester {
	/// Creates a tester over `rules`.
	pub fn new(rules: Vec<HostRule>) -> Self {
		Self { rules, compiled: RwLock::new(HashMap::new()) }
	}

	/// Rules in evaluation order.
	pub fn rules(&self) -> &[HostRule] {
		&self.rules
	}

	/// Rewrites `url` with the first matching enabled rule, or returns `None`.
	pub fn apply(&self, url: &str) -> Result<Option<String>> {
		for rule in self.rules.iter().filter(|rule| rule.enabled) {
			let regex = self.compile(&rule.from)?;

			if regex.is_match(url) {
				return Ok(Some(regex.replace_all(url, rule.to.as_str()).into_owned()));
			}
		}

		Ok(None)
	}

	/// Like [`Self::apply`], returning `url` unchanged when nothing matches.
	pub fn apply_or_original(&self, url: &str) -> Result<String> {
		Ok(self.apply(url)?.unwrap_or_else(|| url.to_owned()))
	}

	/// Number of patterns compiled so far.
	pub fn compiled_len(&self) -> usize {
		self.compiled.read().len()
	}

	fn compile(&self, pattern: &str) -> Result<Regex, ConfigError> {
		if let Some(regex) = self.compiled.read().get(pattern) {
			return Ok(regex.clone());
		}

		let regex = RegexBuilder::new(&pattern.replace('*', "(.*)"))
			.case_insensitive(true)
			.build()
			.map_err(|source| ConfigError::InvalidHostRule { pattern: pattern.to_owned(), source })?;

		self.compiled.write().insert(pattern.to_owned(), regex.clone());

		Ok(regex)
	}
}
impl From<Vec<HostRule>> for HostRulesTester {
	fn from(rules: Vec<HostRule>) -> Self {
		Self::new(rules)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn empty_rule_lists_never_match() {
		let tester = HostRulesTester::default();

		assert_eq!(tester.apply("http://a.com/x").expect("Empty lists should not fail."), None);
		assert_eq!(
			tester.apply_or_original("http://a.com/x").expect("Empty lists should not fail."),
			"http://a.com/x"
		);
	}

	#[test]
	fn prefix_rules_rewrite_the_prefix() {
		let tester = HostRulesTester::new(vec![HostRule::new("http://a", "http://b")]);

		assert_eq!(
			tester.apply("http://a/path?q=1").expect("Rule should apply."),
			Some("http://b/path?q=1".into())
		);
		assert_eq!(
			tester.apply("HTTP://A/upper").expect("Rule should apply."),
			Some("http://b/upper".into())
		);
	}

	#[test]
	fn wildcards_capture_and_first_enabled_rule_wins() {
		let mut disabled = HostRule::new("*api.example.com*", "disabled");

		disabled.enabled = false;

		let tester = HostRulesTester::new(vec![
			disabled,
			HostRule::new("https://*.example.com/", "http://localhost:8080/$1/"),
			HostRule::new("https://api.example.com/", "never"),
		]);

		assert_eq!(
			tester.apply("https://api.example.com/v1").expect("Rule should apply."),
			Some("http://localhost:8080/api/v1".into())
		);
		assert_eq!(tester.compiled_len(), 1);

		tester.apply("https://api.example.com/v2").expect("Rule should apply.");

		assert_eq!(tester.compiled_len(), 1);
	}

	#[test]
	fn invalid_patterns_are_reported() {
		let tester = HostRulesTester::new(vec![HostRule::new("(unclosed", "x")]);
		let err = tester.apply("http://a").expect_err("Invalid patterns must fail.");

		assert!(matches!(
			err,
			Error::Config(ConfigError::InvalidHostRule { ref pattern, .. }) if pattern == "(unclosed"
		));
	}

	#[test]
	fn rules_deserialize_with_enabled_by_default() {
		let rules: Vec<HostRule> =
			serde_json::from_str(r#"[{"from":"http://a","to":"http://b","comment":"local"}]"#)
				.expect("Rule records should deserialize.");

		assert!(rules[0].enabled);
		assert_eq!(rules[0].comment.as_deref(), Some("local"));
	}
}
