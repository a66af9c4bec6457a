//! Owner-scoped memoization for values computed while evaluating expressions.
//!
//! Entries are addressed by `(owner, key, group)`. They live until the owner clears them; there
//! is no TTL and no eviction, so the cache is meant for bounded lifetimes such as one request
//! editor or one evaluation pass.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::_prelude::*;

type CacheMap = Arc<RwLock<HashMap<CacheKey, CacheValue>>>;

/// Identity of the component that owns a set of cache entries.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheOwner(String);
impl CacheOwner {
	/// Wraps an explicit owner name.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Allocates a process-unique owner identity.
	pub fn unique() -> Self {
		static NEXT: AtomicU64 = AtomicU64::new(1);

		Self(format!("owner-{}", NEXT.fetch_add(1, Ordering::Relaxed)))
	}

	/// Returns the owner name.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl Display for CacheOwner {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// Scalar value stored in the cache.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CacheValue {
	/// Numeric value (timestamps, random numbers).
	Number(i64),
	/// Text value.
	Text(String),
}
impl Display for CacheValue {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Number(value) => write!(f, "{value}"),
			Self::Text(value) => f.write_str(value),
		}
	}
}
impl From<i64> for CacheValue {
	fn from(value: i64) -> Self {
		Self::Number(value)
	}
}
impl From<String> for CacheValue {
	fn from(value: String) -> Self {
		Self::Text(value)
	}
}
impl From<&str> for CacheValue {
	fn from(value: &str) -> Self {
		Self::Text(value.to_owned())
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct CacheKey {
	owner: CacheOwner,
	key: String,
	group: String,
}
impl CacheKey {
	fn new(owner: &CacheOwner, key: &str, group: &str) -> Self {
		Self { owner: owner.clone(), key: key.to_owned(), group: group.to_owned() }
	}
}

/// Thread-safe `(owner, key, group)` store.
///
/// Cloning the cache shares the same backing map.
#[derive(Clone, Debug, Default)]
pub struct Cache(CacheMap);
impl Cache {
	/// Stores a value, silently replacing any previous one.
	pub fn store(&self, owner: &CacheOwner, key: &str, group: &str, value: impl Into<CacheValue>) {
		self.0.write().insert(CacheKey::new(owner, key, group), value.into());
	}

	/// Returns the cached value, or `None` on a miss.
	pub fn find(&self, owner: &CacheOwner, key: &str, group: &str) -> Option<CacheValue> {
		self.0.read().get(&CacheKey::new(owner, key, group)).cloned()
	}

	/// Returns the cached value or computes, stores, and returns a new one.
	pub fn find_or_store_with<F>(
		&self,
		owner: &CacheOwner,
		key: &str,
		group: &str,
		init: F,
	) -> CacheValue
	where
		F: FnOnce() -> CacheValue,
	{
		let mut guard = self.0.write();

		guard.entry(CacheKey::new(owner, key, group)).or_insert_with(init).clone()
	}

	/// Drops every entry that belongs to `owner`.
	pub fn clear(&self, owner: &CacheOwner) {
		self.0.write().retain(|entry, _| &entry.owner != owner);
	}

	/// Total number of entries across all owners.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns true when nothing is cached.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn store_then_find_returns_value() {
		let cache = Cache::default();
		let owner = CacheOwner::new("editor-1");

		cache.store(&owner, "random", "a", 42_i64);
		cache.store(&owner, "label", "", "hello");

		assert_eq!(cache.find(&owner, "random", "a"), Some(CacheValue::Number(42)));
		assert_eq!(cache.find(&owner, "label", ""), Some(CacheValue::Text("hello".into())));
		assert_eq!(cache.find(&owner, "random", "b"), None);
	}

	#[test]
	fn store_overwrites_existing_entry() {
		let cache = Cache::default();
		let owner = CacheOwner::new("editor-1");

		cache.store(&owner, "now", "g", 1_i64);
		cache.store(&owner, "now", "g", 2_i64);

		assert_eq!(cache.find(&owner, "now", "g"), Some(CacheValue::Number(2)));
		assert_eq!(cache.len(), 1);
	}

	#[test]
	fn clear_only_drops_entries_of_one_owner() {
		let cache = Cache::default();
		let first = CacheOwner::unique();
		let second = CacheOwner::unique();

		assert_ne!(first, second);

		cache.store(&first, "random", "a", 1_i64);
		cache.store(&first, "now", "a", 2_i64);
		cache.store(&second, "random", "a", 3_i64);
		cache.clear(&first);

		assert_eq!(cache.find(&first, "random", "a"), None);
		assert_eq!(cache.find(&first, "now", "a"), None);
		assert_eq!(cache.find(&second, "random", "a"), Some(CacheValue::Number(3)));
	}

	#[test]
	fn find_or_store_with_only_initializes_once() {
		let cache = Cache::default();
		let owner = CacheOwner::new("editor");
		let first = cache.find_or_store_with(&owner, "random", "x", || CacheValue::Number(7));
		let second = cache.find_or_store_with(&owner, "random", "x", || CacheValue::Number(8));

		assert_eq!(first, second);
	}
}
