use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use hashbrown::HashMap;

use crate::{TaperError, TaperSet};

/// `(window_len, time_bandwidth bit pattern, taper_count)`
type TaperKey = (usize, u64, usize);

/// Memoizes [`TaperSet`]s by their exact parameter tuple.
///
/// Taper sets are immutable once generated, so entries are never invalidated.
#[derive(Debug, Default)]
pub struct TaperCache {
	entries: Mutex<HashMap<TaperKey, Arc<TaperSet>>>,
}

impl TaperCache {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Process-wide instance.
	pub fn global() -> &'static Self {
		static GLOBAL: OnceLock<TaperCache> = OnceLock::new();
		GLOBAL.get_or_init(TaperCache::new)
	}

	/// Returns the cached taper set for the given parameters, generating it on a miss.
	///
	/// Generation happens outside of the lock, concurrent misses on the same key may
	/// both compute the set but only the first inserted one is kept and shared.
	///
	/// # Errors
	/// - [`TaperError`] if the parameters are invalid, see [`TaperSet::generate`]
	pub fn get_or_generate(
		&self,
		window_len: usize,
		time_bandwidth: f64,
		taper_count: usize,
	) -> Result<Arc<TaperSet>, TaperError> {
		let key = (window_len, time_bandwidth.to_bits(), taper_count);

		if let Some(hit) = self.lock().get(&key) {
			return Ok(hit.clone());
		}

		let generated = Arc::new(TaperSet::generate(
			window_len,
			time_bandwidth,
			taper_count,
		)?);
		tracing::debug!(window_len, time_bandwidth, taper_count, "caching taper set");

		Ok(self.lock().entry(key).or_insert(generated).clone())
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.lock().len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.lock().is_empty()
	}

	pub fn clear(&self) {
		self.lock().clear();
	}

	// Entries are immutable, a panic while holding the lock can't leave them inconsistent.
	fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<TaperKey, Arc<TaperSet>>> {
		self.entries.lock().unwrap_or_else(PoisonError::into_inner)
	}
}
