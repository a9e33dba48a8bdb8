use std::sync::{
	atomic::{AtomicBool, Ordering},
	Arc,
};

/// Cooperative cancellation flag shared between the caller and a running computation.
///
/// Cancelling is sticky: once dispatched, every clone observes it.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	pub fn cancel(&self) {
		self.0.store(true, Ordering::Relaxed);
	}

	#[must_use]
	pub fn is_cancelled(&self) -> bool {
		self.0.load(Ordering::Relaxed)
	}
}
