use std::borrow::Cow;

use crate::{MultitaperError, PaddingPolicy};

/// A window of the signal, `window_len` samples long, starting at `offset`.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment<'a> {
	pub offset: usize,
	/// Borrowed from the signal, or owned when zero padding was needed.
	pub samples: Cow<'a, [f64]>,
	/// Leading samples taken from the signal, the rest is zero padding.
	pub n_of_signal_samples: usize,
}

/// Start offsets and lengths of the segments a signal is sliced into.
///
/// Plans are cheap to copy, [`SegmentPlan::iter`] can be called any number of times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentPlan {
	signal_len: usize,
	window_len: usize,
	step: usize,
	padding: PaddingPolicy,
}

impl SegmentPlan {
	/// # Errors
	/// - [`MultitaperError::InvalidParameter`] if `window_len` or `step` is zero, or if
	///   the signal is too short for a single segment under the chosen padding policy
	pub fn new(
		signal_len: usize,
		window_len: usize,
		step: usize,
		padding: PaddingPolicy,
	) -> Result<Self, MultitaperError> {
		if window_len == 0 {
			return Err(MultitaperError::invalid(
				"window_len",
				"at least one sample is required",
			));
		}
		if step == 0 {
			return Err(MultitaperError::invalid(
				"step",
				"at least one sample is required",
			));
		}
		let plan = Self {
			signal_len,
			window_len,
			step,
			padding,
		};
		if plan.len() == 0 {
			return Err(MultitaperError::invalid(
				"window_len",
				format!(
					"a window of {window_len} samples doesn't fit in a signal of {signal_len} samples"
				),
			));
		}
		Ok(plan)
	}

	#[must_use]
	pub fn window_len(&self) -> usize {
		self.window_len
	}

	#[must_use]
	pub fn step(&self) -> usize {
		self.step
	}

	/// Number of segments: `floor((L - N) / S) + 1` whole windows when `L ≥ N`, plus one
	/// zero-padded trailing window if the padding policy asks for it and samples remain.
	#[must_use]
	pub fn len(&self) -> usize {
		let whole = if self.signal_len >= self.window_len {
			(self.signal_len - self.window_len) / self.step + 1
		} else {
			0
		};
		let next_offset = whole * self.step;
		let trailing = self.padding == PaddingPolicy::ZeroPad && next_offset < self.signal_len;
		whole + usize::from(trailing)
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	#[must_use]
	pub fn offsets(&self) -> Vec<usize> {
		(0..self.len()).map(|i| i * self.step).collect()
	}

	#[must_use]
	pub fn iter<'a>(&self, signal: &'a [f64]) -> Segments<'a> {
		debug_assert_eq!(signal.len(), self.signal_len, "signal doesn't match the plan");
		Segments {
			signal,
			window_len: self.window_len,
			step: self.step,
			index: 0,
			len: self.len(),
		}
	}

	/// The `index`-th segment, usable for random access from parallel workers.
	///
	/// # Panics
	/// - if `index >= self.len()`
	#[must_use]
	pub fn segment<'a>(&self, signal: &'a [f64], index: usize) -> Segment<'a> {
		assert!(index < self.len(), "segment index out of range");
		extract(signal, index * self.step, self.window_len)
	}
}

fn extract(signal: &[f64], offset: usize, window_len: usize) -> Segment<'_> {
	let end = offset + window_len;
	if end <= signal.len() {
		return Segment {
			offset,
			samples: Cow::Borrowed(&signal[offset..end]),
			n_of_signal_samples: window_len,
		};
	}
	let available = &signal[offset..];
	let mut padded = vec![0.; window_len];
	padded[..available.len()].copy_from_slice(available);
	Segment {
		offset,
		samples: Cow::Owned(padded),
		n_of_signal_samples: available.len(),
	}
}

#[derive(Debug, Clone)]
pub struct Segments<'a> {
	signal: &'a [f64],
	window_len: usize,
	step: usize,
	index: usize,
	len: usize,
}

impl<'a> Iterator for Segments<'a> {
	type Item = Segment<'a>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.index < self.len {
			let segment = extract(self.signal, self.index * self.step, self.window_len);
			self.index += 1;
			Some(segment)
		} else {
			None
		}
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		let remaining = self.len - self.index;
		(remaining, Some(remaining))
	}
}

impl ExactSizeIterator for Segments<'_> {}
