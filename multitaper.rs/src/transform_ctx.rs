use std::ops::Range;

use crate::{SampleRate, Sides};

/// Describes the frequency bins produced by a DFT of `transform_length` points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformCtx {
	sample_rate: SampleRate,
	transform_length: usize,
	sides: Sides,
}

impl TransformCtx {
	#[must_use]
	pub const fn new(sample_rate: SampleRate, transform_length: usize, sides: Sides) -> Self {
		Self {
			sample_rate,
			transform_length,
			sides,
		}
	}

	#[must_use]
	pub const fn sample_rate(&self) -> SampleRate {
		self.sample_rate
	}

	#[must_use]
	pub const fn transform_length(&self) -> usize {
		self.transform_length
	}

	#[must_use]
	pub const fn sides(&self) -> Sides {
		self.sides
	}

	/// DFT results of real signals are mirrored.
	///
	/// When one-sided, the bins cover the frequencies between 0 and the Nyquist frequency,
	/// the latter only being present for even transform lengths.
	#[must_use]
	pub const fn n_of_bins(&self) -> usize {
		match self.sides {
			Sides::OneSided => self.transform_length / 2 + 1,
			Sides::TwoSided => self.transform_length,
		}
	}

	#[must_use]
	#[allow(clippy::cast_precision_loss)]
	pub fn frequency_gap(&self) -> f64 {
		self.sample_rate.hz() / self.transform_length as f64
	}

	#[must_use]
	#[allow(clippy::cast_precision_loss)]
	pub fn bin_to_frequency(&self, bin: usize) -> f64 {
		bin as f64 * self.frequency_gap()
	}

	/// Nearest bin, clamped to the available ones.
	#[must_use]
	#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
	pub fn frequency_to_bin(&self, frequency: f64) -> usize {
		let bin = (frequency / self.frequency_gap()).round().max(0.) as usize;
		bin.min(self.n_of_bins() - 1)
	}

	#[must_use]
	pub fn frequencies(&self) -> Vec<f64> {
		(0..self.n_of_bins())
			.map(|bin| self.bin_to_frequency(bin))
			.collect()
	}

	#[must_use]
	pub fn max_frequency(&self) -> f64 {
		self.bin_to_frequency(self.n_of_bins() - 1)
	}

	/// Power folding factor applied to a bin: one-sided spectra double every bin whose
	/// mirror image was dropped, i.e. all but DC and Nyquist.
	#[must_use]
	pub fn fold_gain(&self, bin: usize) -> f64 {
		match self.sides {
			Sides::TwoSided => 1.,
			Sides::OneSided => {
				let is_nyquist = self.transform_length % 2 == 0 && bin == self.transform_length / 2;
				if bin == 0 || is_nyquist {
					1.
				} else {
					2.
				}
			}
		}
	}

	/// Bins whose frequency lies within `min..=max`. Empty when no bin does.
	#[must_use]
	pub fn bins_within(&self, min: f64, max: f64) -> Range<usize> {
		let n = self.n_of_bins();
		let start = (0..n)
			.find(|&bin| self.bin_to_frequency(bin) >= min)
			.unwrap_or(n);
		let end = (start..n)
			.find(|&bin| self.bin_to_frequency(bin) > max)
			.unwrap_or(n);
		start..end
	}
}
