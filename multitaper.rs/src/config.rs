use serde::{Deserialize, Serialize};

use crate::MultitaperError;

/// How the per-taper spectra of a segment are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WeightingMode {
	/// Arithmetic mean.
	#[default]
	Uniform,
	/// Weighted by the concentration ratio of each taper.
	Eigen,
	/// Iterative per-bin weights that down-weight tapers with high broadband leakage.
	Adaptive,
}

impl TryFrom<u8> for WeightingMode {
	type Error = MultitaperError;

	/// Numeric selector used by host bindings: `0` uniform, `1` eigen, `2` adaptive.
	fn try_from(value: u8) -> Result<Self, Self::Error> {
		match value {
			0 => Ok(Self::Uniform),
			1 => Ok(Self::Eigen),
			2 => Ok(Self::Adaptive),
			other => Err(MultitaperError::invalid(
				"weighting",
				format!("unknown weighting selector {other}, expected 0, 1 or 2"),
			)),
		}
	}
}

/// What happens to the trailing samples that don't fill a whole window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PaddingPolicy {
	#[default]
	Drop,
	/// Emit one last segment, zero-padded to the window length.
	ZeroPad,
}

/// Trend removed from each segment before tapering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Detrend {
	#[default]
	Off,
	Constant,
	Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Sides {
	/// Non-negative frequencies only, with the power of mirrored bins folded in.
	#[default]
	OneSided,
	/// Every DFT bin, in natural `0..transform_length` order.
	TwoSided,
}

/// Largest window or transform length, in samples, a spectrogram can be planned with.
pub const MAX_TRANSFORM_LENGTH: usize = 1 << 24;

/// Length of the DFT applied to each tapered segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TransformLength {
	/// No zero padding.
	#[default]
	Window,
	/// `max(nextpow2(window), nextpow2(n))`.
	MinimumNfft(usize),
	/// Exactly `n` points, `n` must not be smaller than the window.
	Exact(usize),
}

impl TransformLength {
	/// # Errors
	/// - [`MultitaperError::InvalidParameter`] if an exact length is shorter than the window
	///   or if the resolved length exceeds [`MAX_TRANSFORM_LENGTH`]
	pub fn resolve(self, window_len: usize) -> Result<usize, MultitaperError> {
		let too_long = || {
			MultitaperError::invalid(
				"transform_length",
				format!("at most {MAX_TRANSFORM_LENGTH} points are supported"),
			)
		};
		let resolved = match self {
			Self::Window => window_len,
			Self::MinimumNfft(n) => window_len
				.checked_next_power_of_two()
				.zip(n.max(1).checked_next_power_of_two())
				.map(|(window, minimum)| window.max(minimum))
				.ok_or_else(too_long)?,
			Self::Exact(n) if n < window_len => {
				return Err(MultitaperError::invalid(
					"transform_length",
					format!("{n} points can't hold a window of {window_len} samples"),
				))
			}
			Self::Exact(n) => n,
		};
		if resolved > MAX_TRANSFORM_LENGTH {
			return Err(too_long());
		}
		Ok(resolved)
	}
}

/// Parameters of a multitaper spectrogram, everything but the signal and its sample rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultitaperConfig {
	pub window_seconds: f64,
	pub step_seconds: f64,
	/// Time-bandwidth product `NW`.
	pub time_bandwidth: f64,
	/// `None` picks `floor(2·NW) - 1`.
	pub taper_count: Option<usize>,
	pub transform_length: TransformLength,
	/// Inclusive `(min, max)` range in Hz. `None` keeps every bin.
	pub frequency_range: Option<(f64, f64)>,
	pub weighting: WeightingMode,
	pub padding: PaddingPolicy,
	pub detrend: Detrend,
	pub sides: Sides,
}

impl Default for MultitaperConfig {
	fn default() -> Self {
		Self {
			window_seconds: 5.,
			step_seconds: 1.,
			time_bandwidth: 3.,
			taper_count: None,
			transform_length: TransformLength::default(),
			frequency_range: None,
			weighting: WeightingMode::default(),
			padding: PaddingPolicy::default(),
			detrend: Detrend::default(),
			sides: Sides::default(),
		}
	}
}

impl MultitaperConfig {
	#[must_use]
	pub fn new(window_seconds: f64, step_seconds: f64, time_bandwidth: f64) -> Self {
		Self {
			window_seconds,
			step_seconds,
			time_bandwidth,
			..Self::default()
		}
	}

	#[must_use]
	pub fn with_taper_count(mut self, taper_count: usize) -> Self {
		self.taper_count = Some(taper_count);
		self
	}

	#[must_use]
	pub fn with_transform_length(mut self, transform_length: TransformLength) -> Self {
		self.transform_length = transform_length;
		self
	}

	#[must_use]
	pub fn with_frequency_range(mut self, min: f64, max: f64) -> Self {
		self.frequency_range = Some((min, max));
		self
	}

	#[must_use]
	pub fn with_weighting(mut self, weighting: WeightingMode) -> Self {
		self.weighting = weighting;
		self
	}

	#[must_use]
	pub fn with_padding(mut self, padding: PaddingPolicy) -> Self {
		self.padding = padding;
		self
	}

	#[must_use]
	pub fn with_detrend(mut self, detrend: Detrend) -> Self {
		self.detrend = detrend;
		self
	}

	#[must_use]
	pub fn with_sides(mut self, sides: Sides) -> Self {
		self.sides = sides;
		self
	}
}
