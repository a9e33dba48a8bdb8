use crate::{
	compute_spectrogram_with_cancel, CancellationToken, Diagnostic, MultitaperConfig,
	MultitaperError, Spectrogram, TransformLength, WeightingMode,
};

/// The nine positional inputs of the host-facing entry point, in order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectrogramRequest<'a> {
	pub signal: &'a [f64],
	/// Hz.
	pub sample_rate: f64,
	pub window_seconds: f64,
	pub step_seconds: f64,
	pub time_bandwidth: f64,
	/// `0` picks `floor(2·NW) - 1`.
	pub taper_count: usize,
	pub transform_length: TransformLength,
	/// Inclusive `(min, max)` in Hz, `None` keeps every bin.
	pub frequency_range: Option<(f64, f64)>,
	/// `0` uniform, `1` eigen, `2` adaptive.
	pub weighting: u8,
}

/// Outputs of [`SpectrogramRequest::call`]; axes are only present when requested.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrogramOutputs {
	pub spectrogram: Spectrogram,
	pub times: Option<Vec<f64>>,
	pub frequencies: Option<Vec<f64>>,
	pub diagnostics: Vec<Diagnostic>,
}

impl SpectrogramOutputs {
	#[must_use]
	pub fn n_of_outputs(&self) -> usize {
		1 + usize::from(self.times.is_some()) + usize::from(self.frequencies.is_some())
	}
}

pub const MAX_OUTPUTS: usize = 3;

impl SpectrogramRequest<'_> {
	/// # Errors
	/// - [`MultitaperError::InvalidParameter`] if the weighting selector is unknown
	pub fn to_config(&self) -> Result<MultitaperConfig, MultitaperError> {
		let mut config = MultitaperConfig::new(
			self.window_seconds,
			self.step_seconds,
			self.time_bandwidth,
		)
		.with_transform_length(self.transform_length)
		.with_weighting(WeightingMode::try_from(self.weighting)?);
		if self.taper_count > 0 {
			config = config.with_taper_count(self.taper_count);
		}
		if let Some((min, max)) = self.frequency_range {
			config = config.with_frequency_range(min, max);
		}
		Ok(config)
	}

	/// Runs the computation and returns the first `n_outputs` outputs, in the order
	/// spectrogram, times, frequencies. Requesting no output behaves like requesting one.
	///
	/// # Errors
	/// - [`MultitaperError::InvalidParameter`] if more than [`MAX_OUTPUTS`] outputs are
	///   requested, or see [`crate::compute_spectrogram`]
	pub fn call(&self, n_outputs: usize) -> Result<SpectrogramOutputs, MultitaperError> {
		self.call_with_cancel(n_outputs, &CancellationToken::new())
	}

	/// # Errors
	/// - see [`SpectrogramRequest::call`] and [`crate::compute_spectrogram_with_cancel`]
	pub fn call_with_cancel(
		&self,
		n_outputs: usize,
		cancel: &CancellationToken,
	) -> Result<SpectrogramOutputs, MultitaperError> {
		if n_outputs > MAX_OUTPUTS {
			return Err(MultitaperError::invalid(
				"n_outputs",
				format!("at most {MAX_OUTPUTS} outputs are available, {n_outputs} requested"),
			));
		}
		let config = self.to_config()?;
		let result = compute_spectrogram_with_cancel(self.signal, self.sample_rate, &config, cancel)?;

		Ok(SpectrogramOutputs {
			spectrogram: result.spectrogram,
			times: (n_outputs >= 2).then_some(result.times),
			frequencies: (n_outputs >= 3).then_some(result.frequencies),
			diagnostics: result.diagnostics,
		})
	}
}
