use std::{ops::Range, sync::Arc};

use dpss::{optimal_taper_count, TaperCache, TaperSet};
use serde::{Deserialize, Serialize};

use crate::{
	CancellationToken, Detrend, Diagnostic, MultitaperAverager, MultitaperConfig, MultitaperError,
	SampleRate, MAX_TRANSFORM_LENGTH, SegmentPlan, SpectralEstimator, Spectrogram, SpectrogramAssembler, TransformCtx,
};

/// Result of [`compute_spectrogram`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultitaperSpectrogram {
	/// Linear power spectral density, one row per segment.
	pub spectrogram: Spectrogram,
	/// Segment centers in seconds.
	pub times: Vec<f64>,
	/// Column frequencies in Hz.
	pub frequencies: Vec<f64>,
	/// Non-fatal conditions met while planning the computation.
	pub diagnostics: Vec<Diagnostic>,
}

/// Computes the multitaper spectrogram of `signal`, sampled at `sample_rate` Hz.
///
/// Every parameter is validated before any spectrum is computed: on error no work
/// has been done.
///
/// # Errors
/// - [`MultitaperError::InvalidParameter`] if the signal is empty or contains non-finite
///   samples, or if any configuration value is out of range
/// - [`MultitaperError::DimensionMismatch`] on an internal inconsistency
pub fn compute_spectrogram(
	signal: &[f64],
	sample_rate: f64,
	config: &MultitaperConfig,
) -> Result<MultitaperSpectrogram, MultitaperError> {
	compute_spectrogram_with_cancel(signal, sample_rate, config, &CancellationToken::new())
}

/// Same as [`compute_spectrogram`], abandoning the computation as soon as `cancel` is set.
///
/// # Errors
/// - [`MultitaperError::Cancelled`] if `cancel` was set before every segment was processed
/// - see [`compute_spectrogram`]
pub fn compute_spectrogram_with_cancel(
	signal: &[f64],
	sample_rate: f64,
	config: &MultitaperConfig,
	cancel: &CancellationToken,
) -> Result<MultitaperSpectrogram, MultitaperError> {
	let plan = Plan::new(signal, sample_rate, config)?;
	plan.execute(signal, cancel)
}

/// Everything derived from the parameters, shared read-only by the segment workers.
#[derive(Debug)]
struct Plan {
	segments: SegmentPlan,
	tapers: Arc<TaperSet>,
	ctx: TransformCtx,
	columns: Range<usize>,
	estimator: SpectralEstimator,
	averager: MultitaperAverager,
	detrend: Detrend,
	diagnostics: Vec<Diagnostic>,
}

impl Plan {
	fn new(
		signal: &[f64],
		sample_rate: f64,
		config: &MultitaperConfig,
	) -> Result<Self, MultitaperError> {
		let sample_rate = SampleRate::new(sample_rate)?;
		validate_signal(signal)?;
		let mut diagnostics = Vec::new();

		let window = sample_rate.seconds_to_samples("window_seconds", config.window_seconds)?;
		if !window.exact {
			Diagnostic::WindowLengthRounded {
				seconds: config.window_seconds,
				samples: window.samples,
			}
			.emit(&mut diagnostics);
		}
		let step = sample_rate.seconds_to_samples("step_seconds", config.step_seconds)?;
		if !step.exact {
			Diagnostic::StepRounded {
				seconds: config.step_seconds,
				samples: step.samples,
			}
			.emit(&mut diagnostics);
		}
		let window_len = window.samples;
		if window_len > MAX_TRANSFORM_LENGTH {
			return Err(MultitaperError::invalid(
				"window_seconds",
				format!("{window_len} samples, at most {MAX_TRANSFORM_LENGTH} are supported"),
			));
		}

		let segments = SegmentPlan::new(signal.len(), window_len, step.samples, config.padding)?;
		let ctx = TransformCtx::new(
			sample_rate,
			config.transform_length.resolve(window_len)?,
			config.sides,
		);
		let columns = frequency_columns(&ctx, config.frequency_range, &mut diagnostics)?;

		let optimal = optimal_taper_count(config.time_bandwidth);
		let taper_count = config.taper_count.unwrap_or(optimal);
		let tapers =
			TaperCache::global().get_or_generate(window_len, config.time_bandwidth, taper_count)?;
		if taper_count != optimal {
			Diagnostic::TaperCountMismatch {
				requested: taper_count,
				optimal,
			}
			.emit(&mut diagnostics);
		}
		let well_concentrated = tapers.n_of_well_concentrated();
		if well_concentrated < tapers.len() {
			Diagnostic::PoorlyConcentratedTapers {
				taper_count: tapers.len(),
				well_concentrated,
			}
			.emit(&mut diagnostics);
		}

		tracing::debug!(
			window_len,
			step = step.samples,
			taper_count,
			transform_length = ctx.transform_length(),
			n_of_segments = segments.len(),
			n_of_columns = columns.len(),
			"planned multitaper spectrogram"
		);

		Ok(Self {
			segments,
			estimator: SpectralEstimator::new(ctx, window_len)?,
			averager: MultitaperAverager::new(config.weighting, tapers.concentrations(), &ctx),
			tapers,
			ctx,
			columns,
			detrend: config.detrend,
			diagnostics,
		})
	}

	fn execute(
		&self,
		signal: &[f64],
		cancel: &CancellationToken,
	) -> Result<MultitaperSpectrogram, MultitaperError> {
		let n_of_segments = self.segments.len();

		#[cfg(feature = "parallel")]
		let rows: Result<Vec<Vec<f64>>, MultitaperError> = {
			use rayon::prelude::*;
			(0..n_of_segments)
				.into_par_iter()
				.map(|index| self.segment_spectrum(signal, index, cancel))
				.collect()
		};

		#[cfg(not(feature = "parallel"))]
		let rows: Result<Vec<Vec<f64>>, MultitaperError> = (0..n_of_segments)
			.map(|index| self.segment_spectrum(signal, index, cancel))
			.collect();

		let assembled = SpectrogramAssembler::new(self.ctx, self.segments.window_len())
			.assemble(rows?, &self.segments.offsets())?;
		let assembled = if self.columns.len() == self.ctx.n_of_bins() {
			assembled
		} else {
			assembled.restrict_to(self.columns.clone())
		};

		Ok(MultitaperSpectrogram {
			spectrogram: assembled.spectrogram,
			times: assembled.times,
			frequencies: assembled.frequencies,
			diagnostics: self.diagnostics.clone(),
		})
	}

	/// Taper-reduce stage: the spectra of every taper of a segment, combined into one row.
	fn segment_spectrum(
		&self,
		signal: &[f64],
		index: usize,
		cancel: &CancellationToken,
	) -> Result<Vec<f64>, MultitaperError> {
		if cancel.is_cancelled() {
			return Err(MultitaperError::Cancelled);
		}

		let segment = self.segments.segment(signal, index);
		tracing::trace!(index, offset = segment.offset, "processing segment");
		let mut samples = segment.samples.into_owned();
		// The zero padding of a trailing segment is not part of the trend.
		self.detrend.apply(&mut samples[..segment.n_of_signal_samples]);

		if samples.iter().all(|&s| s == 0.) {
			return Ok(vec![0.; self.ctx.n_of_bins()]);
		}

		let per_taper = self.taper_spectra(&samples, cancel)?;

		#[allow(clippy::cast_precision_loss)]
		let mean_square = samples.iter().map(|s| s * s).sum::<f64>() / samples.len() as f64;
		self.averager.combine(&per_taper, mean_square)
	}

	/// One spectrum per taper, in taper order.
	#[cfg(feature = "parallel")]
	fn taper_spectra(
		&self,
		samples: &[f64],
		cancel: &CancellationToken,
	) -> Result<Vec<Vec<f64>>, MultitaperError> {
		use rayon::prelude::*;
		(0..self.tapers.len())
			.into_par_iter()
			.map_init(
				|| self.estimator.clone(),
				|estimator, order| {
					if cancel.is_cancelled() {
						return Err(MultitaperError::Cancelled);
					}
					estimator.estimate(samples, self.tapers.taper(order))
				},
			)
			.collect()
	}

	#[cfg(not(feature = "parallel"))]
	fn taper_spectra(
		&self,
		samples: &[f64],
		cancel: &CancellationToken,
	) -> Result<Vec<Vec<f64>>, MultitaperError> {
		let mut estimator = self.estimator.clone();
		self.tapers
			.iter()
			.map(|taper| {
				if cancel.is_cancelled() {
					return Err(MultitaperError::Cancelled);
				}
				estimator.estimate(samples, taper)
			})
			.collect()
	}
}

fn validate_signal(signal: &[f64]) -> Result<(), MultitaperError> {
	if signal.is_empty() {
		return Err(MultitaperError::invalid("signal", "at least one sample is required"));
	}
	if let Some((index, value)) = signal.iter().enumerate().find(|(_, s)| !s.is_finite()) {
		return Err(MultitaperError::invalid(
			"signal",
			format!("sample {index} is {value}"),
		));
	}
	Ok(())
}

/// Columns kept by the inclusive `(min, max)` filter. A `max` above the highest bin
/// frequency is clamped to it.
fn frequency_columns(
	ctx: &TransformCtx,
	range: Option<(f64, f64)>,
	diagnostics: &mut Vec<Diagnostic>,
) -> Result<Range<usize>, MultitaperError> {
	let Some((min, max)) = range else {
		return Ok(0..ctx.n_of_bins());
	};
	if !min.is_finite() || max.is_nan() || min < 0. || min >= max {
		return Err(MultitaperError::invalid(
			"frequency_range",
			format!("expected 0 ≤ min < max, got ({min}, {max})"),
		));
	}

	let highest = ctx.max_frequency();
	let max = if max > highest {
		Diagnostic::FrequencyRangeClamped {
			requested: max,
			clamped: highest,
		}
		.emit(diagnostics);
		highest
	} else {
		max
	};

	let columns = ctx.bins_within(min, max);
	if columns.is_empty() {
		return Err(MultitaperError::invalid(
			"frequency_range",
			format!(
				"no frequency bin between {min}Hz and {max}Hz, bins are {}Hz apart",
				ctx.frequency_gap()
			),
		));
	}
	Ok(columns)
}
