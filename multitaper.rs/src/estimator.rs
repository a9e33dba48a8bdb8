use std::sync::Arc;

use rustfft::{num_complex::Complex64, Fft, FftPlanner};

use crate::{MultitaperError, TransformCtx};

/// Power spectral density of one tapered segment.
///
/// Output values are `|DFT(segment · taper)|² / sample_rate`, folded into the
/// non-negative frequencies for one-sided transforms, so that summing them times the
/// frequency gap gives back the energy of the tapered segment.
#[derive(Clone)]
pub struct SpectralEstimator {
	ctx: TransformCtx,
	window_len: usize,
	fft_processor: Arc<dyn Fft<f64>>,
	complex_signal: Vec<Complex64>,
}

impl std::fmt::Debug for SpectralEstimator {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SpectralEstimator")
			.field("ctx", &self.ctx)
			.field("window_len", &self.window_len)
			.field("fft_processor", &"omitted")
			.field("complex_signal", &"omitted")
			.finish()
	}
}

impl SpectralEstimator {
	/// # Errors
	/// - [`MultitaperError::InvalidParameter`] if `window_len` is zero or larger than the transform length
	pub fn new(ctx: TransformCtx, window_len: usize) -> Result<Self, MultitaperError> {
		if window_len == 0 || window_len > ctx.transform_length() {
			return Err(MultitaperError::invalid(
				"transform_length",
				format!(
					"expected at least {window_len} points, got {}",
					ctx.transform_length()
				),
			));
		}
		let mut planner = FftPlanner::new();
		Ok(Self {
			ctx,
			window_len,
			fft_processor: planner.plan_fft_forward(ctx.transform_length()),
			complex_signal: vec![Complex64::default(); ctx.transform_length()],
		})
	}

	#[must_use]
	pub fn ctx(&self) -> TransformCtx {
		self.ctx
	}

	#[must_use]
	pub fn n_of_bins(&self) -> usize {
		self.ctx.n_of_bins()
	}

	/// # Errors
	/// - [`MultitaperError::DimensionMismatch`] if `segment` or `taper` aren't `window_len` long
	pub fn estimate(&mut self, segment: &[f64], taper: &[f64]) -> Result<Vec<f64>, MultitaperError> {
		let mut spectrum = vec![0.; self.n_of_bins()];
		self.estimate_into(segment, taper, &mut spectrum)?;
		Ok(spectrum)
	}

	/// Same as [`SpectralEstimator::estimate`], writing into a caller-provided buffer.
	///
	/// # Errors
	/// - [`MultitaperError::DimensionMismatch`] if `segment` or `taper` aren't `window_len` long,
	///   or if `spectrum` doesn't hold exactly one value per bin
	pub fn estimate_into(
		&mut self,
		segment: &[f64],
		taper: &[f64],
		spectrum: &mut [f64],
	) -> Result<(), MultitaperError> {
		MultitaperError::check_len(self.window_len, segment.len(), "segment length")?;
		MultitaperError::check_len(self.window_len, taper.len(), "taper length")?;
		MultitaperError::check_len(self.n_of_bins(), spectrum.len(), "spectrum length")?;

		for (i, c) in self.complex_signal.iter_mut().enumerate() {
			*c = if i < self.window_len {
				Complex64::new(segment[i] * taper[i], 0.)
			} else {
				Complex64::default()
			};
		}

		self.fft_processor.process(&mut self.complex_signal);

		let normalization_factor = 1. / self.ctx.sample_rate().hz();
		for (bin, (dst, src)) in spectrum
			.iter_mut()
			.zip(self.complex_signal.iter())
			.enumerate()
		{
			*dst = src.norm_sqr() * normalization_factor * self.ctx.fold_gain(bin);
		}

		Ok(())
	}
}
