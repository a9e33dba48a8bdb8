use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::{MultitaperError, SampleRate, TransformCtx};

/// Time-frequency power matrix, stored row-major: one row per time bin, one column
/// per frequency bin. Values are linear power spectral densities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSpectrogram")]
pub struct Spectrogram {
	n_of_times: usize,
	n_of_frequencies: usize,
	values: Vec<f64>,
}

/// Unchecked wire form of [`Spectrogram`].
#[derive(Deserialize)]
struct RawSpectrogram {
	n_of_times: usize,
	n_of_frequencies: usize,
	values: Vec<f64>,
}

impl TryFrom<RawSpectrogram> for Spectrogram {
	type Error = MultitaperError;

	fn try_from(raw: RawSpectrogram) -> Result<Self, Self::Error> {
		Self::from_row_major(raw.n_of_times, raw.n_of_frequencies, raw.values)
	}
}

impl Spectrogram {
	/// # Errors
	/// - [`MultitaperError::DimensionMismatch`] if `values` doesn't hold exactly
	///   `n_of_times · n_of_frequencies` elements
	pub fn from_row_major(
		n_of_times: usize,
		n_of_frequencies: usize,
		values: Vec<f64>,
	) -> Result<Self, MultitaperError> {
		let n_of_cells = n_of_times.checked_mul(n_of_frequencies).ok_or(
			MultitaperError::DimensionMismatch {
				expected: usize::MAX,
				found: values.len(),
				context: "spectrogram cells",
			},
		)?;
		MultitaperError::check_len(n_of_cells, values.len(), "spectrogram cells")?;
		Ok(Self {
			n_of_times,
			n_of_frequencies,
			values,
		})
	}

	#[must_use]
	pub fn n_of_times(&self) -> usize {
		self.n_of_times
	}

	#[must_use]
	pub fn n_of_frequencies(&self) -> usize {
		self.n_of_frequencies
	}

	#[must_use]
	pub fn get(&self, time: usize, frequency: usize) -> Option<f64> {
		(time < self.n_of_times && frequency < self.n_of_frequencies)
			.then(|| self.values[time * self.n_of_frequencies + frequency])
	}

	/// # Panics
	/// - if `time >= self.n_of_times()`
	#[must_use]
	pub fn row(&self, time: usize) -> &[f64] {
		assert!(time < self.n_of_times, "time index out of range");
		&self.values[time * self.n_of_frequencies..(time + 1) * self.n_of_frequencies]
	}

	/// One slice per time bin, empty ones when there are no frequency columns.
	pub fn rows(&self) -> impl ExactSizeIterator<Item = &[f64]> {
		(0..self.n_of_times).map(move |time| self.row(time))
	}

	#[must_use]
	pub fn as_row_major(&self) -> &[f64] {
		&self.values
	}

	#[must_use]
	pub fn into_row_major(self) -> Vec<f64> {
		self.values
	}

	/// Frequency-major copy, for hosts that store matrices by column.
	#[must_use]
	pub fn to_column_major(&self) -> Vec<f64> {
		let mut transposed = Vec::with_capacity(self.values.len());
		for frequency in 0..self.n_of_frequencies {
			transposed.extend(
				(0..self.n_of_times).map(|time| self.values[time * self.n_of_frequencies + frequency]),
			);
		}
		transposed
	}

	/// `10·log10(value)`, with silent cells mapped to negative infinity.
	#[must_use]
	pub fn to_db(&self) -> Self {
		Self {
			values: self.values.iter().map(|v| 10. * v.log10()).collect(),
			..*self
		}
	}

	/// Keeps only the given frequency columns.
	#[must_use]
	pub fn select_frequencies(&self, columns: Range<usize>) -> Self {
		let width = columns.len();
		let mut values = Vec::with_capacity(self.n_of_times * width);
		for row in self.rows() {
			values.extend_from_slice(&row[columns.clone()]);
		}
		Self {
			n_of_times: self.n_of_times,
			n_of_frequencies: width,
			values,
		}
	}
}

/// Stacks per-segment spectra into a [`Spectrogram`] with its time and frequency axes.
#[derive(Debug, Clone)]
pub struct SpectrogramAssembler {
	sample_rate: SampleRate,
	window_len: usize,
	ctx: TransformCtx,
}

/// Spectrogram matrix and the axes its rows and columns correspond to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssembledSpectrogram {
	pub spectrogram: Spectrogram,
	/// Window centers in seconds, one per row.
	pub times: Vec<f64>,
	/// Bin frequencies in Hz, one per column.
	pub frequencies: Vec<f64>,
}

impl SpectrogramAssembler {
	#[must_use]
	pub fn new(ctx: TransformCtx, window_len: usize) -> Self {
		Self {
			sample_rate: ctx.sample_rate(),
			window_len,
			ctx,
		}
	}

	/// `offsets[t]` is the first sample of the segment `per_segment[t]` was computed from.
	///
	/// # Errors
	/// - [`MultitaperError::DimensionMismatch`] if offsets and spectra don't pair up or
	///   if any spectrum doesn't hold one value per frequency bin
	#[allow(clippy::cast_precision_loss)]
	pub fn assemble(
		&self,
		per_segment: Vec<Vec<f64>>,
		offsets: &[usize],
	) -> Result<AssembledSpectrogram, MultitaperError> {
		MultitaperError::check_len(offsets.len(), per_segment.len(), "segment spectra")?;
		let n_of_frequencies = self.ctx.n_of_bins();

		let mut values = Vec::with_capacity(per_segment.len() * n_of_frequencies);
		for spectrum in per_segment {
			MultitaperError::check_len(n_of_frequencies, spectrum.len(), "segment spectrum")?;
			values.extend(spectrum);
		}

		let half_window = self.window_len as f64 / 2.;
		Ok(AssembledSpectrogram {
			spectrogram: Spectrogram::from_row_major(offsets.len(), n_of_frequencies, values)?,
			times: offsets
				.iter()
				.map(|&offset| self.sample_rate.samples_to_seconds(offset as f64 + half_window))
				.collect(),
			frequencies: self.ctx.frequencies(),
		})
	}
}

impl AssembledSpectrogram {
	/// Keeps only the given frequency columns, along with their axis values.
	#[must_use]
	pub fn restrict_to(&self, columns: Range<usize>) -> Self {
		Self {
			spectrogram: self.spectrogram.select_frequencies(columns.clone()),
			times: self.times.clone(),
			frequencies: self.frequencies[columns].to_vec(),
		}
	}
}
