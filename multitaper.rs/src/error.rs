use dpss::TaperError;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum MultitaperError {
	#[error("invalid parameter `{name}`: {reason}")]
	InvalidParameter { name: &'static str, reason: String },
	#[error("internal error: expected {expected} values, found {found} ({context})")]
	DimensionMismatch {
		expected: usize,
		found: usize,
		context: &'static str,
	},
	#[error("computation cancelled")]
	Cancelled,
}

impl MultitaperError {
	pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
		Self::InvalidParameter {
			name,
			reason: reason.into(),
		}
	}

	pub(crate) fn check_len(
		expected: usize,
		found: usize,
		context: &'static str,
	) -> Result<(), Self> {
		if expected == found {
			Ok(())
		} else {
			Err(Self::DimensionMismatch {
				expected,
				found,
				context,
			})
		}
	}

	/// `true` for errors that reveal a defect in this crate rather than a bad input.
	#[must_use]
	pub fn is_internal(&self) -> bool {
		matches!(self, Self::DimensionMismatch { .. })
	}
}

impl From<TaperError> for MultitaperError {
	fn from(value: TaperError) -> Self {
		match value {
			TaperError::InvalidParameter { name, reason } => Self::InvalidParameter { name, reason },
		}
	}
}

/// Non-fatal conditions detected while computing a spectrogram.
///
/// Every diagnostic is also emitted as a `tracing` warning.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Diagnostic {
	/// The number of tapers differs from `floor(2·NW) - 1`.
	TaperCountMismatch { requested: usize, optimal: usize },
	/// Some tapers have a concentration ratio below the quality threshold.
	PoorlyConcentratedTapers {
		taper_count: usize,
		well_concentrated: usize,
	},
	/// The requested upper frequency exceeds the highest representable one.
	FrequencyRangeClamped { requested: f64, clamped: f64 },
	/// The window length in seconds doesn't map to a whole number of samples.
	WindowLengthRounded { seconds: f64, samples: usize },
	/// The step in seconds doesn't map to a whole number of samples.
	StepRounded { seconds: f64, samples: usize },
}

impl Diagnostic {
	pub(crate) fn emit(self, diagnostics: &mut Vec<Diagnostic>) {
		tracing::warn!(diagnostic = ?self, "multitaper spectrogram diagnostic");
		diagnostics.push(self);
	}
}
