use derive_more::derive::Display;

use crate::MultitaperError;

/// Tolerance, in samples, under which a duration is considered a whole number of samples.
const WHOLE_SAMPLES_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Display)]
#[display("{_0}Hz")]
pub struct SampleRate(f64);

/// Result of converting a duration to a number of samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleCount {
	pub samples: usize,
	/// `false` when the duration had to be rounded.
	pub exact: bool,
}

impl SampleRate {
	/// # Errors
	/// - [`MultitaperError::InvalidParameter`] if `hz` is not a positive finite number
	pub fn new(hz: f64) -> Result<Self, MultitaperError> {
		if hz.is_finite() && hz > 0. {
			Ok(Self(hz))
		} else {
			Err(MultitaperError::invalid(
				"sample_rate",
				format!("expected a positive frequency, got {hz}"),
			))
		}
	}

	#[must_use]
	pub fn hz(&self) -> f64 {
		self.0
	}

	#[must_use]
	pub fn nyquist(&self) -> f64 {
		self.0 / 2.
	}

	/// Rounds `seconds · sample_rate` to the nearest number of samples.
	///
	/// # Errors
	/// - [`MultitaperError::InvalidParameter`] if `seconds` is not finite or
	///   if the conversion yields less than one sample or more than `usize` can count
	#[allow(
		clippy::cast_possible_truncation,
		clippy::cast_sign_loss,
		clippy::cast_precision_loss
	)]
	pub fn seconds_to_samples(
		&self,
		name: &'static str,
		seconds: f64,
	) -> Result<SampleCount, MultitaperError> {
		let raw = seconds * self.0;
		if !raw.is_finite() || raw.round() < 1. {
			return Err(MultitaperError::invalid(
				name,
				format!("{seconds}s is less than one sample at {self}"),
			));
		}
		if raw.round() >= usize::MAX as f64 {
			return Err(MultitaperError::invalid(
				name,
				format!("{seconds}s at {self} is too many samples to count"),
			));
		}
		let rounded = raw.round();
		Ok(SampleCount {
			samples: rounded as usize,
			exact: (raw - rounded).abs() <= WHOLE_SAMPLES_TOLERANCE * rounded.max(1.),
		})
	}

	#[must_use]
	pub fn samples_to_seconds(&self, samples: f64) -> f64 {
		samples / self.0
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_seconds_to_samples() {
		let rate = SampleRate::new(200.).unwrap();
		assert_eq!(
			rate.seconds_to_samples("window", 2.).unwrap(),
			SampleCount {
				samples: 400,
				exact: true
			}
		);
		assert_eq!(
			rate.seconds_to_samples("window", 0.1).unwrap(),
			SampleCount {
				samples: 20,
				exact: true
			}
		);
		assert_eq!(
			rate.seconds_to_samples("window", 0.0126).unwrap(),
			SampleCount {
				samples: 3,
				exact: false
			}
		);
	}

	#[test]
	fn test_less_than_one_sample() {
		let rate = SampleRate::new(100.).unwrap();
		assert!(rate.seconds_to_samples("step", 0.004).is_err());
		assert!(rate.seconds_to_samples("step", 0.).is_err());
		assert!(rate.seconds_to_samples("step", -1.).is_err());
		assert!(rate.seconds_to_samples("step", f64::NAN).is_err());
	}

	#[test]
	fn test_too_many_samples() {
		let rate = SampleRate::new(100.).unwrap();
		assert!(matches!(
			rate.seconds_to_samples("window_seconds", 1e30),
			Err(MultitaperError::InvalidParameter {
				name: "window_seconds",
				..
			})
		));
	}

	#[test]
	fn test_invalid_rates() {
		assert!(SampleRate::new(0.).is_err());
		assert!(SampleRate::new(-44100.).is_err());
		assert!(SampleRate::new(f64::INFINITY).is_err());
	}

	#[test]
	fn test_display() {
		assert_eq!(SampleRate::new(44100.).unwrap().to_string(), "44100Hz");
	}
}
