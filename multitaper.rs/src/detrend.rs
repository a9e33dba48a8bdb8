#![allow(clippy::cast_precision_loss)]

use crate::Detrend;

impl Detrend {
	/// Removes the trend from `samples` in place.
	pub fn apply(self, samples: &mut [f64]) {
		match self {
			Self::Off => (),
			Self::Constant => remove_mean(samples),
			Self::Linear => remove_line(samples),
		}
	}
}

fn remove_mean(samples: &mut [f64]) {
	if samples.is_empty() {
		return;
	}
	let mean = samples.iter().sum::<f64>() / samples.len() as f64;
	for s in samples {
		*s -= mean;
	}
}

/// Least-squares line fit over `x = 0..n`, centered to keep the normal equations well conditioned.
fn remove_line(samples: &mut [f64]) {
	let n = samples.len();
	if n < 2 {
		remove_mean(samples);
		return;
	}

	let center = (n - 1) as f64 / 2.;
	let mean = samples.iter().sum::<f64>() / n as f64;
	let (covariance, variance) = samples.iter().enumerate().fold(
		(0., 0.),
		|(covariance, variance), (i, &s)| {
			let x = i as f64 - center;
			(covariance + x * (s - mean), variance + x * x)
		},
	);
	let slope = covariance / variance;

	for (i, s) in samples.iter_mut().enumerate() {
		*s -= mean + slope * (i as f64 - center);
	}
}
