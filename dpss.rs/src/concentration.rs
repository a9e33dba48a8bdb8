use std::f64::consts::PI;

use rustfft::{num_complex::Complex64, FftPlanner};

/// Fraction of a taper's energy that falls inside `[-W, W]`, with `W = nw / N`.
///
/// Evaluates `hᵀ A h`, where `A[i][j] = sin(2πW(i - j)) / (π(i - j))`, via the
/// autocorrelation of `h` so that the cost is dominated by two FFTs.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn concentration_ratio(taper: &[f64], half_bandwidth: f64) -> f64 {
	let n = taper.len();
	if n == 0 {
		return 0.;
	}

	let autocorrelation = autocorrelation(taper);
	let mut ratio = 2. * half_bandwidth * autocorrelation[0];
	for (lag, r) in autocorrelation.iter().enumerate().take(n).skip(1) {
		let lag = lag as f64;
		ratio += 2. * r * (2. * PI * half_bandwidth * lag).sin() / (PI * lag);
	}
	ratio
}

/// Non-negative lags of the linear autocorrelation of `signal`.
#[allow(clippy::cast_precision_loss)]
fn autocorrelation(signal: &[f64]) -> Vec<f64> {
	let n = signal.len();
	let transform_length = (2 * n - 1).next_power_of_two();

	let mut planner = FftPlanner::<f64>::new();
	let forward = planner.plan_fft_forward(transform_length);
	let inverse = planner.plan_fft_inverse(transform_length);

	let mut buffer = vec![Complex64::default(); transform_length];
	for (dst, &src) in buffer.iter_mut().zip(signal) {
		*dst = Complex64::new(src, 0.);
	}
	forward.process(&mut buffer);
	for c in &mut buffer {
		*c = Complex64::new(c.norm_sqr(), 0.);
	}
	inverse.process(&mut buffer);

	// https://docs.rs/rustfft/6.2.0/rustfft/index.html#normalization
	let normalization_factor = 1. / transform_length as f64;
	buffer
		.iter()
		.take(n)
		.map(|c| c.re * normalization_factor)
		.collect()
}
