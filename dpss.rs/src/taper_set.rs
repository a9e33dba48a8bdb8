#![allow(clippy::cast_precision_loss)]

use std::f64::consts::PI;

use nalgebra::DVector;

use crate::{concentration_ratio, tridiagonal::SymmetricTridiagonal, TaperError};

/// Concentration below which a taper leaks enough energy out of band to noticeably
/// degrade the variance reduction of the multitaper estimate.
pub const WELL_CONCENTRATED_THRESHOLD: f64 = 0.9;

/// The `K` most concentrated Slepian tapers of length `N` for a time-bandwidth
/// product `NW`, ordered by descending concentration.
///
/// Every taper has unit energy, tapers are mutually orthogonal and their polarity is
/// fixed: even-order tapers have a positive sum, odd-order tapers start with a
/// positive lobe.
#[derive(Debug, Clone, PartialEq)]
pub struct TaperSet {
	window_len: usize,
	time_bandwidth: f64,
	tapers: Vec<DVector<f64>>,
	concentrations: Vec<f64>,
}

impl TaperSet {
	/// # Errors
	/// - [`TaperError::InvalidParameter`] if `window_len < 1`, if `time_bandwidth` is not a
	///   positive finite number smaller than `window_len / 2`, if `taper_count < 1` or
	///   if `taper_count > window_len`
	pub fn generate(
		window_len: usize,
		time_bandwidth: f64,
		taper_count: usize,
	) -> Result<Self, TaperError> {
		validate(window_len, time_bandwidth, taper_count)?;

		let n = window_len;
		let half_bandwidth = time_bandwidth / n as f64;
		let cos_bandwidth = (2. * PI * half_bandwidth).cos();

		// Commutes with the time-frequency concentration operator, has the same
		// eigenvectors and a well separated spectrum.
		let matrix = SymmetricTridiagonal::new(
			(0..n)
				.map(|i| ((n as f64 - 1. - 2. * i as f64) / 2.).powi(2) * cos_bandwidth)
				.collect(),
			(1..n).map(|i| (i * (n - i)) as f64 / 2.).collect(),
		);

		let mut tapers: Vec<DVector<f64>> = Vec::with_capacity(taper_count);
		for (order, eigenvalue) in matrix
			.largest_eigenvalues(taper_count)
			.into_iter()
			.enumerate()
		{
			let mut taper = matrix.eigenvector(eigenvalue, &tapers);
			if needs_flip(order, taper.as_slice()) {
				taper.neg_mut();
			}
			tapers.push(taper);
		}

		let concentrations = tapers
			.iter()
			.map(|taper| concentration_ratio(taper.as_slice(), half_bandwidth).clamp(0., 1.))
			.collect();

		tracing::trace!(window_len, time_bandwidth, taper_count, "generated tapers");

		Ok(Self {
			window_len,
			time_bandwidth,
			tapers,
			concentrations,
		})
	}

	#[must_use]
	pub fn window_len(&self) -> usize {
		self.window_len
	}

	#[must_use]
	pub fn time_bandwidth(&self) -> f64 {
		self.time_bandwidth
	}

	#[must_use]
	pub fn half_bandwidth(&self) -> f64 {
		self.time_bandwidth / self.window_len as f64
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.tapers.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.tapers.is_empty()
	}

	/// # Panics
	/// - if `order >= self.len()`
	#[must_use]
	pub fn taper(&self, order: usize) -> &[f64] {
		self.tapers[order].as_slice()
	}

	pub fn iter(&self) -> impl ExactSizeIterator<Item = &[f64]> {
		self.tapers.iter().map(DVector::as_slice)
	}

	/// Concentration ratio (eigenvalue of the concentration problem) of each taper,
	/// in the same order as the tapers.
	#[must_use]
	pub fn concentrations(&self) -> &[f64] {
		&self.concentrations
	}

	/// Number of tapers whose concentration reaches [`WELL_CONCENTRATED_THRESHOLD`].
	#[must_use]
	pub fn n_of_well_concentrated(&self) -> usize {
		self.concentrations
			.iter()
			.filter(|&&c| c >= WELL_CONCENTRATED_THRESHOLD)
			.count()
	}
}

/// `floor(2·NW) - 1`, the conventional number of tapers for a time-bandwidth product,
/// never less than one.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn optimal_taper_count(time_bandwidth: f64) -> usize {
	((2. * time_bandwidth).floor() as usize).saturating_sub(1).max(1)
}

fn validate(window_len: usize, time_bandwidth: f64, taper_count: usize) -> Result<(), TaperError> {
	if window_len < 1 {
		return Err(TaperError::invalid(
			"window_len",
			"at least one sample is required",
		));
	}
	if !time_bandwidth.is_finite() || time_bandwidth <= 0. {
		return Err(TaperError::invalid(
			"time_bandwidth",
			format!("expected a positive number, got {time_bandwidth}"),
		));
	}
	if time_bandwidth >= window_len as f64 / 2. {
		return Err(TaperError::invalid(
			"time_bandwidth",
			format!(
				"half bandwidth must be below the Nyquist frequency, got NW = {time_bandwidth} for {window_len} samples"
			),
		));
	}
	if taper_count < 1 {
		return Err(TaperError::invalid(
			"taper_count",
			"at least one taper is required",
		));
	}
	if taper_count > window_len {
		return Err(TaperError::invalid(
			"taper_count",
			format!("at most {window_len} orthogonal tapers exist for {window_len} samples, got {taper_count}"),
		));
	}
	Ok(())
}

fn needs_flip(order: usize, taper: &[f64]) -> bool {
	if order % 2 == 0 {
		taper.iter().sum::<f64>() < 0.
	} else {
		let threshold = (1. / taper.len() as f64).max(1e-7);
		taper
			.iter()
			.find(|v| v.abs() >= threshold)
			.is_some_and(|&v| v < 0.)
	}
}

#[cfg(test)]
mod tests {
	use nalgebra::SymmetricEigen;

	use super::*;

	fn assert_orthonormal(set: &TaperSet, tolerance: f64) {
		for (i, a) in set.iter().enumerate() {
			for (j, b) in set.iter().enumerate() {
				let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
				let expected = if i == j { 1. } else { 0. };
				assert!(
					(dot - expected).abs() < tolerance,
					"<{i}, {j}> = {dot}, expected {expected}"
				);
			}
		}
	}

	#[test]
	fn test_orthonormal_for_many_configurations() {
		for (n, nw, k) in [
			(16, 2., 3),
			(64, 2.5, 4),
			(100, 3., 5),
			(257, 4., 7),
			(400, 3., 5),
			(512, 1.5, 2),
		] {
			let set = TaperSet::generate(n, nw, k).unwrap();
			assert_eq!(set.len(), k);
			assert!(set.iter().all(|t| t.len() == n));
			assert_orthonormal(&set, 1e-9);
		}
	}

	#[test]
	fn test_concentration_is_non_increasing() {
		let set = TaperSet::generate(200, 4., 10).unwrap();
		for pair in set.concentrations().windows(2) {
			assert!(pair[0] + 1e-12 >= pair[1], "{pair:?}");
		}
		assert!(set.concentrations()[0] > 0.999_999);
	}

	#[test]
	fn test_more_tapers_than_bandwidth_supports() {
		let set = TaperSet::generate(128, 2., 12).unwrap();
		assert_eq!(set.len(), 12);
		assert_orthonormal(&set, 1e-9);
		assert!(set.n_of_well_concentrated() < 12);
		assert!(set.n_of_well_concentrated() >= 3);
	}

	#[test]
	fn test_matches_dense_concentration_eigenvectors() {
		let n = 48;
		let nw = 2.5;
		let w = nw / n as f64;
		let dense = nalgebra::DMatrix::from_fn(n, n, |i, j| {
			if i == j {
				2. * w
			} else {
				let d = i as f64 - j as f64;
				(2. * PI * w * d).sin() / (PI * d)
			}
		});
		let eigen = SymmetricEigen::new(dense);
		let mut order: Vec<usize> = (0..n).collect();
		order.sort_by(|&a, &b| eigen.eigenvalues[b].total_cmp(&eigen.eigenvalues[a]));

		let set = TaperSet::generate(n, nw, 4).unwrap();
		for (k, &idx) in order.iter().take(4).enumerate() {
			let reference = eigen.eigenvectors.column(idx);
			let dot: f64 = set
				.taper(k)
				.iter()
				.zip(reference.iter())
				.map(|(a, b)| a * b)
				.sum();
			assert!((dot.abs() - 1.).abs() < 1e-8, "taper {k}: |dot| = {}", dot.abs());
			assert!((set.concentrations()[k] - eigen.eigenvalues[idx]).abs() < 1e-8);
		}
	}

	#[test]
	fn test_polarity_convention() {
		let set = TaperSet::generate(101, 3., 5).unwrap();
		for (order, taper) in set.iter().enumerate() {
			assert!(!needs_flip(order, taper), "taper {order} has the wrong polarity");
		}
		assert!(set.taper(0).iter().all(|&v| v > 0.));
	}

	#[test]
	fn test_deterministic() {
		let a = TaperSet::generate(300, 3.5, 6).unwrap();
		let b = TaperSet::generate(300, 3.5, 6).unwrap();
		assert_eq!(a, b);
	}

	#[test]
	fn test_single_sample_window() {
		let set = TaperSet::generate(1, 0.25, 1).unwrap();
		assert_eq!(set.taper(0), &[1.]);
	}

	#[test]
	fn test_invalid_parameters() {
		assert!(matches!(
			TaperSet::generate(0, 2., 1),
			Err(TaperError::InvalidParameter { name: "window_len", .. })
		));
		assert!(matches!(
			TaperSet::generate(64, 0., 1),
			Err(TaperError::InvalidParameter { name: "time_bandwidth", .. })
		));
		assert!(matches!(
			TaperSet::generate(64, f64::NAN, 1),
			Err(TaperError::InvalidParameter { name: "time_bandwidth", .. })
		));
		assert!(matches!(
			TaperSet::generate(64, 32., 1),
			Err(TaperError::InvalidParameter { name: "time_bandwidth", .. })
		));
		assert!(matches!(
			TaperSet::generate(64, 2., 0),
			Err(TaperError::InvalidParameter { name: "taper_count", .. })
		));
		assert!(matches!(
			TaperSet::generate(8, 2., 9),
			Err(TaperError::InvalidParameter { name: "taper_count", .. })
		));
	}

	#[test]
	fn test_optimal_taper_count() {
		assert_eq!(optimal_taper_count(3.), 5);
		assert_eq!(optimal_taper_count(2.5), 4);
		assert_eq!(optimal_taper_count(0.5), 1);
		assert_eq!(optimal_taper_count(0.1), 1);
	}
}
