use crate::{MultitaperError, TransformCtx, WeightingMode};

const ADAPTIVE_TOLERANCE: f64 = 1e-10;
const MAX_ADAPTIVE_ITERATIONS: usize = 100;

/// Combines the per-taper spectra of a segment into a single estimate.
#[derive(Debug, Clone)]
pub struct MultitaperAverager {
	mode: WeightingMode,
	concentrations: Vec<f64>,
	/// Level of unit-variance white noise in each output bin.
	noise_scale: Vec<f64>,
}

impl MultitaperAverager {
	/// `concentrations` holds the concentration ratio of each taper, in taper order.
	#[must_use]
	pub fn new(mode: WeightingMode, concentrations: &[f64], ctx: &TransformCtx) -> Self {
		let sample_rate = ctx.sample_rate().hz();
		Self {
			mode,
			concentrations: concentrations.to_vec(),
			noise_scale: (0..ctx.n_of_bins())
				.map(|bin| ctx.fold_gain(bin) / sample_rate)
				.collect(),
		}
	}

	#[must_use]
	pub fn mode(&self) -> WeightingMode {
		self.mode
	}

	/// `segment_power` is the mean square of the tapered-from segment, only used by
	/// [`WeightingMode::Adaptive`] to estimate broadband leakage.
	///
	/// # Errors
	/// - [`MultitaperError::DimensionMismatch`] if there isn't one spectrum per taper or if
	///   any spectrum doesn't hold one value per bin
	pub fn combine(
		&self,
		per_taper: &[Vec<f64>],
		segment_power: f64,
	) -> Result<Vec<f64>, MultitaperError> {
		MultitaperError::check_len(self.concentrations.len(), per_taper.len(), "taper spectra")?;
		for spectrum in per_taper {
			MultitaperError::check_len(self.noise_scale.len(), spectrum.len(), "taper spectrum")?;
		}

		Ok(match self.mode {
			WeightingMode::Uniform => {
				#[allow(clippy::cast_precision_loss)]
				let weight = 1. / per_taper.len() as f64;
				self.weighted(per_taper, &vec![weight; per_taper.len()])
			}
			WeightingMode::Eigen => {
				let total: f64 = self.concentrations.iter().sum();
				let weights: Vec<f64> = if total > 0. {
					self.concentrations.iter().map(|c| c / total).collect()
				} else {
					#[allow(clippy::cast_precision_loss)]
					let weight = 1. / per_taper.len() as f64;
					vec![weight; per_taper.len()]
				};
				self.weighted(per_taper, &weights)
			}
			WeightingMode::Adaptive => self.adaptive(per_taper, segment_power),
		})
	}

	fn weighted(&self, per_taper: &[Vec<f64>], weights: &[f64]) -> Vec<f64> {
		let mut combined = vec![0.; self.noise_scale.len()];
		for (spectrum, weight) in per_taper.iter().zip(weights) {
			for (dst, value) in combined.iter_mut().zip(spectrum) {
				*dst += weight * value;
			}
		}
		combined
	}

	/// Per-bin iterative weighting: each taper is trusted in proportion to how much of
	/// the estimated power at that bin it can attribute to in-band energy rather than
	/// broadband leakage.
	fn adaptive(&self, per_taper: &[Vec<f64>], segment_power: f64) -> Vec<f64> {
		let n_of_tapers = per_taper.len();
		let mut weights = vec![0.; n_of_tapers];
		let mut previous = vec![0.; n_of_tapers];

		(0..self.noise_scale.len())
			.map(|bin| {
				let leakage = segment_power * self.noise_scale[bin];
				let mut estimate = if n_of_tapers >= 2 {
					0.5 * (per_taper[0][bin] + per_taper[1][bin])
				} else {
					per_taper[0][bin]
				};

				previous.fill(f64::INFINITY);
				for _ in 0..MAX_ADAPTIVE_ITERATIONS {
					let mut total_weight = 0.;
					for (w, &concentration) in weights.iter_mut().zip(&self.concentrations) {
						let denominator = concentration * estimate + (1. - concentration) * leakage;
						let b = if denominator > 0. { estimate / denominator } else { 1. };
						*w = concentration * b * b;
						total_weight += *w;
					}
					if total_weight <= 0. {
						break;
					}
					for w in &mut weights {
						*w /= total_weight;
					}

					estimate = weights
						.iter()
						.zip(per_taper)
						.map(|(w, spectrum)| w * spectrum[bin])
						.sum();

					let change = weights
						.iter()
						.zip(&previous)
						.map(|(w, p)| (w - p).abs())
						.fold(0., f64::max);
					previous.copy_from_slice(&weights);
					if change < ADAPTIVE_TOLERANCE {
						break;
					}
				}
				estimate
			})
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use crate::{SampleRate, Sides};

	use super::*;

	fn ctx(n_of_bins_hint: usize) -> TransformCtx {
		TransformCtx::new(SampleRate::new(100.).unwrap(), (n_of_bins_hint - 1) * 2, Sides::OneSided)
	}

	#[test]
	fn test_uniform_is_mean() {
		let averager = MultitaperAverager::new(WeightingMode::Uniform, &[1., 1., 1.], &ctx(3));
		let combined = averager
			.combine(&[vec![1., 2., 3.], vec![3., 2., 1.], vec![2., 2., 2.]], 0.)
			.unwrap();
		for (c, e) in combined.iter().zip([2., 2., 2.]) {
			assert!((c - e).abs() < 1e-12);
		}
	}

	#[test]
	fn test_eigen_weights_follow_concentration() {
		let averager = MultitaperAverager::new(WeightingMode::Eigen, &[0.75, 0.25], &ctx(2));
		let combined = averager.combine(&[vec![4., 0.], vec![0., 4.]], 0.).unwrap();
		assert!((combined[0] - 3.).abs() < 1e-12);
		assert!((combined[1] - 1.).abs() < 1e-12);
	}

	#[test]
	fn test_adaptive_equal_spectra_is_fixed_point() {
		let averager = MultitaperAverager::new(
			WeightingMode::Adaptive,
			&[0.9999, 0.998, 0.97, 0.7],
			&ctx(4),
		);
		let spectrum = vec![0.5, 1.5, 2., 0.25];
		let combined = averager.combine(&vec![spectrum.clone(); 4], 1.).unwrap();
		for (c, e) in combined.iter().zip(&spectrum) {
			assert!((c - e).abs() < 1e-9, "{c} != {e}");
		}
	}

	#[test]
	fn test_adaptive_downweights_leaky_taper() {
		// A weak bin where the poorly concentrated taper picks up leaked broadband power.
		let averager = MultitaperAverager::new(WeightingMode::Adaptive, &[0.999, 0.5], &ctx(2));
		let combined = averager
			.combine(&[vec![1e-4, 1e-4], vec![1e-4, 1e-2]], 100.)
			.unwrap();
		let uniform = 0.5 * (1e-4 + 1e-2);
		assert!((combined[0] - 1e-4).abs() < 1e-12);
		assert!(combined[1] < uniform);
		assert!(combined[1] > 1e-4);
		assert!(combined.iter().all(|v| v.is_finite() && *v >= 0.));
	}

	#[test]
	fn test_adaptive_silent_segment() {
		let averager = MultitaperAverager::new(WeightingMode::Adaptive, &[0.99, 0.9], &ctx(3));
		let combined = averager.combine(&[vec![0.; 3], vec![0.; 3]], 0.).unwrap();
		assert_eq!(combined, [0., 0., 0.]);
	}

	#[test]
	fn test_single_taper() {
		for mode in [WeightingMode::Uniform, WeightingMode::Eigen, WeightingMode::Adaptive] {
			let averager = MultitaperAverager::new(mode, &[0.95], &ctx(3));
			let combined = averager.combine(&[vec![1., 2., 3.]], 1.).unwrap();
			for (c, e) in combined.iter().zip([1., 2., 3.]) {
				assert!((c - e).abs() < 1e-12, "{mode:?}: {c} != {e}");
			}
		}
	}

	#[test]
	fn test_dimension_mismatch() {
		let averager = MultitaperAverager::new(WeightingMode::Uniform, &[1., 1.], &ctx(3));
		assert!(matches!(
			averager.combine(&[vec![1., 2., 3.]], 0.),
			Err(MultitaperError::DimensionMismatch { .. })
		));
		assert!(matches!(
			averager.combine(&[vec![1., 2., 3.], vec![1., 2.]], 0.),
			Err(MultitaperError::DimensionMismatch { .. })
		));
	}
}
