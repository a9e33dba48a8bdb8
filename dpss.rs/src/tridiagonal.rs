//! Eigenpairs of real symmetric tridiagonal matrices.
//!
//! Eigenvalues are isolated one at a time with Sturm-sequence bisection, eigenvectors are
//! then recovered with inverse iteration on the shifted matrix. Only the eigenpairs that
//! are actually requested get computed, which keeps taper generation at `O(N·K)` instead
//! of the `O(N³)` of a dense decomposition.

use nalgebra::DVector;

const MAX_BISECTIONS: usize = 256;
const MAX_INVERSE_ITERATIONS: usize = 8;
const INVERSE_ITERATION_TOLERANCE: f64 = 1e-14;

#[derive(Debug, Clone, PartialEq)]
pub struct SymmetricTridiagonal {
	diagonal: Vec<f64>,
	off_diagonal: Vec<f64>,
}

impl SymmetricTridiagonal {
	/// # Panics
	/// - if `diagonal` is empty
	/// - if `off_diagonal` doesn't contain exactly `diagonal.len() - 1` elements
	#[must_use]
	pub fn new(diagonal: Vec<f64>, off_diagonal: Vec<f64>) -> Self {
		assert!(!diagonal.is_empty(), "matrix must be at least 1x1");
		assert_eq!(
			diagonal.len(),
			off_diagonal.len() + 1,
			"off diagonal length must be one less than the diagonal length"
		);
		Self {
			diagonal,
			off_diagonal,
		}
	}

	#[must_use]
	pub fn dim(&self) -> usize {
		self.diagonal.len()
	}

	#[must_use]
	pub fn diagonal(&self) -> &[f64] {
		&self.diagonal
	}

	#[must_use]
	pub fn off_diagonal(&self) -> &[f64] {
		&self.off_diagonal
	}

	/// Gershgorin interval containing the whole spectrum.
	#[must_use]
	pub fn spectrum_bounds(&self) -> (f64, f64) {
		let n = self.dim();
		let mut lower = f64::INFINITY;
		let mut upper = f64::NEG_INFINITY;
		for i in 0..n {
			let left = if i > 0 { self.off_diagonal[i - 1].abs() } else { 0. };
			let right = if i + 1 < n { self.off_diagonal[i].abs() } else { 0. };
			lower = lower.min(self.diagonal[i] - left - right);
			upper = upper.max(self.diagonal[i] + left + right);
		}
		let slack = f64::EPSILON * lower.abs().max(upper.abs()).max(1.);
		(lower - slack, upper + slack)
	}

	/// Number of eigenvalues strictly smaller than `x`, from the signs of the
	/// pivots of the `LDLᵀ` factorization of `self - xI`.
	#[must_use]
	pub fn count_below(&self, x: f64) -> usize {
		let pivot_floor = f64::MIN_POSITIVE
			* self
				.off_diagonal
				.iter()
				.map(|e| e * e)
				.fold(1., f64::max);

		let mut count = 0;
		let mut pivot = 0.;
		for (i, &d) in self.diagonal.iter().enumerate() {
			pivot = if i == 0 {
				d - x
			} else {
				d - x - self.off_diagonal[i - 1].powi(2) / pivot
			};
			if pivot.abs() < pivot_floor {
				pivot = -pivot_floor;
			}
			if pivot < 0. {
				count += 1;
			}
		}
		count
	}

	/// The `index`-th smallest eigenvalue (0-based).
	///
	/// # Panics
	/// - if `index >= self.dim()`
	#[must_use]
	pub fn eigenvalue(&self, index: usize) -> f64 {
		assert!(index < self.dim(), "eigenvalue index out of range");
		let (mut lower, mut upper) = self.spectrum_bounds();
		for _ in 0..MAX_BISECTIONS {
			let mid = 0.5 * (lower + upper);
			if mid <= lower || mid >= upper {
				break;
			}
			if self.count_below(mid) > index {
				upper = mid;
			} else {
				lower = mid;
			}
		}
		0.5 * (lower + upper)
	}

	/// The `count` largest eigenvalues, in descending order.
	#[must_use]
	pub fn largest_eigenvalues(&self, count: usize) -> Vec<f64> {
		let n = self.dim();
		(0..count.min(n)).map(|k| self.eigenvalue(n - 1 - k)).collect()
	}

	/// Unit-norm eigenvector for `eigenvalue`, kept orthogonal to `orthogonal_to`.
	///
	/// `orthogonal_to` is expected to contain unit-norm, mutually orthogonal vectors
	/// of the same dimension as this matrix.
	#[must_use]
	pub fn eigenvector(&self, eigenvalue: f64, orthogonal_to: &[DVector<f64>]) -> DVector<f64> {
		let n = self.dim();
		if n == 1 {
			return DVector::from_element(1, 1.);
		}

		let lu = ShiftedLu::factor(self, eigenvalue);

		// Neither symmetric nor antisymmetric, so every eigenvector has a component along it.
		#[allow(clippy::cast_precision_loss)]
		let mut v = DVector::from_fn(n, |i, _| 1. + i as f64 / n as f64);
		project_out(&mut v, orthogonal_to);
		v.normalize_mut();

		for _ in 0..MAX_INVERSE_ITERATIONS {
			let mut next = lu.solve(&v);
			project_out(&mut next, orthogonal_to);
			let norm = next.norm();
			if norm == 0. || !norm.is_finite() {
				break;
			}
			next /= norm;

			let converged = (next.dot(&v).abs() - 1.).abs() < INVERSE_ITERATION_TOLERANCE;
			v = next;
			if converged {
				break;
			}
		}

		v
	}

	/// Dense representation, mostly useful for cross-checking against dense solvers.
	#[must_use]
	pub fn to_dense(&self) -> nalgebra::DMatrix<f64> {
		let n = self.dim();
		nalgebra::DMatrix::from_fn(n, n, |i, j| {
			if i == j {
				self.diagonal[i]
			} else if i + 1 == j {
				self.off_diagonal[i]
			} else if j + 1 == i {
				self.off_diagonal[j]
			} else {
				0.
			}
		})
	}
}

fn project_out(v: &mut DVector<f64>, basis: &[DVector<f64>]) {
	for b in basis {
		let coefficient = b.dot(v);
		v.axpy(-coefficient, b, 1.);
	}
}

/// LU factorization with partial pivoting of `T - shift·I`, stored as one sub-diagonal
/// of multipliers and three diagonals of `U`.
struct ShiftedLu {
	multipliers: Vec<f64>,
	pivots: Vec<f64>,
	upper1: Vec<f64>,
	upper2: Vec<f64>,
	swapped: Vec<bool>,
}

impl ShiftedLu {
	fn factor(matrix: &SymmetricTridiagonal, shift: f64) -> Self {
		let n = matrix.dim();
		let mut multipliers = matrix.off_diagonal.clone();
		let mut pivots: Vec<f64> = matrix.diagonal.iter().map(|d| d - shift).collect();
		let mut upper1 = matrix.off_diagonal.clone();
		let mut upper2 = vec![0.; n.saturating_sub(2)];
		let mut swapped = vec![false; n.saturating_sub(1)];

		for i in 0..n - 1 {
			if pivots[i].abs() >= multipliers[i].abs() {
				if pivots[i] != 0. {
					let factor = multipliers[i] / pivots[i];
					multipliers[i] = factor;
					pivots[i + 1] -= factor * upper1[i];
				}
			} else {
				let factor = pivots[i] / multipliers[i];
				pivots[i] = multipliers[i];
				multipliers[i] = factor;
				let tmp = upper1[i];
				upper1[i] = pivots[i + 1];
				pivots[i + 1] = tmp - factor * pivots[i + 1];
				if i + 2 < n {
					upper2[i] = upper1[i + 1];
					upper1[i + 1] = -factor * upper1[i + 1];
				}
				swapped[i] = true;
			}
		}

		// The shift is an eigenvalue, so a (near) zero pivot is expected.
		let scale = matrix
			.diagonal
			.iter()
			.chain(matrix.off_diagonal.iter())
			.fold(0., |acc: f64, v| acc.max(v.abs()))
			.max(shift.abs())
			.max(f64::MIN_POSITIVE);
		let floor = f64::EPSILON * scale;
		for p in &mut pivots {
			if p.abs() < floor {
				*p = if p.is_sign_negative() { -floor } else { floor };
			}
		}

		Self {
			multipliers,
			pivots,
			upper1,
			upper2,
			swapped,
		}
	}

	fn solve(&self, rhs: &DVector<f64>) -> DVector<f64> {
		let n = self.pivots.len();
		let mut b = rhs.clone();

		for i in 0..n - 1 {
			if self.swapped[i] {
				let tmp = b[i];
				b[i] = b[i + 1];
				b[i + 1] = tmp - self.multipliers[i] * b[i];
			} else {
				b[i + 1] -= self.multipliers[i] * b[i];
			}
		}

		b[n - 1] /= self.pivots[n - 1];
		if n > 1 {
			b[n - 2] = (b[n - 2] - self.upper1[n - 2] * b[n - 1]) / self.pivots[n - 2];
		}
		for i in (0..n.saturating_sub(2)).rev() {
			b[i] = (b[i] - self.upper1[i] * b[i + 1] - self.upper2[i] * b[i + 2]) / self.pivots[i];
		}
		b
	}
}

#[cfg(test)]
mod tests {
	use nalgebra::SymmetricEigen;

	use super::*;

	#[allow(clippy::cast_precision_loss)]
	fn sample_matrix(n: usize) -> SymmetricTridiagonal {
		SymmetricTridiagonal::new(
			(0..n).map(|i| ((i * 7) % 5) as f64 - 2.).collect(),
			(1..n).map(|i| 0.5 + (i % 3) as f64).collect(),
		)
	}

	#[test]
	fn test_count_below_brackets_spectrum() {
		let matrix = sample_matrix(12);
		let (lower, upper) = matrix.spectrum_bounds();
		assert_eq!(matrix.count_below(lower), 0);
		assert_eq!(matrix.count_below(upper), 12);
	}

	#[test]
	fn test_eigenvalues_match_dense_solver() {
		let matrix = sample_matrix(20);
		let mut expected: Vec<f64> = SymmetricEigen::new(matrix.to_dense())
			.eigenvalues
			.iter()
			.copied()
			.collect();
		expected.sort_by(|a, b| b.total_cmp(a));

		let actual = matrix.largest_eigenvalues(20);
		for (a, e) in actual.iter().zip(expected.iter()) {
			assert!((a - e).abs() < 1e-10, "{a} != {e}");
		}
	}

	#[test]
	fn test_eigenvectors_satisfy_definition() {
		let matrix = sample_matrix(30);
		let dense = matrix.to_dense();
		let mut found: Vec<DVector<f64>> = vec![];
		for eigenvalue in matrix.largest_eigenvalues(6) {
			let v = matrix.eigenvector(eigenvalue, &found);
			let residual = (&dense * &v - &v * eigenvalue).norm();
			assert!(residual < 1e-8, "residual {residual}");
			assert!((v.norm() - 1.).abs() < 1e-12);
			for other in &found {
				assert!(v.dot(other).abs() < 1e-10);
			}
			found.push(v);
		}
	}

	#[test]
	fn test_one_by_one() {
		let matrix = SymmetricTridiagonal::new(vec![3.], vec![]);
		assert!((matrix.eigenvalue(0) - 3.).abs() < 1e-12);
		assert_eq!(matrix.eigenvector(3., &[]).as_slice(), &[1.]);
	}
}
