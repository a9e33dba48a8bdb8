use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use multitaper::{compute_spectrogram, MultitaperConfig, WeightingMode};

fn bench_weighting_modes(c: &mut Criterion) {
	use rand::prelude::*;
	let mut rng = rand::thread_rng();
	let signal: Vec<f64> = (0..1_000 * 60)
		.map(|_| rng.gen_range(-1.0..=1.0))
		.collect();

	let mut group = c.benchmark_group("Multitaper spectrogram");

	for weighting in [WeightingMode::Uniform, WeightingMode::Eigen, WeightingMode::Adaptive] {
		let config = MultitaperConfig::new(2., 0.5, 3.).with_weighting(weighting);
		// Warm the taper cache outside of the measurement.
		black_box(compute_spectrogram(&signal, 1_000., &config).unwrap());

		group.bench_function(BenchmarkId::new("60s at 1kHz", format!("{weighting:?}")), |b| {
			b.iter(|| {
				black_box(compute_spectrogram(&signal, 1_000., &config).unwrap());
			});
		});
	}

	group.finish();
}

criterion_group! {
  name = benches;
  config = Criterion::default().measurement_time(Duration::from_secs(8));
  targets = bench_weighting_modes
}
criterion_main!(benches);
