use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dpss::TaperSet;

fn bench_taper_generation(c: &mut Criterion) {
	let mut group = c.benchmark_group("Taper generation");

	for window_len in [256, 1024, 4096] {
		group.bench_function(BenchmarkId::new("NW=3, K=5", window_len), |b| {
			b.iter(|| {
				black_box(TaperSet::generate(window_len, 3., 5).unwrap());
			});
		});
	}

	group.finish();
}

criterion_group! {
  name = benches;
  config = Criterion::default().measurement_time(Duration::from_secs(8));
  targets = bench_taper_generation
}
criterion_main!(benches);
