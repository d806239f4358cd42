use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use warptps_image::Image;
use warptps_imgproc::{
    parallel::ExecutionStrategy,
    warp::{warp_tps, warp_with_field, SampleField, WarpParams},
};
use warptps_tps::{solve, LandmarkSet, TpsModel};

fn random_inverse(width: usize, height: usize, count: usize) -> TpsModel {
    let mut rng = StdRng::seed_from_u64(7);
    let mut landmarks = LandmarkSet::new();
    for _ in 0..count {
        let x = rng.random_range(0.0..width as f64);
        let y = rng.random_range(0.0..height as f64);
        let dx = rng.random_range(-10.0..10.0);
        let dy = rng.random_range(-10.0..10.0);
        landmarks.add([x, y], [x + dx, y + dy]);
    }
    solve(&landmarks.swapped(), 0.0).unwrap()
}

fn bench_warp_tps(c: &mut Criterion) {
    let mut group = c.benchmark_group("WarpTps");

    for (width, height) in [(256, 224), (512, 448), (1024, 896)].iter() {
        group.throughput(criterion::Throughput::Elements((*width * *height) as u64));

        let parameter_string = format!("{}x{}", width, height);

        // input image
        let image_size = [*width, *height].into();
        let image = Image::<u8, 3>::new(image_size, vec![0u8; width * height * 3]).unwrap();

        // output image
        let output = Image::<u8, 3>::from_size_val(image_size, 0).unwrap();
        let inverse = random_inverse(*width, *height, 16);

        for (name, strategy) in [
            ("serial", ExecutionStrategy::Serial),
            ("par_bands", ExecutionStrategy::Parallel),
        ] {
            let params = WarpParams::default().with_strategy(strategy);
            group.bench_with_input(
                BenchmarkId::new(name, &parameter_string),
                &(&image, &output, &inverse),
                |b, i| {
                    let (src, mut dst, model) = (i.0.clone(), i.1.clone(), i.2);
                    b.iter(|| {
                        warp_tps(
                            black_box(&src),
                            black_box(&mut dst),
                            black_box(model),
                            black_box(&params),
                        )
                    })
                },
            );
        }

        let field = SampleField::from_model(&inverse, image_size, 1.0, 8).unwrap();
        group.bench_with_input(
            BenchmarkId::new("field_stride_8", &parameter_string),
            &(&image, &output, &field),
            |b, i| {
                let (src, mut dst, field) = (i.0.clone(), i.1.clone(), i.2);
                b.iter(|| {
                    warp_with_field(
                        black_box(&src),
                        black_box(&mut dst),
                        black_box(field),
                        black_box(&WarpParams::default()),
                    )
                })
            },
        );
    }
    group.finish();
}

fn bench_landmark_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("WarpTpsLandmarks");

    let (width, height) = (512, 448);
    let image_size = [width, height].into();
    let image = Image::<u8, 3>::new(image_size, vec![0u8; width * height * 3]).unwrap();
    let output = Image::<u8, 3>::from_size_val(image_size, 0).unwrap();

    for count in [4, 32, 128] {
        let inverse = random_inverse(width, height, count);
        group.bench_with_input(BenchmarkId::new("par_bands", count), &inverse, |b, model| {
            let (src, mut dst) = (image.clone(), output.clone());
            b.iter(|| {
                warp_tps(
                    black_box(&src),
                    black_box(&mut dst),
                    black_box(model),
                    black_box(&WarpParams::default()),
                )
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_warp_tps, bench_landmark_count);
criterion_main!(benches);
