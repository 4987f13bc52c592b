use compfig::metrics::{self, Planes};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{DynamicImage, Rgb, RgbImage};

fn planes(width: u32, height: u32, offset: u32) -> Planes {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            ((x + offset) % 256) as u8,
            ((y * 3) % 256) as u8,
            ((x ^ y) % 256) as u8,
        ])
    });
    Planes::from_image(&DynamicImage::ImageRgb8(img), 3)
}

fn bench_metrics(c: &mut Criterion) {
    let a = planes(1280, 720, 0);
    let b = planes(1280, 720, 3);

    c.bench_function("mse_720p", |bench| {
        bench.iter(|| metrics::mse(black_box(&a), black_box(&b)))
    });
    c.bench_function("ssim_720p", |bench| {
        bench.iter(|| metrics::ssim(black_box(&a), black_box(&b)).unwrap())
    });
}

criterion_group!(benches, bench_metrics);
criterion_main!(benches);
