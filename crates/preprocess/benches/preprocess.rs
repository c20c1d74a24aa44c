use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use preprocess::{CpuPreProcessor, DeviceOrientation, Preprocess, RgbaFrame};

/// Create an RGBA frame for benchmarking (gradient pattern)
fn create_test_frame(width: u32, height: u32) -> RgbaFrame {
    let mut pixels = vec![0u8; (width * height * 4) as usize];
    for y in 0..height {
        for x in 0..width {
            let idx = ((y * width + x) * 4) as usize;
            pixels[idx] = (x % 256) as u8; // R
            pixels[idx + 1] = (y % 256) as u8; // G
            pixels[idx + 2] = ((x + y) % 256) as u8; // B
            pixels[idx + 3] = 255;
        }
    }
    RgbaFrame::new(width, height, pixels).unwrap()
}

fn benchmark_crop_and_scale(c: &mut Criterion) {
    let mut group = c.benchmark_group("crop_and_scale");

    let resolutions = [(640, 480), (1280, 720), (1920, 1080)];
    let mut preprocessor = CpuPreProcessor::new((416, 416)).unwrap();

    for (width, height) in resolutions.iter() {
        let frame = create_test_frame(*width, *height);

        group.bench_with_input(
            BenchmarkId::new("preprocess", format!("{}x{}", width, height)),
            &frame,
            |b, frame| {
                b.iter(|| preprocessor.preprocess(black_box(frame)).unwrap());
            },
        );
    }

    group.finish();
}

fn benchmark_orientation(c: &mut Criterion) {
    let mut group = c.benchmark_group("fit_device_orientation");
    let frame = create_test_frame(1280, 720);

    for orientation in [
        DeviceOrientation::Portrait,
        DeviceOrientation::LandscapeRight,
    ] {
        group.bench_with_input(
            BenchmarkId::new("rotate", orientation.as_str()),
            &frame,
            |b, frame| {
                b.iter(|| orientation.apply(black_box(frame.clone())).unwrap());
            },
        );
    }

    group.finish();
}

criterion_group!(benches, benchmark_crop_and_scale, benchmark_orientation);
criterion_main!(benches);
