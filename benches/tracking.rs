use criterion::{criterion_group, criterion_main, Criterion};
use patchtrack::matcher::{best_match, preprocess_frame};
use patchtrack::{capture_template, Frame, PixelFormat, TemplateStore, TrackerConfig};
use std::hint::black_box;

fn make_frame(width: usize, height: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let value = ((x * 13) ^ (y * 7) ^ (x * y)) & 0xFF;
            data.push(value as u8);
        }
    }
    data
}

fn bench_tracking_tick(c: &mut Criterion) {
    let width = 640;
    let height = 480;
    let data = make_frame(width, height);
    let cfg = TrackerConfig::default();
    let template_size = cfg.template_size(width, height);

    let frame = Frame::new(&data, width, height, PixelFormat::Luma8).unwrap();
    let mut store = TemplateStore::new(cfg.max_templates);
    for _ in 0..cfg.max_templates {
        store
            .push(capture_template(&frame, template_size, cfg.scale).unwrap())
            .unwrap();
    }

    c.bench_function("preprocess_vga_frame", |b| {
        b.iter(|| {
            let scaled = preprocess_frame(black_box(&frame), cfg.scale).unwrap();
            black_box(scaled);
        })
    });

    let scaled = preprocess_frame(&frame, cfg.scale).unwrap();
    c.bench_function("best_match_two_templates", |b| {
        b.iter(|| {
            let best = best_match(black_box(scaled.view()), &store, &cfg);
            black_box(best);
        })
    });
}

criterion_group!(benches, bench_tracking_tick);
criterion_main!(benches);
