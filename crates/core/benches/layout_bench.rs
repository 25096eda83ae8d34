use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

use pdftree_core::layout::{
    GraphicBoxes, LayoutParams, PageElems, PageStats, Segment, TextLine, cluster_aligned,
};
use pdftree_core::tree::{TreeExtractor, TreeOptions};

const PAGE_W: f64 = 612.0;
const PAGE_H: f64 = 792.0;

#[derive(Clone)]
struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    fn new(seed: u64) -> Self {
        Self { state: seed.max(1) }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    fn gen_f64(&mut self, min: f64, max: f64) -> f64 {
        let n = self.next_u64() as f64 / u64::MAX as f64;
        min + (max - min) * n
    }
}

/// A page of `count` short lines laid out in three jittered columns, with
/// a ruled table below them.
fn synthetic_page(seed: u64, count: usize) -> PageElems {
    let mut rng = XorShift64::new(seed);
    let mut mentions = Vec::with_capacity(count);
    for i in 0..count {
        let col = (i % 3) as f64;
        let row = (i / 3) as f64;
        let x0 = 36.0 + col * 180.0 + rng.gen_f64(0.0, 4.0);
        let y0 = 36.0 + row * 12.0 + rng.gen_f64(0.0, 1.0);
        let width = rng.gen_f64(60.0, 160.0);
        mentions.push(TextLine::new((x0, y0, x0 + width, y0 + 10.0), "lorem ipsum dolor").with_font("Times", 10.0));
    }
    let top = 36.0 + (count / 3) as f64 * 12.0 + 20.0;
    let mut segments = Vec::new();
    for r in 0..=4 {
        let y = top + r as f64 * 16.0;
        segments.push(Segment::new(0.5, (36.0, y), (576.0, y)));
    }
    for c in 0..=3 {
        let x = 36.0 + c as f64 * 180.0;
        segments.push(Segment::new(0.5, (x, top), (x, top + 64.0)));
    }
    PageElems::new(1, PAGE_W, PAGE_H, mentions, segments, vec![], vec![])
}

fn bench_cluster_aligned(c: &mut Criterion) {
    let params = LayoutParams::default();
    let mut group = c.benchmark_group("cluster_aligned");
    for &n in &[60usize, 120, 180] {
        let page = synthetic_page(0x5eed ^ n as u64, n);
        let stats = PageStats::of_page(&page);
        let graphics = GraphicBoxes::of_page(&page);
        let texts: Vec<usize> = (0..page.mentions.len()).collect();
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &texts, |b, texts| {
            b.iter(|| {
                let nodes = cluster_aligned(&page, texts, &graphics, &stats, &params);
                black_box(nodes.len());
            })
        });
    }
    group.finish();
}

fn bench_build_tree(c: &mut Criterion) {
    let pages: Vec<PageElems> = (0..4)
        .map(|i| {
            let mut p = synthetic_page(0xbeef + i, 90);
            p.page_num = i as usize + 1;
            p
        })
        .collect();
    let options = TreeOptions {
        parallel: false,
        ..TreeOptions::default()
    };
    let extractor = TreeExtractor::new(pages, options);
    c.bench_function("build_tree_4_pages", |b| {
        b.iter(|| {
            let trees = extractor.build().unwrap();
            black_box(trees.len());
        })
    });
}

criterion_group!(layout_benches, bench_cluster_aligned, bench_build_tree);
criterion_main!(layout_benches);
