//! Benchmarks for the normalizer pipelines
//!
//! Measures:
//! - Preprocessing (trivia removal, positions) with and without source text
//! - Full semantic normalization of growing compilation units
//! - Parallel batch handling through the driver

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use quickcheck::{Arbitrary, Gen};

use csharp_normalizer::driver::{Driver, Mode, Request};
use csharp_normalizer::ir::Node;
use csharp_normalizer::normalizer::Normalizer;
use test_utils::ir::generator::{CompilationUnit, Method, UsingDirective};

/// A unit with `usings` using directives and one method of `params` parameters.
fn unit(usings: usize, params: usize) -> CompilationUnit {
    let mut g = Gen::new(8);
    let mut method = Method::arbitrary(&mut g);
    method.params = (0..params).map(|_| Arbitrary::arbitrary(&mut g)).collect();
    CompilationUnit {
        usings: (0..usings).map(|_| UsingDirective::arbitrary(&mut g)).collect(),
        method: Some(method),
    }
}

fn bench_preprocess(c: &mut Criterion) {
    let normalizer = Normalizer::default();
    let (source, tree) = unit(20, 4).build();
    let tree = Node::from(tree);

    let mut group = c.benchmark_group("preprocess");
    group.bench_function("without_source", |b| {
        b.iter(|| normalizer.preprocess(black_box(&tree), None))
    });
    group.bench_function("with_source", |b| {
        b.iter(|| normalizer.preprocess(black_box(&tree), Some(&source)))
    });
    group.finish();
}

fn bench_semantic(c: &mut Criterion) {
    let driver = Driver::new(Default::default(), Mode::Semantic);
    let mut group = c.benchmark_group("semantic");
    for size in [1usize, 10, 50] {
        let (source, tree) = unit(size, size.min(8)).build();
        let tree = Node::from(tree);
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &tree, |b, tree| {
            b.iter(|| driver.transform(black_box(tree), Some(&source)))
        });
    }
    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    let driver = Driver::default();
    let requests: Vec<Request> = (0..64)
        .map(|_| {
            let (source, tree) = unit(5, 2).build();
            Request {
                content: Some(source),
                ast: Node::from(tree),
            }
        })
        .collect();
    c.bench_function("handle_batch_64", |b| {
        b.iter(|| driver.handle_batch(black_box(&requests)))
    });
}

criterion_group!(benches, bench_preprocess, bench_semantic, bench_batch);
criterion_main!(benches);
