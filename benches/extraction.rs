use criterion::{Criterion, criterion_group, criterion_main};
use ragkit::graph::GraphExtractor;
use std::hint::black_box;

fn synthetic_chunk() -> String {
    "Python is a programming language created by Guido Van Rossum. The interpreter uses \
     bytecode and contains a garbage collector. Django is a web framework and requires \
     Python installations. The ecosystem has package managers like Pip and Conda, and \
     every project requires a virtual environment for clean dependency management. \
     Rust is a systems language; Cargo uses manifests and contains a dependency resolver."
        .to_string()
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let text = synthetic_chunk();
    let extractor = GraphExtractor::new(10).expect("patterns should compile");

    c.bench_function("pattern_extraction", |b| {
        b.iter(|| extractor.extract_with_patterns(black_box(&text)))
    });

    c.bench_function("keyword_extraction", |b| {
        b.iter(|| extractor.extract_keywords(black_box(&text)))
    });

    c.bench_function("graph_metadata", |b| {
        b.iter(|| extractor.build_graph_metadata(black_box(&text), "chunk_0"))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
