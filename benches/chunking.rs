use criterion::{Criterion, criterion_group, criterion_main};
use ragkit::chunker::TextChunker;
use std::hint::black_box;

fn synthetic_document() -> String {
    let paragraphs: Vec<String> = (0..200)
        .map(|i| {
            format!(
                "Section {} covers retrieval pipelines in depth. Chunking splits the text at \
                 sentence boundaries whenever one lands late enough in the window! Does the \
                 overlap preserve context across adjacent chunks? It does, and that matters \
                 for embedding quality.\n",
                i
            )
        })
        .collect();
    paragraphs.join("\n")
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let text = synthetic_document();
    let chunker = TextChunker::new(1000, 200).expect("valid chunker config");

    c.bench_function("chunking", |b| {
        b.iter(|| chunker.chunk(black_box(&text)))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
