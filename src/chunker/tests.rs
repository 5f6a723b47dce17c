use super::*;

fn chunker(size: usize, overlap: usize) -> TextChunker {
    TextChunker::new(size, overlap).expect("valid chunker config")
}

#[test]
fn empty_input() {
    let chunker = chunker(1000, 200);
    assert!(chunker.chunk("").is_empty());
    assert!(chunker.chunk("   \n\t  ").is_empty());
}

#[test]
fn short_input_is_discarded() {
    let chunker = chunker(1000, 200);
    // Trimmed length of 50 or fewer characters is below the minimum
    let chunks = chunker.chunk("Too short to be useful.");
    assert!(chunks.is_empty());
}

#[test]
fn single_chunk_passthrough() {
    let chunker = chunker(1000, 200);
    let text = "This sentence is comfortably longer than fifty characters and fits in one window.";
    let chunks = chunker.chunk(text);
    assert_eq!(chunks, vec![text.to_string()]);
}

#[test]
fn snaps_to_sentence_boundary() {
    let chunker = chunker(100, 20);
    // A period lands past the window midpoint; the chunk must end there
    // instead of cutting mid-word.
    let text = format!(
        "{}. {}",
        "word ".repeat(14).trim(),
        "trailing content that spills into the next window and keeps going for a while"
    );
    let chunks = chunker.chunk(&text);
    assert!(chunks.len() >= 2);
    assert!(
        chunks[0].ends_with('.'),
        "first chunk should end at the sentence boundary: {:?}",
        chunks[0]
    );
}

#[test]
fn accepts_mid_sentence_cut_without_boundary() {
    let chunker = chunker(100, 20);
    // No boundary characters at all: full windows are kept
    let text = "x".repeat(250);
    let chunks = chunker.chunk(&text);
    assert_eq!(chunks[0].chars().count(), 100);
}

#[test]
fn early_boundary_is_ignored() {
    let chunker = chunker(100, 20);
    // Only boundary is at index 10, before the midpoint; the window must not
    // shrink to it.
    let text = format!("Short one.{}", "y".repeat(200));
    let chunks = chunker.chunk(&text);
    assert_eq!(chunks[0].chars().count(), 100);
}

#[test]
fn overlap_carries_context_forward() {
    let chunker = chunker(100, 30);
    let text = "z".repeat(300);
    let chunks = chunker.chunk(&text);
    // Without boundaries, each window starts `size - overlap` after the
    // previous one, so adjacent chunks share exactly `overlap` characters.
    assert!(chunks.len() >= 3);
    let first: Vec<char> = chunks[0].chars().collect();
    let second: Vec<char> = chunks[1].chars().collect();
    assert_eq!(first[first.len() - 30..], second[..30]);
}

#[test]
fn bounded_iteration_count() {
    let chunker = chunker(100, 20);
    let text = "a".repeat(10_000);
    let chunks = chunker.chunk(&text);
    // ceil(len / (size - overlap))
    assert!(chunks.len() <= 10_000usize.div_ceil(80));
}

#[test]
fn covers_entire_input() {
    let chunker = chunker(200, 50);
    let sentences: Vec<String> = (0..40)
        .map(|i| format!("Sentence number {} talks about topic {}.", i, i % 7))
        .collect();
    let text = sentences.join(" ");
    let chunks = chunker.chunk(&text);

    // Every sentence marker must survive in at least one chunk.
    for i in 0..40 {
        let marker = format!("Sentence number {}", i);
        assert!(
            chunks.iter().any(|c| c.contains(&marker)),
            "missing {:?}",
            marker
        );
    }
}

#[test]
fn multibyte_input_is_safe() {
    let chunker = chunker(100, 20);
    let text = "Résumé naïve Österreich München straße ".repeat(20);
    let chunks = chunker.chunk(&text);
    assert!(!chunks.is_empty());
    // Reassembled chunks must still be valid text containing the words
    assert!(chunks[0].contains("Résumé"));
}

#[test]
fn rejects_invalid_configuration() {
    assert!(TextChunker::new(100, 100).is_err());
    assert!(TextChunker::new(100, 250).is_err());
    assert!(TextChunker::new(0, 0).is_err());
    assert!(TextChunker::new(100, 99).is_ok());
}

#[test]
fn from_config_defaults() {
    let chunker = TextChunker::from_config(&ChunkerConfig::default()).expect("default config");
    assert_eq!(chunker.chunk_size(), 1000);
    assert_eq!(chunker.chunk_overlap(), 200);
}
