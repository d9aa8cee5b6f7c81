use super::*;

fn long_document() -> String {
    (1..=40)
        .map(|i| format!("Sentence number {} talks about topic {} in some detail.", i, i * 7))
        .join(" ")
}

#[test]
fn normalize_whitespace() {
    assert_eq!(normalize_text("  a\n\n b\r\n\x0cc \t "), "a b c");
    assert_eq!(normalize_text("single"), "single");
    assert_eq!(normalize_text(" \n\t "), "");
}

#[test]
fn three_short_sentences_yield_one_chunk() {
    let text = "The cat sat. The dog ran! Did the bird fly?";

    let chunks = split_text(text, 1000, 200).expect("split should succeed");

    assert_eq!(chunks, vec!["The cat sat. The dog ran. Did the bird fly."]);
}

#[test]
fn terminators_are_normalized() {
    let chunks = split_text("Is it?  Yes!!\n\nDone...", 100, 10).expect("split should succeed");

    assert_eq!(chunks, vec!["Is it. Yes. Done."]);
}

#[test]
fn empty_input_yields_no_chunks() {
    assert!(split_text("", 100, 10).expect("split should succeed").is_empty());
    assert!(
        split_text("   \n\t\r\n", 100, 10)
            .expect("split should succeed")
            .is_empty()
    );
    assert!(split_text(" ... ", 100, 10).expect("split should succeed").is_empty());
}

#[test]
fn rejects_invalid_parameters() {
    assert!(matches!(
        split_text("text", 0, 0),
        Err(RagError::InvalidChunking(_))
    ));
    assert!(matches!(
        split_text("text", 10, 10),
        Err(RagError::InvalidChunking(_))
    ));
    assert!(matches!(
        split_text("text", 10, 50),
        Err(RagError::InvalidChunking(_))
    ));
    assert!(split_text("text", 10, 9).is_ok());
}

#[test]
fn overlap_is_cut_at_word_boundary() {
    let text = "Alpha beta gamma. Delta epsilon zeta. Eta theta iota.";

    let chunks = split_text(text, 30, 10).expect("split should succeed");

    assert_eq!(
        chunks,
        vec![
            "Alpha beta gamma.",
            "gamma. Delta epsilon zeta.",
            "zeta. Eta theta iota.",
        ]
    );
}

#[test]
fn zero_overlap_has_no_repeated_text() {
    let text = "Alpha beta gamma. Delta epsilon zeta. Eta theta iota.";

    let chunks = split_text(text, 30, 0).expect("split should succeed");

    assert_eq!(
        chunks,
        vec!["Alpha beta gamma.", "Delta epsilon zeta.", "Eta theta iota."]
    );
}

#[test]
fn consecutive_chunks_share_overlap() {
    let config = ChunkingConfig::new(200, 50).expect("config should be valid");
    let chunks = config
        .split(&long_document())
        .expect("split should succeed");

    assert!(chunks.len() > 3, "expected several chunks, got {}", chunks.len());

    for pair in chunks.windows(2) {
        let (previous, next) = (&pair[0], &pair[1]);
        // The open chunk always ends with the ". " separator before it is trimmed
        let untrimmed = format!("{} ", previous);
        let seed = overlap_seed(&untrimmed, config.chunk_overlap).trim();

        assert!(!seed.is_empty());
        assert!(seed.chars().count() <= config.chunk_overlap);
        assert!(
            previous.ends_with(seed),
            "{:?} should end with {:?}",
            previous,
            seed
        );
        assert!(
            next.starts_with(seed),
            "{:?} should start with {:?}",
            next,
            seed
        );
    }
}

#[test]
fn overlap_seed_never_starts_mid_word() {
    let document = long_document();
    let words: Vec<&str> = document.split_whitespace().collect();

    let chunks = split_text(&document, 150, 40).expect("split should succeed");

    for chunk in chunks.iter().skip(1) {
        let first_word = chunk
            .split_whitespace()
            .next()
            .expect("chunks are never empty");
        assert!(
            words.contains(&first_word),
            "{:?} is not a whole word of the document",
            first_word
        );
    }
}

#[test]
fn short_chunk_is_carried_over_whole() {
    assert_eq!(overlap_seed("Tiny. ", 10), "Tiny. ");
    assert_eq!(overlap_seed("Tiny. ", 0), "");
}

#[test]
fn multibyte_text_is_split_on_char_boundaries() {
    let text = "Café crème brûlée. Naïve façade émigré. Über straße grüßen. Ça va très bien.";

    let chunks = split_text(text, 25, 8).expect("split should succeed");

    assert!(chunks.len() > 1);
    assert_eq!(chunks[0], "Café crème brûlée.");
    assert!(chunks.iter().all(|chunk| !chunk.is_empty()));
}

#[test]
fn oversized_sentence_becomes_its_own_chunk() {
    let long_sentence = "word ".repeat(40);
    let text = format!("Short one. {}. Short two.", long_sentence.trim());

    let chunks = split_text(&text, 50, 0).expect("split should succeed");

    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[0], "Short one.");
    assert!(chunks[1].chars().count() > 50);
    assert_eq!(chunks[2], "Short two.");
}

#[test]
fn large_document_splits_with_debug_logging() {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .finish();
    let text = (0..5000)
        .map(|i| format!("Fact {} is recorded here", i))
        .join(". ");

    let chunks = tracing::subscriber::with_default(subscriber, || split_text(&text, 500, 50))
        .expect("split should succeed");

    assert!(chunks.len() > 100);
    assert!(chunks[0].starts_with("Fact 0 is recorded here."));
    assert!(
        chunks
            .last()
            .is_some_and(|chunk| chunk.ends_with("Fact 4999 is recorded here."))
    );
    assert!(chunks.iter().all(|chunk| chunk.chars().count() <= 502));
}

#[test]
fn default_config() {
    let config = ChunkingConfig::default();

    assert_eq!(config.chunk_size, 1000);
    assert_eq!(config.chunk_overlap, 200);
    assert!(config.validate().is_ok());
}

#[test]
fn partial_toml_uses_defaults() {
    let config: ChunkingConfig = toml::from_str("chunk_size = 500").expect("should parse toml");

    assert_eq!(config.chunk_size, 500);
    assert_eq!(config.chunk_overlap, 200);
}
