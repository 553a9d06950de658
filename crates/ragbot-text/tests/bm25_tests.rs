use ragbot_core::types::{Chunk, ChunkMetadata, TermFrequencies};
use ragbot_text::bm25::idf;
use ragbot_text::{term_frequencies, tokenize, Bm25Scorer, CorpusStats};

fn chunk_with_terms(id: &str, pairs: &[(&str, u32)]) -> Chunk {
    let term_frequencies: TermFrequencies =
        pairs.iter().map(|(t, n)| (t.to_string(), *n)).collect();
    Chunk {
        id: id.to_string(),
        document_id: "doc-1".to_string(),
        bot_id: "bot-1".to_string(),
        chunk_index: 0,
        content: String::new(),
        token_count: 0,
        term_frequencies,
        embedding: None,
        metadata: ChunkMetadata::default(),
    }
}

fn score_of(ranked: &[ragbot_core::types::ScoredChunk<'_>], id: &str) -> f32 {
    ranked.iter().find(|h| h.chunk.id == id).map(|h| h.score).expect("chunk present")
}

#[test]
fn chunk_matching_both_query_terms_ranks_first() {
    let chunks = vec![
        chunk_with_terms("c1", &[("apple", 2), ("pie", 1)]),
        chunk_with_terms("c2", &[("banana", 3)]),
        chunk_with_terms("c3", &[("apple", 1), ("banana", 1)]),
    ];
    let ranked = Bm25Scorer::new().rank("apple pie", &chunks);
    assert_eq!(ranked[0].chunk.id, "c1");
    assert_eq!(ranked[1].chunk.id, "c3");
    assert_eq!(ranked[2].chunk.id, "c2");
    assert!(ranked[0].score > ranked[1].score);
}

#[test]
fn non_matching_chunks_stay_in_the_output_with_zero_score() {
    let chunks = vec![
        chunk_with_terms("c1", &[("apple", 1)]),
        chunk_with_terms("c2", &[("banana", 1)]),
    ];
    let ranked = Bm25Scorer::new().rank("apple", &chunks);
    assert_eq!(ranked.len(), 2);
    assert_eq!(score_of(&ranked, "c2"), 0.0);
}

#[test]
fn score_matches_hand_computed_value() {
    let chunks = vec![
        chunk_with_terms("c1", &[("apple", 2), ("pie", 1)]),
        chunk_with_terms("c2", &[("banana", 3)]),
        chunk_with_terms("c3", &[("apple", 1), ("banana", 1)]),
    ];
    let ranked = Bm25Scorer::new().rank("pie", &chunks);
    // N = 3, df(pie) = 1, avgdl = (3 + 3 + 2) / 3, dl(c1) = 3
    let avgdl = 8.0f32 / 3.0;
    let tf = 1.0f32;
    let expected = idf(3, 1) * tf * 2.5 / (tf + 1.5 * (1.0 - 0.75 + 0.75 * (3.0 / avgdl)));
    assert!((score_of(&ranked, "c1") - expected).abs() < 1e-5);
}

// Repeated query terms are intentionally counted once per occurrence.
#[test]
fn duplicate_query_terms_double_count() {
    let chunks = vec![
        chunk_with_terms("c1", &[("apple", 1)]),
        chunk_with_terms("c2", &[("pear", 1)]),
    ];
    let scorer = Bm25Scorer::new();
    let once = score_of(&scorer.rank("apple", &chunks), "c1");
    let twice = score_of(&scorer.rank("apple apple", &chunks), "c1");
    assert!(once > 0.0);
    assert!((twice - 2.0 * once).abs() < 1e-5);
}

#[test]
fn raising_term_frequency_never_lowers_the_score() {
    let scorer = Bm25Scorer::new();
    let query = vec!["apple".to_string()];
    let others = [
        [("apple", 1u32), ("filler", 4)],
        [("banana", 2), ("filler", 1)],
    ];
    let mut previous = f32::MIN;
    for apple_tf in 0..40u32 {
        let mut maps: Vec<TermFrequencies> = others
            .iter()
            .map(|pairs| pairs.iter().map(|(t, n)| (t.to_string(), *n)).collect())
            .collect();
        let mut target = TermFrequencies::new();
        target.insert("filler".to_string(), 3);
        if apple_tf > 0 {
            target.insert("apple".to_string(), apple_tf);
        }
        maps.push(target);
        let stats = CorpusStats::from_term_maps(maps.iter());
        let score = scorer.score_terms(&query, &maps[2], &stats);
        assert!(score >= previous, "tf={apple_tf}: {score} < {previous}");
        previous = score;
    }
}

#[test]
fn idf_is_never_negative() {
    for n in 1..60usize {
        for df in 0..=n {
            assert!(idf(n, df) >= 0.0, "idf({n}, {df}) negative");
        }
    }
}

#[test]
fn statistics_follow_the_candidate_set() {
    let mut chunks = vec![
        chunk_with_terms("c1", &[("apple", 1)]),
        chunk_with_terms("c2", &[("pear", 1)]),
    ];
    let before = score_of(&Bm25Scorer::new().rank("apple", &chunks), "c1");
    chunks.push(chunk_with_terms("c3", &[("apple", 1)]));
    let after = score_of(&Bm25Scorer::new().rank("apple", &chunks), "c1");
    assert!(after < before, "a second apple chunk lowers apple's idf");
}

#[test]
fn tokenizer_is_idempotent() {
    let inputs = [
        "The quick brown fox -- jumps over the lazy dog!",
        "Café crème: 3 eggs, 200g sugar; bake @ 180°C in the façade oven.",
        "snake_case and CamelCase... mixed_UP_words?!",
        "",
        "  a bb ccc dddd  ",
    ];
    for input in inputs {
        let once = tokenize(input);
        let again = tokenize(&once.join(" "));
        assert_eq!(once, again, "input: {input:?}");
    }
}

#[test]
fn ingestion_and_query_tokenization_agree() {
    let content = "Refunds are processed within 14 days. Contact SUPPORT@example.com!";
    let stored = term_frequencies(content);
    for term in tokenize("Are REFUNDS processed? support") {
        assert!(stored.contains_key(&term), "query term {term} missing from stored map");
    }
}

#[test]
fn accented_query_matches_the_same_ascii_fragments_as_ingestion() {
    let with_text = |id: &str, text: &str| Chunk {
        term_frequencies: term_frequencies(text),
        ..chunk_with_terms(id, &[])
    };
    let chunks = vec![
        with_text("c1", "Our café opens at nine."),
        with_text("c2", "The bakery opens at ten."),
    ];
    assert_eq!(chunks[0].term_frequencies.get("caf"), Some(&1));
    assert!(!chunks[0].term_frequencies.contains_key("café"));

    let ranked = Bm25Scorer::new().rank("CAFÉ", &chunks);
    assert_eq!(ranked[0].chunk.id, "c1");
    assert!(ranked[0].score > 0.0);
    assert_eq!(score_of(&ranked, "c2"), 0.0);
}
