/*!
 * Tests for chunked translation: ordering, concurrency, retry and fallback
 */

use std::sync::Arc;
use std::time::Duration;

use subgloss::errors::TranslationError;
use subgloss::providers::mock::MockProvider;
use subgloss::subtitle_processor::{SubtitleDocument, TranslationUnit};
use subgloss::translation::batch::chunk_units;
use subgloss::translation::{
    BatchTranslator, Glossary, NoopProgress, ProgressTracker, TranslationOptions,
};
use crate::common;
use crate::common::mock_providers::{fast_options, mock_service, RecordingChunkTranslator};

fn document(blocks: usize) -> SubtitleDocument {
    SubtitleDocument::parse(&common::generate_srt(blocks)).unwrap()
}

#[test]
fn test_chunkUnits_shouldProduceCeilCountAndConcatenateToInput() {
    for (n, size) in [(0usize, 100usize), (1, 100), (100, 100), (101, 100), (7, 3), (9, 1)] {
        let units: Vec<TranslationUnit> = (0..n)
            .map(|i| TranslationUnit {
                unique_id: format!("{}-0", i + 1),
                original_text: format!("t{}", i),
                block_index: i,
            })
            .collect();
        let chunks = chunk_units(&units, size);
        assert_eq!(chunks.len(), n.div_ceil(size), "n={} size={}", n, size);
        assert!(chunks.iter().all(|c| !c.is_empty() && c.len() <= size));
        assert_eq!(chunks.concat(), units);
    }
}

#[tokio::test(start_paused = true)]
async fn test_translate_withOutOfOrderCompletion_shouldKeepInputOrder() {
    common::init_logging();
    let doc = document(12);
    let translator = BatchTranslator::new(mock_service(MockProvider::working(), fast_options(2, 3)));
    // Earlier chunks take longer
    let recorder = RecordingChunkTranslator::new(vec![600, 500, 400, 300, 200, 100]);

    let results = translator
        .translate_with(&doc, &recorder, Arc::new(NoopProgress))
        .await
        .unwrap();

    let ids: Vec<String> = results.iter().map(|r| r.unique_id.clone()).collect();
    let expected: Vec<String> = doc.units().into_iter().map(|u| u.unique_id).collect();
    assert_eq!(ids, expected);
    assert_eq!(results[0].translated_text, "T(line 1)");

    assert_eq!(&recorder.started()[..3], &[0usize, 1, 2]);
    assert_ne!(recorder.finished(), (0..6).collect::<Vec<_>>());
}

#[tokio::test(start_paused = true)]
async fn test_translate_withSlowFirstChunk_shouldMatchUndelayedOutput() {
    let doc = document(9);

    let plain = BatchTranslator::new(mock_service(MockProvider::working(), fast_options(3, 3)))
        .translate(&doc, &Glossary::new(), "ctx", Arc::new(NoopProgress))
        .await
        .unwrap();

    let delayed_provider = MockProvider::working().with_delay_fn(|units| {
        if units.iter().any(|u| u.unique_id == "1-0") { 5_000 } else { 10 }
    });
    let delayed = BatchTranslator::new(mock_service(delayed_provider, fast_options(3, 3)))
        .translate(&doc, &Glossary::new(), "ctx", Arc::new(NoopProgress))
        .await
        .unwrap();

    assert_eq!(plain, delayed);
}

#[tokio::test(start_paused = true)]
async fn test_translate_shouldNeverExceedConcurrencyLimit() {
    for limit in [1usize, 2, 3, 5] {
        let provider = MockProvider::working().with_delay(50);
        let translator = BatchTranslator::new(mock_service(provider.clone(), fast_options(1, limit)));

        translator
            .translate(&document(10), &Glossary::new(), "ctx", Arc::new(NoopProgress))
            .await
            .unwrap();

        assert_eq!(provider.request_count(), 10);
        assert!(provider.peak_in_flight() <= limit, "peak {} > {}", provider.peak_in_flight(), limit);
        assert_eq!(provider.peak_in_flight(), limit);
    }
}

#[tokio::test(start_paused = true)]
async fn test_translate_withAlwaysFailingChunk_shouldIsolateFallback() {
    let provider = MockProvider::working().with_failure_when(|units| units.iter().any(|u| u.unique_id == "3-0"));
    let translator = BatchTranslator::new(mock_service(provider.clone(), fast_options(2, 1)));

    let results = translator
        .translate(&document(6), &Glossary::new(), "ctx", Arc::new(NoopProgress))
        .await
        .unwrap();

    let texts: Vec<&str> = results.iter().map(|r| r.translated_text.as_str()).collect();
    assert_eq!(
        texts,
        vec![
            "[TRANSLATED] line 1",
            "[TRANSLATED] line 2",
            "[翻譯失敗] line 3",
            "[翻譯失敗] line 4",
            "[TRANSLATED] line 5",
            "[TRANSLATED] line 6",
        ]
    );
    // 1 + 3 + 1 requests
    assert_eq!(provider.request_count(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_translate_withIntermittentFailures_shouldRecoverByRetrying() {
    let provider = MockProvider::intermittent(2);
    let translator = BatchTranslator::new(mock_service(provider.clone(), fast_options(1, 1)));

    let results = translator
        .translate(&document(3), &Glossary::new(), "ctx", Arc::new(NoopProgress))
        .await
        .unwrap();

    assert!(results.iter().all(|r| r.translated_text.starts_with("[TRANSLATED]")));
    assert_eq!(provider.request_count(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_retry_shouldBackOffLinearly() {
    let options = TranslationOptions {
        chunk_size: 10,
        max_concurrent_requests: 1,
        retry_backoff: Duration::from_millis(1000),
        ..Default::default()
    };
    let translator = BatchTranslator::new(mock_service(MockProvider::malformed(), options));

    let start = tokio::time::Instant::now();
    let results = translator
        .translate(&document(2), &Glossary::new(), "ctx", Arc::new(NoopProgress))
        .await
        .unwrap();

    // Waits 1s after attempt 1 and 2s after attempt 2, none after the last
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(3000), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(3100), "elapsed {:?}", elapsed);
    assert!(results.iter().all(|r| r.translated_text.starts_with("[翻譯失敗] ")));
}

#[tokio::test(start_paused = true)]
async fn test_translate_withShortResponses_shouldFallBackPerChunk() {
    let provider = MockProvider::short_by_one();
    let translator = BatchTranslator::new(mock_service(provider.clone(), fast_options(3, 2)));

    let results = translator
        .translate(&document(4), &Glossary::new(), "ctx", Arc::new(NoopProgress))
        .await
        .unwrap();

    assert_eq!(results.len(), 4);
    assert!(results.iter().all(|r| r.translated_text.starts_with("[翻譯失敗]")));
    assert_eq!(provider.request_count(), 6);
}

#[tokio::test]
async fn test_translate_shouldSendGlossaryAndContextWithEveryChunk() {
    let provider = MockProvider::working();
    let translator = BatchTranslator::new(mock_service(provider.clone(), fast_options(2, 2)));
    let glossary = Glossary::parse("김민성:金敏成");

    translator
        .translate(&document(4), &glossary, "Running Man", Arc::new(NoopProgress))
        .await
        .unwrap();

    let requests = provider.requests();
    assert_eq!(requests.len(), 2);
    for request in requests {
        assert!(request.prompt.contains("김민성:金敏成"));
        assert!(request.prompt.contains("Running Man"));
        assert!(request.response_schema.is_some());
    }
}

#[tokio::test]
async fn test_translate_progress_shouldBeMonotonicAndEndAt100() {
    let tracker = Arc::new(ProgressTracker::new());
    let translator = BatchTranslator::new(mock_service(MockProvider::working(), fast_options(2, 3)));

    translator
        .translate(&document(9), &Glossary::new(), "ctx", tracker.clone())
        .await
        .unwrap();

    let history = tracker.translation_history();
    assert_eq!(history.first().copied(), Some(0));
    assert_eq!(history.last().copied(), Some(100));
    assert!(history.windows(2).all(|w| w[0] <= w[1]));
    // 0 plus one value per chunk
    assert_eq!(history.len(), 1 + 5);
    assert_eq!(tracker.current(), None);
}

#[tokio::test]
async fn test_translate_withShortByOneTranslator_shouldReportConsistencyError() {
    struct Dropping;

    #[async_trait::async_trait]
    impl subgloss::translation::ChunkTranslator for Dropping {
        async fn translate_chunk(
            &self,
            _chunk_index: usize,
            chunk: &[TranslationUnit],
        ) -> Vec<subgloss::translation::TranslationResult> {
            chunk
                .iter()
                .skip(1)
                .map(|u| subgloss::translation::TranslationResult::new(u.unique_id.clone(), "x"))
                .collect()
        }
    }

    let translator = BatchTranslator::new(mock_service(MockProvider::working(), fast_options(100, 3)));
    let result = translator
        .translate_with(&document(3), &Dropping, Arc::new(NoopProgress))
        .await;

    assert!(matches!(
        result,
        Err(TranslationError::Consistency { expected: 3, actual: 2 })
    ));
}
