/*!
 * End-to-end tests of document batches over mocked providers
 */

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use doctran::app_config::Config;
use doctran::errors::ProviderError;
use doctran::providers::mock::{MockDelay, MockProvider};
use doctran::providers::{CompletionClient, CompletionRequest, ResolvedProvider};
use doctran::translation::{BatchEvent, BatchOutcome, BatchRequest, GlossaryEntry};
use doctran::{Paragraph, TranslationService};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::common::{mock_service, numbered_paragraphs, split_events};

/// Client tracking the highest number of calls in flight at once
#[derive(Debug, Default)]
struct InFlightClient {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

#[async_trait]
impl CompletionClient for InFlightClient {
    async fn complete(
        &self,
        _provider: &ResolvedProvider,
        request: &CompletionRequest,
    ) -> Result<String, ProviderError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(10)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(format!("ok {}", request.user_content))
    }
}

async fn run_collecting(
    service: &TranslationService,
    paragraphs: Vec<Paragraph>,
    request: &BatchRequest,
) -> (BatchOutcome, Vec<BatchEvent>) {
    let mut events: Vec<BatchEvent> = Vec::new();
    let outcome = service
        .run_batch(paragraphs, request, &mut events, &CancellationToken::new())
        .await;
    (outcome, events)
}

#[tokio::test]
async fn test_batch_withRandomDelays_shouldStreamProgressAndOrderDone() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mock = MockProvider::working().with_delay(MockDelay::Jitter { max_ms: 30 });
    let service = mock_service(mock.clone());

    let (outcome, events) =
        run_collecting(&service, numbered_paragraphs(25), &BatchRequest::default()).await;

    assert_eq!(outcome, BatchOutcome::Completed { total: 25 });
    assert_eq!(events.len(), 26);
    assert!(events.last().is_some_and(|e| e.is_terminal()));

    let currents: Vec<usize> = events
        .iter()
        .filter_map(|e| match e {
            BatchEvent::Progress { current, total, .. } => {
                assert_eq!(*total, 25);
                Some(*current)
            }
            _ => None,
        })
        .collect();
    assert_eq!(currents, (1..=25).collect::<Vec<_>>());

    let (progress, done) = split_events(&events);
    let done = done.expect("done event");
    for (i, unit) in done.iter().enumerate() {
        assert_eq!(unit.index, i);
        assert_eq!(unit.original, format!("Paragraph {}", i));
        assert_eq!(unit.initial, format!("[TRANSLATED] Paragraph {}", i));
        assert!(unit.optimized.is_none());
    }

    // Every unit streamed exactly once
    let mut streamed: Vec<usize> = progress.iter().map(|u| u.index).collect();
    streamed.sort_unstable();
    assert_eq!(streamed, (0..25).collect::<Vec<_>>());
    assert_eq!(mock.request_count(), 25);
}

#[tokio::test]
async fn test_batch_withEnhance_shouldRefineEveryParagraph() {
    let mock = MockProvider::working();
    let service = mock_service(mock.clone());
    let request = BatchRequest {
        enhance: true,
        optimized_provider: "qwen".to_string(),
        ..BatchRequest::default()
    };

    let (outcome, events) = run_collecting(&service, numbered_paragraphs(4), &request).await;

    assert_eq!(outcome, BatchOutcome::Completed { total: 4 });
    let (_, done) = split_events(&events);
    for unit in done.expect("done event") {
        let optimized = unit.optimized.clone().expect("refined text");
        assert!(optimized.contains(&format!("Original: {}", unit.original)));
        assert_eq!(unit.best_translation(), optimized);
    }

    let calls = mock.calls();
    assert_eq!(calls.len(), 8);
    assert_eq!(calls.iter().filter(|c| c.provider == "qwen").count(), 4);
}

#[tokio::test]
async fn test_batch_withOneFailingParagraph_shouldIsolateFailure() {
    let mock = MockProvider::fail_when_contains("Paragraph 2");
    let service = mock_service(mock);
    let request = BatchRequest {
        enhance: true,
        terms: vec![GlossaryEntry::new("paragraph", "段落")],
        ..BatchRequest::default()
    };

    let (outcome, events) = run_collecting(&service, numbered_paragraphs(4), &request).await;

    assert_eq!(outcome, BatchOutcome::Completed { total: 4 });
    let (_, done) = split_events(&events);
    let done = done.expect("done event");

    let failed = &done[2];
    assert!(failed.is_failed());
    assert!(failed.initial.starts_with("[ERROR:"));
    assert!(failed.optimized.is_none());
    assert!(failed.marked_text.is_none());
    assert!(failed.found_terms.is_none());

    for unit in done.iter().filter(|u| u.index != 2) {
        assert!(!unit.is_failed());
        assert!(unit.optimized.is_some());
        assert_eq!(
            unit.marked_text.as_deref(),
            Some(format!("[[[TERM_START|Paragraph]]] {}", unit.index).as_str())
        );
        assert_eq!(unit.found_terms, Some(vec!["paragraph".to_string()]));
    }
}

#[tokio::test]
async fn test_batch_withRefineFailure_shouldKeepInitialTranslation() {
    let mock = MockProvider::fail_when_system_contains("Improve");
    let service = mock_service(mock);
    let request = BatchRequest {
        enhance: true,
        ..BatchRequest::default()
    };

    let (_, events) = run_collecting(&service, numbered_paragraphs(3), &request).await;

    let (_, done) = split_events(&events);
    for unit in done.expect("done event") {
        assert!(!unit.is_failed());
        assert!(unit.optimized.is_none());
        assert!(unit.refine_error.is_some());
        assert_eq!(unit.best_translation(), unit.initial);
    }
}

#[tokio::test]
async fn test_batch_withConfiguredLimit_shouldBoundInFlightCalls() {
    let mut config = Config::default();
    config.providers.max_concurrent_requests = Some(3);
    let client = Arc::new(InFlightClient::default());
    let service = TranslationService::with_client(&config, client.clone());

    let (outcome, _) =
        run_collecting(&service, numbered_paragraphs(12), &BatchRequest::default()).await;

    assert_eq!(outcome, BatchOutcome::Completed { total: 12 });
    let peak = client.peak.load(Ordering::SeqCst);
    assert!(peak <= 3, "peak in-flight calls was {}", peak);
    assert!(peak >= 2, "calls never overlapped");
}

#[tokio::test]
async fn test_batch_withDroppedReceiver_shouldStopAsSinkClosed() {
    let service = mock_service(MockProvider::working().with_delay(MockDelay::Fixed(5)));
    let (mut sender, receiver) = mpsc::channel::<BatchEvent>(4);
    drop(receiver);

    let outcome = service
        .run_batch(
            numbered_paragraphs(5),
            &BatchRequest::default(),
            &mut sender,
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(outcome, BatchOutcome::SinkClosed { completed: 1, total: 5 });
}

#[tokio::test]
async fn test_batch_withCancellationMidway_shouldNotEmitDone() {
    let mock = MockProvider::working().with_delay(MockDelay::Fixed(100));
    let service = mock_service(mock);
    let (mut sender, mut receiver) = mpsc::unbounded_channel::<BatchEvent>();
    let cancel = CancellationToken::new();

    let batch = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            service
                .run_batch(
                    numbered_paragraphs(40),
                    &BatchRequest::default(),
                    &mut sender,
                    &cancel,
                )
                .await
        }
    });

    let first = receiver.recv().await.expect("first event");
    assert!(matches!(first, BatchEvent::Progress { .. }));
    cancel.cancel();

    let outcome = batch.await.unwrap();
    match outcome {
        BatchOutcome::Cancelled { completed, total } => {
            assert_eq!(total, 40);
            assert!(completed < total);
        }
        other => panic!("expected cancellation, got {:?}", other),
    }

    while let Some(event) = receiver.recv().await {
        assert!(!matches!(event, BatchEvent::Done { .. }));
    }
}
