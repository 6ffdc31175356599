/*!
 * Tests for progress reporting
 */

use std::sync::Arc;
use std::time::Duration;

use subgloss::app_controller::ConsoleProgress;
use subgloss::translation::progress::{
    analysis_time_constant, chunk_percentage, simulated_percentage, ProgressTicker,
};
use subgloss::translation::{CurrentBlock, ProgressSink, ProgressTracker};

#[test]
fn test_chunkPercentage_shouldBeMonotonicAndReach100() {
    for total in [1usize, 3, 7, 100, 101] {
        let values: Vec<u8> = (0..=total).map(|done| chunk_percentage(done, total)).collect();
        assert_eq!(values[0], 0);
        assert_eq!(*values.last().unwrap(), 100);
        assert!(values.windows(2).all(|w| w[0] <= w[1]));
        assert!(values[..total].iter().all(|v| *v < 100));
    }
}

#[test]
fn test_simulatedPercentage_shouldStayBelow100() {
    let tau = analysis_time_constant(1_000_000);
    assert_eq!(tau, Duration::from_secs(200));

    let mut last = 0;
    for seconds in [0u64, 1, 10, 100, 200, 1_000, 10_000, 1_000_000] {
        let value = simulated_percentage(Duration::from_secs(seconds), tau);
        assert!(value >= last);
        assert!(value <= 99);
        last = value;
    }
    assert_eq!(simulated_percentage(Duration::from_secs(200), tau), 50);
}

#[test]
fn test_tracker_shouldRecordLatestValuesAndHistory() {
    let tracker = ProgressTracker::new();
    tracker.translation_progress(0);
    tracker.translation_progress(50);
    tracker.current_block(Some(CurrentBlock {
        block_id: "12".into(),
        timestamp: "00:01:00,000 --> 00:01:02,000".into(),
    }));

    assert_eq!(tracker.translation(), 50);
    assert_eq!(tracker.translation_history(), vec![0, 50]);
    assert_eq!(tracker.current().map(|b| b.block_id), Some("12".to_string()));
    assert_eq!(tracker.analysis(), 0);
    assert!(tracker.analysis_history().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_ticker_withLongAnalysis_shouldPassHalfwayAtTau() {
    let tracker = Arc::new(ProgressTracker::new());
    let ticker = ProgressTicker::start(Duration::from_millis(100), Duration::from_secs(20), tracker.clone());

    tokio::time::sleep(Duration::from_millis(20_050)).await;
    let last = ticker.stop().await;

    assert!((49..=50).contains(&last), "last {}", last);
    assert_eq!(tracker.analysis(), last);
}

#[test]
fn test_consoleProgress_hidden_shouldTrackBothBars() {
    let progress = ConsoleProgress::hidden();
    progress.analysis_progress(17);
    progress.analysis_progress(100);
    progress.translation_progress(33);
    progress.current_block(None);

    assert_eq!(progress.analysis_position(), 100);
    assert_eq!(progress.translation_position(), 33);
}
