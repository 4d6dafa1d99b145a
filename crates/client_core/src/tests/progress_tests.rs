use super::*;
use crate::clock::default_clock;

fn simulator() -> ProgressSimulator {
    ProgressSimulator::new(
        default_clock(),
        Duration::from_millis(300),
        Duration::from_millis(1000),
        Some(7),
    )
}

#[test]
fn status_follows_percent_thresholds() {
    assert_eq!(ProgressStatus::for_percent(0.0), ProgressStatus::Reading);
    assert_eq!(ProgressStatus::for_percent(29.9), ProgressStatus::Reading);
    assert_eq!(ProgressStatus::for_percent(30.0), ProgressStatus::Processing);
    assert_eq!(ProgressStatus::for_percent(59.9), ProgressStatus::Processing);
    assert_eq!(ProgressStatus::for_percent(60.0), ProgressStatus::Finalizing);
    assert_eq!(ProgressStatus::for_percent(90.0), ProgressStatus::Finalizing);
}

#[tokio::test(start_paused = true)]
async fn percent_climbs_monotonically_and_stalls_at_ceiling() {
    let mut progress = simulator();
    let handle = progress.start("Encrypting text...");
    let initial = progress.snapshot();
    assert!(initial.visible);
    assert_eq!(initial.percent, 0.0);
    assert_eq!(initial.status, ProgressStatus::Initializing);

    let mut last = 0.0;
    for _ in 0..200 {
        tokio::time::sleep(Duration::from_millis(300)).await;
        let state = progress.snapshot();
        assert!(state.percent >= last, "{} < {last}", state.percent);
        assert!(state.percent <= PROGRESS_CEILING);
        if state.status != ProgressStatus::Initializing {
            assert_eq!(state.status, ProgressStatus::for_percent(state.percent));
        }
        last = state.percent;
    }
    assert_eq!(last, PROGRESS_CEILING);

    assert!(progress.stop(handle));
}

#[tokio::test(start_paused = true)]
async fn stop_snaps_to_complete_then_hides_after_delay() {
    let mut progress = simulator();
    let handle = progress.start("Decrypting file...");
    tokio::time::sleep(Duration::from_millis(900)).await;

    assert!(progress.stop(handle));
    let stopped = progress.snapshot();
    assert_eq!(stopped.percent, 100.0);
    assert_eq!(stopped.rounded_percent(), 100);
    assert_eq!(stopped.status, ProgressStatus::Complete);
    assert!(stopped.visible);
    assert!(!progress.is_running());

    tokio::time::sleep(Duration::from_millis(999)).await;
    assert!(progress.snapshot().visible);
    tokio::time::sleep(Duration::from_millis(2)).await;
    assert!(!progress.snapshot().visible);

    // Nothing keeps ticking after the stop.
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(progress.snapshot().percent, 100.0);
}

#[tokio::test(start_paused = true)]
async fn stop_without_matching_start_is_a_noop() {
    let mut progress = simulator();
    let orphan = progress.start("Encrypting text...");
    assert!(progress.stop(orphan));
    assert!(!progress.stop(orphan));

    let state_before = progress.snapshot();
    assert!(!progress.stop(orphan));
    assert_eq!(progress.snapshot(), state_before);
}

#[tokio::test(start_paused = true)]
async fn restarting_replaces_the_active_run_without_leaking_timers() {
    let mut progress = simulator();
    let first = progress.start("Encrypting text...");
    tokio::time::sleep(Duration::from_millis(1200)).await;

    let second = progress.start("Decrypting text...");
    assert_ne!(first, second);
    let restarted = progress.snapshot();
    assert_eq!(restarted.percent, 0.0);
    assert_eq!(restarted.title, "Decrypting text...");

    // The first run was stopped by the restart; its handle is now stale.
    assert!(!progress.stop(first));

    // Its hide timer must not hide the second run.
    tokio::time::sleep(Duration::from_millis(1500)).await;
    let state = progress.snapshot();
    assert!(state.visible);
    assert!(state.percent < 100.0);
    assert!(progress.is_running());

    assert!(progress.stop(second));
}

#[tokio::test(start_paused = true)]
async fn each_tick_advances_by_less_than_the_max_step() {
    let mut progress = simulator();
    let mut rx = progress.subscribe();
    let handle = progress.start("Encrypting file...");
    rx.borrow_and_update();

    let mut last = 0.0;
    let mut ticks = 0;
    let mut at = tokio::time::Instant::now();
    while last < PROGRESS_CEILING {
        rx.changed().await.expect("ticker alive");
        let percent = rx.borrow_and_update().percent;
        assert_eq!(at.elapsed(), Duration::from_millis(300));
        at = tokio::time::Instant::now();

        let delta = percent - last;
        assert!((0.0..MAX_STEP).contains(&delta), "tick moved {delta}");
        last = percent;
        ticks += 1;
    }
    // 90% at under 15 per tick takes at least seven ticks.
    assert!(ticks >= 7, "reached the ceiling in {ticks} ticks");
    assert_eq!(last, PROGRESS_CEILING);

    assert!(progress.stop(handle));
}
