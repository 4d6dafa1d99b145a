use super::*;
use crate::{clock::default_clock, test_support::fake_ciphertext};
use tokio::sync::broadcast::error::TryRecvError;

fn engine() -> VisualizationEngine {
    VisualizationEngine::new(default_clock(), VisualizationTimings::default(), Some(11))
}

fn drain(rx: &mut broadcast::Receiver<VisualizationEvent>) -> Vec<VisualizationEvent> {
    let mut events = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => events.push(event),
            Err(TryRecvError::Empty) => return events,
            Err(err) => panic!("event stream broke: {err}"),
        }
    }
}

fn stage_order(events: &[VisualizationEvent]) -> Vec<(&'static str, &'static str)> {
    events
        .iter()
        .filter_map(|event| match event {
            VisualizationEvent::StageActivated { stage, .. } => Some(("active", stage.id())),
            VisualizationEvent::StageCompleted { stage, .. } => Some(("completed", stage.id())),
            _ => None,
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn symmetric_stages_transition_strictly_in_order() {
    let mut engine = engine();
    let mut events = engine.subscribe_events();
    let mut watcher = engine.subscribe();

    let run = engine.begin(Algorithm::Aes);
    let summary = engine
        .play("hello", &fake_ciphertext("hello"))
        .await
        .expect("uninterrupted run");

    assert_eq!(
        stage_order(&drain(&mut events)),
        vec![
            ("active", "input"),
            ("completed", "input"),
            ("active", "padding"),
            ("completed", "padding"),
            ("active", "key"),
            ("completed", "key"),
            ("active", "encrypt"),
            ("completed", "encrypt"),
            ("active", "output"),
            ("completed", "output"),
        ]
    );

    let snapshot = watcher.borrow_and_update().clone();
    assert_eq!(snapshot.run, run);
    assert_eq!(snapshot.phase(), Some(PipelinePhase::Finished));
    assert_eq!(snapshot.summary, Some(summary.clone()));
    assert_eq!(summary.algorithm, Algorithm::Aes);

    let pipeline = snapshot.pipeline.expect("pipeline kept on screen");
    let contents: Vec<&str> = pipeline
        .stages()
        .iter()
        .map(|stage| stage.content.as_str())
        .collect();
    assert_eq!(contents[0], "hello");
    assert_eq!(contents[1], "68656C6C6F");
    assert_eq!(contents[4], fake_ciphertext("hello"));
}

#[tokio::test(start_paused = true)]
async fn every_stage_is_held_for_its_reveal_and_dwell_time() {
    let mut engine = engine();
    engine.begin(Algorithm::Des);
    let summary = engine
        .play("secret message", &fake_ciphertext("secret message"))
        .await
        .expect("run");

    let snapshot = engine.snapshot();
    let revealed: u64 = snapshot
        .pipeline
        .expect("pipeline")
        .stages()
        .iter()
        .map(|stage| stage.content.chars().count() as u64)
        .sum();
    let dwell: Duration = SYMMETRIC_PLAN.iter().map(|plan| plan.dwell).sum();
    let minimum = dwell + Duration::from_millis(20 * revealed);

    assert!(summary.elapsed >= minimum, "{:?} < {minimum:?}", summary.elapsed);
    assert!(summary.elapsed < minimum + Duration::from_millis(50));
}

#[tokio::test(start_paused = true)]
async fn rsa_after_aes_starts_from_a_clean_pipeline() {
    let mut engine = engine();
    engine.begin(Algorithm::Aes);
    engine
        .play("hello", &fake_ciphertext("hello"))
        .await
        .expect("aes run");

    let second = engine.begin(Algorithm::Rsa);
    let fresh = engine.snapshot();
    assert_eq!(fresh.run, second);
    assert!(fresh.summary.is_none());
    assert_eq!(fresh.elapsed, Duration::ZERO);
    let pipeline = fresh.pipeline.expect("pipeline");
    assert_eq!(pipeline.algorithm(), Algorithm::Rsa);
    assert_eq!(pipeline.stages().len(), 4);
    assert!(pipeline
        .stages()
        .iter()
        .all(|stage| stage.status == StageStatus::Pending && stage.content.is_empty()));

    let mut events = engine.subscribe_events();
    let summary = engine.play("U29tZUNpcGhlcg==", "hello").await.expect("rsa run");
    assert_eq!(summary.algorithm, Algorithm::Rsa);
    let order = stage_order(&drain(&mut events));
    assert_eq!(order.first(), Some(&("active", "input")));
    assert!(!order.iter().any(|(_, stage)| *stage == "padding"));

    let finished = engine.snapshot().pipeline.expect("pipeline");
    assert_eq!(finished.stages()[1].content, RSA_ILLUSTRATIVE_MODULUS);
    assert_eq!(finished.stages()[3].content, "hello");
}

#[tokio::test(start_paused = true)]
async fn abort_mid_sequence_stops_immediately_without_summary() {
    let mut engine = engine();
    let mut events = engine.subscribe_events();
    engine.begin(Algorithm::Aes);
    let handle = engine.abort_handle().expect("armed run");
    let cipher = fake_ciphertext("hello");

    let (outcome, ()) = tokio::join!(engine.play("hello", &cipher), async {
        tokio::time::sleep(Duration::from_millis(1000)).await;
        handle.cancel();
    });
    assert_eq!(outcome, Err(PlaybackError::Aborted(Cancelled)));

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.phase(), Some(PipelinePhase::Aborted));
    assert!(snapshot.summary.is_none());
    assert!(snapshot.visible);
    let pipeline = snapshot.pipeline.expect("partial pipeline left on screen");
    assert_eq!(pipeline.stages()[0].status, StageStatus::Completed);
    assert_eq!(pipeline.stages()[4].status, StageStatus::Pending);

    let events = drain(&mut events);
    assert!(events
        .iter()
        .any(|event| matches!(event, VisualizationEvent::Aborted { .. })));
    assert!(!events
        .iter()
        .any(|event| matches!(event, VisualizationEvent::Finished { .. })));

    // Nothing keeps animating after the abort.
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(engine.snapshot().pipeline, Some(pipeline));
}

#[tokio::test(start_paused = true)]
async fn failed_request_aborts_before_any_stage_starts() {
    let mut engine = engine();
    engine.begin(Algorithm::Des);
    engine.abort();

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.phase(), Some(PipelinePhase::Aborted));
    let pipeline = snapshot.pipeline.expect("pipeline");
    assert!(pipeline
        .stages()
        .iter()
        .all(|stage| stage.status == StageStatus::Pending));

    assert_eq!(
        engine.play("hello", "aGVsbG8=").await,
        Err(PlaybackError::NotArmed)
    );
}

#[tokio::test(start_paused = true)]
async fn play_requires_an_armed_run() {
    let mut engine = engine();
    assert_eq!(
        engine.play("hello", "aGVsbG8=").await,
        Err(PlaybackError::NotArmed)
    );
    assert!(!engine.snapshot().visible);
}

#[tokio::test(start_paused = true)]
async fn elapsed_readout_ticks_while_armed() {
    let mut engine = engine();
    engine.begin(Algorithm::Aes);
    tokio::time::sleep(Duration::from_millis(350)).await;

    let elapsed = engine.snapshot().elapsed;
    assert!(elapsed >= Duration::from_millis(300), "{elapsed:?}");
    assert!(elapsed <= Duration::from_millis(350), "{elapsed:?}");

    engine.abort();
    let frozen = engine.snapshot().elapsed;
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(engine.snapshot().elapsed, frozen);
}

#[tokio::test(start_paused = true)]
async fn hide_discards_the_run() {
    let mut engine = engine();
    engine.begin(Algorithm::Rsa);
    engine.hide();

    let snapshot = engine.snapshot();
    assert!(!snapshot.visible);
    assert!(snapshot.pipeline.is_none());
    assert!(engine.abort_handle().is_none());

    let rx = engine.subscribe();
    engine.hide();
    assert!(!rx.has_changed().expect("sender alive"));
}
