//! Replay driver tests using recordings written to disk


use image::DynamicImage;
use pose_match::{
    capture::{CaptureEvent, CapturePhase, CaptureType},
    config::Config,
    replay::{load_frames, load_landmarks, run_replay, RecordedFrame, ReplayOptions, ReplayTemplate},
    store::{DirectoryStore, MemoryStore, PoseStore},
};
use std::io::Write;
use test_helpers::{shifted, standing_pose, FailingStore};

fn write_recording(frames: &[RecordedFrame]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    for frame in frames {
        writeln!(file, "{}", serde_json::to_string(frame).unwrap()).unwrap();
    }
    file
}

fn steady(count: u64, pose: Option<&pose_match::landmarks::PoseLandmarks>) -> Vec<RecordedFrame> {
    (0..count)
        .map(|i| RecordedFrame {
            t_ms: i * 33,
            landmarks: pose.cloned(),
        })
        .collect()
}

fn template() -> ReplayTemplate {
    ReplayTemplate {
        name: "tree".to_string(),
        image: DynamicImage::new_rgba8(1280, 720),
        landmarks: standing_pose(),
    }
}

#[test]
fn test_recording_round_trips_through_disk() {
    let pose = standing_pose();
    let frames = steady(5, Some(&pose));
    let file = write_recording(&frames);
    assert_eq!(load_frames(file.path()).unwrap(), frames);
}

#[test]
fn test_template_landmarks_from_json() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}", serde_json::to_string(&standing_pose()).unwrap()).unwrap();
    assert_eq!(load_landmarks(file.path()).unwrap(), standing_pose());
}

#[test]
fn test_replay_auto_captures_into_directory() {
    let pose = standing_pose();
    let frames = steady(250, Some(&pose));
    let root = tempfile::tempdir().unwrap();
    let mut store = DirectoryStore::open(root.path(), "replay").unwrap();
    let options = ReplayOptions {
        auto_confirm: true,
        ..ReplayOptions::default()
    };

    let report = run_replay(Config::default(), template(), &frames, &options, &mut store).unwrap();
    assert_eq!(report.captures, 1);
    assert_eq!(report.saved.len(), 1);

    let saved = store.get_by_id(&report.saved[0]).unwrap().unwrap();
    assert_eq!(saved.metadata.pose_name, "tree");
    assert_eq!(saved.metadata.capture_type, CaptureType::Auto);
    assert!(saved.metadata.score >= 80);

    let events: Vec<CaptureEvent> = report
        .ticks
        .iter()
        .flat_map(|t| t.events.iter().flatten().copied())
        .collect();
    assert_eq!(events[0], CaptureEvent::HoldStarted);
    assert!(events.contains(&CaptureEvent::CountdownStarted(3)));
    assert!(events.contains(&CaptureEvent::CountdownTick(1)));
}

#[test]
fn test_replay_without_auto_capture_never_captures() {
    let pose = standing_pose();
    let frames = steady(250, Some(&pose));
    let options = ReplayOptions {
        auto_capture: false,
        auto_confirm: true,
        ..ReplayOptions::default()
    };
    let mut store = MemoryStore::new("replay");
    let report = run_replay(Config::default(), template(), &frames, &options, &mut store).unwrap();
    assert_eq!(report.captures, 0);
    assert!(report.ticks.iter().all(|t| t.phase == CapturePhase::Idle));
    assert_eq!(report.ticks.last().unwrap().smoothed, 100);
}

#[test]
fn test_replay_poor_match_gives_guidance() {
    let far_off = shifted(&standing_pose(), 0.3, 0.0);
    let frames = steady(30, Some(&far_off));
    let mut store = MemoryStore::new("replay");
    let report = run_replay(
        Config::default(),
        template(),
        &frames,
        &ReplayOptions::default(),
        &mut store,
    )
    .unwrap();
    assert_eq!(report.captures, 0);
    let last = report.ticks.last().unwrap();
    assert_eq!(last.raw, 29);
    assert_eq!(last.guidance.map(|g| g.message()), Some("Move right"));
}

#[test]
fn test_replay_counts_failed_saves() {
    let pose = standing_pose();
    let frames = steady(250, Some(&pose));
    let options = ReplayOptions {
        auto_confirm: true,
        ..ReplayOptions::default()
    };
    let mut store = FailingStore::default();
    let report = run_replay(Config::default(), template(), &frames, &options, &mut store).unwrap();
    assert_eq!(report.captures, 1);
    assert_eq!(report.failed_saves, 1);
    assert!(report.saved.is_empty());
}

#[test]
fn test_score_drop_on_final_second_cancels_capture() {
    let pose = standing_pose();
    let mut config = Config::default();
    config.capture.success_threshold = 85;

    // Hold starts at 800ms, the countdown at 3800ms, and the last second
    // would elapse at 6800ms, the same frame the body leaves the view
    let mut frames: Vec<RecordedFrame> = (0..68)
        .map(|i| RecordedFrame {
            t_ms: i * 100,
            landmarks: Some(pose.clone()),
        })
        .collect();
    frames.push(RecordedFrame {
        t_ms: 6800,
        landmarks: None,
    });

    let mut store = MemoryStore::new("replay");
    let report = run_replay(config, template(), &frames, &ReplayOptions::default(), &mut store).unwrap();

    let before = &report.ticks[report.ticks.len() - 2];
    assert_eq!(before.phase, CapturePhase::Countdown);
    assert_eq!(before.countdown, Some(1));

    let last = report.ticks.last().unwrap();
    assert!(last.smoothed < 85);
    assert_eq!(last.events, [Some(CaptureEvent::CountdownCancelled), None]);
    assert_eq!(last.phase, CapturePhase::Idle);
    assert_eq!(report.captures, 0);
}
