//! Player service tests: the actor loop, reporter ticks and teardown
//!
//! Tokio time is paused, so reporter ticks are driven by auto-advance while
//! the fake engine clock is moved by hand.

mod helpers;

use helpers::{drain_events, seconds, Harness};
use monotrack_common::events::{PlaybackMode, PlayerEvent};
use monotrack_player::playback::{PlayerHandle, PlayerService};
use std::time::Duration;
use tokio::task::JoinHandle;

fn spawn_player() -> (PlayerHandle, JoinHandle<()>, helpers::EngineProbe) {
    let Harness {
        controller, probe, ..
    } = Harness::new();
    let (handle, task) = PlayerService::spawn(controller);
    (handle, task, probe)
}

async fn wait_for_mode(handle: &PlayerHandle, mode: PlaybackMode) {
    handle
        .watch()
        .wait_for(|s| s.mode == mode)
        .await
        .expect("player service stopped");
}

#[tokio::test(start_paused = true)]
async fn test_reporter_publishes_position_while_playing() {
    let (handle, _task, probe) = spawn_player();
    handle.load(seconds(10)).await.unwrap();
    wait_for_mode(&handle, PlaybackMode::Ready).await;

    handle.play().await.unwrap();
    wait_for_mode(&handle, PlaybackMode::Playing).await;

    probe.advance(2.5);
    let snapshot = tokio::time::timeout(
        Duration::from_secs(1),
        handle.watch().wait_for(|s| s.position_seconds >= 2.5),
    )
    .await
    .expect("no progress published")
    .unwrap()
    .clone();
    assert!((snapshot.progress_percent - 25.0).abs() < 1e-9);
}

#[tokio::test(start_paused = true)]
async fn test_no_progress_after_pause() {
    let (handle, _task, probe) = spawn_player();
    let mut events = handle.subscribe_events();
    handle.load(seconds(10)).await.unwrap();
    wait_for_mode(&handle, PlaybackMode::Ready).await;
    handle.play().await.unwrap();
    wait_for_mode(&handle, PlaybackMode::Playing).await;
    probe.advance(1.0);

    handle.pause().await.unwrap();
    wait_for_mode(&handle, PlaybackMode::Paused).await;
    drain_events(&mut events);

    probe.advance(1.0);
    tokio::time::sleep(Duration::from_secs(1)).await;
    let late = drain_events(&mut events);
    assert!(
        !late.iter().any(|e| matches!(e, PlayerEvent::Progress { .. })),
        "progress after pause: {:?}",
        late
    );
    assert!((handle.snapshot().position_seconds - 1.0).abs() < 1e-9);
}

#[tokio::test(start_paused = true)]
async fn test_reporter_detects_end() {
    let (handle, _task, probe) = spawn_player();
    let mut events = handle.subscribe_events();
    handle.load(seconds(3)).await.unwrap();
    wait_for_mode(&handle, PlaybackMode::Ready).await;
    handle.play().await.unwrap();
    wait_for_mode(&handle, PlaybackMode::Playing).await;

    probe.advance(3.2);
    wait_for_mode(&handle, PlaybackMode::Ended).await;
    assert!((handle.snapshot().position_seconds - 3.0).abs() < 1e-9);
    assert_eq!(probe.live_count(), 0);

    tokio::time::sleep(Duration::from_millis(500)).await;
    let ended = drain_events(&mut events)
        .into_iter()
        .filter(|e| matches!(e, PlayerEvent::PlaybackEnded { .. }))
        .count();
    assert_eq!(ended, 1);
}

#[tokio::test(start_paused = true)]
async fn test_natural_completion_through_service() {
    let (handle, _task, probe) = spawn_player();
    handle.load(seconds(10)).await.unwrap();
    wait_for_mode(&handle, PlaybackMode::Ready).await;
    handle.play().await.unwrap();
    wait_for_mode(&handle, PlaybackMode::Playing).await;

    probe.advance(9.99);
    probe.finish(probe.live().unwrap());
    wait_for_mode(&handle, PlaybackMode::Ended).await;
    assert!((handle.snapshot().position_seconds - 10.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_shutdown_closes_device_once() {
    let (handle, task, probe) = spawn_player();
    handle.load(seconds(10)).await.unwrap();
    wait_for_mode(&handle, PlaybackMode::Ready).await;
    handle.play().await.unwrap();
    wait_for_mode(&handle, PlaybackMode::Playing).await;

    handle.shutdown().await.unwrap();
    task.await.unwrap();

    assert_eq!(probe.closes(), 1);
    assert_eq!(probe.live_count(), 0);
    assert_eq!(handle.snapshot().mode, PlaybackMode::Paused);
    assert!(handle.play().await.is_err());
    assert!(handle.is_closed());
}

#[tokio::test]
async fn test_dropping_last_handle_tears_down() {
    let (handle, task, probe) = spawn_player();
    let second = handle.clone();
    drop(handle);
    second.mute().await.unwrap();
    drop(second);

    task.await.unwrap();
    assert_eq!(probe.closes(), 1);
}

#[tokio::test]
async fn test_mute_round_trip_through_handle() {
    let (handle, _task, probe) = spawn_player();
    handle.set_volume(0.42).await.unwrap();
    handle.mute().await.unwrap();
    handle.watch().wait_for(|s| s.is_muted).await.unwrap();
    assert_eq!(probe.gain(), 0.0);

    handle.unmute().await.unwrap();
    handle.watch().wait_for(|s| !s.is_muted).await.unwrap();
    assert_eq!(probe.gain(), 0.42);
    assert_eq!(handle.snapshot().volume, 0.42);
}
