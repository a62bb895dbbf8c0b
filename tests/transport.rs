use std::time::Duration;

use approx::assert_abs_diff_eq;
use rstest::rstest;

use pcmdeck::{ContextBuilder, ContextState, TransportController, TransportPhase};

mod test_support;
use test_support::{ramp_block, ready, run_to_end, silent_block, step, FRAME_LEN};

#[test]
fn one_second_of_silence_plays_to_exactly_100() {
    let block = silent_block(1.0);
    assert_eq!(block.as_str().len(), 64_000); // 48000 bytes
    let mut transport = ready(&block);
    assert_eq!(transport.duration(), Duration::from_secs(1));

    transport.play().unwrap();
    let progress = run_to_end(&mut transport);

    // 60 frames of 400 samples make up the second
    assert_eq!(progress.len(), 60);
    assert_eq!(progress.last(), Some(&100.0));
    assert!(progress[..59].iter().all(|p| *p < 100.0));
    assert!(!transport.is_playing());
    assert_eq!(transport.phase(), TransportPhase::Ready);
    assert_eq!(transport.state().elapsed_before_current_session, Duration::ZERO);
}

#[test]
fn progress_never_decreases_while_playing() {
    let mut transport = ready(&silent_block(0.75));
    transport.play().unwrap();
    let progress = run_to_end(&mut transport);

    assert!(progress.windows(2).all(|pair| pair[0] <= pair[1]));
    assert!(progress.iter().all(|p| (0.0..=100.0).contains(p)));
}

#[test]
fn pause_at_40_percent_then_resume_to_the_end() {
    let mut transport = ready(&silent_block(1.0));
    transport.play().unwrap();
    for _ in 0..24 {
        step(&mut transport);
    }
    assert_abs_diff_eq!(transport.progress(), 40.0, epsilon = 1e-9);

    transport.pause();
    assert!(!transport.is_playing());
    assert_abs_diff_eq!(transport.progress(), 40.0, epsilon = 1e-9);
    assert_eq!(
        transport.state().elapsed_before_current_session,
        Duration::from_millis(400)
    );

    // time passes while paused
    transport.context_mut().unwrap().render_frames(12_000).unwrap();
    assert_eq!(transport.poll(), None);
    assert_abs_diff_eq!(transport.progress(), 40.0, epsilon = 1e-9);

    transport.play().unwrap();
    let mut frames = 0;
    while transport.is_playing() {
        step(&mut transport);
        assert!(transport.elapsed() <= transport.duration());
        frames += 1;
    }

    // the remaining 600ms
    assert_eq!(frames, 36);
    assert_eq!(transport.progress(), 100.0);
}

#[rstest]
#[case(1)]
#[case(10)]
#[case(59)]
fn resume_continues_where_pause_left_off(#[case] frames: usize) {
    let mut transport = ready(&ramp_block(24_000));
    transport.play().unwrap();
    for _ in 0..frames {
        step(&mut transport);
    }
    transport.pause();

    let offset = transport.state().elapsed_before_current_session;
    assert_eq!(offset, duration_of_frames(frames * FRAME_LEN));
    assert!(offset <= transport.duration());

    transport.play().unwrap();
    let context = transport.context_mut().unwrap();
    let first = context.render_frames(1).unwrap()[0];
    assert_eq!(first, (frames * FRAME_LEN) as f32 / 32768.0);
}

fn duration_of_frames(frames: usize) -> Duration {
    Duration::from_nanos(frames as u64 * 1_000_000_000 / 24_000)
}

#[test]
fn pause_when_not_playing_does_nothing() {
    let mut idle = TransportController::new(ContextBuilder::offline());
    idle.pause();
    assert_eq!(idle.phase(), TransportPhase::Idle);

    let mut transport = ready(&silent_block(1.0));
    transport.pause();
    assert_eq!(transport.phase(), TransportPhase::Ready);
    assert_eq!(transport.progress(), 0.0);
}

#[test]
fn play_twice_keeps_one_live_unit() {
    let mut transport = ready(&silent_block(1.0));
    transport.play().unwrap();
    step(&mut transport);
    transport.play().unwrap();

    assert_eq!(transport.context().unwrap().active_units(), 1);
    let progress = run_to_end(&mut transport);
    assert_eq!(progress.len(), 59);
}

#[test]
fn pause_then_play_restarts_exactly_one_unit() {
    let mut transport = ready(&silent_block(1.0));
    transport.play().unwrap();
    step(&mut transport);
    transport.pause();
    transport.play().unwrap();
    step(&mut transport);

    // the paused unit was released at the first rendered sample
    assert_eq!(transport.context().unwrap().active_units(), 1);
}

#[test]
fn toggle_restarts_after_completion() {
    let mut transport = ready(&silent_block(0.5));
    transport.toggle().unwrap();
    run_to_end(&mut transport);
    assert_eq!(transport.progress(), 100.0);

    transport.toggle().unwrap();
    assert!(transport.is_playing());
    assert_eq!(transport.progress(), 0.0);
    assert_eq!(transport.state().elapsed_before_current_session, Duration::ZERO);

    step(&mut transport);
    assert!(transport.progress() > 0.0 && transport.progress() < 100.0);
}

#[test]
fn toggle_pauses_and_resumes() {
    let mut transport = ready(&silent_block(1.0));
    transport.toggle().unwrap();
    step(&mut transport);
    step(&mut transport);

    transport.toggle().unwrap();
    assert!(!transport.is_playing());
    let paused_at = transport.progress();

    transport.toggle().unwrap();
    assert!(transport.is_playing());
    assert_eq!(transport.progress(), paused_at);
}

#[test]
fn replacing_the_block_mid_playback_goes_idle() {
    let mut transport = ready(&silent_block(1.0));
    transport.play().unwrap();
    step(&mut transport);

    let err = transport.load(&"not base64!".into());
    assert!(err.is_err());
    assert_eq!(transport.phase(), TransportPhase::Idle);
    assert!(!transport.is_playing());
    assert!(transport.context().is_none());
    assert_eq!(transport.poll(), None);

    transport.load(&silent_block(0.5)).unwrap();
    assert_eq!(transport.phase(), TransportPhase::Ready);
    assert_eq!(transport.progress(), 0.0);
    assert_eq!(transport.duration(), Duration::from_millis(500));
    assert_eq!(transport.context().unwrap().current_time(), Duration::ZERO);
}

#[test]
fn play_resumes_a_suspended_context() {
    let mut transport = TransportController::new(ContextBuilder::offline().start_suspended(true));
    transport.load(&silent_block(0.1)).unwrap();
    assert_eq!(
        transport.context().unwrap().state(),
        ContextState::Suspended
    );

    transport.play().unwrap();
    assert_eq!(transport.context().unwrap().state(), ContextState::Running);
}

#[test]
fn pause_past_the_end_counts_as_completion() {
    let mut transport = ready(&silent_block(0.1));
    transport.play().unwrap();
    // render well past the end without delivering frames
    transport.context_mut().unwrap().render_frames(24_000).unwrap();

    transport.pause();
    assert_eq!(transport.progress(), 100.0);
    assert_eq!(transport.state().elapsed_before_current_session, Duration::ZERO);
}

#[test]
fn dispose_twice_is_a_no_op() {
    let mut transport = ready(&silent_block(0.1));
    transport.play().unwrap();
    transport.dispose();
    transport.dispose();

    assert_eq!(transport.phase(), TransportPhase::Idle);
    assert!(matches!(
        transport.play(),
        Err(pcmdeck::PlayError::Unavailable)
    ));
}
