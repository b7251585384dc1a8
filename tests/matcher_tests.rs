use std::time::Duration;

use apk_controller::clock::{Clock, SimulatedClock};
use apk_controller::engine::error::ScriptError;
use apk_controller::engine::matcher::can_proceed;
use apk_controller::graph::{
    screen_model::{ElementSignature, Screen},
    script_graph::{ExpectedScreenSet, ScriptGraph},
};

mod common;
use crate::common::{FakeDevice, element, frame_with_texts, millis};

// =========================================================================
// Helpers
// =========================================================================

/// Screens 1..=3 matched by "welcome", "connect" and "settings".
fn graph(max_retries: u32, wait: Duration) -> ScriptGraph {
    let mut graph = ScriptGraph::new();
    for (nr, text) in [(1, "welcome"), (2, "connect"), (3, "settings")] {
        graph
            .add_screen(
                Screen::new(nr)
                    .with_required(ElementSignature::text(text))
                    .with_retries(max_retries, wait),
            )
            .unwrap();
    }
    graph
}

fn expected(nrs: &[u32]) -> ExpectedScreenSet {
    nrs.iter().copied().collect()
}

// =========================================================================
// Fast path
// =========================================================================

#[test]
fn single_pass_match_returns_without_sleeping() {
    let graph = graph(3, millis(100));
    let mut device = FakeDevice::new(vec![frame_with_texts(&["connect"])]);
    let clock = SimulatedClock::new();

    let found = can_proceed(&mut device, &clock, &graph, &expected(&[2]), false).expect("screen 2 matches");

    assert_eq!(found.screen_nr, 2);
    assert_eq!(found.polls, 1);
    assert_eq!(clock.total_slept(), Duration::ZERO);
    assert_eq!(device.queries, 1);
}

#[test]
fn single_pass_checks_every_candidate_once_and_never_sleeps() {
    let graph = graph(5, millis(100));
    let mut device = FakeDevice::new(vec![frame_with_texts(&["unrelated"])]);
    let clock = SimulatedClock::new();

    let err = can_proceed(&mut device, &clock, &graph, &expected(&[1, 2, 3]), false).unwrap_err();

    match err {
        ScriptError::ScreenNotFound { tried, polls, elapsed } => {
            assert_eq!(tried, vec![1, 2, 3]);
            assert_eq!(polls, 3);
            assert_eq!(elapsed, Duration::ZERO);
        }
        other => panic!("expected ScreenNotFound, got {:?}", other),
    }
    assert_eq!(clock.sleep_count(), 0);
}

// =========================================================================
// Retry path
// =========================================================================

#[test]
fn retry_succeeds_on_third_poll_after_two_waits() {
    let graph = graph(3, millis(100));
    let mut device = FakeDevice::new(vec![frame_with_texts(&["welcome"])]).with_render_delay(2);
    let clock = SimulatedClock::new();

    let found = can_proceed(&mut device, &clock, &graph, &expected(&[1]), true).expect("matches on 3rd poll");

    assert_eq!(found.screen_nr, 1);
    assert_eq!(found.polls, 3);
    assert!(clock.total_slept() >= millis(200));
    assert_eq!(clock.sleep_count(), 2);
}

#[test]
fn retry_fails_when_screen_never_appears_within_budget() {
    let graph = graph(3, millis(100));
    let mut device = FakeDevice::new(vec![frame_with_texts(&["welcome"])]).with_render_delay(3);
    let clock = SimulatedClock::new();

    let err = can_proceed(&mut device, &clock, &graph, &expected(&[1]), true).unwrap_err();

    match err {
        ScriptError::ScreenNotFound { tried, polls, elapsed } => {
            assert_eq!(tried, vec![1]);
            assert_eq!(polls, 3);
            assert_eq!(elapsed, millis(200));
        }
        other => panic!("expected ScreenNotFound, got {:?}", other),
    }
    // No sleep after the final poll.
    assert_eq!(clock.sleep_count(), 2);
}

#[test]
fn retry_exhausts_each_candidate_before_the_next() {
    let graph = graph(2, millis(50));
    let mut device = FakeDevice::new(vec![frame_with_texts(&["connect"])]);
    let clock = SimulatedClock::new();

    let found = can_proceed(&mut device, &clock, &graph, &expected(&[1, 2]), true).expect("screen 2 matches");

    assert_eq!(found.screen_nr, 2);
    // Two polls on screen 1, then the first poll on screen 2.
    assert_eq!(found.polls, 3);
    assert_eq!(clock.total_slept(), millis(50));
}

#[test]
fn zero_retries_still_polls_once() {
    let graph = graph(0, millis(100));
    let mut device = FakeDevice::new(vec![frame_with_texts(&["settings"])]);
    let clock = SimulatedClock::new();

    let found = can_proceed(&mut device, &clock, &graph, &expected(&[3]), true).expect("screen 3 matches");
    assert_eq!(found.screen_nr, 3);
    assert_eq!(clock.sleep_count(), 0);
}

#[test]
fn error_message_names_candidates_and_time() {
    let graph = graph(2, millis(250));
    let mut device = FakeDevice::new(vec![Vec::new()]);
    let clock = SimulatedClock::new();

    let err = can_proceed(&mut device, &clock, &graph, &expected(&[2, 3]), true).unwrap_err();
    let message = err.to_string();

    assert!(message.contains("[2, 3]"), "message: {}", message);
    assert!(message.contains("4 polls"), "message: {}", message);
    assert!(message.contains("0.50s"), "message: {}", message);
}

// =========================================================================
// Matching semantics
// =========================================================================

#[test]
fn earliest_candidate_wins_when_several_match() {
    let graph = graph(1, millis(10));
    let mut device = FakeDevice::new(vec![frame_with_texts(&["welcome", "connect", "settings"])]);
    let clock = SimulatedClock::new();

    let found = can_proceed(&mut device, &clock, &graph, &expected(&[3, 1, 2]), false).unwrap();
    assert_eq!(found.screen_nr, 3);

    let found = can_proceed(&mut device, &clock, &graph, &expected(&[2, 3]), false).unwrap();
    assert_eq!(found.screen_nr, 2);
}

#[test]
fn all_required_objects_must_be_present() {
    let mut graph = ScriptGraph::new();
    graph
        .add_screen(
            Screen::new(1)
                .with_required(ElementSignature::text("Hello"))
                .with_required(ElementSignature::text("Welcome to Tor on mobile.")),
        )
        .unwrap();
    let clock = SimulatedClock::new();

    let mut partial = FakeDevice::new(vec![frame_with_texts(&["Hello"])]);
    assert!(can_proceed(&mut partial, &clock, &graph, &expected(&[1]), false).is_err());

    let mut full = FakeDevice::new(vec![frame_with_texts(&["Hello", "Welcome to Tor on mobile."])]);
    let found = can_proceed(&mut full, &clock, &graph, &expected(&[1]), false).unwrap();
    assert_eq!(found.required.len(), 2);
}

#[test]
fn optional_objects_refine_but_never_gate_a_match() {
    let mut graph = ScriptGraph::new();
    graph
        .add_screen(
            Screen::new(1)
                .with_required(ElementSignature::text("Connect"))
                .with_optional(ElementSignature::text("Use Bridges"))
                .with_optional(ElementSignature::text("Always-on VPN")),
        )
        .unwrap();
    let clock = SimulatedClock::new();

    let mut device = FakeDevice::new(vec![vec![
        element(&[("text", "Connect"), ("className", "android.widget.Button")]),
        element(&[("text", "Use Bridges")]),
    ]]);
    let found = can_proceed(&mut device, &clock, &graph, &expected(&[1]), false).unwrap();

    assert_eq!(found.optional.len(), 1);
    assert_eq!(found.optional[0].signature, ElementSignature::text("Use Bridges"));
    assert_eq!(
        found.required[0].attributes.get("className").map(String::as_str),
        Some("android.widget.Button")
    );
}

#[test]
fn repeated_detection_on_unchanged_screen_is_stable() {
    let graph = graph(3, millis(100));
    let mut device = FakeDevice::new(vec![frame_with_texts(&["connect", "settings"])]);
    let clock = SimulatedClock::new();
    let candidates = expected(&[1, 2, 3]);

    let first = can_proceed(&mut device, &clock, &graph, &candidates, true).unwrap();
    for _ in 0..5 {
        let again = can_proceed(&mut device, &clock, &graph, &candidates, true).unwrap();
        assert_eq!(again, first);
    }
    assert_eq!(first.screen_nr, 2);
}

#[test]
fn undeclared_candidate_is_reported() {
    let graph = graph(1, millis(10));
    let mut device = FakeDevice::new(vec![Vec::new()]);
    let clock = SimulatedClock::new();

    let err = can_proceed(&mut device, &clock, &graph, &expected(&[42]), false).unwrap_err();
    assert!(matches!(err, ScriptError::UnknownScreen(42)));
    assert_eq!(clock.elapsed(), Duration::ZERO);
}
