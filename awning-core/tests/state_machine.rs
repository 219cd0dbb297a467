//! State machine scenarios: calibration sentinel, hysteresis transitions,
//! travel completion, and the blink cadence.

mod common;

use awning_core::config::Thresholds;
use awning_core::state::{BLINK_TOGGLE_TICKS, DeviceState, Direction, StateMachine};
use common::PanelState;

fn calibrated() -> Thresholds {
    Thresholds {
        trigger_min: 400.0,
        trigger_max: 600.0,
        distance_min: 10.0,
        distance_max: 30.0,
    }
}

/// Drives the machine to RolledUp: low trigger starts a closing transition,
/// short distance completes it.
fn roll_up(machine: &mut StateMachine, panel: &mut PanelState) {
    machine.evaluate(&calibrated(), 350.0, 5.0, panel);
    assert_eq!(machine.state(), DeviceState::RolledUp);
}

#[test]
fn any_zero_threshold_forces_uninitialized_with_all_indicators_on() {
    let mut machine = StateMachine::new();
    let mut panel = PanelState::default();
    roll_up(&mut machine, &mut panel);

    let mut thresholds = calibrated();
    thresholds.distance_max = 0.0;
    // Readings that would otherwise start a transition are ignored.
    machine.evaluate(&thresholds, 650.0, 20.0, &mut panel);

    assert_eq!(machine.state(), DeviceState::Uninitialized);
    assert!(panel.closed && panel.open && panel.blink);
}

#[test]
fn bright_reading_starts_an_opening_transition() {
    let mut machine = StateMachine::new();
    let mut panel = PanelState::default();
    roll_up(&mut machine, &mut panel);

    machine.evaluate(&calibrated(), 650.0, 20.0, &mut panel);

    assert_eq!(machine.state(), DeviceState::Transitioning);
    assert_eq!(machine.direction(), Some(Direction::Opening));
    assert!(!panel.closed);
    assert!(panel.open);
}

#[test]
fn opening_travel_completes_past_max_distance() {
    let mut machine = StateMachine::new();
    let mut panel = PanelState::default();
    roll_up(&mut machine, &mut panel);
    machine.evaluate(&calibrated(), 650.0, 20.0, &mut panel);

    machine.evaluate(&calibrated(), 650.0, 35.0, &mut panel);

    assert_eq!(machine.state(), DeviceState::RolledDown);
}

#[test]
fn dark_reading_closes_from_rolled_down() {
    let mut machine = StateMachine::new();
    let mut panel = PanelState::default();
    roll_up(&mut machine, &mut panel);
    machine.evaluate(&calibrated(), 650.0, 35.0, &mut panel);
    assert_eq!(machine.state(), DeviceState::RolledDown);

    machine.evaluate(&calibrated(), 350.0, 20.0, &mut panel);
    assert_eq!(machine.state(), DeviceState::Transitioning);
    assert_eq!(machine.direction(), Some(Direction::Closing));
    assert!(panel.closed);
    assert!(!panel.open);

    machine.evaluate(&calibrated(), 350.0, 5.0, &mut panel);
    assert_eq!(machine.state(), DeviceState::RolledUp);
    assert!(panel.closed);
    assert!(!panel.open);
    assert!(!panel.blink);
}

#[test]
fn rolled_states_persist_between_crossings() {
    let mut machine = StateMachine::new();
    let mut panel = PanelState::default();
    roll_up(&mut machine, &mut panel);

    for _ in 0..10 {
        machine.evaluate(&calibrated(), 500.0, 20.0, &mut panel);
        assert_eq!(machine.state(), DeviceState::RolledUp);
    }
}

#[test]
fn opening_wins_when_both_thresholds_are_crossed() {
    // Degenerate configuration where min sits above max: a mid reading
    // satisfies both checks, and the opening branch is evaluated first.
    let thresholds = Thresholds {
        trigger_min: 600.0,
        trigger_max: 400.0,
        distance_min: 10.0,
        distance_max: 30.0,
    };
    let mut machine = StateMachine::new();
    let mut panel = PanelState::default();

    machine.evaluate(&thresholds, 500.0, 20.0, &mut panel);

    assert_eq!(machine.state(), DeviceState::Transitioning);
    assert_eq!(machine.direction(), Some(Direction::Opening));
}

#[test]
fn blink_toggles_on_the_documented_cadence() {
    let mut machine = StateMachine::new();
    let mut panel = PanelState::default();
    // Enter a transition and hold it: readings stay between the thresholds.
    machine.evaluate(&calibrated(), 650.0, 20.0, &mut panel);
    assert_eq!(machine.state(), DeviceState::Transitioning);

    let evaluations = BLINK_TOGGLE_TICKS * 3 + 1;
    for _ in 0..evaluations {
        machine.evaluate(&calibrated(), 500.0, 20.0, &mut panel);
    }

    assert_eq!(panel.blink_toggles, 3);
}
