use remote_trigger::{Action, Config, Polarity, TriggerPhase, WakeFlags, WakeReason};

use crate::mock_hw::{started, Controller, Emission, Hardware, TEST_LONG, TEST_SHORT};

fn double(flags: &WakeFlags) -> (Controller<'_>, Hardware<'_>) {
    started(flags, Config::double_trigger(Polarity::ActiveLow))
}

#[test]
fn pair_of_events_emits_off() {
    let flags = WakeFlags::new();
    let (mut controller, hw) = double(&flags);
    let code = controller.config().code;

    hw.sensor_pulse();
    assert_eq!(controller.step().action, Action::None);
    assert_eq!(controller.phase(), TriggerPhase::ArmedWaitingSecond);
    assert!(hw.emissions().is_empty());

    hw.sensor_pulse();
    assert_eq!(controller.step().action, Action::EmitOff);
    assert_eq!(controller.phase(), TriggerPhase::Idle);
    assert_eq!(hw.emissions(), vec![Emission::Off(code)]);
}

#[test]
fn second_event_inside_window_after_a_tick() {
    let flags = WakeFlags::new();
    let (mut controller, hw) = double(&flags);

    hw.sensor_pulse();
    controller.step();

    // One short period elapses, the window has two.
    hw.timer_fire();
    assert_eq!(controller.step().reason, WakeReason::None);
    assert_eq!(controller.phase(), TriggerPhase::ArmedWaitingSecond);

    hw.sensor_pulse();
    assert_eq!(controller.step().action, Action::EmitOff);
}

#[test]
fn lone_event_emits_on_when_window_expires() {
    let flags = WakeFlags::new();
    let (mut controller, hw) = double(&flags);
    let code = controller.config().code;

    hw.sensor_pulse();
    let mut actions = vec![controller.step().action];

    for _ in 0..TEST_SHORT.ticks {
        hw.timer_fire();
        actions.push(controller.step().action);
    }

    assert_eq!(actions, vec![Action::None, Action::None, Action::EmitOn]);
    assert_eq!(controller.phase(), TriggerPhase::Idle);
    assert_eq!(hw.emissions(), vec![Emission::On(code)]);
}

#[test]
fn short_window_replaces_long_window_while_armed() {
    let flags = WakeFlags::new();
    let (mut controller, hw) = double(&flags);
    assert_eq!(*hw.timer_starts.borrow(), vec![TEST_LONG.period_ms]);

    hw.sensor_pulse();
    controller.step();
    assert_eq!(controller.window(), TEST_SHORT);
    assert_eq!(
        *hw.timer_starts.borrow(),
        vec![TEST_LONG.period_ms, TEST_SHORT.period_ms]
    );

    hw.sensor_pulse();
    controller.step();
    assert_eq!(controller.window(), TEST_LONG);
    assert_eq!(
        *hw.timer_starts.borrow(),
        vec![
            TEST_LONG.period_ms,
            TEST_SHORT.period_ms,
            TEST_LONG.period_ms
        ]
    );
}

#[test]
fn timeout_takes_priority_over_battery_sampling() {
    let flags = WakeFlags::new();
    let (mut controller, hw) = double(&flags);
    let samples = hw.power_ups();

    hw.sensor_pulse();
    controller.step();
    for _ in 0..TEST_SHORT.ticks {
        hw.timer_fire();
        controller.step();
    }

    assert_eq!(hw.power_ups(), samples);
    assert!(!hw.has_line("Battery sensing"));
}

#[test]
fn sampling_resumes_on_long_window_after_timeout() {
    let flags = WakeFlags::new();
    let (mut controller, hw) = double(&flags);

    hw.sensor_pulse();
    controller.step();
    for _ in 0..TEST_SHORT.ticks {
        hw.timer_fire();
        controller.step();
    }
    let samples = hw.power_ups();

    let mut reasons = Vec::new();
    for _ in 0..TEST_LONG.ticks {
        hw.timer_fire();
        reasons.push(controller.step().reason);
    }

    assert_eq!(
        reasons,
        vec![WakeReason::None, WakeReason::None, WakeReason::Timer]
    );
    assert_eq!(hw.power_ups(), samples + 1);
}

#[test]
fn new_pair_starts_after_timeout() {
    let flags = WakeFlags::new();
    let (mut controller, hw) = double(&flags);

    hw.sensor_pulse();
    controller.step();
    for _ in 0..TEST_SHORT.ticks {
        hw.timer_fire();
        controller.step();
    }

    hw.sensor_pulse();
    assert_eq!(controller.step().action, Action::None);
    assert_eq!(controller.phase(), TriggerPhase::ArmedWaitingSecond);
    hw.sensor_pulse();
    assert_eq!(controller.step().action, Action::EmitOff);
}

#[test]
fn active_high_pair_emits_off() {
    let flags = WakeFlags::new();
    let (mut controller, hw) = started(&flags, Config::double_trigger(Polarity::ActiveHigh));

    hw.sensor_pulse();
    controller.step();
    hw.sensor_pulse();
    assert_eq!(controller.step().action, Action::EmitOff);
}
