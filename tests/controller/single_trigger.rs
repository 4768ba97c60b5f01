use remote_trigger::{Action, Config, Cycle, Polarity, TriggerPhase, WakeFlags, WakeReason};

use crate::mock_hw::{started, Emission, Flash};

#[test]
fn every_event_emits_on() {
    let flags = WakeFlags::new();
    let (mut controller, hw) = started(&flags, Config::single_trigger(Polarity::ActiveLow));
    let code = controller.config().code;

    for _ in 0..3 {
        hw.sensor_pulse();
        assert_eq!(
            controller.step(),
            Cycle {
                reason: WakeReason::ExternalEvent,
                action: Action::EmitOn,
            }
        );
        assert_eq!(controller.phase(), TriggerPhase::Idle);
    }

    assert_eq!(hw.emissions(), vec![Emission::On(code); 3]);
}

#[test]
fn active_high_line_emits_on() {
    let flags = WakeFlags::new();
    let (mut controller, hw) = started(&flags, Config::single_trigger(Polarity::ActiveHigh));

    hw.sensor_pulse();
    assert_eq!(controller.step().action, Action::EmitOn);
    assert_eq!(hw.emissions().len(), 1);
}

#[test]
fn emission_blinks_once_and_traces() {
    let flags = WakeFlags::new();
    let (mut controller, hw) = started(&flags, Config::single_trigger(Polarity::ActiveLow));

    hw.sensor_pulse();
    controller.step();

    assert_eq!(hw.flashes(), vec![Flash::Blink(1)]);
    assert!(hw.has_line("Emit on"));
}

#[test]
fn pulses_before_rearm_are_dropped() {
    let flags = WakeFlags::new();
    let (mut controller, hw) = started(&flags, Config::single_trigger(Polarity::ActiveLow));

    // The handler disarmed the line on the first pulse; the foreground has
    // not re-armed it yet.
    hw.sensor_pulse();
    hw.sensor_pulse();
    hw.sensor_pulse();

    assert_eq!(controller.step().action, Action::EmitOn);
    assert_eq!(controller.step().reason, WakeReason::None);
    assert_eq!(hw.emissions().len(), 1);

    // Re-armed by the step.
    hw.sensor_pulse();
    assert_eq!(controller.step().action, Action::EmitOn);
}

#[test]
fn never_arms_for_a_second_event() {
    let flags = WakeFlags::new();
    let (mut controller, hw) = started(&flags, Config::single_trigger(Polarity::ActiveLow));

    for i in 0..10 {
        if i % 3 == 0 {
            hw.timer_fire();
        } else {
            hw.sensor_pulse();
        }
        controller.step();
        assert_eq!(controller.phase(), TriggerPhase::Idle);
        assert_eq!(controller.window(), controller.config().long_window);
    }
}
