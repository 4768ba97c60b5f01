//! Mock adapters for driving the controller on the host.
//!
//! Every adapter shares its state through `Rc<RefCell<_>>` so a test keeps
//! a handle after the adapter has been moved into the controller.

use std::cell::RefCell;
use std::convert::Infallible;
use std::future::{self, Future};
use std::rc::Rc;

use remote_trigger::config::{Edge, Window};
use remote_trigger::power::Calibration;
use remote_trigger::{
    event, AdcPort, Config, ConfigError, Diagnostics, EventLine, Indicator, Polarity,
    PowerError, RadioTransmitter, SwitchCode, TriggerController, TriggerMode, WakeFlags,
    WakeTimer,
};

/// Raw reading that converts to 3000 mV.
pub const RAW_FRESH: u16 = 1671;
/// Raw reading that converts to 2088 mV, under the 2300 mV threshold.
pub const RAW_DRAINED: u16 = 2400;

pub const TEST_LONG: Window = Window::new(8_000, 3);
pub const TEST_SHORT: Window = Window::new(250, 2);

// ── ADC ───────────────────────────────────────────────────────

#[derive(Debug)]
pub struct AdcState {
    pub raw: u16,
    pub responsive: bool,
    pub power_ups: u32,
    pub powered: bool,
}

#[derive(Clone)]
pub struct MockAdc(pub Rc<RefCell<AdcState>>);

impl AdcPort for MockAdc {
    fn power_up(&mut self) -> Result<(), PowerError> {
        let mut adc = self.0.borrow_mut();
        adc.powered = true;
        adc.power_ups += 1;
        Ok(())
    }

    fn power_down(&mut self) {
        self.0.borrow_mut().powered = false;
    }

    fn start_conversion(&mut self) {}

    fn read(&mut self) -> nb::Result<u16, Infallible> {
        let adc = self.0.borrow();
        if adc.responsive {
            Ok(adc.raw)
        } else {
            Err(nb::Error::WouldBlock)
        }
    }
}

// ── Wake-up timer ─────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockTimer {
    pub starts: Rc<RefCell<Vec<u32>>>,
}

impl WakeTimer for MockTimer {
    fn start(&mut self, period_ms: u32) {
        self.starts.borrow_mut().push(period_ms);
    }

    fn sleep(&mut self) -> impl Future<Output = ()> {
        future::ready(())
    }
}

// ── Sensor line ───────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct LineState {
    pub enabled: Option<Edge>,
    pub high: bool,
}

#[derive(Clone, Default)]
pub struct MockLine(pub Rc<RefCell<LineState>>);

impl EventLine for MockLine {
    fn enable(&mut self, edge: Edge) {
        self.0.borrow_mut().enabled = Some(edge);
    }

    fn disable(&mut self) {
        self.0.borrow_mut().enabled = None;
    }

    fn is_enabled(&self) -> bool {
        self.0.borrow().enabled.is_some()
    }

    fn clear_pending(&mut self) {}

    fn is_high(&self) -> bool {
        self.0.borrow().high
    }
}

// ── Collaborators ─────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Emission {
    On(SwitchCode),
    Off(SwitchCode),
}

#[derive(Clone, Default)]
pub struct MockRadio(pub Rc<RefCell<Vec<Emission>>>);

impl RadioTransmitter for MockRadio {
    fn emit_on(&mut self, code: &SwitchCode) {
        self.0.borrow_mut().push(Emission::On(*code));
    }

    fn emit_off(&mut self, code: &SwitchCode) {
        self.0.borrow_mut().push(Emission::Off(*code));
    }
}

#[derive(Clone, Default)]
pub struct MockDiagnostics(pub Rc<RefCell<Vec<String>>>);

impl Diagnostics for MockDiagnostics {
    fn log_line(&mut self, line: &str) {
        self.0.borrow_mut().push(line.to_owned());
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flash {
    Blink(u8),
    LowBattery,
}

#[derive(Clone, Default)]
pub struct MockIndicator(pub Rc<RefCell<Vec<Flash>>>);

impl Indicator for MockIndicator {
    fn blink(&mut self, count: u8) {
        self.0.borrow_mut().push(Flash::Blink(count));
    }

    fn low_battery_pulse(&mut self) {
        self.0.borrow_mut().push(Flash::LowBattery);
    }
}

// ── Rig ───────────────────────────────────────────────────────

pub type Controller<'a> = TriggerController<
    'a,
    MockAdc,
    MockTimer,
    MockLine,
    MockRadio,
    MockDiagnostics,
    MockIndicator,
>;

/// Test-side handles onto the hardware owned by the controller.
pub struct Hardware<'a> {
    pub flags: &'a WakeFlags,
    pub polarity: Polarity,
    pub adc: Rc<RefCell<AdcState>>,
    pub timer_starts: Rc<RefCell<Vec<u32>>>,
    pub line: MockLine,
    pub radio: Rc<RefCell<Vec<Emission>>>,
    pub lines: Rc<RefCell<Vec<String>>>,
    pub flashes: Rc<RefCell<Vec<Flash>>>,
}

#[allow(dead_code)]
impl Hardware<'_> {
    /// Asserts and releases the sensor, running the line handler on the
    /// asserting edge if the interrupt controller would deliver it.
    pub fn sensor_pulse(&self) {
        self.set_level(self.polarity.is_asserted(true));
        self.set_level(!self.polarity.is_asserted(true));
    }

    /// Fires the wake-up timer handler once.
    pub fn timer_fire(&self) {
        self.flags.timer.raise();
    }

    pub fn set_raw(&self, raw: u16) {
        self.adc.borrow_mut().raw = raw;
    }

    pub fn power_ups(&self) -> u32 {
        self.adc.borrow().power_ups
    }

    pub fn emissions(&self) -> Vec<Emission> {
        self.radio.borrow().clone()
    }

    pub fn flashes(&self) -> Vec<Flash> {
        self.flashes.borrow().clone()
    }

    pub fn has_line(&self, text: &str) -> bool {
        self.lines.borrow().iter().any(|l| l == text)
    }

    pub fn clear_records(&self) {
        self.radio.borrow_mut().clear();
        self.lines.borrow_mut().clear();
        self.flashes.borrow_mut().clear();
    }

    fn set_level(&self, high: bool) {
        let edge = {
            let mut state = self.line.0.borrow_mut();
            let edge = match (state.high, high) {
                (false, true) => Some(Edge::Rising),
                (true, false) => Some(Edge::Falling),
                _ => None,
            };
            state.high = high;
            edge
        };
        let delivered = edge.is_some() && self.line.0.borrow().enabled == edge;
        if delivered {
            event::on_interrupt(&mut self.line.clone(), self.polarity, &self.flags.event);
        }
    }
}

/// Shrinks the windows to a few ticks and pins the ADC calibration.
pub fn test_config(config: Config) -> Config {
    let trigger = match config.trigger {
        TriggerMode::Double { .. } => TriggerMode::Double { window: TEST_SHORT },
        TriggerMode::Single => TriggerMode::Single,
    };
    Config {
        long_window: TEST_LONG,
        trigger,
        ..config
    }
    .with_calibration(Calibration::vrefint_factory(1671))
}

/// Builds a controller around mocks. The sensor line idles deasserted.
pub fn try_rig(
    flags: &WakeFlags,
    config: Config,
) -> (Result<Controller<'_>, ConfigError>, Hardware<'_>) {
    let adc = Rc::new(RefCell::new(AdcState {
        raw: RAW_FRESH,
        responsive: true,
        power_ups: 0,
        powered: false,
    }));
    let timer = MockTimer::default();
    let line = MockLine::default();
    line.0.borrow_mut().high = !config.polarity.is_asserted(true);
    let radio = MockRadio::default();
    let diagnostics = MockDiagnostics::default();
    let indicator = MockIndicator::default();

    let hardware = Hardware {
        flags,
        polarity: config.polarity,
        adc: adc.clone(),
        timer_starts: timer.starts.clone(),
        line: line.clone(),
        radio: radio.0.clone(),
        lines: diagnostics.0.clone(),
        flashes: indicator.0.clone(),
    };

    let controller = TriggerController::new(
        config,
        flags,
        MockAdc(adc),
        timer,
        line,
        radio,
        diagnostics,
        indicator,
    );

    (controller, hardware)
}

pub fn rig(flags: &WakeFlags, config: Config) -> (Controller<'_>, Hardware<'_>) {
    let (controller, hardware) = try_rig(flags, config);
    (controller.expect("test configuration is valid"), hardware)
}

/// Builds and starts a controller, then forgets the startup records.
pub fn started(flags: &WakeFlags, config: Config) -> (Controller<'_>, Hardware<'_>) {
    let (mut controller, hardware) = rig(flags, test_config(config));
    controller.start();
    hardware.clear_records();
    (controller, hardware)
}
