//! Sensor input on PA0 / EXTI line 0.
//!
//! The pin is configured once through embassy. Everything the handler
//! touches (mask, edge selection, pending bit, input level) goes through
//! the PAC, so the line can be driven from both contexts without sharing
//! an object.

use embassy_stm32::gpio::{Input, Pull};
use embassy_stm32::pac::{self, interrupt};
use embassy_stm32::{Peri, peripherals};
use remote_trigger::config::Edge;
use remote_trigger::{EventLine, event};

use super::{EXTI_REG_IDX, WAKE_FLAGS, WAKE_SIGNAL};
use crate::DEVICE;

const SENSE_PIN: usize = 0;
const SENSE_EXTI_LINE: usize = 0;

/// SYSCFG_EXTICR port code for GPIOA.
const PORT_A: u8 = 0;

pub struct SensorLine {
    _pin: Input<'static>,
}

impl SensorLine {
    /// Configures PA0 as an input, selects it for EXTI line 0 and unmasks
    /// the vector. The line stays disabled until armed.
    pub fn new(pin: Peri<'static, peripherals::PA0>, pull: Pull) -> Self {
        let pin = Input::new(pin, pull);

        pac::RCC.apb2enr().modify(|w| w.set_syscfgen(true));
        pac::SYSCFG
            .exticr(SENSE_EXTI_LINE / 4)
            .modify(|w| w.set_exti(SENSE_EXTI_LINE % 4, PORT_A));

        let mut line = Self { _pin: pin };
        line.disable();
        line.clear_pending();

        unsafe {
            cortex_m::peripheral::NVIC::unmask(embassy_stm32::interrupt::EXTI0_1);
        };

        line
    }
}

/// Register-level view of the line, usable from the handler.
struct Exti0;

impl EventLine for Exti0 {
    fn enable(&mut self, edge: Edge) {
        let exti = pac::EXTI;
        exti.rtsr(EXTI_REG_IDX)
            .modify(|w| w.set_line(SENSE_EXTI_LINE, edge == Edge::Rising));
        exti.ftsr(EXTI_REG_IDX)
            .modify(|w| w.set_line(SENSE_EXTI_LINE, edge == Edge::Falling));
        exti.imr(EXTI_REG_IDX)
            .modify(|w| w.set_line(SENSE_EXTI_LINE, true));
    }

    fn disable(&mut self) {
        pac::EXTI
            .imr(EXTI_REG_IDX)
            .modify(|w| w.set_line(SENSE_EXTI_LINE, false));
    }

    fn is_enabled(&self) -> bool {
        pac::EXTI.imr(EXTI_REG_IDX).read().line(SENSE_EXTI_LINE)
    }

    fn clear_pending(&mut self) {
        pac::EXTI
            .pr(EXTI_REG_IDX)
            .write(|w| w.set_line(SENSE_EXTI_LINE, true));
    }

    fn is_high(&self) -> bool {
        pac::GPIOA.idr().read().idr(SENSE_PIN) == pac::gpio::vals::Idr::HIGH
    }
}

impl EventLine for SensorLine {
    fn enable(&mut self, edge: Edge) {
        Exti0.enable(edge);
    }

    fn disable(&mut self) {
        Exti0.disable();
    }

    fn is_enabled(&self) -> bool {
        Exti0.is_enabled()
    }

    fn clear_pending(&mut self) {
        Exti0.clear_pending();
    }

    fn is_high(&self) -> bool {
        Exti0.is_high()
    }
}

/// EXTI lines 0 and 1 interrupt handler.
///
/// Only line 0 is in use. An asserted line is disarmed and latched, the
/// foreground re-arms it after handling the wake.
#[interrupt]
fn EXTI0_1() {
    if event::on_interrupt(&mut Exti0, DEVICE.polarity, &WAKE_FLAGS.event) {
        WAKE_SIGNAL.signal(());
    }
}
