//! RTC wake-up timer.
//!
//! The wake-up timer runs from LSE/16 (2048 Hz) and keeps counting in STOP
//! mode. Its interrupt reaches the NVIC through EXTI line 20.

use embassy_stm32::pac::{self, interrupt};
use embassy_stm32::{Peri, peripherals};
use remote_trigger::WakeTimer;

use super::{EXTI_REG_IDX, WAKE_FLAGS, WAKE_SIGNAL};

/// EXTI line wired to the RTC wake-up event.
const RTC_WAKEUP_EXTI_LINE: usize = 20;

/// Wake-up counter clock with the LSE/16 prescaler.
const WUT_CLOCK_HZ: u32 = 32_768 / 16;

/// Upper bound on polls for the reload register to become writable.
const WUTWF_POLLS: u32 = 10_000;

/// Periodic wake-up source for the controller.
pub struct RtcWakeTimer {
    _rtc: Peri<'static, peripherals::RTC>,
}

impl RtcWakeTimer {
    /// Routes the wake-up event to the NVIC. The timer itself stays off
    /// until the first [`WakeTimer::start`].
    pub fn new(rtc: Peri<'static, peripherals::RTC>) -> Self {
        let exti = pac::EXTI;

        exti.imr(EXTI_REG_IDX)
            .modify(|w| w.set_line(RTC_WAKEUP_EXTI_LINE, true));
        exti.rtsr(EXTI_REG_IDX)
            .modify(|w| w.set_line(RTC_WAKEUP_EXTI_LINE, true));

        unsafe {
            cortex_m::peripheral::NVIC::unmask(embassy_stm32::interrupt::RTC);
        };

        Self { _rtc: rtc }
    }
}

/// Reload value for a period, the counter fires after `reload + 1` clocks.
fn reload_for(period_ms: u32) -> u16 {
    let clocks = (period_ms.saturating_mul(WUT_CLOCK_HZ) / 1000).clamp(1, 1 << 16);
    (clocks - 1) as u16
}

impl WakeTimer for RtcWakeTimer {
    fn start(&mut self, period_ms: u32) {
        let rtc = pac::RTC;

        // RTC registers live in the backup domain.
        pac::RCC.apb1enr().modify(|w| w.set_pwren(true));
        pac::PWR.cr().modify(|w| w.set_dbp(true));

        rtc.wpr().write(|w| w.set_key(0xca));
        rtc.wpr().write(|w| w.set_key(0x53));

        rtc.cr().modify(|w| {
            w.set_wute(false);
            w.set_wutie(false);
        });

        let mut polls = 0;
        while !rtc.isr().read().wutwf() {
            polls += 1;
            if polls >= WUTWF_POLLS {
                defmt::warn!("RTC wake-up timer not writable, reprogramming anyway");
                break;
            }
        }

        rtc.wutr().write(|w| w.set_wut(reload_for(period_ms)));
        rtc.isr().modify(|w| w.set_wutf(false));
        rtc.cr().modify(|w| {
            w.set_wucksel(pac::rtc::vals::Wucksel::DIV16);
            w.set_wutie(true);
            w.set_wute(true);
        });

        rtc.wpr().write(|w| w.set_key(0xff));
    }

    async fn sleep(&mut self) {
        WAKE_SIGNAL.wait().await;
    }
}

/// RTC interrupt handler (EXTI line 20).
///
/// Clears the wake-up flag and its EXTI pending bit, then hands the tick
/// to the foreground.
#[interrupt]
fn RTC() {
    let rtc = pac::RTC;

    if rtc.isr().read().wutf() {
        rtc.isr().modify(|w| w.set_wutf(false));
        WAKE_FLAGS.timer.raise();
        WAKE_SIGNAL.signal(());
    }

    // PR is write-one-to-clear: write only this line's bit.
    pac::EXTI
        .pr(EXTI_REG_IDX)
        .write(|w| w.set_line(RTC_WAKEUP_EXTI_LINE, true));
}
