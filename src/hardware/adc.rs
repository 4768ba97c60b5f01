//! Supply measurement through the internal voltage reference.
//!
//! VREFINT is converted against VDDA, which is tied to the battery. The
//! ADC is clocked from PCLK (HSI16 is off) in low-frequency mode.

use core::convert::Infallible;

use embassy_stm32::pac;
use embassy_stm32::pac::adc::vals::{Ckmode, Smp};
use embassy_stm32::{Peri, peripherals};
use remote_trigger::{AdcPort, PowerError};

/// VREFINT is internally connected to channel 17.
const VREFINT_CHANNEL: usize = 17;

/// Factory VREFINT reading taken at VDDA = 3.0 V.
const VREFINT_CAL_ADDR: usize = 0x1FF8_0078;

/// Upper bound on polls for reference start-up, enable, disable and
/// calibration. Covers well over 3 ms at 2.097 MHz.
const READY_POLLS: u32 = 10_000;

pub struct VrefintAdc {
    _adc: Peri<'static, peripherals::ADC1>,
}

impl VrefintAdc {
    /// Calibrates the converter once and leaves it powered down.
    pub fn new(adc: Peri<'static, peripherals::ADC1>) -> Self {
        let regs = pac::ADC1;

        pac::RCC.apb2enr().modify(|w| w.set_adcen(true));
        regs.cfgr2().modify(|w| w.set_ckmode(Ckmode::PCLK));
        regs.cr().modify(|w| w.set_adcal(true));
        if !wait(|| !regs.cr().read().adcal()) {
            defmt::warn!("ADC calibration timed out");
        }
        pac::RCC.apb2enr().modify(|w| w.set_adcen(false));

        Self { _adc: adc }
    }

    /// Raw factory calibration word.
    pub fn vrefint_cal() -> u16 {
        // SAFETY: fixed, always readable system memory location.
        unsafe { core::ptr::read_volatile(VREFINT_CAL_ADDR as *const u16) }
    }
}

fn wait(mut done: impl FnMut() -> bool) -> bool {
    (0..READY_POLLS).any(|_| done())
}

impl AdcPort for VrefintAdc {
    fn power_up(&mut self) -> Result<(), PowerError> {
        let regs = pac::ADC1;

        pac::RCC.apb2enr().modify(|w| w.set_adcen(true));
        regs.ccr().modify(|w| {
            w.set_lfmen(true);
            w.set_vrefen(true);
        });
        regs.smpr().modify(|w| w.set_smp(Smp::CYCLES160_5));
        regs.chselr()
            .write(|w| w.set_chselx(VREFINT_CHANNEL, true));

        // With ULP set VREFINT is off in STOP and needs up to 3 ms to
        // restart.
        if !wait(|| pac::PWR.csr().read().vrefintrdyf()) {
            defmt::warn!("VREFINT did not settle");
            return Err(PowerError::NotReady);
        }

        regs.isr().modify(|w| w.set_adrdy(true));
        regs.cr().modify(|w| w.set_aden(true));
        if !wait(|| regs.isr().read().adrdy()) {
            defmt::warn!("ADC did not become ready");
            return Err(PowerError::NotReady);
        }

        Ok(())
    }

    fn power_down(&mut self) {
        let regs = pac::ADC1;

        if regs.cr().read().adstart() {
            regs.cr().modify(|w| w.set_adstp(true));
            wait(|| !regs.cr().read().adstart());
        }
        regs.cr().modify(|w| w.set_addis(true));
        wait(|| !regs.cr().read().aden());

        regs.ccr().modify(|w| w.set_vrefen(false));
        pac::RCC.apb2enr().modify(|w| w.set_adcen(false));
    }

    fn start_conversion(&mut self) {
        pac::ADC1.cr().modify(|w| w.set_adstart(true));
    }

    fn read(&mut self) -> nb::Result<u16, Infallible> {
        let regs = pac::ADC1;
        if regs.isr().read().eoc() {
            // Reading DR clears EOC.
            Ok(regs.dr().read().data())
        } else {
            Err(nb::Error::WouldBlock)
        }
    }
}
