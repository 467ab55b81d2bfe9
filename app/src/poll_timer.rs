use core::sync::atomic::{AtomicBool, Ordering};

use touch_slider::hal::Scheduler;

use crate::hal::rcc::Rcc;
use crate::pac;
use crate::pac::interrupt;

static TICK: AtomicBool = AtomicBool::new(false);

/// Periodic tick for the touch poll cycle, from the TIM2 update interrupt
pub struct PollTimer {
    tim: pac::TIM2,
    clk_freq: u32,
}

impl PollTimer {
    pub fn new(tim: pac::TIM2, rcc: &mut Rcc) -> Self {
        let rccregs = unsafe { pac::Peripherals::steal().RCC };
        rccregs.apb1enr.modify(|_, w| w.tim2en().set_bit());

        // If pclk is prescaled from hclk, the frequency fed into the timers is doubled
        let clk_freq = if rcc.clocks.hclk().0 == rcc.clocks.pclk().0 {
            rcc.clocks.pclk().0
        } else {
            rcc.clocks.pclk().0 * 2
        };

        tim.cr1.modify(|_, w| w.arpe().set_bit());

        Self { tim, clk_freq }
    }

    /// True once for every elapsed interval since the last call
    pub fn take_tick() -> bool {
        let tick = TICK.load(Ordering::Relaxed);
        if tick {
            TICK.store(false, Ordering::Relaxed);
        }
        tick
    }

    fn set_interval(&mut self, interval_ms: u32) {
        let arr = self.clk_freq / 1000 * interval_ms;
        self.tim.arr.write(|w| w.arr().bits(arr));
        self.tim.egr.write(|w| w.ug().set_bit());
        self.tim.sr.write(|w| unsafe { w.bits(0) });
    }
}

impl Scheduler for PollTimer {
    fn attach(&mut self, interval_ms: u32) {
        self.set_interval(interval_ms);
        TICK.store(false, Ordering::Relaxed);
        self.tim.dier.write(|w| w.uie().set_bit());
        self.tim.cr1.modify(|_, w| w.cen().set_bit());
    }

    fn detach(&mut self) {
        self.tim.dier.write(|w| w.uie().clear_bit());
        self.tim.cr1.modify(|_, w| w.cen().clear_bit());
        TICK.store(false, Ordering::Relaxed);
    }
}

#[interrupt]
fn TIM2() {
    // Clear IRQ flags
    unsafe {
        let tim2 = pac::Peripherals::steal().TIM2;
        tim2.sr.write(|w| w.bits(0));
    }
    TICK.store(true, Ordering::Relaxed);
}
