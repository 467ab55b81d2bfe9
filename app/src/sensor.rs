//! Touch sensing on the STM32 TSC, with a first-order filter in software.

use stm32f0xx_hal as hal;
use touch_slider::hal::Sensor;
use touch_slider::FilteredTable;

use crate::hal::pac;
use crate::hal::rcc::Rcc;
use crate::hal::tsc::Tsc;

/// Wiring of one electrode to the TSC
#[derive(Clone, Copy, Debug)]
pub struct TscSample {
    pub group: u8,
    pub sample: u8,
    pub channel: u8,
}

const MAX_COUNT: u16 = 8191;

/// Each new count moves the filtered value 1/2^FILTER_SHIFT of the way
const FILTER_SHIFT: i32 = 2;

/// Electrodes are indexed by channel id. Each batch lists electrodes which are
/// acquired together, so it may hold at most one electrode per group.
pub struct TscSensor<const N: usize> {
    tsc: Tsc,
    electrodes: &'static [TscSample; N],
    batches: &'static [&'static [usize]],
    configured: [bool; N],
    raw: [u16; N],
    filtered: [u16; N],
    period_ms: Option<u32>,
    next_ms: u32,
}

impl<const N: usize> TscSensor<N> {
    pub fn new(
        tsc: pac::TSC,
        rcc: &mut Rcc,
        electrodes: &'static [TscSample; N],
        batches: &'static [&'static [usize]],
    ) -> Self {
        let config = hal::tsc::Config {
            clock_prescale: None,
            max_count: Some(hal::tsc::MaxCount::U8191),
            charge_transfer_high: None,
            charge_transfer_low: None,
        };
        Self {
            tsc: Tsc::tsc(tsc, rcc, Some(config)),
            electrodes,
            batches,
            configured: [false; N],
            raw: [0; N],
            filtered: [0; N],
            period_ms: None,
            next_ms: 0,
        }
    }

    /// Acquire and filter all configured electrodes if a filter period has
    /// elapsed, and publish the filtered values to `table`
    pub fn poll(&mut self, now_ms: u32, table: &FilteredTable<N>) {
        let period = match self.period_ms {
            Some(period) => period,
            None => return,
        };
        if (now_ms.wrapping_sub(self.next_ms) as i32) < 0 {
            return;
        }
        self.next_ms = now_ms.wrapping_add(period);

        for batch in self.batches {
            self.acquire(batch);
            cortex_m::asm::delay(1000);
        }

        for i in 0..N {
            if !self.configured[i] {
                continue;
            }
            self.filtered[i] = if self.filtered[i] == 0 {
                self.raw[i]
            } else {
                let f = self.filtered[i] as i32;
                (f + ((self.raw[i] as i32 - f) >> FILTER_SHIFT)) as u16
            };
        }
        table.on_filtered(&self.raw, &self.filtered);
    }

    fn acquire(&mut self, batch: &[usize]) {
        // IMHO all HAL peripheral drivers should include a pub register block for just this kind of
        // extension, but they don't so steal our own.
        let regs = unsafe { pac::Peripherals::steal().TSC };

        let mut iogcsr: u32 = 0;
        let mut ioscr: u32 = 0;
        let mut ioccr: u32 = 0;

        for &i in batch.iter().filter(|&&i| i < N && self.configured[i]) {
            let s = &self.electrodes[i];
            iogcsr |= 1 << (s.group - 1);
            ioscr |= 1 << ((s.group - 1) * 4 + s.sample - 1);
            ioccr |= 1 << ((s.group - 1) * 4 + s.channel - 1);
        }
        if iogcsr == 0 {
            return;
        }

        regs.iogcsr.write(|w| unsafe { w.bits(iogcsr) });
        regs.ioscr.write(|w| unsafe { w.bits(ioscr) });
        regs.ioccr.write(|w| unsafe { w.bits(ioccr) });

        self.tsc.acquire().ok();

        // Groups which hit MAX COUNT before the charge threshold are not
        // flagged complete; they read as MAX_COUNT + 1.
        let group_status = regs.iogcsr.read().bits() >> 16;

        for &i in batch.iter().filter(|&&i| i < N && self.configured[i]) {
            let group = self.electrodes[i].group;
            self.raw[i] = if group_status & (1 << (group - 1)) != 0 {
                self.tsc.read_unchecked(group)
            } else {
                MAX_COUNT + 1
            };
        }
    }
}

impl<const N: usize> Sensor for TscSensor<N> {
    fn init(&mut self) {
        self.configured = [false; N];
        self.raw = [0; N];
        self.filtered = [0; N];
        log::info!("TSC ready, {} electrodes, max count {}", N, MAX_COUNT);
    }

    fn configure(&mut self, channel: touch_slider::ChannelId) {
        if let Some(configured) = self.configured.get_mut(channel.index()) {
            *configured = true;
        }
    }

    fn unconfigure(&mut self, channel: touch_slider::ChannelId) {
        let i = channel.index();
        if i < N {
            self.configured[i] = false;
            self.raw[i] = 0;
            self.filtered[i] = 0;
        }
    }

    fn filter_start(&mut self, period_ms: u32) {
        self.period_ms = Some(period_ms);
        self.next_ms = 0;
    }

    fn filter_stop(&mut self) {
        self.period_ms = None;
    }
}
