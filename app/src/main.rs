#![no_main]
#![no_std]

use core::sync::atomic::{AtomicU32, Ordering};
use cortex_m_rt::{entry, exception};
use panic_halt as _;

use stm32f0xx_hal as hal;

use touch_slider::{FilteredTable, PinTable, SliderConfig, TouchSlider, DEFAULT_SLIDER_CONFIG};

use crate::hal::pac;
use crate::hal::prelude::*;

use poll_timer::PollTimer;
use profile::CHANNELS;
use sensor::TscSensor;

mod logger;
mod poll_timer;
mod profile;
mod sensor;
mod serial;

type Slider = TouchSlider<'static, PinTable<'static>, TscSensor<CHANNELS>, PollTimer, CHANNELS>;

/// Percentage of the untouched count below which a pad is touched
const SLIDER_SENSITIVITY: u8 = 95;
const BUTTON_SENSITIVITY: u8 = 93;

/// Time for the filter to settle on the untouched counts before calibration
const SETTLE_MS: u32 = 200;

static SLIDER_CONFIG: SliderConfig = SliderConfig {
    calibrate_on_start: false,
    print_button_touched: true,
    ..DEFAULT_SLIDER_CONFIG
};

static FILTERED: FilteredTable<CHANNELS> = FilteredTable::new();
static TIME: AtomicU32 = AtomicU32::new(0);

/// Run the sensor filter only, for `ms` milliseconds
fn settle(slider: &mut Slider, ms: u32) {
    let start = TIME.load(Ordering::Relaxed);
    loop {
        let now = TIME.load(Ordering::Relaxed);
        if now.wrapping_sub(start) >= ms {
            break;
        }
        slider.sensor_mut().poll(now, &FILTERED);
    }
    // Drop ticks which fired while settling
    PollTimer::take_tick();
}

#[entry]
fn main() -> ! {
    let dp = pac::Peripherals::take().unwrap();
    let cp = cortex_m::Peripherals::take().unwrap();
    let mut nvic = cp.NVIC;

    let mut flash = dp.FLASH;
    let mut rcc = dp.RCC.configure().sysclk(48.mhz()).freeze(&mut flash);
    let gpioa = dp.GPIOA.split(&mut rcc);
    let gpiob = dp.GPIOB.split(&mut rcc);

    // A library requiring a critical section to set a gpio AF register is bad and I just won't.
    let fake_cs = unsafe { cortex_m::interrupt::CriticalSection::new() };

    // Initialize touch pins
    let _pa0 = gpioa.pa0.into_alternate_af3(&fake_cs);
    let _pa4 = gpioa.pa4.into_alternate_af3(&fake_cs);
    let _pb0 = gpiob.pb0.into_alternate_af3(&fake_cs);
    let _pb11 = gpiob.pb11.into_alternate_af3(&fake_cs);
    let _pb13 = gpiob.pb13.into_alternate_af3(&fake_cs);
    let _pa5 = gpioa.pa5.into_alternate_af3(&fake_cs);
    let _pb1 = gpiob.pb1.into_alternate_af3(&fake_cs);
    let _g1_cap = gpioa.pa1.into_alternate_af3(&fake_cs);
    let _g2_cap = gpioa.pa6.into_alternate_af3(&fake_cs);
    let _g3_cap = gpiob.pb2.into_alternate_af3(&fake_cs);
    let _g6_cap = gpiob.pb12.into_alternate_af3(&fake_cs);

    let tx_pin = gpiob.pb6.into_alternate_af0(&fake_cs);
    let rx_pin = gpiob.pb7.into_alternate_af0(&fake_cs);
    let uart = hal::serial::Serial::usart1(dp.USART1, (tx_pin, rx_pin), 115200.bps(), &mut rcc);
    serial::uart1::init(uart, 4);
    logger::init(log::LevelFilter::Info);

    let mut syst = hal::timers::Timer::syst(cp.SYST, 1000.hz(), &mut rcc);
    syst.listen(&hal::timers::Event::TimeOut);

    let tsc = TscSensor::new(dp.TSC, &mut rcc, &profile::ELECTRODES, &profile::BATCHES);
    let poll_timer = PollTimer::new(dp.TIM2, &mut rcc);

    unsafe {
        nvic.set_priority(pac::Interrupt::TIM2, 3);
        cortex_m::peripheral::NVIC::unmask(pac::Interrupt::TIM2);
    }

    let mut slider: Slider = match TouchSlider::new(
        &profile::SLIDER_PINS,
        SLIDER_SENSITIVITY,
        profile::PINS,
        tsc,
        poll_timer,
        &FILTERED,
        Some(SLIDER_CONFIG),
    ) {
        Ok(slider) => slider,
        Err(err) => {
            log::error!("Touch slider setup failed: {}", err);
            loop {
                cortex_m::asm::wfi();
            }
        }
    };
    for pin in profile::BUTTON_PINS {
        // Failures are logged by add_button
        let _ = slider.add_button(pin, BUTTON_SENSITIVITY);
    }

    slider.start();
    settle(&mut slider, SETTLE_MS);
    slider.calibrate();

    loop {
        let now = TIME.load(Ordering::Relaxed);
        slider.sensor_mut().poll(now, &FILTERED);

        if !PollTimer::take_tick() {
            continue;
        }
        slider.update();

        let swipe = slider.take_swipe_status();
        if swipe != 0 {
            log::info!("Slider position {} swipe {}", slider.position(), swipe);
        }
        let fine = slider.take_swipe_status_fine();
        if fine != 0 {
            log::info!("Fine swipe {}", fine);
        }
        if let Some(pin) = slider.take_button_short_press() {
            if pin == profile::CALIBRATE_PIN {
                log::info!("Recalibrating");
                slider.stop();
                slider.resume();
                settle(&mut slider, SETTLE_MS);
                slider.calibrate();
            } else {
                log::info!("Button {} pressed", pin.0);
            }
        }
    }
}

#[exception]
fn SysTick() {
    let time = TIME.load(Ordering::Relaxed);
    TIME.store(time.wrapping_add(1), Ordering::Relaxed);
}
