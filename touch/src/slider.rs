//! The touch slider controller: a linear slider plus optional touch buttons
//! sharing one sensing peripheral.
//!
//! The controller owns its channel pool, so channel assignments are checked
//! when pads and buttons are bound. Its owner calls [`TouchSlider::update`]
//! on every scheduler tick and reads events with the `take_*` methods, which
//! consume what they return.

use heapless::Vec;

use crate::button::{ButtonSample, Buttons};
use crate::channel::{ChannelPool, FilteredTable, Owner};
use crate::diag::{Flags, Values};
use crate::hal::{Scheduler, Sensor};
use crate::linear::{LinearSample, LinearSlider};
use crate::map::ChannelMap;
use crate::{
    ChannelId, Error, Pin, SliderConfig, SwipeState, DEFAULT_SLIDER_CONFIG, MAX_SLIDER_PADS,
};

#[derive(Clone, Copy, Debug)]
struct Pad {
    pin: Pin,
    channel: ChannelId,
}

pub struct TouchSlider<'a, M, S, T, const CH: usize> {
    map: M,
    sensor: S,
    scheduler: T,
    config: SliderConfig,
    pool: ChannelPool<'a, CH>,
    pads: Vec<Pad, MAX_SLIDER_PADS>,
    touched: [bool; MAX_SLIDER_PADS],
    linear: LinearSlider,
    buttons: Buttons<CH>,
    running: bool,
}

impl<'a, M, S, T, const CH: usize> TouchSlider<'a, M, S, T, CH>
where
    M: ChannelMap,
    S: Sensor,
    T: Scheduler,
{
    /// Create a slider with the same sensitivity (0-100) for every pad
    ///
    /// `pins` are ordered from the bottom of the slider to the top. At most
    /// [`MAX_SLIDER_PADS`] are used.
    pub fn new(
        pins: &[Pin],
        sensitivity: u8,
        map: M,
        sensor: S,
        scheduler: T,
        filtered: &'a FilteredTable<CH>,
        config: Option<SliderConfig>,
    ) -> Result<Self, Error> {
        let mut pads: Vec<(Pin, u8), MAX_SLIDER_PADS> = Vec::new();
        for pin in pins.iter().take(MAX_SLIDER_PADS) {
            let _ = pads.push((*pin, sensitivity));
        }
        if pins.len() > MAX_SLIDER_PADS {
            log::warn!("Slider limited to {} of {} pins", MAX_SLIDER_PADS, pins.len());
        }
        Self::with_thresholds(&pads, map, sensor, scheduler, filtered, config)
    }

    /// Create a slider with a sensitivity (0-100) per pad
    pub fn with_thresholds(
        pads: &[(Pin, u8)],
        map: M,
        sensor: S,
        scheduler: T,
        filtered: &'a FilteredTable<CH>,
        config: Option<SliderConfig>,
    ) -> Result<Self, Error> {
        if pads.is_empty() {
            return Err(Error::NoSliderPads);
        }
        if pads.len() > MAX_SLIDER_PADS {
            log::warn!("Slider limited to {} of {} pins", MAX_SLIDER_PADS, pads.len());
        }
        let pads = &pads[..pads.len().min(MAX_SLIDER_PADS)];

        let mut slider = Self {
            map,
            sensor,
            scheduler,
            config: config.unwrap_or(DEFAULT_SLIDER_CONFIG),
            pool: ChannelPool::new(filtered),
            pads: Vec::new(),
            touched: [false; MAX_SLIDER_PADS],
            linear: LinearSlider::new(pads.len()),
            buttons: Buttons::new(CH.saturating_sub(pads.len())),
            running: false,
        };

        for (index, &(pin, sensitivity)) in pads.iter().enumerate() {
            if let Err(err) = slider.bind_pad(index, pin, sensitivity) {
                log::error!("Error: {}", err);
                for pad in slider.pads.iter() {
                    slider.pool.release(pad.channel);
                }
                return Err(err);
            }
        }

        slider.sensor.init();
        Ok(slider)
    }

    fn resolve(&self, pin: Pin) -> Result<ChannelId, Error> {
        match self.map.channel(pin) {
            Some(ch) if self.pool.contains(ch) => Ok(ch),
            _ => Err(Error::InvalidPin(pin)),
        }
    }

    fn bind_pad(&mut self, index: usize, pin: Pin, sensitivity: u8) -> Result<(), Error> {
        let channel = self.resolve(pin)?;
        self.pool.bind(channel, Owner::Slider(index as u8), sensitivity)?;
        self.pads
            .push(Pad { pin, channel })
            .map_err(|_| Error::CapacityExhausted)
    }

    /// Add a touch button with a sensitivity (0-100), and enable touch buttons
    ///
    /// A button added while running is measured right away, but stays
    /// untouched until the next [`calibrate`](Self::calibrate).
    pub fn add_button(&mut self, pin: Pin, sensitivity: u8) -> Result<(), Error> {
        self.try_add_button(pin, sensitivity)
            .inspect_err(|err| log::warn!("{}", err))
    }

    fn try_add_button(&mut self, pin: Pin, sensitivity: u8) -> Result<(), Error> {
        if self.buttons.len() >= self.buttons.capacity() {
            return Err(Error::CapacityExhausted);
        }
        if self.buttons.find(pin).is_some() {
            return Err(Error::DuplicateButton(pin));
        }
        if self.pads.iter().any(|p| p.pin == pin) {
            return Err(Error::SliderPin(pin));
        }
        let channel = self.resolve(pin)?;
        self.pool.bind(channel, Owner::Button, sensitivity)?;
        if let Err(err) = self.buttons.insert(pin, channel) {
            self.pool.release(channel);
            return Err(err);
        }

        if self.running {
            self.sensor.configure(channel);
        }
        self.config.touch_buttons = true;
        log::info!("Added button {} successfully with touch channel {}", pin.0, channel.0);
        Ok(())
    }

    /// Remove a touch button and free its channel
    pub fn remove_button(&mut self, pin: Pin) -> Result<(), Error> {
        if self.buttons.is_empty() {
            log::warn!("No touch buttons to remove");
            return Err(Error::NotRegistered(pin));
        }
        match self.buttons.remove(pin) {
            Some(button) => {
                self.pool.release(button.channel);
                self.sensor.unconfigure(button.channel);
                log::info!("Removed button {} from the list of touch buttons", pin.0);
                Ok(())
            }
            None => {
                let err = Error::NotRegistered(pin);
                log::warn!("{}", err);
                Err(err)
            }
        }
    }

    /// Configure the bound channels, start filtering and the poll tick
    ///
    /// Calibrates first if `calibrate_on_start` is set, so no pad may be
    /// touched while starting.
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        log::info!("Initializing touch slider...");

        for ch in self.pool.bound() {
            self.sensor.configure(ch);
        }
        self.sensor.filter_start(self.config.filter_period_ms);

        if self.config.calibrate_on_start {
            self.calibrate();
        }
        self.scheduler.attach(self.config.update_interval_ms);
        self.running = true;
        log::info!("Touch slider initialized!");
    }

    pub fn stop(&mut self) {
        if self.running {
            self.sensor.filter_stop();
            self.scheduler.detach();
            self.running = false;
        }
    }

    pub fn resume(&mut self) {
        if !self.running {
            self.sensor.filter_start(self.config.filter_period_ms);
            self.scheduler.attach(self.config.update_interval_ms);
            self.running = true;
        }
    }

    pub fn running(&self) -> bool {
        self.running
    }

    /// Set the threshold of every pad and button from its current value
    ///
    /// Nothing may be touched while this runs: a touched reading would
    /// become the new baseline.
    pub fn calibrate(&mut self) {
        self.pool.calibrate();
    }

    /// Run one poll cycle
    pub fn update(&mut self) {
        self.pool.classify();

        let len = self.pads.len();
        for (touched, pad) in self.touched.iter_mut().zip(self.pads.iter()) {
            *touched = self.pool.touched(pad.channel);
        }
        let sample = self.linear.push(&self.touched[..len], self.config.swipe_fine);
        self.report_slider(&sample);

        if self.config.touch_buttons {
            let sample = self.buttons.update(&self.pool);
            self.report_buttons(&sample);
        }
    }

    fn report_slider(&self, sample: &LinearSample) {
        let touched = Flags(&self.touched[..self.pads.len()]);
        if sample.first_touch {
            if self.config.print_slider_touched {
                log::info!("Slider Touched Status:{}", touched);
            }
            if self.config.print_swipe_status {
                if self.linear.first_pad_bottom() {
                    log::info!("FIRST TOUCH BOT");
                }
                if self.linear.first_pad_top() {
                    log::info!("FIRST TOUCH TOP");
                }
            }
        }

        if sample.swipe != SwipeState::NoChange && self.config.print_slider_touched {
            log::info!("Slider Touched Status:{}", touched);
        }
        if self.config.print_swipe_status {
            match sample.swipe {
                SwipeState::SwipeDown => log::info!("SWIPE DOWN"),
                SwipeState::SwipeUp => log::info!("SWIPE UP"),
                SwipeState::NoChange => (),
            }
            if sample.fine_up {
                log::info!("SWIPE FINE UP");
            }
            if sample.fine_down {
                log::info!("SWIPE FINE DOWN");
            }
        }
        log::trace!("Slider values:{} = {}", Values(self.linear.values()), self.linear.position());
    }

    fn report_buttons(&self, sample: &ButtonSample) {
        if !self.config.print_button_touched {
            return;
        }
        if sample.armed.is_some() {
            self.print_button_touched();
        }
        if let Some(pin) = sample.pressed {
            log::info!("GPIO Button Touched: {}", pin.0);
        }
    }

    /// Swipes down minus swipes up since the last call. Resets the count.
    pub fn take_swipe_status(&mut self) -> i8 {
        self.linear.take_swipe()
    }

    /// Fine swipes down minus fine swipes up since the last call. Resets the
    /// count. Always 0 while fine swipes are disabled.
    pub fn take_swipe_status_fine(&mut self) -> i8 {
        if !self.config.swipe_fine {
            log::warn!("Swipe fine is disabled, enable it with set_swipe_fine(true)");
            return 0;
        }
        self.linear.take_swipe_fine()
    }

    /// The button of the last short press, if not read yet. Reading clears
    /// it. Always `None` while touch buttons are disabled.
    pub fn take_button_short_press(&mut self) -> Option<Pin> {
        if !self.config.touch_buttons {
            log::warn!("Touch buttons are disabled, enable them with set_touch_buttons(true)");
            return None;
        }
        self.buttons.take_short_press()
    }

    /// False for pins which are not a button
    pub fn is_button_pressed(&self, pin: Pin) -> bool {
        self.buttons.find(pin).map(|b| b.touched).unwrap_or(false)
    }

    /// False for pins which are not a slider pad
    pub fn is_slider_pad_touched(&self, pin: Pin) -> bool {
        self.pads
            .iter()
            .position(|p| p.pin == pin)
            .map(|i| self.touched[i])
            .unwrap_or(false)
    }

    /// Copy the touched flags of the pads, bottom first, into `out`
    ///
    /// Returns the number of flags copied.
    pub fn slider_touched(&self, out: &mut [bool]) -> usize {
        let n = out.len().min(self.pads.len());
        out[..n].copy_from_slice(&self.touched[..n]);
        n
    }

    pub fn position(&self) -> i16 {
        self.linear.position()
    }

    /// Per-pad displacement (-1, 0 or 1) of the last cycle
    pub fn slider_values(&self) -> &[i8] {
        self.linear.values()
    }

    /// Classification of the last cycle
    pub fn swipe_state(&self) -> SwipeState {
        self.linear.state()
    }

    pub fn pad_count(&self) -> usize {
        self.pads.len()
    }

    pub fn button_count(&self) -> usize {
        self.buttons.len()
    }

    pub fn button_capacity(&self) -> usize {
        self.buttons.capacity()
    }

    pub fn config(&self) -> &SliderConfig {
        &self.config
    }

    pub fn set_swipe_fine(&mut self, enabled: bool) {
        self.config.swipe_fine = enabled;
    }

    pub fn set_touch_buttons(&mut self, enabled: bool) {
        self.config.touch_buttons = enabled;
    }

    pub fn set_print_swipe_status(&mut self, enabled: bool) {
        self.config.print_swipe_status = enabled;
    }

    pub fn set_print_slider_touched(&mut self, enabled: bool) {
        self.config.print_slider_touched = enabled;
    }

    pub fn set_print_button_touched(&mut self, enabled: bool) {
        self.config.print_button_touched = enabled;
    }

    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }

    pub fn scheduler(&self) -> &T {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut T {
        &mut self.scheduler
    }

    pub fn print_button_touched(&self) {
        let mut touched: Vec<bool, CH> = Vec::new();
        for button in self.buttons.iter() {
            let _ = touched.push(button.touched);
        }
        log::info!("Button Touched Status:{}", Flags(&touched));
    }

    pub fn print_slider_touched(&self) {
        log::info!("Slider Touched Status:{}", Flags(&self.touched[..self.pads.len()]));
    }

    pub fn print_slider_values(&self) {
        log::info!("Slider values:{}", Values(self.linear.values()));
    }

    pub fn print_slider_filtered_values(&self) {
        let mut values: Vec<u16, MAX_SLIDER_PADS> = Vec::new();
        for pad in self.pads.iter() {
            let _ = values.push(self.pool.filtered_value(pad.channel));
        }
        log::info!("Slider Touched Status (Using Pad Values):{}", Values(&values));
    }
}
