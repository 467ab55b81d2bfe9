#![cfg_attr(not(test), no_std)]

//! Capacitive touch slider and touch button decoding.
//!
//! A linear array of pads is turned into a coarse position and swipe events,
//! and a separate set of pads sharing the same sensing peripheral is turned
//! into debounced short-press events. The sensing peripheral, the periodic
//! scheduler and the pin-to-channel map are supplied by the caller through
//! the traits in [`hal`] and [`map`].

pub mod button;
pub mod channel;
pub mod diag;
pub mod hal;
pub mod linear;
pub mod map;
pub mod slider;

pub use channel::{ChannelPool, FilteredTable};
pub use map::{ChannelMap, PinTable};
pub use slider::TouchSlider;

/// Maximum number of pads in a slider
pub const MAX_SLIDER_PADS: usize = 10;

/// External pin identity, as known to the board (e.g. a GPIO number)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Pin(pub u8);

/// Internal sensing channel id, an index into the channel pool
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChannelId(pub u8);

impl ChannelId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Per-cycle classification of slider movement
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwipeState {
    NoChange,
    SwipeUp,
    SwipeDown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// The pin does not map to a sensing channel
    InvalidPin(Pin),
    /// The pin is already registered as a button
    DuplicateButton(Pin),
    /// The pin is already registered as a slider pad
    SliderPin(Pin),
    /// The channel is already bound to a pad or button
    ChannelInUse(ChannelId),
    /// The channel map returned an id outside of the channel pool
    UnknownChannel(ChannelId),
    /// No more channels available for buttons
    CapacityExhausted,
    /// The pin is not registered as a button
    NotRegistered(Pin),
    /// A slider needs at least one pad
    NoSliderPads,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::InvalidPin(pin) => write!(f, "GPIO pin {} is not a valid touch pad", pin.0),
            Error::DuplicateButton(pin) => {
                write!(f, "button {} is already in the list of touch buttons", pin.0)
            }
            Error::SliderPin(pin) => write!(f, "button {} is already in the list of sliders", pin.0),
            Error::ChannelInUse(ch) => write!(f, "touch channel {} is already bound", ch.0),
            Error::UnknownChannel(ch) => write!(f, "touch channel {} is out of range", ch.0),
            Error::CapacityExhausted => write!(f, "no touch channels left for buttons"),
            Error::NotRegistered(pin) => {
                write!(f, "button {} is not in the list of touch buttons", pin.0)
            }
            Error::NoSliderPads => write!(f, "slider has no pads"),
        }
    }
}

/// Configuration for a touch slider and its buttons
#[derive(Clone, Copy, Debug)]
pub struct SliderConfig {
    /// Period of the poll cycle, in ms
    pub update_interval_ms: u32,
    /// Period of the peripheral's filter, in ms
    pub filter_period_ms: u32,
    /// Calibrate thresholds in `start()`. No pad may be touched at that point.
    pub calibrate_on_start: bool,
    /// Track fine swipes (first touch on an end pad, then release)
    pub swipe_fine: bool,
    /// Run the button debouncer. Switched on by adding a button.
    pub touch_buttons: bool,
    /// Log swipe events
    pub print_swipe_status: bool,
    /// Log the touched array of the slider when it changes
    pub print_slider_touched: bool,
    /// Log the touched array of the buttons and short presses
    pub print_button_touched: bool,
}

impl SliderConfig {
    const fn default() -> Self {
        Self {
            update_interval_ms: 50,
            filter_period_ms: 10,
            calibrate_on_start: true,
            swipe_fine: true,
            touch_buttons: false,
            print_swipe_status: true,
            print_slider_touched: true,
            print_button_touched: false,
        }
    }
}

pub const DEFAULT_SLIDER_CONFIG: SliderConfig = SliderConfig::default();
