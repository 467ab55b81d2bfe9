//! Touch electrodes of the speedway controller board.
//!
//! Pins are numbered as on the port: PAn is `Pin(n)`, PBn is `Pin(16 + n)`.
//! Channel ids index [`ELECTRODES`].

use touch_slider::{ChannelId, Pin, PinTable};

use crate::sensor::TscSample;

/// Size of the channel pool
pub const CHANNELS: usize = 7;

pub const fn pa(n: u8) -> Pin {
    Pin(n)
}

pub const fn pb(n: u8) -> Pin {
    Pin(16 + n)
}

pub static ELECTRODES: [TscSample; CHANNELS] = [
    TscSample { group: 1, sample: 2, channel: 1 }, // PA0
    TscSample { group: 2, sample: 3, channel: 1 }, // PA4
    TscSample { group: 3, sample: 4, channel: 2 }, // PB0
    TscSample { group: 6, sample: 2, channel: 1 }, // PB11
    TscSample { group: 6, sample: 2, channel: 3 }, // PB13
    TscSample { group: 2, sample: 3, channel: 2 }, // PA5
    TscSample { group: 3, sample: 4, channel: 3 }, // PB1
];

/// Electrodes acquired together, at most one per group
pub static BATCHES: [&[usize]; 2] = [&[0, 1, 2, 3], &[4, 5, 6]];

pub const PINS: PinTable<'static> = PinTable(&[
    (pa(0), ChannelId(0)),
    (pa(4), ChannelId(1)),
    (pb(0), ChannelId(2)),
    (pb(11), ChannelId(3)),
    (pb(13), ChannelId(4)),
    (pa(5), ChannelId(5)),
    (pb(1), ChannelId(6)),
]);

/// Slider pads, bottom to top
pub const SLIDER_PINS: [Pin; 3] = [pb(13), pa(5), pb(1)];

pub const BUTTON_PINS: [Pin; 4] = [pa(0), pa(4), pb(0), pb(11)];

/// Short press on this button recalibrates all pads
pub const CALIBRATE_PIN: Pin = pb(11);
