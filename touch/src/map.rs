//! Mapping from board pins to sensing channels.

use crate::{ChannelId, Pin};

/// Lookup of the sensing channel behind a pin, `None` if the pin cannot sense
/// touch
pub trait ChannelMap {
    fn channel(&self, pin: Pin) -> Option<ChannelId>;
}

impl<F> ChannelMap for F
where
    F: Fn(Pin) -> Option<ChannelId>,
{
    fn channel(&self, pin: Pin) -> Option<ChannelId> {
        self(pin)
    }
}

/// A fixed table of pin and channel pairs
#[derive(Clone, Copy, Debug)]
pub struct PinTable<'a>(pub &'a [(Pin, ChannelId)]);

impl ChannelMap for PinTable<'_> {
    fn channel(&self, pin: Pin) -> Option<ChannelId> {
        self.0.iter().find(|(p, _)| *p == pin).map(|(_, ch)| *ch)
    }
}

/// Number of touch channels on the ESP32
pub const ESP32_TOUCH_CHANNELS: usize = 10;

/// GPIO to touch pad map of the ESP32
pub const ESP32_TOUCH_PINS: PinTable<'static> = PinTable(&[
    (Pin(4), ChannelId(0)),
    (Pin(0), ChannelId(1)),
    (Pin(2), ChannelId(2)),
    (Pin(15), ChannelId(3)),
    (Pin(13), ChannelId(4)),
    (Pin(12), ChannelId(5)),
    (Pin(14), ChannelId(6)),
    (Pin(27), ChannelId(7)),
    (Pin(33), ChannelId(8)),
    (Pin(32), ChannelId(9)),
]);

/// Number of touch channels on the ESP32-S2 and ESP32-S3. Channel 0 is
/// internal and has no pin.
pub const ESP32S2_TOUCH_CHANNELS: usize = 15;

/// GPIO to touch pad map of the ESP32-S2 and ESP32-S3
pub const ESP32S2_TOUCH_PINS: PinTable<'static> = PinTable(&[
    (Pin(1), ChannelId(1)),
    (Pin(2), ChannelId(2)),
    (Pin(3), ChannelId(3)),
    (Pin(4), ChannelId(4)),
    (Pin(5), ChannelId(5)),
    (Pin(6), ChannelId(6)),
    (Pin(7), ChannelId(7)),
    (Pin(8), ChannelId(8)),
    (Pin(9), ChannelId(9)),
    (Pin(10), ChannelId(10)),
    (Pin(11), ChannelId(11)),
    (Pin(12), ChannelId(12)),
    (Pin(13), ChannelId(13)),
    (Pin(14), ChannelId(14)),
]);

#[cfg(test)]
pub mod test {
    use super::*;
    use crate::channel::{ChannelPool, FilteredTable, Owner};

    #[test]
    fn test_pin_table() {
        assert_eq!(ESP32_TOUCH_PINS.channel(Pin(4)), Some(ChannelId(0)));
        assert_eq!(ESP32_TOUCH_PINS.channel(Pin(32)), Some(ChannelId(9)));
        assert_eq!(ESP32_TOUCH_PINS.channel(Pin(5)), None);
        assert_eq!(ESP32S2_TOUCH_PINS.channel(Pin(0)), None);
        assert_eq!(ESP32S2_TOUCH_PINS.channel(Pin(14)), Some(ChannelId(14)));
    }

    fn assert_fits<const CH: usize>(table: PinTable<'_>) {
        let filtered = FilteredTable::<CH>::new();
        let mut pool = ChannelPool::new(&filtered);
        for (pin, ch) in table.0 {
            assert!(ch.index() < CH, "Pin {} maps outside of the pool", pin.0);
            assert_eq!(table.channel(*pin), Some(*ch));
            pool.bind(*ch, Owner::Button, 80).unwrap();
        }
    }

    #[test]
    fn test_profiles_fit_pool() {
        assert_fits::<ESP32_TOUCH_CHANNELS>(ESP32_TOUCH_PINS);
        assert_fits::<ESP32S2_TOUCH_CHANNELS>(ESP32S2_TOUCH_PINS);
        assert_eq!(ESP32_TOUCH_PINS.0.len(), ESP32_TOUCH_CHANNELS);
    }

    #[test]
    fn test_closure_map() {
        let map = |pin: Pin| (pin.0 < 3).then_some(ChannelId(pin.0 * 2));
        assert_eq!(map.channel(Pin(2)), Some(ChannelId(4)));
        assert_eq!(map.channel(Pin(3)), None);
    }
}
