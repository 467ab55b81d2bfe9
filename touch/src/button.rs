use heapless::Vec;

use crate::channel::ChannelPool;
use crate::{ChannelId, Error, Pin};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TouchButton {
    pub pin: Pin,
    pub channel: ChannelId,
    pub touched: bool,
}

/// What a single poll cycle did to the buttons
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ButtonSample {
    /// Number of buttons touched in this cycle
    pub active: usize,
    /// A single button was newly armed in this cycle
    pub armed: Option<Pin>,
    /// A short press completed in this cycle
    pub pressed: Option<Pin>,
}

/// Short-press detection over a set of touch buttons
///
/// A short press is one button touched on its own and then released, with no
/// other button touched in between. Touching two or more buttons at once
/// cancels the sequence until every button is released.
pub struct Buttons<const CAP: usize> {
    buttons: Vec<TouchButton, CAP>,
    capacity: usize,
    armed: Option<Pin>,
    cancelled: bool,
    pending: Option<Pin>,
}

impl<const CAP: usize> Buttons<CAP> {
    /// `capacity` limits the number of buttons below `CAP`
    pub fn new(capacity: usize) -> Self {
        Self {
            buttons: Vec::new(),
            capacity: capacity.min(CAP),
            armed: None,
            cancelled: false,
            pending: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.buttons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buttons.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TouchButton> {
        self.buttons.iter()
    }

    pub fn find(&self, pin: Pin) -> Option<&TouchButton> {
        self.buttons.iter().find(|b| b.pin == pin)
    }

    pub fn armed(&self) -> Option<Pin> {
        self.armed
    }

    pub fn insert(&mut self, pin: Pin, channel: ChannelId) -> Result<(), Error> {
        if self.buttons.len() >= self.capacity {
            return Err(Error::CapacityExhausted);
        }
        if self.find(pin).is_some() {
            return Err(Error::DuplicateButton(pin));
        }
        self.buttons
            .push(TouchButton { pin, channel, touched: false })
            .map_err(|_| Error::CapacityExhausted)
    }

    /// Remove a button, keeping the order of the others. Any armed or
    /// unread short press of this button is dropped.
    pub fn remove(&mut self, pin: Pin) -> Option<TouchButton> {
        let index = self.buttons.iter().position(|b| b.pin == pin)?;
        if self.armed == Some(pin) {
            self.armed = None;
        }
        if self.pending == Some(pin) {
            self.pending = None;
        }
        Some(self.buttons.remove(index))
    }

    /// Process the touch decisions of one poll cycle
    pub fn update<const CH: usize>(&mut self, pool: &ChannelPool<'_, CH>) -> ButtonSample {
        let mut active = 0;
        let mut last = None;
        for button in self.buttons.iter_mut() {
            button.touched = pool.touched(button.channel);
            if button.touched {
                active += 1;
                last = Some(button.pin);
            }
        }

        let mut sample = ButtonSample { active, armed: None, pressed: None };
        match (active, last) {
            (0, _) => {
                if let Some(pin) = self.armed.take() {
                    self.pending = Some(pin);
                    sample.pressed = Some(pin);
                }
                self.cancelled = false;
            }
            (1, Some(pin)) if !self.cancelled => {
                if self.armed != Some(pin) {
                    sample.armed = Some(pin);
                }
                self.armed = Some(pin);
            }
            (1, _) => (),
            _ => {
                self.armed = None;
                self.cancelled = true;
            }
        }
        sample
    }

    /// The last completed short press, if not read yet. Reading clears it.
    pub fn take_short_press(&mut self) -> Option<Pin> {
        self.pending.take()
    }
}

#[cfg(test)]
pub mod test {
    use super::*;
    use crate::channel::{FilteredTable, Owner};

    const BASELINE: u16 = 1000;
    const TOUCH: u16 = 500;

    fn setup(table: &FilteredTable<4>) -> (ChannelPool<'_, 4>, Buttons<4>) {
        let mut pool = ChannelPool::new(table);
        let mut buttons = Buttons::new(4);
        for i in 0..3u8 {
            pool.bind(ChannelId(i), Owner::Button, 80).unwrap();
            buttons.insert(Pin(10 + i), ChannelId(i)).unwrap();
            table.store(ChannelId(i), BASELINE);
        }
        pool.calibrate();
        (pool, buttons)
    }

    fn cycle(
        table: &FilteredTable<4>,
        pool: &mut ChannelPool<'_, 4>,
        buttons: &mut Buttons<4>,
        touched: [bool; 3],
    ) -> ButtonSample {
        for (i, t) in touched.iter().enumerate() {
            table.store(ChannelId(i as u8), if *t { TOUCH } else { BASELINE });
        }
        pool.classify();
        buttons.update(pool)
    }

    #[test]
    fn test_short_press() {
        let table = FilteredTable::new();
        let (mut pool, mut buttons) = setup(&table);

        let s = cycle(&table, &mut pool, &mut buttons, [false, true, false]);
        assert_eq!(s.armed, Some(Pin(11)));
        assert_eq!(s.pressed, None);

        let s = cycle(&table, &mut pool, &mut buttons, [false, true, false]);
        assert_eq!(s.armed, None, "Re-armed while held");
        assert_eq!(buttons.take_short_press(), None, "Fired before release");

        let s = cycle(&table, &mut pool, &mut buttons, [false, false, false]);
        assert_eq!(s.pressed, Some(Pin(11)));
        assert_eq!(buttons.take_short_press(), Some(Pin(11)));
        assert_eq!(buttons.take_short_press(), None, "Short press was not consumed");

        cycle(&table, &mut pool, &mut buttons, [false, false, false]);
        assert_eq!(buttons.take_short_press(), None);
    }

    #[test]
    fn test_multi_touch_cancels() {
        let table = FilteredTable::new();
        let (mut pool, mut buttons) = setup(&table);

        cycle(&table, &mut pool, &mut buttons, [true, false, false]);
        let s = cycle(&table, &mut pool, &mut buttons, [true, false, true]);
        assert_eq!(s.active, 2);
        assert_eq!(buttons.armed(), None);
        cycle(&table, &mut pool, &mut buttons, [true, false, false]);
        assert_eq!(buttons.armed(), None, "Re-armed before a full release");
        let s = cycle(&table, &mut pool, &mut buttons, [false, false, false]);
        assert_eq!(s.pressed, None);
        assert_eq!(buttons.take_short_press(), None);

        // After a full release the next isolated touch counts again
        cycle(&table, &mut pool, &mut buttons, [false, false, true]);
        cycle(&table, &mut pool, &mut buttons, [false, false, false]);
        assert_eq!(buttons.take_short_press(), Some(Pin(12)));

        cycle(&table, &mut pool, &mut buttons, [true, false, false]);
        cycle(&table, &mut pool, &mut buttons, [true, true, true]);
        cycle(&table, &mut pool, &mut buttons, [false, false, false]);
        assert_eq!(buttons.take_short_press(), None);
    }

    #[test]
    fn test_hand_over_to_other_button() {
        let table = FilteredTable::new();
        let (mut pool, mut buttons) = setup(&table);

        cycle(&table, &mut pool, &mut buttons, [true, false, false]);
        let s = cycle(&table, &mut pool, &mut buttons, [false, true, false]);
        assert_eq!(s.pressed, None);
        assert_eq!(s.armed, Some(Pin(11)));
        cycle(&table, &mut pool, &mut buttons, [false, false, false]);
        assert_eq!(buttons.take_short_press(), Some(Pin(11)));
    }

    #[test]
    fn test_insert_rejects() {
        let mut buttons = Buttons::<4>::new(2);
        assert_eq!(buttons.insert(Pin(1), ChannelId(0)), Ok(()));
        assert_eq!(buttons.insert(Pin(1), ChannelId(1)), Err(Error::DuplicateButton(Pin(1))));
        assert_eq!(buttons.insert(Pin(2), ChannelId(1)), Ok(()));
        assert_eq!(buttons.insert(Pin(3), ChannelId(2)), Err(Error::CapacityExhausted));
        assert_eq!(buttons.len(), 2);
    }

    #[test]
    fn test_remove_keeps_order_and_drops_state() {
        let table = FilteredTable::new();
        let (mut pool, mut buttons) = setup(&table);

        cycle(&table, &mut pool, &mut buttons, [false, true, false]);
        assert_eq!(buttons.armed(), Some(Pin(11)));

        let removed = buttons.remove(Pin(11)).unwrap();
        assert_eq!(removed.channel, ChannelId(1));
        assert_eq!(buttons.armed(), None);
        let pins: std::vec::Vec<Pin> = buttons.iter().map(|b| b.pin).collect();
        assert_eq!(pins, [Pin(10), Pin(12)]);
        assert_eq!(buttons.remove(Pin(11)), None);
    }
}
