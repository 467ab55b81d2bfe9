//! Per-channel state of the sensing peripheral.
//!
//! [`FilteredTable`] is the only state shared with the peripheral: its filter
//! callback stores whole per-channel values, and the poll cycle loads them.
//! Both sides use single-element atomic loads and stores, so no lock is
//! needed and no cross-channel consistency is assumed.
//!
//! [`ChannelPool`] is owned by one controller. It tags each channel with its
//! owner, and holds the calibrated thresholds and the last touch decision.

use core::sync::atomic::{AtomicBool, AtomicU16, Ordering};

use crate::{ChannelId, Error};

pub struct FilteredTable<const CH: usize> {
    values: [AtomicU16; CH],
    enabled: [AtomicBool; CH],
}

impl<const CH: usize> FilteredTable<CH> {
    #[allow(clippy::declare_interior_mutable_const)]
    pub const fn new() -> Self {
        const ZERO: AtomicU16 = AtomicU16::new(0);
        const OFF: AtomicBool = AtomicBool::new(false);
        Self {
            values: [ZERO; CH],
            enabled: [OFF; CH],
        }
    }

    /// Latest filtered value of a channel, 0 for unknown channels
    pub fn value(&self, ch: ChannelId) -> u16 {
        self.values
            .get(ch.index())
            .map(|v| v.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    pub fn store(&self, ch: ChannelId, value: u16) {
        if let Some(v) = self.values.get(ch.index()) {
            v.store(value, Ordering::Relaxed);
        }
    }

    pub fn is_enabled(&self, ch: ChannelId) -> bool {
        self.enabled
            .get(ch.index())
            .map(|e| e.load(Ordering::Relaxed))
            .unwrap_or(false)
    }

    pub(crate) fn set_enabled(&self, ch: ChannelId, enabled: bool) {
        if let Some(e) = self.enabled.get(ch.index()) {
            e.store(enabled, Ordering::Relaxed);
        }
    }

    /// Filter output hook for the sensing peripheral
    ///
    /// `filtered` is indexed by channel id. Values of channels which are not
    /// bound to a pad or button are ignored, as is anything beyond `CH`.
    pub fn on_filtered(&self, _raw: &[u16], filtered: &[u16]) {
        for (i, value) in filtered.iter().take(CH).enumerate() {
            if self.enabled[i].load(Ordering::Relaxed) {
                self.values[i].store(*value, Ordering::Relaxed);
            }
        }
    }

    /// The filter hook as a closure over this table, for peripheral drivers
    /// which take a callback
    pub fn callback(&self) -> impl Fn(&[u16], &[u16]) + '_ {
        move |raw, filtered| self.on_filtered(raw, filtered)
    }
}

impl<const CH: usize> Default for FilteredTable<CH> {
    fn default() -> Self {
        Self::new()
    }
}

/// What a channel is used for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Owner {
    Unused,
    /// Pad of the slider, at the given position from the bottom
    Slider(u8),
    Button,
}

#[derive(Clone, Copy, Debug)]
pub struct Channel {
    pub owner: Owner,
    /// (0-100) Percentage of the untouched value below which the channel is
    /// touched. Higher is more sensitive.
    pub threshold_percent: u8,
    /// Absolute threshold, valid after calibration
    pub threshold: u16,
    pub touched: bool,
}

impl Channel {
    const fn unused() -> Self {
        Self {
            owner: Owner::Unused,
            threshold_percent: 0,
            threshold: 0,
            touched: false,
        }
    }

    pub fn enabled(&self) -> bool {
        self.owner != Owner::Unused
    }
}

pub struct ChannelPool<'a, const CH: usize> {
    channels: [Channel; CH],
    filtered: &'a FilteredTable<CH>,
}

impl<'a, const CH: usize> ChannelPool<'a, CH> {
    pub fn new(filtered: &'a FilteredTable<CH>) -> Self {
        Self {
            channels: [Channel::unused(); CH],
            filtered,
        }
    }

    pub fn contains(&self, ch: ChannelId) -> bool {
        ch.index() < CH
    }

    pub fn get(&self, ch: ChannelId) -> Option<&Channel> {
        self.channels.get(ch.index())
    }

    pub fn owner(&self, ch: ChannelId) -> Owner {
        self.get(ch).map(|c| c.owner).unwrap_or(Owner::Unused)
    }

    pub fn touched(&self, ch: ChannelId) -> bool {
        self.get(ch).map(|c| c.touched).unwrap_or(false)
    }

    pub fn threshold(&self, ch: ChannelId) -> u16 {
        self.get(ch).map(|c| c.threshold).unwrap_or(0)
    }

    pub fn filtered_value(&self, ch: ChannelId) -> u16 {
        self.filtered.value(ch)
    }

    /// Claim a channel. The threshold stays at 0 (never touched) until the
    /// next calibration.
    ///
    /// A channel enabled in the filtered table belongs to a pool, this one or
    /// another sharing the table, and cannot be claimed again.
    pub fn bind(&mut self, ch: ChannelId, owner: Owner, threshold_percent: u8) -> Result<(), Error> {
        let channel = self
            .channels
            .get_mut(ch.index())
            .ok_or(Error::UnknownChannel(ch))?;
        if channel.enabled() || self.filtered.is_enabled(ch) {
            return Err(Error::ChannelInUse(ch));
        }

        *channel = Channel {
            owner,
            threshold_percent: threshold_percent.min(100),
            threshold: 0,
            touched: false,
        };
        self.filtered.set_enabled(ch, true);
        Ok(())
    }

    /// Return a channel to the pool. Channels this pool does not own are left
    /// alone.
    pub fn release(&mut self, ch: ChannelId) {
        if let Some(channel) = self.channels.get_mut(ch.index()) {
            if channel.enabled() {
                *channel = Channel::unused();
                self.filtered.set_enabled(ch, false);
            }
        }
    }

    /// Release every channel owned by this pool
    pub fn release_all(&mut self) {
        for i in 0..CH {
            self.release(ChannelId(i as u8));
        }
    }

    /// Ids of all channels bound to a pad or button
    pub fn bound(&self) -> impl Iterator<Item = ChannelId> + '_ {
        self.channels
            .iter()
            .enumerate()
            .filter(|(_, c)| c.enabled())
            .map(|(i, _)| ChannelId(i as u8))
    }

    /// Derive the threshold of every bound channel from its current filtered
    /// value. The pads must not be touched while this runs.
    pub fn calibrate(&mut self) {
        for (i, channel) in self.channels.iter_mut().enumerate() {
            if !channel.enabled() {
                continue;
            }
            let ch = ChannelId(i as u8);
            let value = self.filtered.value(ch);
            if channel.touched {
                log::warn!("T{}: calibrating while touched, baseline {} includes the touch", i, value);
            }
            channel.threshold = (value as u32 * channel.threshold_percent as u32 / 100) as u16;
            log::info!("T{}: {} - Threshold: {}", i, value, channel.threshold);
        }
    }

    /// Update the touch decision of every bound channel. A touch lowers the
    /// filtered value, so below threshold means touched.
    pub fn classify(&mut self) {
        for (i, channel) in self.channels.iter_mut().enumerate() {
            if channel.enabled() {
                channel.touched = self.filtered.value(ChannelId(i as u8)) < channel.threshold;
            }
        }
    }
}

impl<const CH: usize> Drop for ChannelPool<'_, CH> {
    fn drop(&mut self) {
        self.release_all();
    }
}

#[cfg(test)]
pub mod test {
    use super::*;

    #[test]
    fn test_calibrate_truncates() {
        let table = FilteredTable::<4>::new();
        let mut pool = ChannelPool::new(&table);
        pool.bind(ChannelId(1), Owner::Button, 85).unwrap();
        pool.bind(ChannelId(2), Owner::Slider(0), 90).unwrap();

        table.store(ChannelId(1), 999);
        table.store(ChannelId(2), 1000);
        pool.calibrate();

        assert_eq!(pool.threshold(ChannelId(1)), 849);
        assert_eq!(pool.threshold(ChannelId(2)), 900);
        assert_eq!(pool.threshold(ChannelId(0)), 0, "Unbound channel was calibrated");
    }

    #[test]
    fn test_classify_below_threshold() {
        let table = FilteredTable::<2>::new();
        let mut pool = ChannelPool::new(&table);
        pool.bind(ChannelId(0), Owner::Slider(0), 80).unwrap();
        table.store(ChannelId(0), 1000);
        pool.calibrate();

        table.store(ChannelId(0), 800);
        pool.classify();
        assert!(!pool.touched(ChannelId(0)), "Touched at exactly the threshold");

        table.store(ChannelId(0), 799);
        pool.classify();
        assert!(pool.touched(ChannelId(0)));

        table.store(ChannelId(0), 1200);
        pool.classify();
        assert!(!pool.touched(ChannelId(0)));
    }

    #[test]
    fn test_uncalibrated_never_touched() {
        let table = FilteredTable::<1>::new();
        let mut pool = ChannelPool::new(&table);
        pool.bind(ChannelId(0), Owner::Button, 80).unwrap();
        table.store(ChannelId(0), 0);
        pool.classify();
        assert!(!pool.touched(ChannelId(0)));
    }

    #[test]
    fn test_bind_exclusive() {
        let table = FilteredTable::<3>::new();
        let mut pool = ChannelPool::new(&table);
        assert_eq!(pool.bind(ChannelId(1), Owner::Slider(0), 80), Ok(()));
        assert_eq!(
            pool.bind(ChannelId(1), Owner::Button, 80),
            Err(Error::ChannelInUse(ChannelId(1)))
        );
        assert_eq!(pool.owner(ChannelId(1)), Owner::Slider(0));
        assert_eq!(
            pool.bind(ChannelId(3), Owner::Button, 80),
            Err(Error::UnknownChannel(ChannelId(3)))
        );

        pool.release(ChannelId(1));
        assert_eq!(pool.owner(ChannelId(1)), Owner::Unused);
        assert!(!table.is_enabled(ChannelId(1)));
        assert_eq!(pool.bind(ChannelId(1), Owner::Button, 80), Ok(()));
    }

    #[test]
    fn test_pools_share_table() {
        let table = FilteredTable::<4>::new();
        let mut a = ChannelPool::new(&table);
        let mut b = ChannelPool::new(&table);
        a.bind(ChannelId(0), Owner::Slider(0), 80).unwrap();
        a.bind(ChannelId(1), Owner::Slider(1), 80).unwrap();

        assert_eq!(
            b.bind(ChannelId(0), Owner::Button, 80),
            Err(Error::ChannelInUse(ChannelId(0)))
        );
        assert_eq!(b.owner(ChannelId(0)), Owner::Unused);
        assert_eq!(b.bind(ChannelId(2), Owner::Button, 80), Ok(()));

        b.release_all();
        assert!(table.is_enabled(ChannelId(0)), "Released a channel of another pool");
        assert!(table.is_enabled(ChannelId(1)), "Released a channel of another pool");
        assert!(!table.is_enabled(ChannelId(2)));

        drop(a);
        assert!(!table.is_enabled(ChannelId(0)));
        assert_eq!(b.bind(ChannelId(0), Owner::Button, 80), Ok(()));
    }

    #[test]
    fn test_calibrate_while_touched() {
        let table = FilteredTable::<1>::new();
        let mut pool = ChannelPool::new(&table);
        pool.bind(ChannelId(0), Owner::Button, 80).unwrap();
        table.store(ChannelId(0), 1000);
        pool.calibrate();

        table.store(ChannelId(0), 500);
        pool.classify();
        assert!(pool.touched(ChannelId(0)));

        // The touched reading becomes the baseline
        pool.calibrate();
        assert_eq!(pool.threshold(ChannelId(0)), 400);
        pool.classify();
        assert!(!pool.touched(ChannelId(0)));
    }

    #[test]
    fn test_percent_clamped() {
        let table = FilteredTable::<1>::new();
        let mut pool = ChannelPool::new(&table);
        pool.bind(ChannelId(0), Owner::Button, 250).unwrap();
        assert_eq!(pool.get(ChannelId(0)).unwrap().threshold_percent, 100);
    }

    #[test]
    fn test_callback_skips_disabled() {
        let table = FilteredTable::<3>::new();
        let mut pool = ChannelPool::new(&table);
        pool.bind(ChannelId(0), Owner::Button, 80).unwrap();
        pool.bind(ChannelId(2), Owner::Button, 80).unwrap();

        let cb = table.callback();
        cb(&[0; 4], &[10, 20, 30, 40]);

        assert_eq!(table.value(ChannelId(0)), 10);
        assert_eq!(table.value(ChannelId(1)), 0);
        assert_eq!(table.value(ChannelId(2)), 30);
        assert_eq!(pool.bound().count(), 2);
    }
}
