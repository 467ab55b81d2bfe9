//! Collaborators of the touch slider which depend on the target hardware.

use crate::ChannelId;

/// Capacitive sensing peripheral
///
/// The peripheral measures every configured channel and publishes its
/// filtered values through [`FilteredTable::on_filtered`]. Lower values mean
/// more coupled capacitance, i.e. a touch.
///
/// [`FilteredTable::on_filtered`]: crate::channel::FilteredTable::on_filtered
pub trait Sensor {
    /// One-time peripheral setup (reference voltages, measurement mode)
    fn init(&mut self);
    /// Enable measurement of a channel
    fn configure(&mut self, channel: ChannelId);
    /// Stop measuring a channel. Channels which are not configured are
    /// ignored.
    fn unconfigure(&mut self, channel: ChannelId);
    /// Start the filter, publishing values every `period_ms`
    fn filter_start(&mut self, period_ms: u32);
    fn filter_stop(&mut self);
}

/// Periodic tick which drives the poll cycle
///
/// The owner of the slider calls [`TouchSlider::update`] on every tick while
/// attached.
///
/// [`TouchSlider::update`]: crate::slider::TouchSlider::update
pub trait Scheduler {
    fn attach(&mut self, interval_ms: u32);
    fn detach(&mut self);
}
