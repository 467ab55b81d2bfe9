//! `log` backend writing to the serial port.

use core::fmt::Write;

use log::{LevelFilter, Log, Metadata, Record};

use crate::serial::uart1;

struct UartLogger;

static LOGGER: UartLogger = UartLogger;

impl Log for UartLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut writer = uart1::writer();
        let _ = write!(writer, "[{}] {}\r\n", record.level(), record.args());
    }

    fn flush(&self) {}
}

/// Install the serial logger. The UART must be initialized first.
pub fn init(level: LevelFilter) {
    // No atomic compare-and-swap on this core, so the racy setters are the only
    // option. They run once, before any interrupt can log.
    unsafe {
        let _ = log::set_logger_racy(&LOGGER);
        log::set_max_level_racy(level);
    }
}
