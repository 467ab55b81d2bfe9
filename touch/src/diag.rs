//! Formatting of status arrays for the diagnostic log, without allocation.

use core::fmt;

/// Touched flags as ` 1 0 0 1`
pub struct Flags<'a>(pub &'a [bool]);

impl fmt::Display for Flags<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for flag in self.0 {
            write!(f, " {}", *flag as u8)?;
        }
        Ok(())
    }
}

/// Any values as ` a b c`
pub struct Values<'a, T>(pub &'a [T]);

impl<T: fmt::Display> fmt::Display for Values<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for value in self.0 {
            write!(f, " {}", value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub mod test {
    use super::*;

    #[test]
    fn test_format() {
        assert_eq!(format!("{}", Flags(&[true, false, false, true])), " 1 0 0 1");
        assert_eq!(format!("{}", Values(&[-1i8, 0, 1])), " -1 0 1");
        assert_eq!(format!("{}", Values::<u16>(&[])), "");
    }
}
