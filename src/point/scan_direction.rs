/// The direction at which the scanner mirror was travelling at the time of the
/// output pulse.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScanDirection {
    /// The scan is moving from the left side of the in-track direction to the
    /// right side.
    LeftToRight,
    /// The opposite direction.
    #[default]
    RightToLeft,
}

impl From<ScanDirection> for u8 {
    fn from(scan_direction: ScanDirection) -> u8 {
        match scan_direction {
            ScanDirection::RightToLeft => 0,
            ScanDirection::LeftToRight => 1,
        }
    }
}

impl From<u8> for ScanDirection {
    fn from(n: u8) -> ScanDirection {
        if n & 1 == 1 {
            ScanDirection::LeftToRight
        } else {
            ScanDirection::RightToLeft
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_u8() {
        assert_eq!(ScanDirection::RightToLeft, ScanDirection::from(0));
        assert_eq!(ScanDirection::LeftToRight, ScanDirection::from(1));
        assert_eq!(0, u8::from(ScanDirection::RightToLeft));
        assert_eq!(1, u8::from(ScanDirection::LeftToRight));
    }
}
