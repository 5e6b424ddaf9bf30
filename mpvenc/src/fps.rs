use crate::error::EncoderError;

/// Picture rate as a reduced ratio. Only the eight rates with an MPEG-2
/// `frame_rate_code` can be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRate {
    pub num: u32,
    pub den: u32,
}

const FRAME_RATE_CODES: [(u32, u32); 8] = [
    (24_000, 1_001),
    (24, 1),
    (25, 1),
    (30_000, 1_001),
    (30, 1),
    (50, 1),
    (60_000, 1_001),
    (60, 1),
];

impl FrameRate {
    pub fn new(num: u32, den: u32) -> Result<Self, EncoderError> {
        if num == 0 || den == 0 {
            return Err(EncoderError::InvalidFrameRate { num, den });
        }
        let g = gcd(num, den);
        let rate = Self {
            num: num / g,
            den: den / g,
        };
        if rate.code_lookup().is_none() {
            return Err(EncoderError::InvalidFrameRate { num, den });
        }
        Ok(rate)
    }

    pub fn from_int(fps: u32) -> Result<Self, EncoderError> {
        Self::new(fps, 1)
    }

    fn code_lookup(self) -> Option<u8> {
        FRAME_RATE_CODES
            .iter()
            .position(|&(n, d)| n == self.num && d == self.den)
            .map(|i| i as u8 + 1)
    }

    /// `frame_rate_code` of the sequence header.
    pub fn code(self) -> u8 {
        self.code_lookup().unwrap_or(3)
    }

    /// Rate rounded to whole pictures per second, as used by GOP time codes.
    pub fn nominal(self) -> u32 {
        (self.num + self.den / 2) / self.den
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        Self { num: 25, den: 1 }
    }
}

impl std::fmt::Display for FrameRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

const fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    if a == 0 { 1 } else { a }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_accepts_valid_num_den() {
        let fps = FrameRate::new(30, 1).unwrap();
        assert_eq!(fps.num, 30);
        assert_eq!(fps.den, 1);
        assert_eq!(fps.code(), 5);
    }

    #[test]
    fn new_rejects_zero() {
        assert!(matches!(
            FrameRate::new(0, 1),
            Err(EncoderError::InvalidFrameRate { num: 0, den: 1 })
        ));
        assert!(FrameRate::new(1, 0).is_err());
    }

    #[test]
    fn new_normalizes_ratio() {
        let fps = FrameRate::new(120, 2).unwrap();
        assert_eq!(fps, FrameRate { num: 60, den: 1 });
        assert_eq!(fps.code(), 8);
    }

    #[test]
    fn keeps_non_reducible_ratio() {
        let fps = FrameRate::new(30_000, 1_001).unwrap();
        assert_eq!(fps.code(), 4);
        assert_eq!(fps.nominal(), 30);
    }

    #[test]
    fn rejects_rates_without_code() {
        assert!(FrameRate::from_int(15).is_err());
        assert!(FrameRate::new(25, 2).is_err());
    }

    #[test]
    fn default_is_pal() {
        let fps = FrameRate::default();
        assert_eq!(fps.code(), 3);
        assert_eq!(fps.nominal(), 25);
        assert_eq!(fps.to_string(), "25");
        assert_eq!(FrameRate::new(24_000, 1_001).unwrap().to_string(), "24000/1001");
    }
}
