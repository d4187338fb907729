//! Frame rate and picture size carried in video track entries.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Frame rate as `num / den` frames per second.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rational {
    pub num: u32,
    pub den: u32,
}

impl Rational {
    pub const FPS_24: Self = Self::fps(24);
    pub const FPS_25: Self = Self::fps(25);
    pub const FPS_30: Self = Self::fps(30);
    /// NTSC 30000/1001.
    pub const FPS_29_97: Self = Self {
        num: 30_000,
        den: 1_001,
    };
    pub const FPS_60: Self = Self::fps(60);

    const fn fps(num: u32) -> Self {
        Self { num, den: 1 }
    }

    /// `None` for a zero denominator.
    pub fn new(num: u32, den: u32) -> Option<Self> {
        (den != 0).then_some(Self { num, den })
    }

    /// Value written into the `FrameRate` float element.
    pub fn as_f64(self) -> f64 {
        if self.den == 0 {
            return 0.0;
        }
        f64::from(self.num) / f64::from(self.den)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.den {
            1 => write!(f, "{} fps", self.num),
            den => write!(f, "{}/{den} fps", self.num),
        }
    }
}

/// Picture size in pixels (`PixelWidth` x `PixelHeight`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const VGA: Self = Self::new(640, 480);
    pub const HD: Self = Self::new(1920, 1080);

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when either dimension is zero.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
