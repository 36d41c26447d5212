//! Scalar channels of complex samples.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// One complex value read from a source.
pub type Sample = Complex64;

/// Sample substituted for positions outside the source.
///
/// Every channel of this sample is NaN, so it renders as background.
pub const BACKGROUND_SAMPLE: Sample = Complex64::new(f64::NAN, f64::NAN);

/// The scalar extracted from each complex sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    /// Real component
    Real,
    /// Imaginary component
    #[default]
    Imaginary,
    /// Modulus, `sqrt(re² + im²)`
    Magnitude,
    /// Argument, `atan2(im, re)` in `(-π, π]`
    Phase,
}

impl ChannelKind {
    /// All channel kinds, in display order.
    pub const ALL: [ChannelKind; 4] = [
        ChannelKind::Real,
        ChannelKind::Imaginary,
        ChannelKind::Magnitude,
        ChannelKind::Phase,
    ];

    /// Short tag used on the command line and in logs.
    pub fn tag(self) -> &'static str {
        match self {
            ChannelKind::Real => "real",
            ChannelKind::Imaginary => "imaginary",
            ChannelKind::Magnitude => "magnitude",
            ChannelKind::Phase => "phase",
        }
    }

    /// Value range the channel can take when it is bounded independently of the data.
    pub fn natural_range(self) -> Option<(f64, f64)> {
        match self {
            ChannelKind::Phase => Some((-PI, PI)),
            _ => None,
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ChannelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "real" | "re" => Ok(ChannelKind::Real),
            "imaginary" | "imag" | "im" => Ok(ChannelKind::Imaginary),
            "magnitude" | "amplitude" | "abs" => Ok(ChannelKind::Magnitude),
            "phase" | "arg" => Ok(ChannelKind::Phase),
            other => Err(format!(
                "unknown channel '{}' (expected real, imaginary, magnitude or phase)",
                other
            )),
        }
    }
}

/// Extract the scalar `channel` of `sample`.
///
/// Total: NaN components propagate as NaN and are dealt with by the range
/// mapper. The phase of the origin is 0.
#[inline]
pub fn extract(sample: Sample, channel: ChannelKind) -> f64 {
    match channel {
        ChannelKind::Real => sample.re,
        ChannelKind::Imaginary => sample.im,
        ChannelKind::Magnitude => sample.norm(),
        ChannelKind::Phase => {
            if sample.re == 0.0 && sample.im == 0.0 {
                0.0
            } else {
                let arg = sample.arg();
                // atan2 yields -π for a negative zero imaginary part
                if arg == -PI {
                    PI
                } else {
                    arg
                }
            }
        }
    }
}
