//! # Unit Types
//!
//! Type-safe wrappers for the handful of units an estimate deals in. These
//! are plain f64 newtypes so JSON stays clean (just numbers).
//!
//! ## Internal Units
//!
//! The host model hands over lengths in decimal feet, so that is the internal
//! length unit everywhere in the engine:
//! - Length: feet (ft), inches (in)
//! - Weight: pounds (lb)
//! - Linear weight: pounds per linear foot (plf)
//!
//! Conduit diameters are carried in feet too, and snapped to a
//! [`NominalDiameter`] (1/64" resolution) whenever they are used as a key.
//!
//! ## Example
//!
//! ```rust
//! use takeoff_core::units::{Feet, Inches, NominalDiameter};
//!
//! let run = Feet(12.5);
//! let run_inches: Inches = run.into();
//! assert_eq!(run_inches.0, 150.0);
//!
//! let trade = NominalDiameter::from_feet(Feet(1.25 / 12.0));
//! assert_eq!(trade.label(), "1-1/4\"");
//! ```

use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Sub};

use serde::{Deserialize, Serialize};

// ============================================================================
// Length Units
// ============================================================================

/// Length in feet
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Feet(pub f64);

/// Length in inches
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inches(pub f64);

impl From<Feet> for Inches {
    fn from(ft: Feet) -> Self {
        Inches(ft.0 * 12.0)
    }
}

impl From<Inches> for Feet {
    fn from(inches: Inches) -> Self {
        Feet(inches.0 / 12.0)
    }
}

// ============================================================================
// Weight Units
// ============================================================================

/// Weight in pounds
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pounds(pub f64);

/// Linear weight in pounds per linear foot (plf)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlF(pub f64);

impl PlF {
    /// Weight of a given length at this linear weight
    pub fn over(self, length: Feet) -> Pounds {
        Pounds(self.0 * length.0)
    }
}

impl Pounds {
    /// Round up to the next whole pound
    pub fn ceil(self) -> Pounds {
        Pounds(self.0.ceil())
    }

    /// Spread over a length
    pub fn per(self, length: Feet) -> PlF {
        if length.0 == 0.0 {
            PlF(0.0)
        } else {
            PlF(self.0 / length.0)
        }
    }
}

// ============================================================================
// Arithmetic Implementations (macro to reduce boilerplate)
// ============================================================================

macro_rules! impl_arithmetic {
    ($type:ty) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl AddAssign for $type {
            fn add_assign(&mut self, rhs: Self) {
                self.0 += rhs.0;
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl Div<f64> for $type {
            type Output = Self;
            fn div(self, rhs: f64) -> Self::Output {
                Self(self.0 / rhs)
            }
        }

        impl std::iter::Sum for $type {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                Self(iter.map(|v| v.0).sum())
            }
        }
    };
}

impl_arithmetic!(Feet);
impl_arithmetic!(Inches);
impl_arithmetic!(Pounds);
impl_arithmetic!(PlF);

// ============================================================================
// Nominal Diameter
// ============================================================================

/// A conduit trade size snapped to 1/64".
///
/// Raw diameters from the model are floats in feet and drift in the last few
/// bits; snapping gives a hashable, ordered key with a stable label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NominalDiameter(pub u32);

impl NominalDiameter {
    const PER_INCH: u32 = 64;

    /// Snap a diameter in feet to the nearest 1/64"
    pub fn from_feet(diameter: Feet) -> Self {
        Self::from_inches(diameter.into())
    }

    /// Snap a diameter in inches to the nearest 1/64"
    pub fn from_inches(diameter: Inches) -> Self {
        let units = (diameter.0 * f64::from(Self::PER_INCH)).round();
        NominalDiameter(if units <= 0.0 { 0 } else { units as u32 })
    }

    pub fn inches(self) -> Inches {
        Inches(f64::from(self.0) / f64::from(Self::PER_INCH))
    }

    pub fn feet(self) -> Feet {
        self.inches().into()
    }

    /// Trade-size label: `1/2"`, `1"`, `1-1/4"`
    pub fn label(self) -> String {
        let whole = self.0 / Self::PER_INCH;
        let rem = self.0 % Self::PER_INCH;
        if rem == 0 {
            return format!("{}\"", whole);
        }
        let (num, den) = reduce(rem, Self::PER_INCH);
        if whole == 0 {
            format!("{}/{}\"", num, den)
        } else {
            format!("{}-{}/{}\"", whole, num, den)
        }
    }
}

impl fmt::Display for NominalDiameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

fn reduce(num: u32, den: u32) -> (u32, u32) {
    let mut a = num;
    let mut b = den;
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    (num / a, den / a)
}

// ============================================================================
// Length Formatting
// ============================================================================

/// Presentation boundary for lengths.
pub trait LengthFormatter {
    fn format(&self, length: Feet) -> String;
    fn parse(&self, text: &str) -> Option<Feet>;
}

/// Architectural feet-and-inches, rounded to 1/16": `12' - 6 1/2"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeetInches;

impl FeetInches {
    const SIXTEENTHS: f64 = 16.0;
}

impl LengthFormatter for FeetInches {
    fn format(&self, length: Feet) -> String {
        let sign = if length.0 < 0.0 { "-" } else { "" };
        let total = (length.0.abs() * 12.0 * Self::SIXTEENTHS).round() as u64;
        let per_foot = 12 * Self::SIXTEENTHS as u64;
        let feet = total / per_foot;
        let rem = total % per_foot;
        let inches = rem / Self::SIXTEENTHS as u64;
        let frac = (rem % Self::SIXTEENTHS as u64) as u32;

        let inch_part = if frac == 0 {
            format!("{}\"", inches)
        } else {
            let (n, d) = reduce(frac, Self::SIXTEENTHS as u32);
            format!("{} {}/{}\"", inches, n, d)
        };
        format!("{}{}' - {}", sign, feet, inch_part)
    }

    fn parse(&self, text: &str) -> Option<Feet> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        if let Some((feet, rest)) = text.split_once('\'') {
            let feet: f64 = feet.trim().parse().ok()?;
            let rest = rest.trim().trim_start_matches('-').trim();
            let inches = if rest.is_empty() { 0.0 } else { parse_inches(rest)? };
            return Some(Feet(feet + inches / 12.0));
        }
        if text.ends_with('"') {
            return parse_inches(text).map(|i| Feet(i / 12.0));
        }
        text.parse().ok().map(Feet)
    }
}

/// `6`, `6 1/2`, `1-1/4`, `3/4`, optionally with a trailing `"`.
fn parse_inches(text: &str) -> Option<f64> {
    let text = text.trim().trim_end_matches('"').trim();
    if text.is_empty() {
        return None;
    }
    let mut total = 0.0;
    for token in text.split_whitespace() {
        for part in token.split('-').filter(|p| !p.is_empty()) {
            total += match part.split_once('/') {
                Some((n, d)) => {
                    let n: f64 = n.parse().ok()?;
                    let d: f64 = d.parse().ok()?;
                    if d == 0.0 {
                        return None;
                    }
                    n / d
                }
                None => part.parse::<f64>().ok()?,
            };
        }
    }
    Some(total)
}
