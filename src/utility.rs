//! Scalar helpers: the missing value sentinel, quality control, and unit conversions.
//!
//! Raw data handed to this crate may flag missing values with a sentinel (`MISSING`). Once the data
//! is inside a `Sounding` it is stored with the `Optioned` type and the sentinel never shows up
//! again, but the thermodynamic and vector routines still run every argument through `is_valid`
//! so a sentinel passed in by a caller is treated as missing.
use metfor::{Feet, Knots, Meters, MetersPSec, Quantity};

/// Sentinel value used to flag missing data in raw input.
pub const MISSING: f64 = -9999.0;

/// Quality control check for a raw value.
///
/// Anything below -998 or above 200,000 is treated as missing, as is anything that is not a finite
/// number.
#[inline]
pub fn is_valid(val: f64) -> bool {
    val.is_finite() && !(val < -998.0 || val > 2.0e5)
}

/// Check every value in a slice with `is_valid`.
#[inline]
pub(crate) fn all_valid(vals: &[f64]) -> bool {
    vals.iter().all(|&v| is_valid(v))
}

/// Convert a speed in knots to meters per second.
#[inline]
pub fn knots_to_mps(speed: Knots) -> MetersPSec {
    MetersPSec::from(speed)
}

/// Convert a speed in meters per second to knots.
#[inline]
pub fn mps_to_knots(speed: MetersPSec) -> Knots {
    Knots::from(speed)
}

/// Convert meters to feet.
#[inline]
pub fn meters_to_feet(length: Meters) -> Feet {
    Feet::from(length)
}

/// Convert feet to meters.
#[inline]
pub fn feet_to_meters(length: Feet) -> Meters {
    Meters::from(length)
}

/// Convert a temperature in Celsius to Fahrenheit, propagating the sentinel.
#[inline]
pub fn celsius_to_fahrenheit(t: f64) -> f64 {
    if !is_valid(t) {
        return MISSING;
    }
    1.8 * t + 32.0
}

/// Convert a raw value into an `Optioned` quantity, treating anything that fails `is_valid` as
/// missing.
#[inline]
pub(crate) fn raw_to_optioned<T>(val: f64) -> optional::Optioned<T>
where
    T: Quantity + optional::Noned + Copy,
{
    if is_valid(val) {
        optional::some(T::pack(val))
    } else {
        optional::none()
    }
}

#[cfg(test)]
pub mod test_tools {
    pub fn approx_equal(val1: f64, val2: f64, eps: f64) -> bool {
        assert!(eps > 0.0);

        (val1 - val2).abs() < eps
    }
}
