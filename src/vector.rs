//! Conversions between wind direction/speed and u/v components.
//!
//! The conventions are meteorological: the direction is where the wind is blowing *from* in
//! degrees clockwise from north, so a west wind (270&deg;) has a positive u component.
use crate::{
    error::{AnalysisError, Result},
    utility::is_valid,
};
use metfor::{Knots, Quantity, WindSpdDir, WindUV};

/// Convert a direction (degrees) and speed into u and v components.
pub fn to_components(direction: f64, speed: Knots) -> Result<WindUV<Knots>> {
    let spd = speed.unpack();
    if !is_valid(direction) || !is_valid(spd) {
        return Err(AnalysisError::MissingValue);
    }

    let rads = (direction % 360.0).to_radians();
    let u = -spd * rads.sin();
    let v = -spd * rads.cos();

    Ok(WindUV {
        u: Knots(u),
        v: Knots(v),
    })
}

/// Convert u and v components into a direction in [0, 360) and speed.
pub fn to_polar(u: Knots, v: Knots) -> Result<WindSpdDir<Knots>> {
    let speed = magnitude(u.unpack(), v.unpack())?;

    let mut direction = f64::atan2(-u.unpack(), -v.unpack()).to_degrees();
    if direction < 0.0 {
        direction += 360.0;
    }
    if direction >= 360.0 {
        direction -= 360.0;
    }

    Ok(WindSpdDir {
        speed: Knots(speed),
        direction,
    })
}

/// The magnitude of a vector.
#[inline]
pub fn magnitude(u: f64, v: f64) -> Result<f64> {
    if !is_valid(u) || !is_valid(v) {
        return Err(AnalysisError::MissingValue);
    }

    Ok(u.hypot(v))
}
