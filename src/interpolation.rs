//! Interpolate values from a sounding in the vertical.
//!
//! Interpolation in height is linear, interpolation in pressure is linear in the logarithm of
//! pressure. Levels where the requested field (or the coordinate) is missing are skipped, so the
//! levels on either side of them are used instead.
use crate::{
    error::{AnalysisError, Result},
    sounding::Sounding,
    thermo,
    utility::is_valid,
};
use itertools::Itertools;
use metfor::{Celsius, HectoPascal, Knots, Meters, Quantity, WindUV};
use optional::Optioned;
use strum_macros::{Display, EnumIter};

/// The variables stored in a sounding that can be interpolated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, Display)]
pub enum Field {
    /// Pressure (hPa)
    Pressure,
    /// Geopotential height (m MSL)
    Height,
    /// Temperature (C)
    Temperature,
    /// Dew point (C)
    DewPoint,
    /// U component of the wind (knots)
    UWind,
    /// V component of the wind (knots)
    VWind,
}

impl Field {
    #[inline]
    fn value(self, snd: &Sounding, idx: usize) -> Option<f64> {
        #[inline]
        fn get<T: Quantity + optional::Noned + Copy>(
            profile: &[Optioned<T>],
            idx: usize,
        ) -> Option<f64> {
            profile
                .get(idx)
                .and_then(|v| v.into_option())
                .map(Quantity::unpack)
        }

        match self {
            Field::Pressure => get(snd.pressure_profile(), idx),
            Field::Height => get(snd.height_profile(), idx),
            Field::Temperature => get(snd.temperature_profile(), idx),
            Field::DewPoint => get(snd.dew_point_profile(), idx),
            Field::UWind => get(snd.u_wind_profile(), idx),
            Field::VWind => get(snd.v_wind_profile(), idx),
        }
    }
}

/// Interpolate a field to a height (m MSL).
///
/// Returns the stored value exactly if a level is at the requested height.
///
/// # Examples
///
/// ```rust
/// use metfor::Meters;
/// use sounding_params::{interpolate_by_height, Field, Sounding};
///
/// let snd = Sounding::from_raw_uv_columns(
///     "", "",
///     &[1000.0, 900.0, 800.0],
///     &[0.0, 1000.0, 2000.0],
///     &[20.0, 12.0, 4.0],
///     &[15.0, 8.0, 0.0],
///     &[0.0, 10.0, 20.0],
///     &[0.0, 0.0, 0.0],
/// ).unwrap();
///
/// let t = interpolate_by_height(&snd, Meters(500.0), Field::Temperature).unwrap();
/// assert!((t - 16.0).abs() < 1.0e-10);
///
/// assert!(interpolate_by_height(&snd, Meters(2500.0), Field::Temperature).is_err());
/// ```
pub fn interpolate_by_height(snd: &Sounding, tgt_h: Meters, field: Field) -> Result<f64> {
    let tgt_h = tgt_h.unpack();
    if !is_valid(tgt_h) {
        return Err(AnalysisError::MissingValue);
    }

    let points = (0..snd.level_count())
        .filter_map(|i| Some((Field::Height.value(snd, i)?, field.value(snd, i)?)));

    interpolate(points, tgt_h, |x0, x1, x| (x - x0) / (x1 - x0))
}

/// Interpolate a field to a pressure level.
///
/// Returns the stored value exactly if a level is at the requested pressure.
pub fn interpolate_by_pressure(snd: &Sounding, tgt_p: HectoPascal, field: Field) -> Result<f64> {
    let tgt_p = tgt_p.unpack();
    if !is_valid(tgt_p) {
        return Err(AnalysisError::MissingValue);
    }
    if tgt_p <= 0.0 {
        return Err(AnalysisError::InvalidInput);
    }

    let points = (0..snd.level_count())
        .filter_map(|i| Some((Field::Pressure.value(snd, i)?, field.value(snd, i)?)))
        .filter(|&(p, _)| p > 0.0);

    interpolate(points, tgt_p, |p0, p1, p| (p0 / p).ln() / (p0 / p1).ln())
}

// What kind of bracket is this?
enum BracketType {
    Bracket((f64, f64), (f64, f64)),
    EndEquals(f64),
}

/// Find the first pair of points bracketing the target and interpolate between them.
///
/// `weight` maps the bracketing coordinates and the target to the fraction of the way from the
/// first point to the second.
#[inline]
fn interpolate<I, F>(points: I, target: f64, weight: F) -> Result<f64>
where
    I: Iterator<Item = (f64, f64)> + Clone,
    F: Fn(f64, f64, f64) -> f64,
{
    let make_bracket = |pnt_0: (f64, f64), pnt_1: (f64, f64)| -> Option<BracketType> {
        let (x0, y0) = pnt_0;
        let (x1, y1) = pnt_1;

        if (x0 - target).abs() < std::f64::EPSILON {
            Some(BracketType::EndEquals(y0))
        } else if (x1 - target).abs() < std::f64::EPSILON {
            Some(BracketType::EndEquals(y1))
        } else if (x0 < target && x1 > target) || (x0 > target && x1 < target) {
            Some(BracketType::Bracket(pnt_0, pnt_1))
        } else {
            None
        }
    };

    let mut count = 0;
    let mut first = None;
    for pnt in points.clone().take(2) {
        count += 1;
        first.get_or_insert(pnt);
    }

    match (count, first) {
        (0, _) => Err(AnalysisError::MissingValue),
        // A single point can only be an exact match.
        (1, Some((x, y))) if (x - target).abs() < std::f64::EPSILON => Ok(y),
        (1, _) => Err(AnalysisError::OutOfRange),
        _ => points
            .tuple_windows::<(_, _)>()
            .find_map(|(pnt_0, pnt_1)| make_bracket(pnt_0, pnt_1))
            .map(|bracket| match bracket {
                BracketType::Bracket((x0, y0), (x1, y1)) => {
                    y0 + weight(x0, x1, target) * (y1 - y0)
                }
                BracketType::EndEquals(y) => y,
            })
            .ok_or(AnalysisError::OutOfRange),
    }
}

/// Pressure at a height (m MSL).
#[inline]
pub fn pressure_for_height(snd: &Sounding, h: Meters) -> Result<HectoPascal> {
    interpolate_by_height(snd, h, Field::Pressure).map(HectoPascal)
}

/// Height (m MSL) of a pressure level.
#[inline]
pub fn height_for_pressure(snd: &Sounding, p: HectoPascal) -> Result<Meters> {
    interpolate_by_pressure(snd, p, Field::Height).map(Meters)
}

/// Temperature at a pressure level.
#[inline]
pub fn temperature_for_pressure(snd: &Sounding, p: HectoPascal) -> Result<Celsius> {
    interpolate_by_pressure(snd, p, Field::Temperature).map(Celsius)
}

/// Dew point at a pressure level.
#[inline]
pub fn dewpoint_for_pressure(snd: &Sounding, p: HectoPascal) -> Result<Celsius> {
    interpolate_by_pressure(snd, p, Field::DewPoint).map(Celsius)
}

/// Wind components at a pressure level.
#[inline]
pub fn wind_components_for_pressure(snd: &Sounding, p: HectoPascal) -> Result<WindUV<Knots>> {
    let u = interpolate_by_pressure(snd, p, Field::UWind)?;
    let v = interpolate_by_pressure(snd, p, Field::VWind)?;

    Ok(WindUV {
        u: Knots(u),
        v: Knots(v),
    })
}

/// Virtual temperature at a pressure level.
///
/// If the dew point can't be found there, this is just the temperature.
pub fn virtual_temperature_for_pressure(snd: &Sounding, p: HectoPascal) -> Result<Celsius> {
    let t = temperature_for_pressure(snd, p)?;
    let td = dewpoint_for_pressure(snd, p).ok();

    thermo::virtual_temperature(p, t, td)
}

/// Convert a height above mean sea level to a height above the surface level of the sounding.
#[inline]
pub fn agl_from_msl(snd: &Sounding, h: Meters) -> Result<Meters> {
    let sfc_h = snd
        .surface_height()
        .into_option()
        .ok_or(AnalysisError::MissingValue)?;
    if !is_valid(h.unpack()) {
        return Err(AnalysisError::MissingValue);
    }

    Ok(Meters(h.unpack() - sfc_h.unpack()))
}

/// Convert a height above the surface level of the sounding to a height above mean sea level.
#[inline]
pub fn msl_from_agl(snd: &Sounding, h: Meters) -> Result<Meters> {
    let sfc_h = snd
        .surface_height()
        .into_option()
        .ok_or(AnalysisError::MissingValue)?;
    if !is_valid(h.unpack()) {
        return Err(AnalysisError::MissingValue);
    }

    Ok(Meters(h.unpack() + sfc_h.unpack()))
}
