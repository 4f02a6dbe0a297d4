//! Indexes that are specific to a sounding, but not a particular parcel analysis of that sounding.
//!
//! The exception is the supercell composite parameter, which combines values from other analyses.

use crate::{
    error::{AnalysisError, Result},
    interpolation::{dewpoint_for_pressure, temperature_for_pressure},
    sounding::Sounding,
    thermo::mixing_ratio,
};
use itertools::{izip, Itertools};
use metfor::{Celsius, HectoPascal, IntHelicityM2pS2, JpKg, MetersPSec, Quantity};
use std::iter::once;

/// Conversion from g/kg * hPa to inches of precipitable water.
const PW_FACTOR: f64 = 0.00040173;

fn temperatures(snd: &Sounding, p: f64) -> Result<(f64, f64)> {
    let p = HectoPascal(p);
    let Celsius(t) = temperature_for_pressure(snd, p)?;
    let Celsius(td) = dewpoint_for_pressure(snd, p)?;
    Ok((t, td))
}

/// The K-index.
///
/// # Examples
///
/// ```rust
/// use sounding_params::{k_index, Sounding};
///
/// let snd = Sounding::from_raw_columns(
///     "", "",
///     &[850.0, 700.0, 500.0],
///     &[1500.0, 3000.0, 5600.0],
///     &[15.0, 4.0, -12.0],
///     &[10.0, -2.0, -25.0],
///     &[270.0, 270.0, 270.0],
///     &[10.0, 20.0, 30.0],
/// ).unwrap();
///
/// // (15 - -12) + 10 - (4 - -2)
/// assert!((k_index(&snd).unwrap() - 31.0).abs() < 1.0e-10);
/// ```
pub fn k_index(snd: &Sounding) -> Result<f64> {
    let (t850, td850) = temperatures(snd, 850.0)?;
    let (t700, td700) = temperatures(snd, 700.0)?;
    let Celsius(t500) = temperature_for_pressure(snd, HectoPascal(500.0))?;

    Ok(t850 - t500 + td850 - (t700 - td700))
}

/// The cross totals, 850 hPa dew point minus 500 hPa temperature.
pub fn cross_totals(snd: &Sounding) -> Result<f64> {
    let Celsius(td850) = dewpoint_for_pressure(snd, HectoPascal(850.0))?;
    let Celsius(t500) = temperature_for_pressure(snd, HectoPascal(500.0))?;

    Ok(td850 - t500)
}

/// The vertical totals, 850 hPa temperature minus 500 hPa temperature.
pub fn vertical_totals(snd: &Sounding) -> Result<f64> {
    let Celsius(t850) = temperature_for_pressure(snd, HectoPascal(850.0))?;
    let Celsius(t500) = temperature_for_pressure(snd, HectoPascal(500.0))?;

    Ok(t850 - t500)
}

/// The total totals, the sum of the cross and vertical totals.
#[inline]
pub fn total_totals(snd: &Sounding) -> Result<f64> {
    Ok(cross_totals(snd)? + vertical_totals(snd)?)
}

/// Precipitable water (inches) between the surface and 400 hPa.
#[inline]
pub fn precipitable_water(snd: &Sounding) -> Result<f64> {
    let sfc_p = snd
        .surface_pressure()
        .into_option()
        .ok_or(AnalysisError::MissingValue)?;

    precipitable_water_layer(snd, sfc_p, HectoPascal(400.0))
}

/// Precipitable water (inches) in a layer.
///
/// The mixing ratio is integrated with the trapezoid method over every level with a dew point
/// between `bottom` and `top`, with the dew point interpolated at the ends of the layer.
pub fn precipitable_water_layer(
    snd: &Sounding,
    bottom: HectoPascal,
    top: HectoPascal,
) -> Result<f64> {
    if !(bottom > top) {
        return Err(AnalysisError::InvalidInput);
    }

    let bottom_td = dewpoint_for_pressure(snd, bottom)?;
    let top_td = dewpoint_for_pressure(snd, top)?;

    let inside = izip!(snd.pressure_profile(), snd.dew_point_profile())
        // Remove levels with missing data
        .filter(|(p, td)| p.is_some() && td.is_some())
        // Unpack from the Optioned type
        .map(|(p, td)| (p.unpack(), td.unpack()))
        .filter(|&(p, _)| p < bottom && p > top);

    once((bottom, bottom_td))
        .chain(inside)
        .chain(once((top, top_td)))
        // Convert dew point to mixing ratio
        .map(|(p, td)| mixing_ratio(p, td).map(|mw| (p.unpack(), mw)))
        // View them as pairs for integrating with the trapezoid method
        .tuple_windows::<(_, _)>()
        .try_fold(0.0, |acc, (lvl0, lvl1)| -> Result<f64> {
            let (p0, mw0) = lvl0?;
            let (p1, mw1) = lvl1?;
            Ok(acc + (mw0 + mw1) / 2.0 * (p0 - p1))
        })
        .map(|integrated_mw| integrated_mw * PW_FACTOR)
}

/// The supercell composite parameter.
///
/// Uses the most unstable CAPE, the effective storm relative helicity, and the effective bulk wind
/// difference. Shear below 10 m/s doesn't count, and shear above 20 m/s counts as 20 m/s. Negative
/// values are clamped to zero.
///
/// # Examples
///
/// ```rust
/// use metfor::{IntHelicityM2pS2, JpKg, MetersPSec};
/// use sounding_params::supercell_composite;
///
/// let scp = supercell_composite(JpKg(2000.0), IntHelicityM2pS2(200.0), MetersPSec(25.0));
/// assert!((scp - 8.0).abs() < 1.0e-10);
///
/// let scp = supercell_composite(JpKg(2000.0), IntHelicityM2pS2(200.0), MetersPSec(5.0));
/// assert_eq!(scp, 0.0);
/// ```
pub fn supercell_composite(
    mu_cape: JpKg,
    effective_srh: IntHelicityM2pS2,
    effective_shear: MetersPSec,
) -> f64 {
    let shear = effective_shear.unpack();
    let shear_term = if shear > 20.0 {
        1.0
    } else if shear < 10.0 {
        0.0
    } else {
        shear / 20.0
    };

    let scp = mu_cape.unpack() / 1000.0 * effective_srh.unpack() / 50.0 * shear_term;
    scp.max(0.0)
}
