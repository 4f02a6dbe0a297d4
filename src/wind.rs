//! Layer mean winds, shear, helicity, and storm motion that doesn't depend on a parcel.
//!
//! Layers are given in pressure (hPa) or in height above ground level. All winds are in knots,
//! helicity is in m<sup>2</sup> s<sup>-2</sup>.
use crate::{
    config::MEAN_WIND_STEPS,
    error::{AnalysisError, Result},
    interpolation::{msl_from_agl, pressure_for_height, wind_components_for_pressure},
    sounding::Sounding,
    utility::{knots_to_mps, mps_to_knots},
    vector,
};
use itertools::{izip, Itertools};
use metfor::{HectoPascal, IntHelicityM2pS2, Knots, Meters, MetersPSec, Quantity, WindUV};
use std::iter::once;

/// Deviation of a supercell's motion from the mean wind, perpendicular to the shear.
const BUNKERS_DEVIATION: MetersPSec = MetersPSec(7.5);

const CALM: WindUV<Knots> = WindUV {
    u: Knots(0.0),
    v: Knots(0.0),
};

/// Pressure weighted mean wind in a layer, sampled at 20 levels.
///
/// # Examples
///
/// ```rust
/// use metfor::{HectoPascal, Knots, WindUV};
/// use sounding_params::{mean_wind, Sounding};
///
/// let snd = Sounding::from_raw_columns(
///     "", "",
///     &[1000.0, 850.0, 500.0, 200.0],
///     &[100.0, 1500.0, 5600.0, 11800.0],
///     &[20.0, 10.0, -15.0, -55.0],
///     &[15.0, 5.0, -25.0, -65.0],
///     &[270.0, 270.0, 270.0, 270.0],
///     &[10.0, 10.0, 10.0, 10.0],
/// ).unwrap();
///
/// let WindUV { u, v } = mean_wind(&snd, HectoPascal(850.0), HectoPascal(200.0)).unwrap();
/// assert!((u.0 - 10.0).abs() < 1.0e-10);
/// assert!(v.0.abs() < 1.0e-10);
/// ```
#[inline]
pub fn mean_wind(snd: &Sounding, bottom: HectoPascal, top: HectoPascal) -> Result<WindUV<Knots>> {
    mean_wind_with(snd, bottom, top, MEAN_WIND_STEPS, CALM)
}

/// Pressure weighted mean storm relative wind in a layer.
///
/// The layer is sampled every `(bottom - top) / steps` hPa, rounded down to a whole number,
/// starting at the bottom. If the layer is too thin for that, the mean of the bottom and top is
/// used.
pub fn mean_wind_with(
    snd: &Sounding,
    bottom: HectoPascal,
    top: HectoPascal,
    steps: usize,
    storm_motion: WindUV<Knots>,
) -> Result<WindUV<Knots>> {
    layer_mean_wind(snd, bottom, top, steps, storm_motion, |p| p.unpack())
}

/// Mean wind in a layer without pressure weighting.
#[inline]
pub fn mean_wind_npw(
    snd: &Sounding,
    bottom: HectoPascal,
    top: HectoPascal,
) -> Result<WindUV<Knots>> {
    mean_wind_npw_with(snd, bottom, top, MEAN_WIND_STEPS, CALM)
}

/// Mean storm relative wind in a layer without pressure weighting.
///
/// Sampled the same way as `mean_wind_with`.
pub fn mean_wind_npw_with(
    snd: &Sounding,
    bottom: HectoPascal,
    top: HectoPascal,
    steps: usize,
    storm_motion: WindUV<Knots>,
) -> Result<WindUV<Knots>> {
    layer_mean_wind(snd, bottom, top, steps, storm_motion, |_| 1.0)
}

fn layer_mean_wind<W>(
    snd: &Sounding,
    bottom: HectoPascal,
    top: HectoPascal,
    steps: usize,
    storm_motion: WindUV<Knots>,
    weight: W,
) -> Result<WindUV<Knots>>
where
    W: Fn(HectoPascal) -> f64,
{
    check_pressure_layer(bottom, top)?;
    if steps == 0 {
        return Err(AnalysisError::InvalidInput);
    }

    let inc = ((bottom - top).unpack() / steps as f64).floor();
    let samples: Vec<HectoPascal> = if inc < 1.0 {
        vec![bottom, top]
    } else {
        (0..)
            .map(|i| bottom - HectoPascal(i as f64 * inc))
            .take_while(|&p| p > top)
            .collect()
    };

    let (usum, vsum, wsum) = samples.into_iter().try_fold(
        (0.0, 0.0, 0.0),
        |(usum, vsum, wsum), p| -> Result<(f64, f64, f64)> {
            let WindUV { u, v } = wind_components_for_pressure(snd, p)?;
            let w = weight(p);
            Ok((
                usum + (u - storm_motion.u).unpack() * w,
                vsum + (v - storm_motion.v).unpack() * w,
                wsum + w,
            ))
        },
    )?;

    Ok(WindUV {
        u: Knots(usum / wsum),
        v: Knots(vsum / wsum),
    })
}

/// The vector difference of the wind at the top and bottom of a layer.
pub fn wind_shear(snd: &Sounding, bottom: HectoPascal, top: HectoPascal) -> Result<WindUV<Knots>> {
    let WindUV { u: ub, v: vb } = wind_components_for_pressure(snd, bottom)?;
    let WindUV { u: ut, v: vt } = wind_components_for_pressure(snd, top)?;

    Ok(WindUV {
        u: Knots((ut - ub).unpack()),
        v: Knots((vt - vb).unpack()),
    })
}

/// Storm relative helicity in a layer between two heights above ground level.
///
/// Returns the total, positive, and negative helicity. A layer with no depth has no helicity.
///
/// # Examples
///
/// ```rust
/// use metfor::{Knots, Meters, WindUV};
/// use sounding_params::{helicity, Sounding};
///
/// // Veering winds.
/// let snd = Sounding::from_raw_columns(
///     "", "",
///     &[1000.0, 925.0, 850.0, 700.0, 500.0],
///     &[0.0, 700.0, 1500.0, 3100.0, 5700.0],
///     &[25.0, 20.0, 15.0, 4.0, -12.0],
///     &[20.0, 16.0, 10.0, -2.0, -25.0],
///     &[150.0, 180.0, 210.0, 240.0, 270.0],
///     &[20.0, 30.0, 40.0, 50.0, 60.0],
/// ).unwrap();
///
/// let calm = WindUV { u: Knots(0.0), v: Knots(0.0) };
/// let (total, pos, neg) = helicity(&snd, Meters(0.0), Meters(3000.0), calm).unwrap();
/// assert!(total.0 > 0.0);
/// assert_eq!(total.0, pos.0 + neg.0);
/// ```
pub fn helicity(
    snd: &Sounding,
    lower_agl: Meters,
    upper_agl: Meters,
    storm_motion: WindUV<Knots>,
) -> Result<(IntHelicityM2pS2, IntHelicityM2pS2, IntHelicityM2pS2)> {
    if lower_agl == upper_agl {
        return Ok((
            IntHelicityM2pS2(0.0),
            IntHelicityM2pS2(0.0),
            IntHelicityM2pS2(0.0),
        ));
    }

    let (bottom, top) = agl_layer_pressures(snd, lower_agl, upper_agl)?;
    let winds = layer_winds(snd, bottom, top)?;

    let storm_u = knots_to_mps(storm_motion.u);
    let storm_v = knots_to_mps(storm_motion.v);

    let (pos, neg) = winds
        .iter()
        .map(|(_, WindUV { u, v })| {
            (
                (knots_to_mps(*u) - storm_u).unpack(),
                (knots_to_mps(*v) - storm_v).unpack(),
            )
        })
        .tuple_windows::<(_, _)>()
        .map(|((u1, v1), (u2, v2))| u2 * v1 - u1 * v2)
        .fold((0.0, 0.0), |(pos, neg), lyr| {
            if lyr > 0.0 {
                (pos + lyr, neg)
            } else {
                (pos, neg + lyr)
            }
        });

    Ok((
        IntHelicityM2pS2(pos + neg),
        IntHelicityM2pS2(pos),
        IntHelicityM2pS2(neg),
    ))
}

/// Find the strongest wind in a layer between two heights above ground level.
///
/// Returns the pressure level and the wind. The first of any ties is returned.
pub fn max_wind(
    snd: &Sounding,
    lower_agl: Meters,
    upper_agl: Meters,
) -> Result<(HectoPascal, WindUV<Knots>)> {
    let (bottom, top) = agl_layer_pressures(snd, lower_agl, upper_agl)?;

    layer_winds(snd, bottom, top)?
        .into_iter()
        .map(|(p, w)| (p, w, w.u.unpack().hypot(w.v.unpack())))
        .fold(None, |max: Option<(HectoPascal, WindUV<Knots>, f64)>, lvl| match max {
            Some(max) if max.2 >= lvl.2 => Some(max),
            _ => Some(lvl),
        })
        .map(|(p, w, _)| (p, w))
        .ok_or(AnalysisError::NotEnoughData)
}

/// Supercell motion from the Bunkers "internal dynamics" method without a parcel.
///
/// The 0-6 km non-pressure weighted mean wind is moved 7.5 m/s perpendicular to the 0-6 km shear.
/// Returns the motion of the right mover and the left mover. With no shear to define a direction
/// both are the mean wind.
pub fn non_parcel_bunkers_motion(snd: &Sounding) -> Result<(WindUV<Knots>, WindUV<Knots>)> {
    let sfc_p = snd
        .surface_pressure()
        .into_option()
        .ok_or(AnalysisError::MissingValue)?;
    let p6km = pressure_for_height(snd, msl_from_agl(snd, Meters(6000.0))?)?;

    let mean = mean_wind_npw(snd, sfc_p, p6km)?;
    let shear = wind_shear(snd, sfc_p, p6km)?;

    Ok(bunkers_deviation(mean, shear))
}

/// Move the mean wind perpendicular to the shear by the Bunkers deviation.
pub(crate) fn bunkers_deviation(
    mean: WindUV<Knots>,
    shear: WindUV<Knots>,
) -> (WindUV<Knots>, WindUV<Knots>) {
    let d = mps_to_knots(BUNKERS_DEVIATION).unpack();
    let (shru, shrv) = (shear.u.unpack(), shear.v.unpack());

    let scale = match vector::magnitude(shru, shrv) {
        Ok(mag) if mag > 0.0 => d / mag,
        _ => 0.0,
    };

    let (du, dv) = (scale * shrv, -scale * shru);
    let (mnu, mnv) = (mean.u.unpack(), mean.v.unpack());

    (
        WindUV {
            u: Knots(mnu + du),
            v: Knots(mnv + dv),
        },
        WindUV {
            u: Knots(mnu - du),
            v: Knots(mnv - dv),
        },
    )
}

fn check_pressure_layer(bottom: HectoPascal, top: HectoPascal) -> Result<()> {
    if !crate::utility::all_valid(&[bottom.unpack(), top.unpack()]) {
        return Err(AnalysisError::MissingValue);
    }
    if !(bottom > top) {
        return Err(AnalysisError::InvalidInput);
    }
    Ok(())
}

/// Pressure at the bottom and top of a layer given in meters above ground level.
fn agl_layer_pressures(
    snd: &Sounding,
    lower_agl: Meters,
    upper_agl: Meters,
) -> Result<(HectoPascal, HectoPascal)> {
    if !(lower_agl < upper_agl) {
        return Err(AnalysisError::InvalidInput);
    }

    let bottom = pressure_for_height(snd, msl_from_agl(snd, lower_agl)?)?;
    let top = pressure_for_height(snd, msl_from_agl(snd, upper_agl)?)?;

    Ok((bottom, top))
}

/// Winds at the bottom and top of a layer and every level with a wind in between.
fn layer_winds(
    snd: &Sounding,
    bottom: HectoPascal,
    top: HectoPascal,
) -> Result<Vec<(HectoPascal, WindUV<Knots>)>> {
    check_pressure_layer(bottom, top)?;

    let bottom_wind = wind_components_for_pressure(snd, bottom)?;
    let top_wind = wind_components_for_pressure(snd, top)?;

    let inside = izip!(
        snd.pressure_profile(),
        snd.u_wind_profile(),
        snd.v_wind_profile()
    )
    .filter(|(p, u, v)| p.is_some() && u.is_some() && v.is_some())
    .map(|(p, u, v)| (p.unpack(), u.unpack(), v.unpack()))
    .filter(|&(p, _, _)| p < bottom && p > top)
    .map(|(p, u, v)| (p, WindUV { u, v }));

    Ok(once((bottom, bottom_wind))
        .chain(inside)
        .chain(once((top, top_wind)))
        .collect())
}
