//! Layers found by lifting parcels, and the storm motion that depends on them.
use crate::{
    config::EffectiveLayerConfig,
    error::{AnalysisError, Result},
    interpolation::{agl_from_msl, height_for_pressure, msl_from_agl, pressure_for_height},
    parcel::{most_unstable_parcel, Parcel, ParcelFlag, DEFAULT_MU_DEPTH},
    parcel_lift::{lift, ParcelResult},
    sounding::Sounding,
    wind::{bunkers_deviation, mean_wind, non_parcel_bunkers_motion, wind_shear},
};
use log::debug;
use metfor::{HectoPascal, JpKg, Knots, Meters, Quantity, WindUV};
use optional::Optioned;

/// Find the effective inflow layer.
///
/// Returns the pressure at the bottom and top of the layer. If the most unstable parcel doesn't
/// have enough CAPE, or has too much CIN, there is no effective inflow layer and this returns
/// `AnalysisError::NotEnoughData`.
#[inline]
pub fn effective_inflow_layer(
    snd: &Sounding,
    cfg: &EffectiveLayerConfig,
) -> Result<(HectoPascal, HectoPascal)> {
    let mu_parcel = most_unstable_parcel(snd, DEFAULT_MU_DEPTH)?;
    let mu_result = lift(snd, &mu_parcel)?;

    effective_inflow_layer_with(snd, cfg, &mu_result)
}

/// Find the effective inflow layer using an already lifted most unstable parcel.
///
/// Starting at the surface, every level is lifted as a parcel. The bottom of the layer is the first
/// level with at least `cfg.ecape` of CAPE and CIN above `cfg.ecinh`. The top is the last level
/// that meets those criteria before one that doesn't.
pub fn effective_inflow_layer_with(
    snd: &Sounding,
    cfg: &EffectiveLayerConfig,
    mu_result: &ParcelResult,
) -> Result<(HectoPascal, HectoPascal)> {
    let qualifies = |cape: Optioned<JpKg>, cin: Optioned<JpKg>| match (
        cape.into_option(),
        cin.into_option(),
    ) {
        (Some(cape), Some(cin)) => cape >= cfg.ecape && cin > cfg.ecinh,
        _ => false,
    };

    if !qualifies(mu_result.cape(), mu_result.cin()) {
        return Err(AnalysisError::NotEnoughData);
    }

    let mut layer = snd
        .bottom_up()
        // Convert levels to parcels
        .filter_map(|lvl| {
            match (
                lvl.pressure.into_option(),
                lvl.temperature.into_option(),
                lvl.dew_point.into_option(),
            ) {
                (Some(p), Some(t), Some(td)) => Some(Parcel::new(p, t, td, ParcelFlag::User)),
                _ => None,
            }
        })
        // Lift the parcel and keep the CAPE and CIN
        .map(|pcl| lift(snd, &pcl).map(|res| (pcl.pressure, res.cape(), res.cin())))
        // Skip levels until we get one that meets the criteria
        .skip_while(|res| matches!(res, Ok((_, cape, cin)) if !qualifies(*cape, *cin)))
        // Take levels as long as they meet the criteria
        .take_while(|res| match res {
            Ok((_, cape, cin)) => qualifies(*cape, *cin),
            Err(_) => true,
        })
        .map(|res| res.map(|(p, _, _)| p));

    let bottom = layer.next().transpose()?.ok_or(AnalysisError::NotEnoughData)?;
    let top = layer.try_fold(bottom, |_, p| p)?;

    debug!("effective inflow layer {:?} - {:?}", bottom, top);
    Ok((bottom, top))
}

/// Supercell motion from the Bunkers "internal dynamics" method using the effective inflow layer.
///
/// When the most unstable parcel has more than 100 J/kg of CAPE and an equilibrium level, the
/// mean wind and shear are taken from the bottom of the effective inflow layer up to 65% of the
/// way to the equilibrium level. Otherwise this falls back to `non_parcel_bunkers_motion`.
///
/// Returns the motion of the right mover and the left mover.
pub fn bunkers_storm_motion(
    snd: &Sounding,
    mu_result: &ParcelResult,
    effective_layer: Option<(HectoPascal, HectoPascal)>,
) -> Result<(WindUV<Knots>, WindUV<Knots>)> {
    let mu_cape = mu_result.cape().into_option();
    let mu_el = mu_result.el_height().into_option();

    match (mu_cape, mu_el, effective_layer) {
        (Some(cape), Some(el_agl), Some((bottom, _))) if cape > JpKg(100.0) => {
            let base = agl_from_msl(snd, height_for_pressure(snd, bottom)?)?;
            let depth = el_agl - base;
            let top_agl = base + Meters(depth.unpack() * 0.65);
            let top = pressure_for_height(snd, msl_from_agl(snd, top_agl)?)?;

            let mean = mean_wind(snd, bottom, top)?;
            let shear = wind_shear(snd, bottom, top)?;

            Ok(bunkers_deviation(mean, shear))
        }
        _ => {
            debug!("no effective inflow layer for Bunkers motion, using 0-6 km winds");
            non_parcel_bunkers_motion(snd)
        }
    }
}
