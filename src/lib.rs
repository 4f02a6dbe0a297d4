#![warn(missing_docs)]
//! Parcel lifting, stability, and severe weather parameters for atmospheric soundings.
//!
//! A `Sounding` is built from parallel columns of pressure, height, temperature, dew point, and
//! wind. From there parcels are chosen with `define_parcel`, lifted with `lift`, and the resulting
//! `ParcelResult` holds the LCL, LFC, EL, CAPE, CIN and friends. Wind routines cover layer mean
//! winds, shear, storm relative helicity, and Bunkers storm motion.
//!
//! Values that may be missing are stored in the `Optioned` type from the
//! [optional](https://crates.io/crates/optional) crate, and physical quantities use the unit types
//! from [metfor](https://crates.io/crates/metfor). Functions that can fail return a `Result` with
//! an `AnalysisError`. Most errors are "soft" and just mean a value couldn't be calculated from the
//! available data, see `AnalysisError::is_soft`.

//
// API
//
pub use crate::{
    config::{EffectiveLayerConfig, LiftConfig, SaturationConfig, MEAN_WIND_STEPS},
    error::{AnalysisError, Result},
    indexes::{
        cross_totals, k_index, precipitable_water, precipitable_water_layer, supercell_composite,
        total_totals, vertical_totals,
    },
    interpolation::{
        agl_from_msl, dewpoint_for_pressure, height_for_pressure, interpolate_by_height,
        interpolate_by_pressure, msl_from_agl, pressure_for_height, temperature_for_pressure,
        virtual_temperature_for_pressure, wind_components_for_pressure, Field,
    },
    layers::{bunkers_storm_motion, effective_inflow_layer, effective_inflow_layer_with},
    levels::temperature_level,
    parcel::{
        define_parcel, effective_layer_parcel, forecast_surface_parcel, max_temperature,
        mean_mixing_ratio, mean_theta, mixed_layer_parcel, most_unstable_parcel, surface_parcel,
        Parcel, ParcelFlag, ParcelSelection, DEFAULT_ML_DEPTH, DEFAULT_MU_DEPTH,
    },
    parcel_lift::{bulk_rich, lift, lift_layer, lift_with_config, ParcelResult},
    sounding::{Level, Sounding, StationInfo},
    utility::{
        celsius_to_fahrenheit, feet_to_meters, is_valid, knots_to_mps, meters_to_feet,
        mps_to_knots, MISSING,
    },
    wind::{
        helicity, max_wind, mean_wind, mean_wind_npw, mean_wind_npw_with, mean_wind_with,
        non_parcel_bunkers_motion, wind_shear,
    },
};

/// Thermodynamic formulas used for lifting parcels.
pub mod thermo;
/// Conversions between wind components and direction and speed.
pub mod vector;

//
// Internal use only
//
mod config;
mod error;
mod indexes;
mod interpolation;
mod layers;
mod levels;
mod parcel;
mod parcel_lift;
mod sounding;
mod utility;
mod wind;
