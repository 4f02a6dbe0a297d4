//! Define the parcels used in parcel analysis.
//!
//! Every way of choosing a parcel is a plain function of the sounding. `define_parcel` dispatches
//! on a `ParcelSelection` to pick one.
use crate::{
    config::EffectiveLayerConfig,
    error::{soft, AnalysisError, Result},
    interpolation::{dewpoint_for_pressure, temperature_for_pressure},
    layers::effective_inflow_layer,
    sounding::Sounding,
    thermo,
};
use log::debug;
use metfor::{Celsius, HectoPascal, Quantity};
use optional::{none, some, Optioned};
use strum_macros::{Display, EnumIter};

/// Default depth of the layer searched for the most unstable parcel.
pub const DEFAULT_MU_DEPTH: HectoPascal = HectoPascal(300.0);

/// Default depth of the mixed layer.
pub const DEFAULT_ML_DEPTH: HectoPascal = HectoPascal(100.0);

/// How a parcel was chosen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, Display)]
pub enum ParcelFlag {
    /// The surface level of the sounding.
    #[strum(serialize = "Surface Parcel")]
    ObservedSurface,
    /// The surface with the forecast maximum temperature.
    #[strum(serialize = "Forecast Surface Parcel")]
    ForecastSurface,
    /// The parcel with the highest wet bulb potential temperature near the surface.
    #[strum(serialize = "Most Unstable Parcel")]
    MostUnstable,
    /// The mean of the lowest part of the sounding.
    #[strum(serialize = "Mixed Layer Parcel")]
    MixedLayer,
    /// Supplied by the user.
    #[strum(serialize = "User Defined Parcel")]
    User,
    /// The mean of the effective inflow layer.
    #[strum(serialize = "Mean Effective Layer Parcel")]
    Effective,
}

impl ParcelFlag {
    /// Whether this parcel starts at (or is tied to) the surface, as opposed to being an elevated
    /// or layer mean parcel.
    #[inline]
    pub fn is_surface_based(self) -> bool {
        use ParcelFlag::*;

        match self {
            ObservedSurface | ForecastSurface | MostUnstable => true,
            MixedLayer | User | Effective => false,
        }
    }
}

/// Instructions for `define_parcel`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParcelSelection {
    /// Use the surface level of the sounding.
    ObservedSurface,
    /// Use the surface pressure with the forecast maximum temperature and the mean mixing ratio of
    /// the lowest 100 hPa.
    ForecastSurface,
    /// Search this deep a layer above the surface for the most unstable parcel.
    MostUnstable {
        /// Depth of the layer to search.
        depth: HectoPascal,
    },
    /// Mix this deep a layer above the surface.
    MixedLayer {
        /// Depth of the layer to mix.
        depth: HectoPascal,
    },
    /// Use these values.
    User {
        /// Pressure of the parcel.
        pressure: HectoPascal,
        /// Temperature of the parcel.
        temperature: Celsius,
        /// Dew point of the parcel.
        dew_point: Celsius,
    },
    /// Mix the effective inflow layer.
    ///
    /// If there is no effective inflow layer the observed surface parcel is used instead, and it
    /// keeps the `ParcelFlag::ObservedSurface` flag.
    Effective,
}

impl ParcelSelection {
    /// The most unstable parcel in the lowest 300 hPa.
    pub const MOST_UNSTABLE: ParcelSelection = ParcelSelection::MostUnstable {
        depth: DEFAULT_MU_DEPTH,
    };

    /// The lowest 100 hPa mixed layer parcel.
    pub const MIXED_LAYER: ParcelSelection = ParcelSelection::MixedLayer {
        depth: DEFAULT_ML_DEPTH,
    };

    /// The flag a parcel chosen this way will carry.
    #[inline]
    pub fn flag(&self) -> ParcelFlag {
        match self {
            ParcelSelection::ObservedSurface => ParcelFlag::ObservedSurface,
            ParcelSelection::ForecastSurface => ParcelFlag::ForecastSurface,
            ParcelSelection::MostUnstable { .. } => ParcelFlag::MostUnstable,
            ParcelSelection::MixedLayer { .. } => ParcelFlag::MixedLayer,
            ParcelSelection::User { .. } => ParcelFlag::User,
            ParcelSelection::Effective => ParcelFlag::Effective,
        }
    }
}

/// Variables defining a parcel as used in parcel analysis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Parcel {
    /// Pressure in hPa
    pub pressure: HectoPascal,
    /// Temperature in C
    pub temperature: Celsius,
    /// Dew point in C
    pub dew_point: Celsius,
    /// How the parcel was chosen.
    pub flag: ParcelFlag,
    /// Depth of the layer used to define the parcel, if any.
    pub depth: Optioned<HectoPascal>,
    /// The bottom and top of the effective inflow layer for an effective layer parcel.
    pub effective_layer: Option<(HectoPascal, HectoPascal)>,
}

impl Parcel {
    /// Create a parcel with no layer information.
    #[inline]
    pub fn new(
        pressure: HectoPascal,
        temperature: Celsius,
        dew_point: Celsius,
        flag: ParcelFlag,
    ) -> Self {
        Parcel {
            pressure,
            temperature,
            dew_point,
            flag,
            depth: none(),
            effective_layer: None,
        }
    }

    /// Get the potential temperature of the parcel.
    #[inline]
    pub fn theta(&self) -> Result<Celsius> {
        thermo::theta(self.pressure, self.temperature, HectoPascal(1000.0))
    }

    /// Get the mixing ratio (g/kg) of the parcel.
    #[inline]
    pub fn mixing_ratio(&self) -> Result<f64> {
        thermo::mixing_ratio(self.pressure, self.dew_point)
    }

    /// Get the virtual temperature of the parcel.
    #[inline]
    pub fn virtual_temperature(&self) -> Result<Celsius> {
        thermo::virtual_temperature(self.pressure, self.temperature, self.dew_point)
    }

    /// Whether the dew point is higher than the temperature.
    #[inline]
    pub fn is_supersaturated(&self) -> bool {
        self.dew_point > self.temperature
    }
}

/// Define a parcel.
///
/// The returned parcel's `flag` says how it was actually chosen. That is always
/// `selection.flag()`, except for `ParcelSelection::Effective` on a sounding without an effective
/// inflow layer. Then this is the observed surface parcel, flagged `ParcelFlag::ObservedSurface`
/// with no `effective_layer`, and anything computed from it (e.g. the bulk Richardson number) is
/// for a surface based parcel.
///
/// # Examples
///
/// ```rust
/// use metfor::HectoPascal;
/// use sounding_params::{define_parcel, ParcelFlag, ParcelSelection, Sounding};
///
/// let snd = Sounding::from_raw_columns(
///     "", "",
///     &[1000.0, 925.0, 850.0, 700.0, 500.0],
///     &[100.0, 760.0, 1480.0, 3060.0, 5700.0],
///     &[25.0, 20.0, 15.0, 4.0, -12.0],
///     &[18.0, 15.0, 10.0, -2.0, -25.0],
///     &[180.0, 200.0, 220.0, 250.0, 270.0],
///     &[10.0, 20.0, 30.0, 40.0, 50.0],
/// ).unwrap();
///
/// let sfc = define_parcel(&snd, ParcelSelection::ObservedSurface).unwrap();
/// assert_eq!(sfc.pressure, HectoPascal(1000.0));
///
/// let ml = define_parcel(&snd, ParcelSelection::MIXED_LAYER).unwrap();
/// assert_eq!(ml.flag, ParcelFlag::MixedLayer);
/// assert_eq!(ml.depth.unwrap(), HectoPascal(100.0));
/// ```
pub fn define_parcel(snd: &Sounding, selection: ParcelSelection) -> Result<Parcel> {
    match selection {
        ParcelSelection::ObservedSurface => surface_parcel(snd),
        ParcelSelection::ForecastSurface => forecast_surface_parcel(snd),
        ParcelSelection::MostUnstable { depth } => most_unstable_parcel(snd, depth),
        ParcelSelection::MixedLayer { depth } => mixed_layer_parcel(snd, depth),
        ParcelSelection::User {
            pressure,
            temperature,
            dew_point,
        } => Ok(Parcel::new(pressure, temperature, dew_point, ParcelFlag::User)),
        ParcelSelection::Effective => effective_layer_parcel(snd, &EffectiveLayerConfig::default()),
    }
}

/// Get the surface parcel.
pub fn surface_parcel(snd: &Sounding) -> Result<Parcel> {
    let sfc = snd.surface_level().ok_or(AnalysisError::NotEnoughData)?;

    let pressure = sfc.pressure.ok_or(AnalysisError::MissingValue)?;
    let temperature = sfc.temperature.ok_or(AnalysisError::MissingValue)?;
    let dew_point = sfc.dew_point.ok_or(AnalysisError::MissingValue)?;

    Ok(Parcel::new(
        pressure,
        temperature,
        dew_point,
        ParcelFlag::ObservedSurface,
    ))
}

/// Get the forecast surface parcel.
///
/// This uses the forecast maximum temperature (see `max_temperature`) and the mean mixing ratio of
/// the lowest 100 hPa for the dew point.
pub fn forecast_surface_parcel(snd: &Sounding) -> Result<Parcel> {
    let sfc_p = surface_pressure(snd)?;
    let top_p = sfc_p - DEFAULT_ML_DEPTH;

    let temperature = max_temperature(snd, DEFAULT_ML_DEPTH)?;
    let mw = mean_mixing_ratio(snd, sfc_p, top_p)?;
    let dew_point = thermo::temperature_at_mixing_ratio(mw, sfc_p)?;

    Ok(Parcel {
        depth: some(DEFAULT_ML_DEPTH),
        ..Parcel::new(sfc_p, temperature, dew_point, ParcelFlag::ForecastSurface)
    })
}

/// Forecast maximum surface temperature.
///
/// The temperature `mix_depth` above the surface, warmed by 2 K and brought dry adiabatically to
/// the surface.
pub fn max_temperature(snd: &Sounding, mix_depth: HectoPascal) -> Result<Celsius> {
    let sfc_p = surface_pressure(snd)?;
    let top_p = sfc_p - mix_depth;

    let t = temperature_for_pressure(snd, top_p)?;
    thermo::theta(top_p, Celsius(t.unpack() + 2.0), sfc_p)
}

/// Get the most unstable parcel.
///
/// This is the parcel with the highest wet bulb potential temperature in the layer from the
/// surface to `depth` above it, searched in 1 hPa steps. If there are ties the lowest one wins.
pub fn most_unstable_parcel(snd: &Sounding, depth: HectoPascal) -> Result<Parcel> {
    let sfc_p = surface_pressure(snd)?;
    let top_p = layer_top(snd, sfc_p, depth)?;

    let mut best: Option<(HectoPascal, Celsius, Celsius, f64)> = None;
    for p in pressure_steps(sfc_p, top_p) {
        let (t, td) = match (
            temperature_for_pressure(snd, p),
            dewpoint_for_pressure(snd, p),
        ) {
            (Ok(t), Ok(td)) => (t, td),
            _ => continue,
        };

        let thw = match soft(thermo::theta_w(p, t, td))? {
            Some(thw) => thw.unpack(),
            None => continue,
        };

        if best.map(|(_, _, _, max)| thw > max).unwrap_or(true) {
            best = Some((p, t, td, thw));
        }
    }

    let (pressure, temperature, dew_point, _) = best.ok_or(AnalysisError::NotEnoughData)?;

    Ok(Parcel {
        depth: some(depth),
        ..Parcel::new(pressure, temperature, dew_point, ParcelFlag::MostUnstable)
    })
}

/// Get a mixed layer parcel.
///
/// The parcel starts at the surface pressure with the mean potential temperature and mean mixing
/// ratio of the layer from the surface to `depth` above it.
pub fn mixed_layer_parcel(snd: &Sounding, depth: HectoPascal) -> Result<Parcel> {
    let sfc_p = surface_pressure(snd)?;
    let top_p = layer_top(snd, sfc_p, depth)?;

    let (temperature, dew_point) = mixed_values(snd, sfc_p, top_p, sfc_p)?;

    Ok(Parcel {
        depth: some(depth),
        ..Parcel::new(sfc_p, temperature, dew_point, ParcelFlag::MixedLayer)
    })
}

/// Get the mean effective layer parcel.
///
/// The parcel is at the middle of the effective inflow layer with its mean potential temperature
/// and mean mixing ratio. When there is no effective inflow layer this falls back to the surface
/// parcel, which is flagged `ParcelFlag::ObservedSurface`.
pub fn effective_layer_parcel(snd: &Sounding, cfg: &EffectiveLayerConfig) -> Result<Parcel> {
    let (bottom, top) = match soft(effective_inflow_layer(snd, cfg))? {
        Some(layer) => layer,
        None => {
            debug!("no effective inflow layer, falling back to the surface parcel");
            return surface_parcel(snd);
        }
    };

    let mid_p = HectoPascal((bottom.unpack() + top.unpack()) / 2.0);
    let (temperature, dew_point) = mixed_values(snd, bottom, top, mid_p)?;

    Ok(Parcel {
        depth: some(bottom - top),
        effective_layer: Some((bottom, top)),
        ..Parcel::new(mid_p, temperature, dew_point, ParcelFlag::Effective)
    })
}

/// Pressure weighted mean potential temperature of a layer, sampled every 1 hPa.
pub fn mean_theta(snd: &Sounding, bottom: HectoPascal, top: HectoPascal) -> Result<Celsius> {
    layer_mean(bottom, top, |p| {
        let t = temperature_for_pressure(snd, p)?;
        thermo::theta(p, t, HectoPascal(1000.0)).map(Quantity::unpack)
    })
    .map(Celsius)
}

/// Pressure weighted mean mixing ratio (g/kg) of a layer, sampled every 1 hPa.
pub fn mean_mixing_ratio(snd: &Sounding, bottom: HectoPascal, top: HectoPascal) -> Result<f64> {
    layer_mean(bottom, top, |p| {
        let td = dewpoint_for_pressure(snd, p)?;
        thermo::mixing_ratio(p, td)
    })
}

/// Temperature and dew point at `p` for air with the mean potential temperature and mixing ratio of
/// a layer.
fn mixed_values(
    snd: &Sounding,
    bottom: HectoPascal,
    top: HectoPascal,
    p: HectoPascal,
) -> Result<(Celsius, Celsius)> {
    let theta = mean_theta(snd, bottom, top)?;
    let mw = mean_mixing_ratio(snd, bottom, top)?;

    let temperature = thermo::theta(HectoPascal(1000.0), theta, p)?;
    let dew_point = thermo::temperature_at_mixing_ratio(mw, p)?;

    Ok((temperature, dew_point))
}

fn layer_mean<F>(bottom: HectoPascal, top: HectoPascal, f: F) -> Result<f64>
where
    F: Fn(HectoPascal) -> Result<f64>,
{
    if !(bottom > top) {
        return Err(AnalysisError::InvalidInput);
    }

    let (sum, weight) = pressure_steps(bottom, top)
        .map(|p| f(p).map(|val| (val * p.unpack(), p.unpack())))
        .try_fold((0.0, 0.0), |(sum, weight), res| {
            res.map(|(val, p)| (sum + val, weight + p))
        })?;

    Ok(sum / weight)
}

/// Pressures from `bottom` to `top` in 1 hPa steps, both ends included.
pub(crate) fn pressure_steps(
    bottom: HectoPascal,
    top: HectoPascal,
) -> impl Iterator<Item = HectoPascal> {
    let (bottom, top) = (bottom.unpack(), top.unpack());
    let n = (bottom - top).max(0.0).floor() as usize;
    let last = if bottom - n as f64 > top {
        Some(HectoPascal(top))
    } else {
        None
    };

    (0..=n)
        .map(move |i| HectoPascal(bottom - i as f64))
        .chain(last)
}

fn surface_pressure(snd: &Sounding) -> Result<HectoPascal> {
    snd.surface_pressure()
        .into_option()
        .ok_or(AnalysisError::MissingValue)
}

/// Top of a layer `depth` deep starting at `bottom`, but no higher than the top of the sounding.
fn layer_top(snd: &Sounding, bottom: HectoPascal, depth: HectoPascal) -> Result<HectoPascal> {
    if !(depth > HectoPascal(0.0)) {
        return Err(AnalysisError::InvalidInput);
    }

    let top = bottom - depth;
    let snd_top = snd
        .top_pressure()
        .into_option()
        .ok_or(AnalysisError::MissingValue)?;

    Ok(if top < snd_top { snd_top } else { top })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::utility::{test_tools::approx_equal, MISSING};
    use strum::IntoEnumIterator;

    fn make_sounding() -> Sounding {
        Sounding::from_raw_columns(
            "",
            "",
            &[1000.0, 925.0, 850.0, 700.0, 500.0, 300.0],
            &[100.0, 760.0, 1480.0, 3060.0, 5700.0, 9100.0],
            &[25.0, 20.0, 15.0, 4.0, -12.0, -40.0],
            &[18.0, 19.0, 10.0, -2.0, -25.0, -55.0],
            &[180.0, 200.0, 220.0, 250.0, 270.0, 280.0],
            &[10.0, 20.0, 30.0, 40.0, 50.0, 60.0],
        )
        .unwrap()
    }

    #[test]
    fn test_flags() {
        for flag in ParcelFlag::iter() {
            println!("{}", flag);
        }
        assert_eq!(ParcelFlag::MostUnstable.to_string(), "Most Unstable Parcel");
        assert!(ParcelFlag::ObservedSurface.is_surface_based());
        assert!(!ParcelFlag::MixedLayer.is_surface_based());
        assert_eq!(ParcelSelection::MOST_UNSTABLE.flag(), ParcelFlag::MostUnstable);
    }

    #[test]
    fn test_pressure_steps() {
        let steps: Vec<_> = pressure_steps(HectoPascal(1000.0), HectoPascal(997.5)).collect();
        assert_eq!(
            steps,
            vec![
                HectoPascal(1000.0),
                HectoPascal(999.0),
                HectoPascal(998.0),
                HectoPascal(997.5)
            ]
        );

        let steps: Vec<_> = pressure_steps(HectoPascal(1000.0), HectoPascal(998.0)).collect();
        assert_eq!(steps.len(), 3);
    }

    #[test]
    fn test_surface_and_user() {
        let snd = make_sounding();
        let pcl = define_parcel(&snd, ParcelSelection::ObservedSurface).unwrap();
        assert_eq!(pcl.pressure, HectoPascal(1000.0));
        assert_eq!(pcl.temperature, Celsius(25.0));
        assert_eq!(pcl.dew_point, Celsius(18.0));
        assert!(pcl.depth.is_none());

        let sel = ParcelSelection::User {
            pressure: HectoPascal(850.0),
            temperature: Celsius(10.0),
            dew_point: Celsius(5.0),
        };
        let pcl = define_parcel(&snd, sel).unwrap();
        assert_eq!(pcl.flag, ParcelFlag::User);
        assert_eq!(pcl.pressure, HectoPascal(850.0));
    }

    #[test]
    fn test_most_unstable() {
        let snd = make_sounding();
        let pcl = define_parcel(&snd, ParcelSelection::MOST_UNSTABLE).unwrap();

        // The moist layer at 925 hPa has the highest wet bulb potential temperature.
        assert_eq!(pcl.pressure, HectoPascal(925.0));
        assert_eq!(pcl.temperature, Celsius(20.0));
        assert_eq!(pcl.dew_point, Celsius(19.0));
        assert_eq!(pcl.depth.unwrap(), HectoPascal(300.0));
    }

    #[test]
    fn test_mixed_layer() {
        let snd = make_sounding();
        let pcl = define_parcel(&snd, ParcelSelection::MIXED_LAYER).unwrap();

        assert_eq!(pcl.pressure, HectoPascal(1000.0));
        // Potential temperature increases with height in this layer, so mixing warms the bottom.
        assert!(approx_equal(pcl.temperature.unpack(), 26.07, 0.01));
        assert!(approx_equal(pcl.dew_point.unpack(), 19.19, 0.01));

        let theta = mean_theta(&snd, HectoPascal(1000.0), HectoPascal(900.0)).unwrap();
        assert!(approx_equal(pcl.theta().unwrap().unpack(), theta.unpack(), 1.0e-6));

        assert_eq!(
            mean_theta(&snd, HectoPascal(900.0), HectoPascal(1000.0)),
            Err(AnalysisError::InvalidInput)
        );
    }

    #[test]
    fn test_forecast_surface() {
        let snd = make_sounding();
        let pcl = define_parcel(&snd, ParcelSelection::ForecastSurface).unwrap();

        let expected = thermo::theta(
            HectoPascal(900.0),
            Celsius(temperature_for_pressure(&snd, HectoPascal(900.0)).unwrap().unpack() + 2.0),
            HectoPascal(1000.0),
        )
        .unwrap();

        assert_eq!(pcl.pressure, HectoPascal(1000.0));
        assert!(approx_equal(pcl.temperature.unpack(), expected.unpack(), 1.0e-10));
        assert_eq!(pcl.flag, ParcelFlag::ForecastSurface);
    }

    #[test]
    fn test_missing_surface() {
        let snd = Sounding::from_raw_uv_columns(
            "",
            "",
            &[1000.0, 900.0],
            &[0.0, 1000.0],
            &[20.0, 10.0],
            &[MISSING, 5.0],
            &[0.0, 0.0],
            &[0.0, 0.0],
        )
        .unwrap();

        assert_eq!(
            define_parcel(&snd, ParcelSelection::ObservedSurface),
            Err(AnalysisError::MissingValue)
        );
    }
}
