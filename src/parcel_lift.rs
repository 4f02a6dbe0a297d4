//! Lift a parcel and measure its buoyancy.
//!
//! The parcel is lifted dry adiabatically to its LCL and then moist adiabatically through every
//! level of the sounding above it. Along the way the positive and negative buoyant energy is
//! integrated, and the special levels (LFC, EL, MPL) and partial CAPE values are captured the first
//! time the ascent passes them.
use crate::{
    config::LiftConfig,
    error::{soft, AnalysisError, Result},
    interpolation::{height_for_pressure, msl_from_agl, pressure_for_height},
    parcel::Parcel,
    sounding::Sounding,
    utility::knots_to_mps,
    wind::mean_wind,
};
use metfor::{Celsius, CelsiusDiff, HectoPascal, JpKg, Meters, Quantity, WindUV};
use optional::{none, some, Optioned};

mod lift;

/// The analysis of a lifted parcel.
///
/// Every value is optional. A value that could not be found, because of missing data or because
/// the parcel never reached that level, is `none`.
#[derive(Debug, Clone)]
pub struct ParcelResult {
    parcel: Parcel,

    // The layer the parcel was lifted through
    lower: Optioned<HectoPascal>,
    upper: Optioned<HectoPascal>,

    lcl_pressure: Optioned<HectoPascal>,
    lcl_height: Optioned<Meters>,
    lcl_temperature: Optioned<Celsius>,
    lfc_pressure: Optioned<HectoPascal>,
    lfc_height: Optioned<Meters>,
    el_pressure: Optioned<HectoPascal>,
    el_height: Optioned<Meters>,
    mpl_pressure: Optioned<HectoPascal>,
    mpl_height: Optioned<Meters>,

    cape: Optioned<JpKg>,
    cin: Optioned<JpKg>,
    cape_3km: Optioned<JpKg>,
    cape_6km: Optioned<JpKg>,
    cape_freezing: Optioned<JpKg>,
    cape_m10c: Optioned<JpKg>,
    cape_m20c: Optioned<JpKg>,
    cape_m30c: Optioned<JpKg>,

    li5: Optioned<CelsiusDiff>,
    li3: Optioned<CelsiusDiff>,
    li_max: Optioned<CelsiusDiff>,
    li_max_pressure: Optioned<HectoPascal>,
    cap_strength: Optioned<CelsiusDiff>,
    cap_pressure: Optioned<HectoPascal>,

    brn_shear: Optioned<f64>,
    brn: Optioned<f64>,
}

impl ParcelResult {
    /// A result with every value missing.
    pub(crate) fn missing(parcel: Parcel) -> Self {
        ParcelResult {
            parcel,
            lower: none(),
            upper: none(),
            lcl_pressure: none(),
            lcl_height: none(),
            lcl_temperature: none(),
            lfc_pressure: none(),
            lfc_height: none(),
            el_pressure: none(),
            el_height: none(),
            mpl_pressure: none(),
            mpl_height: none(),
            cape: none(),
            cin: none(),
            cape_3km: none(),
            cape_6km: none(),
            cape_freezing: none(),
            cape_m10c: none(),
            cape_m20c: none(),
            cape_m30c: none(),
            li5: none(),
            li3: none(),
            li_max: none(),
            li_max_pressure: none(),
            cap_strength: none(),
            cap_pressure: none(),
            brn_shear: none(),
            brn: none(),
        }
    }

    /// The parcel that was lifted.
    #[inline]
    pub fn parcel(&self) -> &Parcel {
        &self.parcel
    }

    /// Pressure at the bottom of the layer the energy was integrated over.
    #[inline]
    pub fn lower(&self) -> Optioned<HectoPascal> {
        self.lower
    }

    /// Pressure at the top of the layer the energy was integrated over.
    #[inline]
    pub fn upper(&self) -> Optioned<HectoPascal> {
        self.upper
    }

    /// Pressure at the lifting condensation level.
    #[inline]
    pub fn lcl_pressure(&self) -> Optioned<HectoPascal> {
        self.lcl_pressure
    }

    /// Height of the lifting condensation level above ground level.
    #[inline]
    pub fn lcl_height(&self) -> Optioned<Meters> {
        self.lcl_height
    }

    /// Temperature of the parcel at the lifting condensation level.
    #[inline]
    pub fn lcl_temperature(&self) -> Optioned<Celsius> {
        self.lcl_temperature
    }

    /// Pressure at the level of free convection.
    #[inline]
    pub fn lfc_pressure(&self) -> Optioned<HectoPascal> {
        self.lfc_pressure
    }

    /// Height of the level of free convection above ground level.
    #[inline]
    pub fn lfc_height(&self) -> Optioned<Meters> {
        self.lfc_height
    }

    /// Pressure at the equilibrium level.
    #[inline]
    pub fn el_pressure(&self) -> Optioned<HectoPascal> {
        self.el_pressure
    }

    /// Height of the equilibrium level above ground level.
    #[inline]
    pub fn el_height(&self) -> Optioned<Meters> {
        self.el_height
    }

    /// Pressure at the maximum parcel level.
    #[inline]
    pub fn mpl_pressure(&self) -> Optioned<HectoPascal> {
        self.mpl_pressure
    }

    /// Height of the maximum parcel level above ground level.
    #[inline]
    pub fn mpl_height(&self) -> Optioned<Meters> {
        self.mpl_height
    }

    /// Convective available potential energy.
    #[inline]
    pub fn cape(&self) -> Optioned<JpKg> {
        self.cape
    }

    /// Convective inhibition, zero or negative.
    #[inline]
    pub fn cin(&self) -> Optioned<JpKg> {
        self.cin
    }

    /// CAPE below 3 km above ground level.
    #[inline]
    pub fn cape_3km(&self) -> Optioned<JpKg> {
        self.cape_3km
    }

    /// CAPE below 6 km above ground level.
    #[inline]
    pub fn cape_6km(&self) -> Optioned<JpKg> {
        self.cape_6km
    }

    /// CAPE below the freezing level.
    #[inline]
    pub fn cape_freezing(&self) -> Optioned<JpKg> {
        self.cape_freezing
    }

    /// CAPE below the -10C level.
    #[inline]
    pub fn cape_m10c(&self) -> Optioned<JpKg> {
        self.cape_m10c
    }

    /// CAPE below the -20C level.
    #[inline]
    pub fn cape_m20c(&self) -> Optioned<JpKg> {
        self.cape_m20c
    }

    /// CAPE below the -30C level.
    #[inline]
    pub fn cape_m30c(&self) -> Optioned<JpKg> {
        self.cape_m30c
    }

    /// Lifted index at 500 hPa, environment minus parcel.
    #[inline]
    pub fn li5(&self) -> Optioned<CelsiusDiff> {
        self.li5
    }

    /// Lifted index at 300 hPa, environment minus parcel.
    #[inline]
    pub fn li3(&self) -> Optioned<CelsiusDiff> {
        self.li3
    }

    /// The most negative lifted index below the equilibrium level.
    #[inline]
    pub fn li_max(&self) -> Optioned<CelsiusDiff> {
        self.li_max
    }

    /// Pressure of the most negative lifted index.
    #[inline]
    pub fn li_max_pressure(&self) -> Optioned<HectoPascal> {
        self.li_max_pressure
    }

    /// The largest amount the environment is warmer than the parcel below the LFC.
    #[inline]
    pub fn cap_strength(&self) -> Optioned<CelsiusDiff> {
        self.cap_strength
    }

    /// Pressure of the strongest cap.
    #[inline]
    pub fn cap_pressure(&self) -> Optioned<HectoPascal> {
        self.cap_pressure
    }

    /// The shear term of the bulk Richardson number, m<sup>2</sup> s<sup>-2</sup>.
    #[inline]
    pub fn brn_shear(&self) -> Optioned<f64> {
        self.brn_shear
    }

    /// Bulk Richardson number.
    #[inline]
    pub fn brn(&self) -> Optioned<f64> {
        self.brn
    }
}

/// Lift a parcel through the whole sounding.
///
/// # Examples
///
/// ```rust
/// use metfor::{HectoPascal, JpKg};
/// use sounding_params::{define_parcel, lift, ParcelSelection, Sounding};
///
/// let snd = Sounding::from_raw_columns(
///     "", "",
///     &[1000.0, 925.0, 850.0, 700.0, 500.0, 300.0, 200.0, 150.0],
///     &[0.0, 700.0, 1450.0, 3050.0, 5700.0, 9300.0, 11900.0, 13700.0],
///     &[30.0, 24.0, 19.0, 8.0, -10.0, -38.0, -58.0, -56.0],
///     &[22.0, 18.0, 12.0, -2.0, -25.0, -55.0, -75.0, -80.0],
///     &[180.0, 200.0, 220.0, 250.0, 270.0, 270.0, 270.0, 270.0],
///     &[10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 60.0],
/// ).unwrap();
///
/// let pcl = define_parcel(&snd, ParcelSelection::ObservedSurface).unwrap();
/// let res = lift(&snd, &pcl).unwrap();
///
/// let lcl = res.lcl_pressure().unwrap();
/// assert!(lcl < HectoPascal(1000.0) && lcl > HectoPascal(850.0));
/// assert!(res.cape().unwrap() > JpKg(0.0));
/// ```
#[inline]
pub fn lift(snd: &Sounding, parcel: &Parcel) -> Result<ParcelResult> {
    lift_with_config(snd, parcel, None, None, &LiftConfig::default())
}

/// Lift a parcel, but only integrate the buoyant energy between `lower` and `upper`.
///
/// A `None` for `lower` means the surface, and for `upper` means the top of the sounding.
#[inline]
pub fn lift_layer(
    snd: &Sounding,
    parcel: &Parcel,
    lower: Option<HectoPascal>,
    upper: Option<HectoPascal>,
) -> Result<ParcelResult> {
    lift_with_config(snd, parcel, lower, upper, &LiftConfig::default())
}

/// Lift a parcel with explicit settings for the stepped searches.
///
/// Unusable input (a single level sounding, a parcel with its dew point above its temperature, no
/// data at the bottom or top of the layer) gives a result with every value missing. If the
/// environment is missing at the LCL, e.g. no heights, only the LCL pressure and temperature are
/// filled in. An LCL above the top of the sounding gives zero CAPE and CIN. Errors are only
/// returned when one of the stepped searches gives up.
pub fn lift_with_config(
    snd: &Sounding,
    parcel: &Parcel,
    lower: Option<HectoPascal>,
    upper: Option<HectoPascal>,
    cfg: &LiftConfig,
) -> Result<ParcelResult> {
    lift::lift_parcel(snd, parcel, lower, upper, cfg)
}

/// The bulk Richardson number shear term and number for a parcel with the given CAPE.
///
/// For surface based parcels the shear is taken between the mean winds of the lowest 500 m and the
/// lowest 6 km. Elevated parcels use a layer starting 500 m below the parcel instead. Returns the
/// shear term, 0.5 |&Delta;V|<sup>2</sup> in m<sup>2</sup> s<sup>-2</sup>, and the number, which
/// is missing if there is no shear.
pub fn bulk_rich(snd: &Sounding, parcel: &Parcel, cape: JpKg) -> Result<(f64, Optioned<f64>)> {
    let sfc_p = snd
        .surface_pressure()
        .into_option()
        .ok_or(AnalysisError::MissingValue)?;

    let (bottom, top) = if parcel.flag.is_surface_based() {
        let top = pressure_for_height(snd, msl_from_agl(snd, Meters(6000.0))?)?;
        (sfc_p, top)
    } else {
        let h_parcel = height_for_pressure(snd, parcel.pressure)?;
        let bottom = soft(pressure_for_height(snd, h_parcel - Meters(500.0)))?
            .filter(|&p| p <= sfc_p)
            .unwrap_or(sfc_p);
        let h_bottom = height_for_pressure(snd, bottom)?;
        let top = pressure_for_height(snd, h_bottom + Meters(6000.0))?;
        (bottom, top)
    };

    let p500m = pressure_for_height(snd, height_for_pressure(snd, bottom)? + Meters(500.0))?;

    let WindUV { u: u_low, v: v_low } = mean_wind(snd, bottom, p500m)?;
    let WindUV { u: u_deep, v: v_deep } = mean_wind(snd, bottom, top)?;

    let du = (knots_to_mps(u_deep) - knots_to_mps(u_low)).unpack();
    let dv = (knots_to_mps(v_deep) - knots_to_mps(v_low)).unpack();
    let brn_shear = 0.5 * (du * du + dv * dv);

    let brn = if brn_shear > 0.0 {
        some(cape.unpack() / brn_shear)
    } else {
        none()
    };

    Ok((brn_shear, brn))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        parcel::{define_parcel, ParcelFlag, ParcelSelection},
        utility::test_tools::approx_equal,
    };

    fn make_sounding() -> Sounding {
        Sounding::from_raw_columns(
            "",
            "",
            &[1000.0, 925.0, 850.0, 700.0, 500.0, 300.0, 200.0, 150.0],
            &[0.0, 700.0, 1450.0, 3050.0, 5700.0, 9300.0, 11900.0, 13700.0],
            &[30.0, 24.0, 19.0, 8.0, -10.0, -38.0, -58.0, -56.0],
            &[22.0, 18.0, 12.0, -2.0, -25.0, -55.0, -75.0, -80.0],
            &[180.0, 200.0, 220.0, 250.0, 270.0, 270.0, 270.0, 270.0],
            &[10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 60.0],
        )
        .unwrap()
    }

    #[test]
    fn test_lift_surface_parcel() {
        let snd = make_sounding();
        let pcl = define_parcel(&snd, ParcelSelection::ObservedSurface).unwrap();
        let res = lift(&snd, &pcl).unwrap();

        let (lcl_p, lcl_t) = crate::thermo::dry_lift(pcl.pressure, pcl.temperature, pcl.dew_point)
            .unwrap();
        assert_eq!(res.lcl_pressure().unwrap(), lcl_p);
        assert_eq!(res.lcl_temperature().unwrap(), lcl_t);

        let cape = res.cape().unwrap();
        let cin = res.cin().unwrap();
        println!("cape = {:?} cin = {:?}", cape, cin);
        assert!(cape > JpKg(0.0));
        assert!(cin <= JpKg(0.0));

        let lfc = res.lfc_pressure().unwrap();
        let el = res.el_pressure().unwrap();
        assert!(lfc <= lcl_p);
        assert!(el < lfc);

        // Partial CAPE values can't be bigger than the whole thing.
        for partial in &[res.cape_3km(), res.cape_6km(), res.cape_freezing()] {
            let partial = partial.unwrap();
            assert!(partial <= cape);
            assert!(partial >= JpKg(0.0));
        }
        assert!(res.cape_3km().unwrap() <= res.cape_6km().unwrap());

        // Unstable at 500 hPa
        assert!(res.li5().unwrap() < CelsiusDiff(0.0));
        assert!(res.li_max().unwrap().unpack() <= res.li5().unwrap().unpack() + 1.0e-6);
    }

    #[test]
    fn test_lift_supersaturated_parcel() {
        let snd = make_sounding();
        let pcl = Parcel::new(
            HectoPascal(1000.0),
            Celsius(20.0),
            Celsius(25.0),
            ParcelFlag::User,
        );
        let res = lift(&snd, &pcl).unwrap();
        assert_eq!(*res.parcel(), pcl);
        assert!(res.lcl_pressure().is_none());
        assert!(res.cape().is_none());
        assert!(res.cin().is_none());
        assert!(res.lfc_pressure().is_none());
        assert!(res.li5().is_none());
    }

    #[test]
    fn test_lift_layer() {
        let snd = make_sounding();
        let pcl = define_parcel(&snd, ParcelSelection::ObservedSurface).unwrap();

        let full = lift(&snd, &pcl).unwrap();
        let part = lift_layer(&snd, &pcl, None, Some(HectoPascal(500.0))).unwrap();

        assert_eq!(part.upper().unwrap(), HectoPascal(500.0));
        assert!(part.cape().unwrap() < full.cape().unwrap());

        // The special levels don't depend on the layer
        assert_eq!(
            part.lfc_pressure().into_option(),
            full.lfc_pressure().into_option()
        );
        assert_eq!(
            part.el_pressure().into_option(),
            full.el_pressure().into_option()
        );
    }

    #[test]
    fn test_bulk_rich() {
        let snd = make_sounding();
        let pcl = define_parcel(&snd, ParcelSelection::ObservedSurface).unwrap();

        let (shear, brn) = bulk_rich(&snd, &pcl, JpKg(2000.0)).unwrap();
        assert!(shear > 0.0);
        assert!(approx_equal(brn.unwrap(), 2000.0 / shear, 1.0e-10));

        // Calm winds have no shear.
        let snd = snd
            .with_u_wind_profile(vec![optional::some(metfor::Knots(0.0)); 8])
            .with_v_wind_profile(vec![optional::some(metfor::Knots(0.0)); 8]);
        let (shear, brn) = bulk_rich(&snd, &pcl, JpKg(2000.0)).unwrap();
        assert!(approx_equal(shear, 0.0, 1.0e-12));
        assert!(brn.is_none());
    }
}
