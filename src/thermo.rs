//! Thermodynamic routines for lifting parcels.
//!
//! Moist adiabats are computed with the Wobus function, an empirical polynomial fit that gives the
//! difference between the potential temperature and the saturated potential temperature of a
//! parcel. The polynomial coefficients must not be changed, every CAPE value in the crate depends
//! on them.
//!
//! All of these take their arguments as raw quantities and run them through
//! `utility::is_valid`, so passing the `MISSING` sentinel results in `AnalysisError::MissingValue`.
use crate::{
    config::SaturationConfig,
    error::{AnalysisError, Result},
    utility::is_valid,
};
use metfor::{Celsius, HectoPascal, Quantity};

/// Gas constant for dry air divided by the specific heat at constant pressure.
pub const ROCP: f64 = 0.28571426;
/// Zero Celsius in Kelvin.
pub const ZEROCNK: f64 = 273.15;
/// Acceleration due to gravity (m s<sup>-2</sup>).
pub const G: f64 = 9.80665;
/// Ratio of the gas constants of dry air and water vapor.
const EPS: f64 = 0.62197;

macro_rules! check_valid {
    ($($val:expr),+) => {
        if !($(is_valid($val))&&+) {
            return Err(AnalysisError::MissingValue);
        }
    };
}

/// Potential temperature (C) of a parcel brought from pressure `p` to the reference pressure
/// `p_ref`, usually 1000 hPa.
#[inline]
pub fn theta(p: HectoPascal, t: Celsius, p_ref: HectoPascal) -> Result<Celsius> {
    let (p, t, p_ref) = (p.unpack(), t.unpack(), p_ref.unpack());
    check_valid!(p, t, p_ref);
    if p <= 0.0 {
        return Err(AnalysisError::InvalidInput);
    }

    Ok(Celsius((t + ZEROCNK) * (p_ref / p).powf(ROCP) - ZEROCNK))
}

/// Temperature of a parcel at its lifting condensation level.
#[inline]
pub fn lcl_temperature(t: Celsius, td: Celsius) -> Result<Celsius> {
    let (t, td) = (t.unpack(), td.unpack());
    check_valid!(t, td);

    let s = t - td;
    let dlt = s * (1.2185 + 0.001278 * t + s * (-0.00219 + 1.173e-5 * s - 0.0000052 * t));

    Ok(Celsius(t - dlt))
}

/// The pressure level where a parcel with potential temperature `theta` (C) has temperature `t`.
#[inline]
pub fn pressure_at_theta(theta: Celsius, t: Celsius) -> Result<HectoPascal> {
    let (theta, t) = (theta.unpack(), t.unpack());
    check_valid!(theta, t);

    let tk = t + ZEROCNK;
    let thk = theta + ZEROCNK;
    if tk <= 0.0 || thk <= 0.0 {
        return Err(AnalysisError::InvalidInput);
    }

    Ok(HectoPascal(1000.0 / (thk / tk).powf(1.0 / ROCP)))
}

/// Lift a parcel dry adiabatically to its LCL.
///
/// Returns the pressure and temperature of the LCL.
#[inline]
pub fn dry_lift(p: HectoPascal, t: Celsius, td: Celsius) -> Result<(HectoPascal, Celsius)> {
    check_valid!(p.unpack(), t.unpack(), td.unpack());

    let t_lcl = lcl_temperature(t, td)?;
    let p_lcl = pressure_at_theta(theta(p, t, HectoPascal(1000.0))?, t_lcl)?;

    Ok((p_lcl, t_lcl))
}

/// The Wobus function.
///
/// Returns the correction (C) to the potential temperature used to find the saturated potential
/// temperature of a parcel at temperature `t`.
#[allow(clippy::excessive_precision)]
pub fn wobus(t: Celsius) -> Result<f64> {
    let t = t.unpack();
    check_valid!(t);

    let x = t - 20.0;
    if x <= 0.0 {
        let pol = 1.0
            + x * (-8.841660499999999e-3
                + x * (1.4714143e-4
                    + x * (-9.671989000000001e-7 + x * (-3.2607217e-8 + x * (-3.8598073e-10)))));
        Ok(15.13 / pol.powi(4))
    } else {
        let pol = x
            * (4.9618922e-07
                + x * (-6.1059365e-09
                    + x * (3.9401551e-11 + x * (-1.2588129e-13 + x * (1.6688280e-16)))));
        let pol = 1.0 + x * (3.6182989e-03 + x * (-1.3603273e-05 + pol));
        Ok((29.93 / pol.powi(4)) + (0.96 * x) - 14.8)
    }
}

/// Lift a saturated parcel moist adiabatically from `p` to `p_target`.
pub fn wet_lift(p: HectoPascal, t: Celsius, p_target: HectoPascal) -> Result<Celsius> {
    wet_lift_with(p, t, p_target, &SaturationConfig::default())
}

/// Same as `wet_lift`, but with explicit solver settings.
pub fn wet_lift_with(
    p: HectoPascal,
    t: Celsius,
    p_target: HectoPascal,
    cfg: &SaturationConfig,
) -> Result<Celsius> {
    check_valid!(p.unpack(), t.unpack(), p_target.unpack());

    // Nowhere to go.
    if (p.unpack() - p_target.unpack()).abs() < 1.0e-9 {
        return Ok(t);
    }

    let thta = theta(p, t, HectoPascal(1000.0))?;
    let thm = thta.unpack() - wobus(thta)? + wobus(t)?;

    saturated_lift_with(p_target, Celsius(thm), cfg)
}

/// Temperature of a saturated parcel with saturated potential temperature `thm` when it is at
/// pressure `p`.
pub fn saturated_lift(p: HectoPascal, thm: Celsius) -> Result<Celsius> {
    saturated_lift_with(p, thm, &SaturationConfig::default())
}

/// Same as `saturated_lift`, but with explicit solver settings.
///
/// This is a secant method. The first guess is the dry adiabatic temperature at `p`.
pub fn saturated_lift_with(p: HectoPascal, thm: Celsius, cfg: &SaturationConfig) -> Result<Celsius> {
    let (p, thm) = (p.unpack(), thm.unpack());
    check_valid!(p, thm);
    if p <= 0.0 {
        return Err(AnalysisError::InvalidInput);
    }

    if (p - 1000.0).abs() - 0.001 <= 0.0 {
        return Ok(Celsius(thm));
    }

    let wobf = |t: f64| wobus(Celsius(t));

    let pwrp = (p / 1000.0).powf(ROCP);
    let mut t1 = (thm + ZEROCNK) * pwrp - ZEROCNK;
    let mut e1 = wobf(t1)? - wobf(thm)?;
    let mut rate = 1.0;

    for _ in 0..cfg.max_iterations {
        let t2 = t1 - e1 * rate;
        let mut e2 = (t2 + ZEROCNK) / pwrp - ZEROCNK;
        e2 += wobf(t2)? - wobf(e2)? - thm;
        let eor = e2 * rate;

        if eor.abs() <= cfg.tolerance {
            return Ok(Celsius(t2 - eor));
        }

        rate = (t2 - t1) / (e2 - e1);
        if !rate.is_finite() {
            break;
        }
        t1 = t2;
        e1 = e2;
    }

    Err(AnalysisError::Convergence {
        routine: "saturated_lift",
        iterations: cfg.max_iterations,
    })
}

/// Temperature of a parcel lifted from (`p`, `t`, `td`) to the pressure `p_target`.
///
/// The parcel is lifted dry adiabatically to its LCL and moist adiabatically from there.
pub fn lifted(p: HectoPascal, t: Celsius, td: Celsius, p_target: HectoPascal) -> Result<Celsius> {
    let (p_lcl, t_lcl) = dry_lift(p, t, td)?;
    wet_lift(p_lcl, t_lcl, p_target)
}

/// Vapor pressure (hPa) over liquid water at temperature `t`.
pub fn vapor_pressure(t: Celsius) -> Result<HectoPascal> {
    let t = t.unpack();
    check_valid!(t);

    let pol = t * (1.1112018e-17 + (t * -3.0994571e-20));
    let pol = t * (2.1874425e-13 + (t * (-1.789232e-15 + pol)));
    let pol = t * (4.3884180e-09 + (t * (-2.988388e-11 + pol)));
    let pol = t * (7.8736169e-05 + (t * (-6.111796e-07 + pol)));
    let pol = 0.99999683 + (t * (-9.082695e-03 + pol));

    Ok(HectoPascal(6.1078 / pol.powi(8)))
}

/// Mixing ratio (g/kg) of saturated air at pressure `p` and temperature `t`.
///
/// Use the dew point for `t` to get the actual mixing ratio of a parcel. Includes a correction for
/// the departure of moist air from an ideal gas.
pub fn mixing_ratio(p: HectoPascal, t: Celsius) -> Result<f64> {
    let (p, tc) = (p.unpack(), t.unpack());
    check_valid!(p, tc);
    if p <= 0.0 {
        return Err(AnalysisError::InvalidInput);
    }

    let x = 0.02 * (tc - 12.5 + (7500.0 / p));
    let wfw = 1.0 + (0.0000045 * p) + (0.0014 * x * x);
    let fwesw = wfw * vapor_pressure(t)?.unpack();

    if fwesw >= p {
        return Err(AnalysisError::InvalidInput);
    }

    Ok(621.97 * (fwesw / (p - fwesw)))
}

/// Temperature of air with mixing ratio `w` (g/kg) at pressure `p`.
///
/// This is the inverse of `mixing_ratio`, so it is the dew point for a parcel with that mixing
/// ratio.
pub fn temperature_at_mixing_ratio(w: f64, p: HectoPascal) -> Result<Celsius> {
    let p = p.unpack();
    check_valid!(w, p);
    if w <= 0.0 || p <= 0.0 {
        return Err(AnalysisError::InvalidInput);
    }

    const C1: f64 = 0.0498646455;
    const C2: f64 = 2.4082965;
    const C3: f64 = 7.07475;
    const C4: f64 = 38.9114;
    const C5: f64 = 0.0915;
    const C6: f64 = 1.2035;

    let x = (w * p / (622.0 + w)).log10();
    let tk = 10.0f64.powf((C1 * x) + C2) - C3 + (C4 * (10.0f64.powf(C5 * x) - C6).powi(2));

    Ok(Celsius(tk - ZEROCNK))
}

/// Virtual temperature of a parcel.
///
/// If the dew point is missing, the air is treated as dry and the virtual temperature is the
/// temperature.
pub fn virtual_temperature<D>(p: HectoPascal, t: Celsius, td: D) -> Result<Celsius>
where
    Option<Celsius>: From<D>,
{
    let tc = t.unpack();
    check_valid!(tc);

    let td = match Option::from(td).filter(|td: &Celsius| is_valid(td.unpack())) {
        Some(td) => td,
        None => return Ok(t),
    };

    check_valid!(p.unpack());

    let tk = tc + ZEROCNK;
    let w = 0.001 * mixing_ratio(p, td)?;

    Ok(Celsius((tk * (1.0 + w / EPS) / (1.0 + w)) - ZEROCNK))
}

/// Wet bulb temperature.
pub fn wet_bulb(p: HectoPascal, t: Celsius, td: Celsius) -> Result<Celsius> {
    let (p_lcl, t_lcl) = dry_lift(p, t, td)?;
    wet_lift(p_lcl, t_lcl, p)
}

/// Wet bulb potential temperature.
pub fn theta_w(p: HectoPascal, t: Celsius, td: Celsius) -> Result<Celsius> {
    let (p_lcl, t_lcl) = dry_lift(p, t, td)?;
    wet_lift(p_lcl, t_lcl, HectoPascal(1000.0))
}

/// Equivalent potential temperature, in Celsius.
///
/// Found by lifting the parcel to 100 hPa, where nearly all the moisture has condensed out, and
/// then bringing it dry adiabatically to 1000 hPa.
pub fn theta_e(p: HectoPascal, t: Celsius, td: Celsius) -> Result<Celsius> {
    let (p_lcl, t_lcl) = dry_lift(p, t, td)?;
    let t_100 = wet_lift(p_lcl, t_lcl, HectoPascal(100.0))?;
    theta(HectoPascal(100.0), t_100, HectoPascal(1000.0))
}
