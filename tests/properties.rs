//! Properties that should hold for any reasonable sounding.
mod utils;

use metfor::{Celsius, HectoPascal, JpKg, Knots, Quantity};
use sounding_params::{
    define_parcel, interpolate_by_pressure, lift, thermo, vector, AnalysisError, Field,
    ParcelSelection, Sounding, MISSING,
};
use strum::IntoEnumIterator;
use utils::*;

fn selections() -> Vec<ParcelSelection> {
    vec![
        ParcelSelection::ObservedSurface,
        ParcelSelection::ForecastSurface,
        ParcelSelection::MOST_UNSTABLE,
        ParcelSelection::MIXED_LAYER,
        ParcelSelection::Effective,
    ]
}

#[test]
fn wind_vectors_round_trip() {
    for &dir in &[0.0, 10.0, 90.0, 135.0, 180.0, 225.0, 270.0, 359.0] {
        for &spd in &[1.0, 10.0, 55.5, 120.0] {
            let uv = vector::to_components(dir, Knots(spd)).unwrap();
            let polar = vector::to_polar(uv.u, uv.v).unwrap();

            assert!(approx_equal(polar.speed.unpack(), spd, 1.0e-9));
            assert!(approx_equal(polar.direction, dir, 1.0e-9));
        }
    }
}

#[test]
fn missing_values_propagate() {
    assert!(matches!(
        vector::to_components(MISSING, Knots(10.0)),
        Err(AnalysisError::MissingValue)
    ));
    assert!(vector::to_polar(Knots(MISSING), Knots(1.0)).is_err());
    assert!(thermo::theta(HectoPascal(MISSING), Celsius(10.0), HectoPascal(1000.0)).is_err());
    assert!(thermo::lcl_temperature(Celsius(20.0), Celsius(MISSING)).is_err());
    assert!(thermo::wet_lift(HectoPascal(900.0), Celsius(MISSING), HectoPascal(500.0)).is_err());
    assert!(thermo::mixing_ratio(HectoPascal(850.0), Celsius(MISSING)).is_err());
    assert_eq!(sounding_params::celsius_to_fahrenheit(MISSING), MISSING);
}

#[test]
fn wet_lift_to_same_pressure_is_identity() {
    for &p in &[1000.0, 927.5, 850.0, 500.0, 250.0] {
        for &t in &[-40.0, -10.0, 0.0, 8.867, 25.0] {
            let t_out = thermo::wet_lift(HectoPascal(p), Celsius(t), HectoPascal(p)).unwrap();
            assert_eq!(t_out, Celsius(t));
        }
    }
}

#[test]
fn dry_lift_conserves_theta() {
    let (p, t, td) = (HectoPascal(1000.0), Celsius(30.0), Celsius(22.0));
    let (p_lcl, t_lcl) = thermo::dry_lift(p, t, td).unwrap();

    assert!(p_lcl < p);
    assert!(t_lcl < t);

    let theta0 = thermo::theta(p, t, HectoPascal(1000.0)).unwrap();
    let theta1 = thermo::theta(p_lcl, t_lcl, HectoPascal(1000.0)).unwrap();
    assert!(approx_equal(theta0.unpack(), theta1.unpack(), 0.01));
}

#[test]
fn moist_lift_starts_at_the_lcl() {
    for &p in &[1000.0, 900.0, 850.0, 700.0, 600.0] {
        for &t in &[-20.0, -5.0, 10.0, 20.0, 35.0] {
            for &dd in &[0.5, 2.0, 8.0, 15.0, 30.0] {
                let (p_lcl, t_lcl) =
                    thermo::dry_lift(HectoPascal(p), Celsius(t), Celsius(t - dd)).unwrap();

                let same = thermo::wet_lift(p_lcl, t_lcl, p_lcl).unwrap();
                assert!(approx_equal(same.unpack(), t_lcl.unpack(), 1.0e-3));

                let above = thermo::wet_lift(p_lcl, t_lcl, p_lcl - HectoPascal(1.0e-6)).unwrap();
                assert!(
                    approx_equal(above.unpack(), t_lcl.unpack(), 1.0e-3),
                    "{} hPa {}C {}C: {:?} vs {:?}",
                    p,
                    t,
                    t - dd,
                    above,
                    t_lcl
                );
            }
        }
    }
}

#[test]
fn cape_is_never_negative() {
    for snd in all_soundings() {
        for sel in selections() {
            let pcl = match define_parcel(&snd, sel) {
                Ok(pcl) => pcl,
                Err(err) => panic!("{:?} failed for {}: {}", sel, snd.station_info(), err),
            };
            let res = lift(&snd, &pcl).unwrap();

            if let Some(cape) = res.cape().into_option() {
                assert!(cape >= JpKg(0.0), "{:?}: {:?}", sel, cape);

                let cin = res.cin().unwrap();
                assert!(cin <= JpKg(0.0), "{:?}: {:?}", sel, cin);
                if cape == JpKg(0.0) {
                    assert_eq!(cin, JpKg(0.0));
                }
            }

            for partial in &[
                res.cape_3km(),
                res.cape_6km(),
                res.cape_freezing(),
                res.cape_m10c(),
                res.cape_m20c(),
                res.cape_m30c(),
            ] {
                if let Some(partial) = partial.into_option() {
                    assert!(partial >= JpKg(0.0));
                }
            }
        }
    }
}

#[test]
fn levels_are_in_order() {
    for snd in all_soundings() {
        for sel in selections() {
            let pcl = define_parcel(&snd, sel).unwrap();
            let res = lift(&snd, &pcl).unwrap();

            let lcl = res.lcl_pressure().unwrap();
            assert!(lcl <= pcl.pressure);

            if let Some(lfc) = res.lfc_pressure().into_option() {
                assert!(lfc <= lcl);
                if let Some(el) = res.el_pressure().into_option() {
                    assert!(el < lfc);
                    // Within the EL refinement step.
                    if let Some(mpl) = res.mpl_pressure().into_option() {
                        assert!(mpl.unpack() <= el.unpack() + 5.0);
                    }
                }
            } else {
                assert!(res.el_pressure().is_none());
            }
        }
    }
}

#[test]
fn interpolation_is_exact_at_levels() {
    let snd = moist_unstable(&VEERING_DIR, &VEERING_SPD);

    for field in Field::iter() {
        let profile = column(&snd, field);
        for (&p, val) in snd.pressure_profile().iter().zip(profile) {
            let (p, val) = match (p.into_option(), val) {
                (Some(p), Some(val)) => (p, val),
                _ => continue,
            };

            let interp = interpolate_by_pressure(&snd, p, field).unwrap();
            assert_eq!(interp, val, "{} at {:?}", field, p);
        }
    }
}

#[test]
fn interpolation_outside_the_data() {
    let snd = standard_atmosphere(&WEST_DIR, &WEST_SPD);

    assert_eq!(
        interpolate_by_pressure(&snd, HectoPascal(1050.0), Field::Temperature),
        Err(AnalysisError::OutOfRange)
    );
    assert_eq!(
        interpolate_by_pressure(&snd, HectoPascal(50.0), Field::Temperature),
        Err(AnalysisError::OutOfRange)
    );
}

fn column(snd: &Sounding, field: Field) -> Vec<Option<f64>> {
    fn unpack<T>(vals: &[optional::Optioned<T>]) -> Vec<Option<f64>>
    where
        T: Quantity + optional::Noned + Copy,
    {
        vals.iter()
            .map(|v| v.into_option().map(Quantity::unpack))
            .collect()
    }

    match field {
        Field::Pressure => unpack(snd.pressure_profile()),
        Field::Height => unpack(snd.height_profile()),
        Field::Temperature => unpack(snd.temperature_profile()),
        Field::DewPoint => unpack(snd.dew_point_profile()),
        Field::UWind => unpack(snd.u_wind_profile()),
        Field::VWind => unpack(snd.v_wind_profile()),
    }
}
