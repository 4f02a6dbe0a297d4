//! Synthetic soundings shared by the integration tests.
#![allow(dead_code)]

use sounding_params::Sounding;

pub const PRESSURE: [f64; 19] = [
    1000.0, 950.0, 900.0, 850.0, 800.0, 750.0, 700.0, 650.0, 600.0, 550.0, 500.0, 450.0, 400.0,
    350.0, 300.0, 250.0, 200.0, 150.0, 100.0,
];

/// Constant 10 kt west wind.
pub const WEST_DIR: [f64; 19] = [270.0; 19];
pub const WEST_SPD: [f64; 19] = [10.0; 19];

/// Speed increases with height, but the direction doesn't change.
pub const UNIDIRECTIONAL_SPD: [f64; 19] = [
    5.0, 10.0, 15.0, 20.0, 25.0, 30.0, 35.0, 40.0, 45.0, 50.0, 55.0, 60.0, 65.0, 70.0, 75.0, 80.0,
    85.0, 70.0, 50.0,
];

/// Winds veer from south-southeast at the surface to west-northwest aloft.
pub const VEERING_DIR: [f64; 19] = [
    150.0, 165.0, 180.0, 195.0, 210.0, 225.0, 240.0, 250.0, 260.0, 265.0, 270.0, 275.0, 280.0,
    285.0, 290.0, 295.0, 300.0, 300.0, 300.0,
];
pub const VEERING_SPD: [f64; 19] = [
    10.0, 20.0, 25.0, 30.0, 35.0, 40.0, 45.0, 50.0, 55.0, 60.0, 65.0, 70.0, 75.0, 80.0, 85.0, 90.0,
    90.0, 70.0, 50.0,
];

/// A stable, standard atmosphere like sounding.
///
/// 1000 hPa, 15C and a 10C dew point at the surface, -60C at 100 hPa.
pub fn standard_atmosphere(wdir: &[f64], wspd: &[f64]) -> Sounding {
    Sounding::from_raw_columns(
        "STD",
        "2020-05-20 00:00",
        &PRESSURE,
        &[
            0.0, 433.3, 887.1, 1363.7, 1865.5, 2395.7, 2957.9, 3556.5, 4197.0, 4886.0, 5632.2,
            6446.8, 7344.7, 8346.3, 9481.3, 10794.3, 12357.8, 14303.4, 16911.5,
        ],
        &[
            15.0, 13.3, 11.6, 9.7, 7.7, 5.6, 3.4, 1.0, -1.6, -4.5, -7.6, -11.0, -14.8, -19.2,
            -24.2, -30.2, -37.4, -46.8, -60.0,
        ],
        &[
            10.0, 8.0, 5.9, 3.6, 1.3, -1.2, -3.9, -6.8, -10.0, -13.4, -17.1, -21.2, -25.8, -31.0,
            -37.1, -44.2, -52.9, -64.2, -80.0,
        ],
        wdir,
        wspd,
    )
    .expect("bad test sounding")
}

/// A warm, moist, and very unstable sounding.
///
/// 1000 hPa, 30C and a 22C dew point at the surface with a steep lapse rate up to an isothermal
/// layer at -60C from 200 hPa to the top.
pub fn moist_unstable(wdir: &[f64], wspd: &[f64]) -> Sounding {
    Sounding::from_raw_columns(
        "UNS",
        "200520/0000",
        &PRESSURE,
        &[
            0.0, 457.3, 934.0, 1432.1, 1953.8, 2501.8, 3079.4, 3690.4, 4339.6, 5032.9, 5777.6,
            6583.1, 7461.5, 8429.6, 9510.4, 10738.0, 12168.4, 13963.3, 16492.9,
        ],
        &[
            30.0, 27.1, 24.1, 20.8, 17.4, 13.8, 9.9, 5.7, 1.2, -3.8, -9.1, -15.1, -21.7, -29.3,
            -38.0, -48.3, -60.0, -60.0, -60.0,
        ],
        &[
            22.0, 19.1, 16.1, 12.8, 8.6, 4.1, -0.7, -5.8, -11.4, -17.4, -24.0, -31.4, -39.6, -48.8,
            -59.5, -72.2, -86.9, -90.6, -95.9,
        ],
        wdir,
        wspd,
    )
    .expect("bad test sounding")
}

/// Levels reaching into the stratosphere.
pub const TALL_PRESSURE: [f64; 21] = [
    1000.0, 950.0, 900.0, 850.0, 800.0, 750.0, 700.0, 650.0, 600.0, 550.0, 500.0, 450.0, 400.0,
    350.0, 300.0, 250.0, 200.0, 150.0, 100.0, 70.0, 50.0,
];
pub const TALL_HEIGHT: [f64; 21] = [
    0.0, 457.3, 934.0, 1432.1, 1953.8, 2501.8, 3079.4, 3690.4, 4339.6, 5032.9, 5777.6, 6583.1,
    7461.5, 8429.6, 9510.4, 10738.0, 12168.4, 13963.3, 16492.9, 18600.0, 20600.0,
];

/// Very unstable up to a tropopause at 200 hPa, then warming with height.
pub const WARM_STRATOSPHERE: [f64; 21] = [
    30.0, 27.1, 24.1, 20.8, 17.4, 13.8, 9.9, 5.7, 1.2, -3.8, -9.1, -15.1, -21.7, -29.3, -38.0,
    -48.3, -60.0, -50.0, -40.0, -30.0, -20.0,
];

/// A shallow buoyant layer under a warm layer at 750 - 700 hPa, with a deep buoyant layer above.
pub const TWO_BUOYANT_LAYERS: [f64; 21] = [
    30.0, 26.0, 21.5, 17.0, 12.5, 19.0, 17.0, 10.0, 1.0, -5.0, -11.0, -17.0, -24.0, -32.0, -41.0,
    -51.0, -60.0, -60.0, -60.0, -60.0, -60.0,
];

/// A sounding on the tall levels with an 8C dew point depression and a 10 kt west wind.
///
/// Missing temperatures make missing dew points.
pub fn tall_sounding(temps: &[f64]) -> Sounding {
    let dew_points: Vec<f64> = temps.iter().map(|t| t - 8.0).collect();

    Sounding::from_raw_columns(
        "TAL",
        "2020-05-20 00:00",
        &TALL_PRESSURE,
        &TALL_HEIGHT,
        temps,
        &dew_points,
        &[270.0; 21],
        &[10.0; 21],
    )
    .expect("bad test sounding")
}

/// Every synthetic sounding with every wind profile.
pub fn all_soundings() -> Vec<Sounding> {
    let winds: [(&[f64], &[f64]); 3] = [
        (&WEST_DIR, &WEST_SPD),
        (&WEST_DIR, &UNIDIRECTIONAL_SPD),
        (&VEERING_DIR, &VEERING_SPD),
    ];

    winds
        .iter()
        .flat_map(|&(wdir, wspd)| vec![standard_atmosphere(wdir, wspd), moist_unstable(wdir, wspd)])
        .collect()
}

pub fn approx_equal(val1: f64, val2: f64, eps: f64) -> bool {
    assert!(eps > 0.0);

    (val1 - val2).abs() < eps
}
