use sounding_params::Sounding;

const PRESSURE: [f64; 19] = [
    1000.0, 950.0, 900.0, 850.0, 800.0, 750.0, 700.0, 650.0, 600.0, 550.0, 500.0, 450.0, 400.0,
    350.0, 300.0, 250.0, 200.0, 150.0, 100.0,
];

const WIND_DIR: [f64; 19] = [
    150.0, 165.0, 180.0, 195.0, 210.0, 225.0, 240.0, 250.0, 260.0, 265.0, 270.0, 275.0, 280.0,
    285.0, 290.0, 295.0, 300.0, 300.0, 300.0,
];

const WIND_SPD: [f64; 19] = [
    10.0, 20.0, 25.0, 30.0, 35.0, 40.0, 45.0, 50.0, 55.0, 60.0, 65.0, 70.0, 75.0, 80.0, 85.0, 90.0,
    90.0, 70.0, 50.0,
];

pub fn load_all_test_soundings() -> [Sounding; 2] {
    let stable = Sounding::from_raw_columns(
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
        &WIND_DIR,
        &WIND_SPD,
    )
    .expect("Error building stable sounding");

    let unstable = Sounding::from_raw_columns(
        "UNS",
        "2020-05-20 00:00",
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
        &WIND_DIR,
        &WIND_SPD,
    )
    .expect("Error building unstable sounding");

    [stable, unstable]
}
