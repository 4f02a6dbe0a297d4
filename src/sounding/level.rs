use metfor::{Celsius, HectoPascal, Knots, Meters};
use optional::Optioned;

/// A copy of one level of the sounding data.
#[derive(Clone, Default, Copy, Debug, PartialEq)]
pub struct Level {
    /// Pressure in hPa
    pub pressure: Optioned<HectoPascal>,
    /// Geopotential height in meters above mean sea level
    pub height: Optioned<Meters>,
    /// Temperature in C
    pub temperature: Optioned<Celsius>,
    /// Dew point in C
    pub dew_point: Optioned<Celsius>,
    /// U component of the wind
    pub u_wind: Optioned<Knots>,
    /// V component of the wind
    pub v_wind: Optioned<Knots>,
}
