//! Data type and methods to store an atmospheric sounding.

use crate::{
    error::{AnalysisError, Result},
    utility::raw_to_optioned,
    vector,
};
use chrono::NaiveDateTime;
use metfor::{Celsius, HectoPascal, Knots, Meters, WindUV};
use optional::Optioned;

pub use self::{level::Level, station_info::StationInfo};

/// All the variables stored in the sounding.
///
/// The profile variables are stored in parallel vectors ordered from the bottom (highest
/// pressure) to the top of the sounding. Any value may be missing. A sounding is assembled with
/// the builder methods and checked with `build`, after that it is only read.
#[derive(Clone, Debug, Default)]
pub struct Sounding {
    // Station info
    station: StationInfo,

    // Valid time of sounding
    valid_time: Option<NaiveDateTime>,
    // The time as the caller supplied it, kept when it could not be parsed.
    valid_time_text: Option<String>,

    // Profiles
    pressure: Vec<Optioned<HectoPascal>>,
    height: Vec<Optioned<Meters>>,
    temperature: Vec<Optioned<Celsius>>,
    dew_point: Vec<Optioned<Celsius>>,
    u_wind: Vec<Optioned<Knots>>,
    v_wind: Vec<Optioned<Knots>>,

    // Index of the first level with a temperature.
    sfc_idx: usize,
}

macro_rules! make_profile_setter {
    ($(#[$attr:meta])* => $name:tt, $inner_type:tt, $p_var:ident) => {
        $(#[$attr])*
        pub fn $name(self, profile: Vec<Optioned<$inner_type>>) -> Self {
            let mut snd = Self {$p_var: profile, ..self};
            snd.update_surface_index();
            snd
        }
    };
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M", "%y%m%d/%H%M"];

impl Sounding {
    /// Create a new sounding with default values. This is a proxy for default with a clearer name.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sounding_params::Sounding;
    ///
    /// let snd = Sounding::new();
    /// assert_eq!(snd.level_count(), 0);
    /// ```
    #[inline]
    pub fn new() -> Self {
        Sounding::default()
    }

    /// Build a sounding from raw parallel columns with wind given as direction and speed.
    ///
    /// Values that fail `utility::is_valid` are stored as missing. The date is parsed if it looks
    /// like `2021-05-04 00:00` or `210504/0000`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use sounding_params::{Sounding, MISSING};
    ///
    /// let snd = Sounding::from_raw_columns(
    ///     "OUN",
    ///     "210504/0000",
    ///     &[1000.0, 850.0, 700.0],
    ///     &[100.0, 1500.0, 3100.0],
    ///     &[25.0, 15.0, 5.0],
    ///     &[20.0, 12.0, MISSING],
    ///     &[180.0, 220.0, 250.0],
    ///     &[10.0, 25.0, 40.0],
    /// )
    /// .unwrap();
    ///
    /// assert_eq!(snd.level_count(), 3);
    /// assert!(snd.level(2).unwrap().dew_point.is_none());
    /// assert!(snd.valid_time().is_some());
    /// ```
    #[allow(clippy::too_many_arguments)]
    pub fn from_raw_columns(
        station_id: &str,
        date: &str,
        pressure: &[f64],
        height: &[f64],
        temperature: &[f64],
        dew_point: &[f64],
        wind_direction: &[f64],
        wind_speed: &[f64],
    ) -> Result<Self> {
        check_lengths(
            pressure.len(),
            &[
                ("height", height.len()),
                ("temperature", temperature.len()),
                ("dew point", dew_point.len()),
                ("wind direction", wind_direction.len()),
                ("wind speed", wind_speed.len()),
            ],
        )?;

        let (u_wind, v_wind): (Vec<Optioned<Knots>>, Vec<Optioned<Knots>>) = wind_direction
            .iter()
            .zip(wind_speed)
            .map(|(&dir, &spd)| match vector::to_components(dir, Knots(spd)) {
                Ok(WindUV { u, v }) => (optional::some(u), optional::some(v)),
                Err(_) => (optional::none(), optional::none()),
            })
            .unzip();

        Self::from_columns(
            station_id,
            date,
            pressure,
            height,
            temperature,
            dew_point,
            u_wind,
            v_wind,
        )
    }

    /// Build a sounding from raw parallel columns with wind given as u and v components in knots.
    ///
    /// Otherwise the same as `from_raw_columns`.
    #[allow(clippy::too_many_arguments)]
    pub fn from_raw_uv_columns(
        station_id: &str,
        date: &str,
        pressure: &[f64],
        height: &[f64],
        temperature: &[f64],
        dew_point: &[f64],
        u_wind: &[f64],
        v_wind: &[f64],
    ) -> Result<Self> {
        check_lengths(
            pressure.len(),
            &[
                ("height", height.len()),
                ("temperature", temperature.len()),
                ("dew point", dew_point.len()),
                ("u wind", u_wind.len()),
                ("v wind", v_wind.len()),
            ],
        )?;

        // A wind is either all there or all missing.
        let (u_wind, v_wind): (Vec<Optioned<Knots>>, Vec<Optioned<Knots>>) = u_wind
            .iter()
            .zip(v_wind)
            .map(|(&u, &v)| {
                let (u, v) = (raw_to_optioned(u), raw_to_optioned(v));
                if u.is_some() && v.is_some() {
                    (u, v)
                } else {
                    (optional::none(), optional::none())
                }
            })
            .unzip();

        Self::from_columns(
            station_id,
            date,
            pressure,
            height,
            temperature,
            dew_point,
            u_wind,
            v_wind,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn from_columns(
        station_id: &str,
        date: &str,
        pressure: &[f64],
        height: &[f64],
        temperature: &[f64],
        dew_point: &[f64],
        u_wind: Vec<Optioned<Knots>>,
        v_wind: Vec<Optioned<Knots>>,
    ) -> Result<Self> {
        fn column<T>(vals: &[f64]) -> Vec<Optioned<T>>
        where
            T: metfor::Quantity + optional::Noned + Copy,
        {
            vals.iter().map(|&v| raw_to_optioned(v)).collect()
        }

        Sounding::new()
            .with_station_info(StationInfo::new().with_station_id(station_id.to_owned()))
            .with_valid_time_text(date)
            .with_pressure_profile(column(pressure))
            .with_height_profile(column(height))
            .with_temperature_profile(column(temperature))
            .with_dew_point_profile(column(dew_point))
            .with_u_wind_profile(u_wind)
            .with_v_wind_profile(v_wind)
            .build()
    }

    /// Check the sounding and finish building it.
    ///
    /// Fails with `AnalysisError::MalformedSounding` if there are no levels or the profiles are
    /// different lengths. Profiles that were never set are filled with missing values.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use metfor::{Celsius, HectoPascal};
    /// use optional::some;
    /// use sounding_params::Sounding;
    ///
    /// assert!(Sounding::new().build().is_err());
    ///
    /// let snd = Sounding::new()
    ///     .with_pressure_profile(vec![some(HectoPascal(1000.0)), some(HectoPascal(900.0))])
    ///     .with_temperature_profile(vec![some(Celsius(20.0)), some(Celsius(14.0))])
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(snd.level_count(), 2);
    /// assert!(snd.level(1).unwrap().height.is_none());
    /// ```
    pub fn build(mut self) -> Result<Self> {
        let n = self.pressure.len();
        if n == 0 {
            return Err(AnalysisError::MalformedSounding(
                "sounding has no levels".to_owned(),
            ));
        }

        macro_rules! fill_or_check {
            ($profile:ident, $name:expr) => {
                if self.$profile.is_empty() {
                    self.$profile = vec![optional::none(); n];
                } else if self.$profile.len() != n {
                    return Err(AnalysisError::MalformedSounding(format!(
                        "{} profile has {} levels, pressure profile has {}",
                        $name,
                        self.$profile.len(),
                        n
                    )));
                }
            };
        }

        fill_or_check!(height, "height");
        fill_or_check!(temperature, "temperature");
        fill_or_check!(dew_point, "dew point");
        fill_or_check!(u_wind, "u wind");
        fill_or_check!(v_wind, "v wind");

        self.update_surface_index();

        Ok(self)
    }

    /// Builder function for setting the station info.
    #[inline]
    pub fn with_station_info(mut self, new_value: StationInfo) -> Self {
        self.station = new_value;
        self
    }

    /// Get the station info
    #[inline]
    pub fn station_info(&self) -> &StationInfo {
        &self.station
    }

    /// Builder method to set the valid time of the sounding.
    #[inline]
    pub fn with_valid_time<T>(mut self, valid_time: T) -> Self
    where
        Option<NaiveDateTime>: From<T>,
    {
        self.valid_time = Option::from(valid_time);
        self
    }

    /// Builder method to set the valid time from text.
    ///
    /// The text is always kept. If it can be parsed the valid time is set too.
    pub fn with_valid_time_text(mut self, text: &str) -> Self {
        let text = text.trim();
        if text.is_empty() {
            return self;
        }

        if let Some(vt) = DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        {
            self.valid_time = Some(vt);
        }
        self.valid_time_text = Some(text.to_owned());
        self
    }

    /// Valid time of the sounding.
    #[inline]
    pub fn valid_time(&self) -> Option<NaiveDateTime> {
        self.valid_time
    }

    /// The valid time as it was supplied, if it was supplied as text.
    #[inline]
    pub fn valid_time_text(&self) -> Option<&str> {
        self.valid_time_text.as_deref()
    }

    make_profile_setter!(
        /// Builder method for the pressure profile.
        ///
        /// # Examples
        /// ```rust
        /// use sounding_params::Sounding;
        /// use metfor::HectoPascal;
        /// use optional::{some, Optioned};
        ///
        /// let data = vec![1000.0, 925.0, 850.0, 700.0, 500.0, 300.0, 250.0, 200.0, 150.0, 100.0];
        /// let pressure_data: Vec<Optioned<HectoPascal>> = data.into_iter()
        ///     .map(HectoPascal)
        ///     .map(some)
        ///     .collect();
        ///
        /// let _snd = Sounding::new()
        ///     .with_pressure_profile(pressure_data);
        /// ```
        #[inline]
        => with_pressure_profile, HectoPascal, pressure
    );

    /// Get the pressure profile
    #[inline]
    pub fn pressure_profile(&self) -> &[Optioned<HectoPascal>] {
        &self.pressure
    }

    make_profile_setter!(
        /// Builder method for the geopotential height profile (m MSL).
        ///
        /// See `with_pressure_profile` for an example of usage, keeping in mind the units type may
        /// be different.
        #[inline]
        => with_height_profile, Meters, height
    );

    /// Get the geopotential height profile.
    #[inline]
    pub fn height_profile(&self) -> &[Optioned<Meters>] {
        &self.height
    }

    make_profile_setter!(
        /// Builder method for the temperature profile.
        ///
        /// See `with_pressure_profile` for an example of usage, keeping in mind the units type may
        /// be different.
        #[inline]
        => with_temperature_profile, Celsius, temperature
    );

    /// Get the temperature profile.
    #[inline]
    pub fn temperature_profile(&self) -> &[Optioned<Celsius>] {
        &self.temperature
    }

    make_profile_setter!(
        /// Builder method for the dew point profile.
        ///
        /// See `with_pressure_profile` for an example of usage, keeping in mind the units type may
        /// be different.
        #[inline]
        => with_dew_point_profile, Celsius, dew_point
    );

    /// Get the dew point profile.
    #[inline]
    pub fn dew_point_profile(&self) -> &[Optioned<Celsius>] {
        &self.dew_point
    }

    make_profile_setter!(
        /// Builder method for the u component of the wind profile.
        #[inline]
        => with_u_wind_profile, Knots, u_wind
    );

    /// Get the u component of the wind profile.
    #[inline]
    pub fn u_wind_profile(&self) -> &[Optioned<Knots>] {
        &self.u_wind
    }

    make_profile_setter!(
        /// Builder method for the v component of the wind profile.
        #[inline]
        => with_v_wind_profile, Knots, v_wind
    );

    /// Get the v component of the wind profile.
    #[inline]
    pub fn v_wind_profile(&self) -> &[Optioned<Knots>] {
        &self.v_wind
    }

    /// The number of levels in the sounding.
    #[inline]
    pub fn level_count(&self) -> usize {
        self.pressure.len()
    }

    /// Index of the surface level.
    ///
    /// This is the first level with a valid temperature, or 0 if the sounding has fewer than 3
    /// levels or no valid temperatures.
    #[inline]
    pub fn surface_index(&self) -> usize {
        self.sfc_idx
    }

    /// Get a level of data values from this sounding.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use metfor::{HectoPascal, Celsius};
    /// use optional::some;
    /// use sounding_params::Sounding;
    ///
    /// let pres: Vec<_> = vec![1000.0, 925.0, 850.0].into_iter()
    ///     .map(HectoPascal).map(some).collect();
    /// let temps: Vec<_> = vec![20.0, 18.0, 17.0].into_iter()
    ///     .map(Celsius).map(some).collect();
    ///
    /// let snd = Sounding::new()
    ///     .with_pressure_profile(pres)
    ///     .with_temperature_profile(temps)
    ///     .build()
    ///     .unwrap();
    ///
    /// let lvl = snd.level(1).unwrap();
    /// assert_eq!(lvl.pressure.unwrap(), HectoPascal(925.0));
    /// assert_eq!(lvl.temperature.unwrap(), Celsius(18.0));
    /// assert!(lvl.u_wind.is_none()); // We never set wind profile.
    ///
    /// assert!(snd.level(3).is_none()); // There weren't that many levels!
    /// ```
    #[inline]
    pub fn level(&self, idx: usize) -> Option<Level> {
        macro_rules! copy_to_result {
            ($result:ident, $profile:ident, $idx:ident) => {
                if let Some(opt_val) = self.$profile.get($idx) {
                    $result.$profile = *opt_val;
                }
            };
        }

        if idx >= self.pressure.len() {
            return None;
        }

        let mut result = Level::default();

        copy_to_result!(result, pressure, idx);
        copy_to_result!(result, height, idx);
        copy_to_result!(result, temperature, idx);
        copy_to_result!(result, dew_point, idx);
        copy_to_result!(result, u_wind, idx);
        copy_to_result!(result, v_wind, idx);

        Some(result)
    }

    /// The surface level.
    #[inline]
    pub fn surface_level(&self) -> Option<Level> {
        self.level(self.sfc_idx)
    }

    /// Pressure at the surface level.
    #[inline]
    pub fn surface_pressure(&self) -> Optioned<HectoPascal> {
        self.pressure
            .get(self.sfc_idx)
            .copied()
            .unwrap_or_else(optional::none)
    }

    /// Height (m MSL) of the surface level.
    #[inline]
    pub fn surface_height(&self) -> Optioned<Meters> {
        self.height
            .get(self.sfc_idx)
            .copied()
            .unwrap_or_else(optional::none)
    }

    /// Pressure at the highest level with a valid pressure and temperature.
    ///
    /// Levels near the top often only carry wind, those are skipped just like they are at the
    /// surface.
    #[inline]
    pub fn top_pressure(&self) -> Optioned<HectoPascal> {
        self.pressure
            .iter()
            .zip(self.temperature.iter())
            .rev()
            .find(|(p, t)| p.is_some() && t.is_some())
            .map(|(p, _)| *p)
            .unwrap_or_else(optional::none)
    }

    /// Get a bottom up iterator over the levels starting at the surface level.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use metfor::{HectoPascal, Celsius};
    /// use optional::{none, some};
    /// use sounding_params::Sounding;
    ///
    /// let pres: Vec<_> = vec![1000.0, 925.0, 850.0, 700.0].into_iter()
    ///     .map(HectoPascal).map(some).collect();
    /// let temps = vec![none(), some(Celsius(18.0)), some(Celsius(17.0)), some(Celsius(5.0))];
    ///
    /// let snd = Sounding::new()
    ///     .with_pressure_profile(pres)
    ///     .with_temperature_profile(temps)
    ///     .build()
    ///     .unwrap();
    ///
    /// let mut iter = snd.bottom_up();
    ///
    /// // The 1000 hPa level is below ground.
    /// let lvl = iter.next().unwrap();
    /// assert_eq!(lvl.pressure.unwrap(), HectoPascal(925.0));
    /// assert_eq!(iter.count(), 2);
    /// ```
    #[inline]
    pub fn bottom_up<'a>(&'a self) -> impl Iterator<Item = Level> + 'a {
        LevelIterator {
            next_idx: self.sfc_idx,
            src: self,
        }
    }

    fn update_surface_index(&mut self) {
        self.sfc_idx = if self.pressure.len() < 3 {
            0
        } else {
            self.temperature
                .iter()
                .position(|t| t.is_some())
                .unwrap_or(0)
        };
    }
}

fn check_lengths(n: usize, others: &[(&str, usize)]) -> Result<()> {
    if n == 0 {
        return Err(AnalysisError::MalformedSounding(
            "sounding has no levels".to_owned(),
        ));
    }

    for &(name, len) in others {
        if len != n {
            return Err(AnalysisError::MalformedSounding(format!(
                "{} column has {} levels, pressure column has {}",
                name, len, n
            )));
        }
    }

    Ok(())
}

/// Bottom up iterator over the levels of a sounding.
struct LevelIterator<'a> {
    next_idx: usize,
    src: &'a Sounding,
}

impl<'a> Iterator for LevelIterator<'a> {
    type Item = Level;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let result = self.src.level(self.next_idx);
        self.next_idx += 1;
        result
    }
}


mod level;
mod station_info;
