//! Find significant temperature levels, such as the freezing level.
use crate::{
    error::{AnalysisError, Result},
    sounding::Sounding,
};
use itertools::{izip, Itertools};
use metfor::{Celsius, HectoPascal, Quantity};

/// Pressure of the lowest level where the temperature first drops to `target`.
///
/// The crossing is found by scanning up from the bottom of the sounding and interpolating linearly
/// in the logarithm of pressure between the last level warmer than `target` and the first level at
/// or below it. If the bottom level is already at or below `target` there is no crossing and this
/// returns `AnalysisError::OutOfRange`.
///
/// # Examples
///
/// ```rust
/// use metfor::{Celsius, HectoPascal};
/// use sounding_params::{temperature_level, Sounding, MISSING};
///
/// let snd = Sounding::from_raw_uv_columns(
///     "", "",
///     &[1000.0, 850.0, 700.0, 500.0],
///     &[0.0, 1500.0, 3000.0, 5600.0],
///     &[15.0, 5.0, -5.0, -20.0],
///     &[MISSING; 4],
///     &[MISSING; 4],
///     &[MISSING; 4],
/// ).unwrap();
///
/// let p = temperature_level(&snd, Celsius(-5.0)).unwrap();
/// assert_eq!(p, HectoPascal(700.0));
///
/// let p = temperature_level(&snd, Celsius(0.0)).unwrap();
/// assert!(p < HectoPascal(850.0) && p > HectoPascal(700.0));
/// ```
pub fn temperature_level(snd: &Sounding, target: Celsius) -> Result<HectoPascal> {
    let mut levels = izip!(snd.pressure_profile(), snd.temperature_profile())
        .filter(|(p, t)| p.is_some() && t.is_some())
        .map(|(p, t)| (p.unpack(), t.unpack()));

    let (bottom_p, bottom_t) = levels.next().ok_or(AnalysisError::NotEnoughData)?;
    if bottom_t <= target {
        return Err(AnalysisError::OutOfRange);
    }

    std::iter::once((bottom_p, bottom_t))
        .chain(levels)
        .tuple_windows::<(_, _)>()
        .find(|(_, (_, t1))| *t1 <= target)
        .map(|((p0, t0), (p1, t1))| {
            if t1 == target {
                p1
            } else {
                let frac = (target - t0).unpack() / (t1 - t0).unpack();
                HectoPascal(p0.unpack() * (frac * (p1.unpack() / p0.unpack()).ln()).exp())
            }
        })
        .ok_or(AnalysisError::OutOfRange)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::utility::{test_tools::approx_equal, MISSING};

    #[test]
    fn test_temperature_level() {
        let snd = Sounding::from_raw_uv_columns(
            "",
            "",
            &[1000.0, 850.0, 700.0, 500.0, 300.0],
            &[0.0, 1500.0, 3000.0, 5600.0, 9000.0],
            &[15.0, 5.0, MISSING, -20.0, -40.0],
            &[MISSING; 5],
            &[MISSING; 5],
            &[MISSING; 5],
        )
        .unwrap();

        // Skips the missing temperature at 700 hPa.
        let p = temperature_level(&snd, Celsius(-10.0)).unwrap();
        let expected = 850.0 * ((15.0 / 25.0) * (500.0f64 / 850.0).ln()).exp();
        assert!(approx_equal(p.unpack(), expected, 1.0e-10));

        assert_eq!(
            temperature_level(&snd, Celsius(20.0)),
            Err(AnalysisError::OutOfRange)
        );
        assert_eq!(
            temperature_level(&snd, Celsius(-50.0)),
            Err(AnalysisError::OutOfRange)
        );
    }
}
