//! Error types for the sounding-params crate.
use thiserror::Error;

/// Error type for the crate.
///
/// Some errors are "soft", they just mean a value could not be calculated from the data at hand,
/// e.g. missing data or a level that isn't in the sounding. Others are "hard" and mean the input
/// was unusable or a numerical routine gave up. See `AnalysisError::is_soft`.
#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum AnalysisError {
    /// A value (surface value, index, location, etc) that is required is not available.
    #[error("Missing value required for analysis.")]
    MissingValue,
    /// The requested level is above the top or below the bottom of the valid data.
    #[error("Requested level is outside the range of the sounding.")]
    OutOfRange,
    /// Not enough data available for anlaysis
    #[error("Not enough data available for analysis.")]
    NotEnoughData,
    /// Bad or invalid input.
    #[error("Invalid input.")]
    InvalidInput,
    /// The sounding could not be built from the supplied columns.
    #[error("Malformed sounding: {0}")]
    MalformedSounding(String),
    /// An iterative routine hit its iteration cap.
    #[error("{routine} failed to converge after {iterations} iterations.")]
    Convergence {
        /// Name of the routine that gave up.
        routine: &'static str,
        /// How many iterations were tried.
        iterations: usize,
    },
}

impl AnalysisError {
    /// Soft errors mean "missing in, missing out". Hard errors should be reported to the caller.
    #[inline]
    pub fn is_soft(&self) -> bool {
        use AnalysisError::*;

        match self {
            MissingValue | OutOfRange | NotEnoughData | InvalidInput => true,
            MalformedSounding(_) | Convergence { .. } => false,
        }
    }
}

/// Shorthand for results.
pub type Result<T> = ::std::result::Result<T, AnalysisError>;

/// Turn soft errors into `None` and keep hard errors as errors.
///
/// Used where a value is nice to have, but failing to get it should not sink the whole analysis.
#[inline]
pub(crate) fn soft<T>(res: Result<T>) -> Result<Option<T>> {
    match res {
        Ok(val) => Ok(Some(val)),
        Err(err) if err.is_soft() => Ok(None),
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_soft_classification() {
        assert!(AnalysisError::MissingValue.is_soft());
        assert!(AnalysisError::OutOfRange.is_soft());
        assert!(!AnalysisError::MalformedSounding("empty".to_owned()).is_soft());
        assert!(!AnalysisError::Convergence {
            routine: "test",
            iterations: 3
        }
        .is_soft());

        assert_eq!(soft::<f64>(Err(AnalysisError::OutOfRange)), Ok(None));
        assert_eq!(soft(Ok(1.0)), Ok(Some(1.0)));
        assert!(soft::<f64>(Err(AnalysisError::Convergence {
            routine: "test",
            iterations: 3
        }))
        .is_err());
    }
}
