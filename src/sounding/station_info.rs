use std::fmt;

/// Where a sounding came from, an upper air station or a model grid point.
///
/// # Examples
///
/// ```rust
/// use sounding_params::StationInfo;
///
/// let stn = StationInfo::new().with_station_id(" KOUN ".to_owned());
/// assert_eq!(stn.station_id(), Some("KOUN"));
/// assert_eq!(stn.to_string(), "KOUN");
///
/// let stn = StationInfo::new().with_station_id(String::new());
/// assert!(stn.station_id().is_none());
/// assert_eq!(stn.to_string(), "unknown station");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StationInfo {
    id: Option<String>,
}

impl StationInfo {
    /// An unidentified station.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to add a station identifier, e.g. KOUN or 72357.
    ///
    /// Surrounding white space is dropped, and an identifier that is blank is no identifier.
    pub fn with_station_id<T>(mut self, id: T) -> Self
    where
        Option<String>: From<T>,
    {
        self.id = Option::from(id)
            .map(|id: String| id.trim().to_owned())
            .filter(|id| !id.is_empty());
        self
    }

    /// Station identifier.
    #[inline]
    pub fn station_id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl fmt::Display for StationInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.station_id() {
            Some(id) => write!(f, "{}", id),
            None => write!(f, "unknown station"),
        }
    }
}
