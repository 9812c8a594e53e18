use thiserror::Error;

/// A field value failed validation or numeric coercion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct InvalidDataError {
    message: String,
}

impl InvalidDataError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A geocoding lookup returned no match for the given city/country.
///
/// The observation model never produces this; it exists for the code that
/// talks to the weather API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct LocationNotFoundError {
    message: String,
}

impl LocationNotFoundError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Catch-all for weather-domain failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeatherApiError {
    #[error("{0}")]
    Api(String),

    #[error(transparent)]
    LocationNotFound(#[from] LocationNotFoundError),

    #[error(transparent)]
    InvalidData(#[from] InvalidDataError),
}

impl WeatherApiError {
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api(message.into())
    }

    pub fn is_invalid_data(&self) -> bool {
        matches!(self, Self::InvalidData(_))
    }

    pub fn is_location_not_found(&self) -> bool {
        matches!(self, Self::LocationNotFound(_))
    }
}
