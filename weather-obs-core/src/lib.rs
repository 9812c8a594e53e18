//! Core library for validated weather observations.
//!
//! This crate defines:
//! - The weather error taxonomy
//! - Text sanitizing and numeric coercion of raw API values
//! - The validated `WeatherObservation` record and its plain-mapping form
//! - Configuration for tools built on top of it
//!
//! It is used by `weather-obs-cli`, but fetching data from a weather API is left
//! to the caller: raw values go in, validated observations come out.

pub mod config;
pub mod error;
pub mod model;
pub mod sanitize;

pub use config::{Config, OutputFormat};
pub use error::{InvalidDataError, LocationNotFoundError, WeatherApiError};
pub use model::{Observation, RawObservation, WeatherObservation};
pub use sanitize::{sanitize_text, to_float};
