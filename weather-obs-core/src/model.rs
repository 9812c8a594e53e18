use std::fmt;

use bon::bon;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::trace;

use crate::error::InvalidDataError;

/// Anything that can be flattened into a plain string-keyed mapping.
pub trait Observation {
    fn to_dict(&self) -> Map<String, Value>;
}

/// Observation fields as they arrive from an API response, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawObservation {
    pub city: Value,
    pub country: Value,
    pub latitude: Value,
    pub longitude: Value,
    pub temperature_c: Value,
    pub windspeed_kmh: Value,
    pub observation_time: Value,
    #[serde(default)]
    pub notes: Value,
}

/// A single weather reading. Every field is validated whenever it is assigned,
/// so an instance can never hold an out-of-range or empty value.
#[derive(Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawObservation")]
pub struct WeatherObservation {
    city: String,
    country: String,
    latitude: f64,
    longitude: f64,
    temperature_c: f64,
    windspeed_kmh: f64,
    observation_time: String,
    notes: Option<String>,
}

#[bon]
impl WeatherObservation {
    /// Validates the fields in declaration order and fails on the first bad one.
    ///
    /// ```
    /// use weather_obs_core::{Observation, WeatherObservation};
    ///
    /// let obs = WeatherObservation::builder()
    ///     .city("Paris")
    ///     .country("fr")
    ///     .latitude(48.8566)
    ///     .longitude(2.3522)
    ///     .temperature_c(18.0)
    ///     .windspeed_kmh(12.5)
    ///     .observation_time("2024-05-01T12:00:00Z")
    ///     .build()?;
    ///
    /// assert_eq!(obs.country(), "FR");
    /// assert_eq!(obs.to_dict()["notes"], serde_json::Value::Null);
    /// # Ok::<(), weather_obs_core::InvalidDataError>(())
    /// ```
    #[builder]
    pub fn new(
        #[builder(into)] city: Value,
        #[builder(into)] country: Value,
        #[builder(into)] latitude: Value,
        #[builder(into)] longitude: Value,
        #[builder(into)] temperature_c: Value,
        #[builder(into)] windspeed_kmh: Value,
        #[builder(into)] observation_time: Value,
        #[builder(into)] notes: Option<Value>,
    ) -> Result<Self, InvalidDataError> {
        let obs = Self {
            city: validate::city(&city)?,
            country: validate::country(&country)?,
            latitude: validate::latitude(&latitude)?,
            longitude: validate::longitude(&longitude)?,
            temperature_c: validate::temperature_c(&temperature_c)?,
            windspeed_kmh: validate::windspeed_kmh(&windspeed_kmh)?,
            observation_time: validate::observation_time(&observation_time)?,
            notes: validate::notes(&notes.unwrap_or(Value::Null))?,
        };

        trace!(city = %obs.city, country = %obs.country, "built weather observation");
        Ok(obs)
    }
}

impl WeatherObservation {
    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn set_city(&mut self, value: impl Into<Value>) -> Result<(), InvalidDataError> {
        self.city = validate::city(&value.into())?;
        Ok(())
    }

    /// Country code, always upper-case.
    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn set_country(&mut self, value: impl Into<Value>) -> Result<(), InvalidDataError> {
        self.country = validate::country(&value.into())?;
        Ok(())
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn set_latitude(&mut self, value: impl Into<Value>) -> Result<(), InvalidDataError> {
        self.latitude = validate::latitude(&value.into())?;
        Ok(())
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn set_longitude(&mut self, value: impl Into<Value>) -> Result<(), InvalidDataError> {
        self.longitude = validate::longitude(&value.into())?;
        Ok(())
    }

    pub fn temperature_c(&self) -> f64 {
        self.temperature_c
    }

    pub fn set_temperature_c(&mut self, value: impl Into<Value>) -> Result<(), InvalidDataError> {
        self.temperature_c = validate::temperature_c(&value.into())?;
        Ok(())
    }

    pub fn windspeed_kmh(&self) -> f64 {
        self.windspeed_kmh
    }

    pub fn set_windspeed_kmh(&mut self, value: impl Into<Value>) -> Result<(), InvalidDataError> {
        self.windspeed_kmh = validate::windspeed_kmh(&value.into())?;
        Ok(())
    }

    /// Timestamp exactly as supplied (sanitized). Not checked against any format.
    pub fn observation_time(&self) -> &str {
        &self.observation_time
    }

    pub fn set_observation_time(
        &mut self,
        value: impl Into<Value>,
    ) -> Result<(), InvalidDataError> {
        self.observation_time = validate::observation_time(&value.into())?;
        Ok(())
    }

    /// Best-effort RFC 3339 reading of [`Self::observation_time`].
    pub fn parsed_observation_time(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.observation_time).ok()
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Text replaces the notes and `Value::Null` clears them; [`Self::clear_notes`]
    /// does the same without going through a raw value.
    pub fn set_notes(&mut self, value: impl Into<Value>) -> Result<(), InvalidDataError> {
        self.notes = validate::notes(&value.into())?;
        Ok(())
    }

    pub fn clear_notes(&mut self) {
        self.notes = None;
    }
}

impl Observation for WeatherObservation {
    fn to_dict(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("city".into(), self.city.clone().into());
        map.insert("country".into(), self.country.clone().into());
        map.insert("latitude".into(), self.latitude.into());
        map.insert("longitude".into(), self.longitude.into());
        map.insert("temperature_c".into(), self.temperature_c.into());
        map.insert("windspeed_kmh".into(), self.windspeed_kmh.into());
        map.insert("observation_time".into(), self.observation_time.clone().into());
        map.insert("notes".into(), self.notes.clone().map_or(Value::Null, Value::String));
        map
    }
}

impl TryFrom<RawObservation> for WeatherObservation {
    type Error = InvalidDataError;

    fn try_from(raw: RawObservation) -> Result<Self, Self::Error> {
        Self::builder()
            .city(raw.city)
            .country(raw.country)
            .latitude(raw.latitude)
            .longitude(raw.longitude)
            .temperature_c(raw.temperature_c)
            .windspeed_kmh(raw.windspeed_kmh)
            .observation_time(raw.observation_time)
            .notes(raw.notes)
            .build()
    }
}

impl Serialize for WeatherObservation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_dict().serialize(serializer)
    }
}

impl fmt::Debug for WeatherObservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "WeatherObservation(city={:?}, country={:?}, lat={:.4}, lon={:.4} \
             tempC={:.1}, wind_kmh={:.1} time={:?}, notes={:?})",
            self.city,
            self.country,
            self.latitude,
            self.longitude,
            self.temperature_c,
            self.windspeed_kmh,
            self.observation_time,
            self.notes,
        )
    }
}

/// Per-field checks shared by the constructor and the setters.
mod validate {
    use std::ops::RangeInclusive;

    use serde_json::Value;
    use tracing::debug;

    use crate::error::InvalidDataError;
    use crate::sanitize::{sanitize_text, to_float};

    fn logged<T>(
        field: &'static str,
        result: Result<T, InvalidDataError>,
    ) -> Result<T, InvalidDataError> {
        result.inspect_err(|err| debug!(field, error = %err, "rejected observation field"))
    }

    fn non_empty_text(value: &Value, message: &str) -> Result<String, InvalidDataError> {
        match value {
            Value::String(s) if !s.trim().is_empty() => Ok(sanitize_text(s)),
            _ => Err(InvalidDataError::new(message)),
        }
    }

    fn in_range(
        name: &str,
        value: &Value,
        range: RangeInclusive<f64>,
        message: &str,
    ) -> Result<f64, InvalidDataError> {
        let v = to_float(name, value)?;
        if range.contains(&v) {
            Ok(v)
        } else {
            Err(InvalidDataError::new(message))
        }
    }

    pub(super) fn city(value: &Value) -> Result<String, InvalidDataError> {
        logged("city", non_empty_text(value, "City must be a non-empty string"))
    }

    pub(super) fn country(value: &Value) -> Result<String, InvalidDataError> {
        logged(
            "country",
            non_empty_text(value, "Country must be a non-empty string").map(|s| s.to_uppercase()),
        )
    }

    pub(super) fn latitude(value: &Value) -> Result<f64, InvalidDataError> {
        logged(
            "latitude",
            in_range("latitude", value, -90.0..=90.0, "Latitude must be between -90 and 90"),
        )
    }

    pub(super) fn longitude(value: &Value) -> Result<f64, InvalidDataError> {
        logged(
            "longitude",
            in_range("Longitude", value, -180.0..=180.0, "Longitude must be between -180 and 180"),
        )
    }

    pub(super) fn temperature_c(value: &Value) -> Result<f64, InvalidDataError> {
        logged(
            "temperature_c",
            in_range("Temperature_c", value, -100.0..=70.0, "Temperature seems unrealistic"),
        )
    }

    pub(super) fn windspeed_kmh(value: &Value) -> Result<f64, InvalidDataError> {
        logged(
            "windspeed_kmh",
            to_float("windspeed_kmh", value).and_then(|v| {
                if v >= 0.0 {
                    Ok(v)
                } else {
                    Err(InvalidDataError::new("Windspeed cannot be negative"))
                }
            }),
        )
    }

    pub(super) fn observation_time(value: &Value) -> Result<String, InvalidDataError> {
        logged(
            "observation_time",
            non_empty_text(value, "Observation time must be a non-empty string"),
        )
    }

    pub(super) fn notes(value: &Value) -> Result<Option<String>, InvalidDataError> {
        logged(
            "notes",
            match value {
                Value::Null => Ok(None),
                Value::String(s) => Ok(Some(sanitize_text(s))),
                _ => Err(InvalidDataError::new("Notes must be a string or None")),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn paris() -> WeatherObservation {
        WeatherObservation::builder()
            .city("Paris")
            .country("fr")
            .latitude(48.8566)
            .longitude(2.3522)
            .temperature_c(18.0)
            .windspeed_kmh(12.5)
            .observation_time("2024-05-01T12:00:00Z")
            .build()
            .expect("valid observation")
    }

    #[test]
    fn paris_to_dict_matches_expected_mapping() {
        let dict = Value::Object(paris().to_dict());
        assert_eq!(
            dict,
            json!({
                "city": "Paris",
                "country": "FR",
                "latitude": 48.8566,
                "longitude": 2.3522,
                "temperature_c": 18.0,
                "windspeed_kmh": 12.5,
                "observation_time": "2024-05-01T12:00:00Z",
                "notes": null,
            })
        );
    }

    #[test]
    fn to_dict_keys_are_in_field_order() {
        let keys: Vec<String> = paris().to_dict().keys().cloned().collect();
        assert_eq!(
            keys,
            [
                "city",
                "country",
                "latitude",
                "longitude",
                "temperature_c",
                "windspeed_kmh",
                "observation_time",
                "notes"
            ]
        );
    }

    #[test]
    fn latitude_bounds() {
        let mut obs = paris();
        for ok in [-90.0, 90.0, 0.0] {
            obs.set_latitude(ok).expect("in range");
            assert_eq!(obs.latitude(), ok);
        }
        for bad in [95.0, -91.0, 90.0001] {
            let err = obs.set_latitude(bad).unwrap_err();
            assert_eq!(err.message(), "Latitude must be between -90 and 90");
        }
    }

    #[test]
    fn longitude_bounds() {
        let mut obs = paris();
        obs.set_longitude(-180.0).expect("lower bound");
        obs.set_longitude(180.0).expect("upper bound");
        assert!(obs.set_longitude(180.5).is_err());
        assert!(obs.set_longitude(-181).is_err());
    }

    #[test]
    fn temperature_bounds() {
        let mut obs = paris();
        obs.set_temperature_c(-100.0).expect("lower bound");
        obs.set_temperature_c(70).expect("upper bound");
        let err = obs.set_temperature_c(70.1).unwrap_err();
        assert_eq!(err.message(), "Temperature seems unrealistic");
        assert!(obs.set_temperature_c(-100.5).is_err());
    }

    #[test]
    fn windspeed_must_not_be_negative() {
        let mut obs = paris();
        obs.set_windspeed_kmh(0).expect("zero is fine");
        assert_eq!(obs.windspeed_kmh(), 0.0);
        let err = obs.set_windspeed_kmh(-0.1).unwrap_err();
        assert_eq!(err.message(), "Windspeed cannot be negative");
    }

    #[test]
    fn blank_text_fields_are_rejected() {
        let mut obs = paris();
        for blank in ["", "   ", "\t\n"] {
            assert_eq!(
                obs.set_city(blank).unwrap_err().message(),
                "City must be a non-empty string"
            );
            assert_eq!(
                obs.set_country(blank).unwrap_err().message(),
                "Country must be a non-empty string"
            );
            assert_eq!(
                obs.set_observation_time(blank).unwrap_err().message(),
                "Observation time must be a non-empty string"
            );
        }
    }

    #[test]
    fn non_text_city_is_rejected() {
        let mut obs = paris();
        assert!(obs.set_city(42).is_err());
        assert!(obs.set_city(Value::Null).is_err());
    }

    #[test]
    fn country_is_upper_cased() {
        let mut obs = paris();
        obs.set_country("us").expect("valid country");
        assert_eq!(obs.country(), "US");
        assert_eq!(obs.to_dict()["country"], "US");
    }

    #[test]
    fn text_fields_are_sanitized() {
        let mut obs = paris();
        obs.set_city("  New   York ").expect("valid city");
        assert_eq!(obs.city(), "New York");
        obs.set_notes("  light   rain\n later ").expect("valid notes");
        assert_eq!(obs.notes(), Some("light rain later"));
    }

    #[test]
    fn notes_accept_none_or_text_only() {
        let mut obs = paris();
        obs.set_notes("windy on the coast").expect("text notes");
        assert_eq!(obs.notes(), Some("windy on the coast"));

        obs.set_notes(Value::Null).expect("null clears");
        assert_eq!(obs.notes(), None);

        let err = obs.set_notes(5).unwrap_err();
        assert_eq!(err.message(), "Notes must be a string or None");

        obs.set_notes("again").expect("text notes");
        obs.clear_notes();
        assert_eq!(obs.notes(), None);
    }

    #[test]
    fn non_numeric_latitude_names_the_field() {
        let mut obs = paris();
        let err = obs.set_latitude("abc").unwrap_err();
        assert!(err.message().contains("latitude"));
    }

    #[test]
    fn coercion_messages_use_field_labels() {
        let mut obs = paris();
        assert_eq!(
            obs.set_longitude("x").unwrap_err().message(),
            "Longitude must be a number."
        );
        assert_eq!(
            obs.set_temperature_c("x").unwrap_err().message(),
            "Temperature_c must be a number."
        );
        assert_eq!(
            obs.set_windspeed_kmh("x").unwrap_err().message(),
            "windspeed_kmh must be a number."
        );
    }

    #[test]
    fn numeric_text_is_coerced() {
        let mut obs = paris();
        obs.set_latitude(" 51.5 ").expect("numeric text");
        assert_eq!(obs.latitude(), 51.5);
    }

    #[test]
    fn failed_setter_leaves_value_untouched() {
        let mut obs = paris();
        let before = obs.clone();
        assert!(obs.set_latitude(200.0).is_err());
        assert!(obs.set_city("").is_err());
        assert!(obs.set_notes(json!(["a"])).is_err());
        assert_eq!(obs, before);
    }

    #[test]
    fn construction_stops_at_first_invalid_field() {
        let err = WeatherObservation::builder()
            .city("Paris")
            .country("  ")
            .latitude(500.0)
            .longitude(2.3522)
            .temperature_c(18.0)
            .windspeed_kmh(-1.0)
            .observation_time("now")
            .build()
            .unwrap_err();
        assert_eq!(err.message(), "Country must be a non-empty string");

        let err = WeatherObservation::builder()
            .city("Paris")
            .country("FR")
            .latitude(48.0)
            .longitude(2.0)
            .temperature_c(18.0)
            .windspeed_kmh(-1.0)
            .observation_time("")
            .build()
            .unwrap_err();
        assert_eq!(err.message(), "Windspeed cannot be negative");
    }

    #[test]
    fn builder_accepts_optional_notes() {
        let obs = WeatherObservation::builder()
            .city("Oslo")
            .country("no")
            .latitude(59.91)
            .longitude(10.75)
            .temperature_c(-4.0)
            .windspeed_kmh(3.0)
            .observation_time("2024-01-10T08:00:00Z")
            .maybe_notes(Some("snow"))
            .build()
            .expect("valid observation");
        assert_eq!(obs.notes(), Some("snow"));
    }

    #[test]
    fn debug_is_single_line_with_rounded_numbers() {
        let mut obs = paris();
        obs.set_notes("clear").expect("valid notes");
        let repr = format!("{obs:?}");
        assert_eq!(
            repr,
            "WeatherObservation(city=\"Paris\", country=\"FR\", lat=48.8566, lon=2.3522 \
             tempC=18.0, wind_kmh=12.5 time=\"2024-05-01T12:00:00Z\", notes=Some(\"clear\"))"
        );
        assert!(!repr.contains('\n'));
    }

    #[test]
    fn observation_time_is_parsed_when_rfc3339() {
        let obs = paris();
        let parsed = obs.parsed_observation_time().expect("rfc3339 timestamp");
        assert_eq!(parsed.timestamp(), 1_714_564_800);

        let mut obs = paris();
        obs.set_observation_time("yesterday noon").expect("free-form text is allowed");
        assert!(obs.parsed_observation_time().is_none());
    }

    #[test]
    fn raw_observation_round_trips_through_serde() {
        let obs = paris();
        let json = serde_json::to_string(&obs).expect("serialize");
        let back: WeatherObservation = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, obs);
    }

    #[test]
    fn deserializing_invalid_json_fails_validation() {
        let err = serde_json::from_value::<WeatherObservation>(json!({
            "city": "Paris",
            "country": "FR",
            "latitude": 95,
            "longitude": 2.35,
            "temperature_c": 18,
            "windspeed_kmh": 12.5,
            "observation_time": "2024-05-01T12:00:00Z",
        }))
        .unwrap_err();
        assert!(err.to_string().contains("Latitude must be between -90 and 90"));
    }
}
