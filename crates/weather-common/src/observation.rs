//! Inbound weather observation as published by the collector.
//!
//! The layout follows the OpenWeatherMap "current weather" response. Every
//! field falls back to its zero value when missing or `null` so partial
//! documents still decode; a field that is present with the wrong JSON type
//! does not.

use serde::{Deserialize, Deserializer, Serialize};

/// Decode `null` the same way as an absent field: the zero value.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// [`null_as_default`] for the sequence and for each of its elements.
fn null_elements_as_default<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    let items = Option::<Vec<Option<T>>>::deserialize(deserializer)?;
    Ok(items
        .unwrap_or_default()
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect())
}

/// A single current-weather observation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherObservation {
    #[serde(deserialize_with = "null_as_default")]
    pub coord: Coordinates,
    /// Condition descriptors, most significant first.
    #[serde(deserialize_with = "null_elements_as_default")]
    pub weather: Vec<ConditionDescriptor>,
    #[serde(deserialize_with = "null_as_default")]
    pub base: String,
    #[serde(deserialize_with = "null_as_default")]
    pub main: Measurements,
    /// Visibility distance in meters.
    #[serde(deserialize_with = "null_as_default")]
    pub visibility: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub wind: WindVector,
    #[serde(deserialize_with = "null_as_default")]
    pub rain: Precipitation,
    #[serde(deserialize_with = "null_as_default")]
    pub clouds: Clouds,
    /// Observation time, unix seconds UTC.
    #[serde(deserialize_with = "null_as_default")]
    pub dt: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub sys: StationInfo,
    /// Shift in seconds from UTC.
    #[serde(deserialize_with = "null_as_default")]
    pub timezone: i64,
    /// City id.
    #[serde(deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    /// Upstream response status code.
    #[serde(deserialize_with = "null_as_default")]
    pub cod: i64,
}

impl WeatherObservation {
    /// The most significant condition, if the upstream reported any.
    pub fn primary_condition(&self) -> Option<&ConditionDescriptor> {
        self.weather.first()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Coordinates {
    #[serde(deserialize_with = "null_as_default")]
    pub lon: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub lat: f64,
}

/// One weather condition entry, e.g. `Rain` / `light rain`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConditionDescriptor {
    /// Condition category code.
    #[serde(deserialize_with = "null_as_default")]
    pub id: i64,
    /// Short label.
    #[serde(deserialize_with = "null_as_default")]
    pub main: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub icon: String,
}

/// Primary measurements. Pressures are in hPa.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Measurements {
    #[serde(deserialize_with = "null_as_default")]
    pub temp: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub feels_like: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub temp_min: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub temp_max: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub pressure: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub humidity: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub sea_level: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub grnd_level: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindVector {
    #[serde(deserialize_with = "null_as_default")]
    pub speed: f64,
    /// Direction in degrees (meteorological).
    #[serde(deserialize_with = "null_as_default")]
    pub deg: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub gust: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Precipitation {
    /// Accumulation over the last hour, mm.
    #[serde(rename = "1h", deserialize_with = "null_as_default")]
    pub one_hour: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Clouds {
    /// Cloud coverage percentage.
    #[serde(deserialize_with = "null_as_default")]
    pub all: i64,
}

/// Station and location metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationInfo {
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub kind: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub country: String,
    #[serde(deserialize_with = "null_as_default")]
    pub sunrise: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub sunset: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_full_document() {
        let obs: WeatherObservation =
            serde_json::from_str(test_utils::fixtures::FULL_OBSERVATION).unwrap();

        assert_eq!(obs.coord.lat, -23.9588);
        assert_eq!(obs.coord.lon, -46.3319);
        assert_eq!(obs.weather.len(), 2);
        assert_eq!(obs.weather[0].id, 500);
        assert_eq!(obs.weather[0].icon, "10d");
        assert_eq!(obs.main.pressure, 1014);
        assert_eq!(obs.main.sea_level, 1014);
        assert_eq!(obs.main.grnd_level, 1012);
        assert_eq!(obs.wind.gust, 7.2);
        assert_eq!(obs.rain.one_hour, 0.45);
        assert_eq!(obs.clouds.all, 75);
        assert_eq!(obs.sys.kind, 2);
        assert_eq!(obs.sys.country, "BR");
        assert_eq!(obs.timezone, -10800);
        assert_eq!(obs.name, "Santos");
        assert_eq!(obs.cod, 200);
    }

    #[test]
    fn test_missing_fields_default_to_zero() {
        let obs: WeatherObservation = serde_json::from_str(r#"{"main":{"temp":21.5}}"#).unwrap();

        assert_eq!(obs.main.temp, 21.5);
        assert_eq!(obs.main.humidity, 0);
        assert_eq!(obs.visibility, 0);
        assert!(obs.weather.is_empty());
        assert!(obs.primary_condition().is_none());
        assert_eq!(obs.sys.country, "");
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let obs: WeatherObservation =
            serde_json::from_str(r#"{"visibility":8000,"snow":{"1h":2.0},"extra":[1,2]}"#)
                .unwrap();
        assert_eq!(obs.visibility, 8000);
    }

    #[test]
    fn test_null_fields_default_to_zero() {
        let obs: WeatherObservation = serde_json::from_str(
            r#"{
                "main": {"temp": 15.5, "humidity": null},
                "rain": null,
                "weather": null,
                "wind": {"speed": null, "deg": 270},
                "sys": {"type": null, "country": null},
                "name": null,
                "visibility": null
            }"#,
        )
        .unwrap();

        assert_eq!(obs.main.temp, 15.5);
        assert_eq!(obs.main.humidity, 0);
        assert_eq!(obs.rain, Precipitation::default());
        assert!(obs.weather.is_empty());
        assert_eq!(obs.wind.speed, 0.0);
        assert_eq!(obs.wind.deg, 270);
        assert_eq!(obs.sys.kind, 0);
        assert_eq!(obs.sys.country, "");
        assert_eq!(obs.name, "");
        assert_eq!(obs.visibility, 0);
    }

    #[test]
    fn test_null_condition_entries_default_to_zero() {
        let obs: WeatherObservation = serde_json::from_str(
            r#"{"weather":[null,{"main":"Rain","description":null}]}"#,
        )
        .unwrap();

        assert_eq!(obs.weather.len(), 2);
        assert_eq!(obs.weather[0], ConditionDescriptor::default());
        assert_eq!(obs.weather[1].main, "Rain");
        assert_eq!(obs.weather[1].description, "");
    }

    #[test]
    fn test_wrong_type_rejected() {
        assert!(serde_json::from_str::<WeatherObservation>(r#"{"main":"hot"}"#).is_err());
        assert!(serde_json::from_str::<WeatherObservation>(r#"{"weather":{"main":"Rain"}}"#).is_err());
        assert!(serde_json::from_str::<WeatherObservation>(r#"{"main":{"humidity":80.5}}"#).is_err());
    }
}
