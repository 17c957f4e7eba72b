//! Outbound weather summary accepted by the ingestion API.

use serde::{Deserialize, Serialize};

use crate::error::{TransformError, TransformResult};
use crate::observation::WeatherObservation;

/// Flattened projection of a [`WeatherObservation`].
///
/// Field order is the wire order of the serialized document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherSummary {
    pub coord: SummaryCoordinates,
    pub temperature: f64,
    pub percent_humidity: i64,
    pub wind: SummaryWind,
    pub weather_condition: WeatherCondition,
    pub feels_like: f64,
    pub temperature_min: f64,
    pub temperature_max: f64,
    pub visibility_level: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryCoordinates {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryWind {
    pub speed: f64,
    pub deg: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherCondition {
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
}

impl From<&WeatherObservation> for WeatherSummary {
    /// Straight field copies, no unit conversion.
    ///
    /// The condition comes from the first descriptor. An observation without
    /// descriptors yields empty strings rather than an error.
    fn from(obs: &WeatherObservation) -> Self {
        let weather_condition = obs
            .primary_condition()
            .map(|c| WeatherCondition {
                kind: c.main.clone(),
                description: c.description.clone(),
            })
            .unwrap_or_default();

        Self {
            coord: SummaryCoordinates {
                lat: obs.coord.lat,
                lon: obs.coord.lon,
            },
            temperature: obs.main.temp,
            percent_humidity: obs.main.humidity,
            wind: SummaryWind {
                speed: obs.wind.speed,
                deg: obs.wind.deg,
            },
            weather_condition,
            feels_like: obs.main.feels_like,
            temperature_min: obs.main.temp_min,
            temperature_max: obs.main.temp_max,
            visibility_level: obs.visibility,
        }
    }
}

impl WeatherSummary {
    /// Serialize to the JSON body posted downstream.
    pub fn to_json_bytes(&self) -> TransformResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(TransformError::Encode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::ConditionDescriptor;

    fn observation() -> WeatherObservation {
        serde_json::from_str(test_utils::fixtures::FULL_OBSERVATION).unwrap()
    }

    #[test]
    fn test_fields_copied_exactly() {
        let obs = observation();
        let summary = WeatherSummary::from(&obs);

        assert_eq!(summary.coord.lat, obs.coord.lat);
        assert_eq!(summary.coord.lon, obs.coord.lon);
        assert_eq!(summary.temperature, obs.main.temp);
        assert_eq!(summary.percent_humidity, obs.main.humidity);
        assert_eq!(summary.wind.speed, obs.wind.speed);
        assert_eq!(summary.wind.deg, obs.wind.deg);
        assert_eq!(summary.feels_like, obs.main.feels_like);
        assert_eq!(summary.temperature_min, obs.main.temp_min);
        assert_eq!(summary.temperature_max, obs.main.temp_max);
        assert_eq!(summary.visibility_level, obs.visibility);
    }

    #[test]
    fn test_condition_from_first_descriptor() {
        let summary = WeatherSummary::from(&observation());
        assert_eq!(summary.weather_condition.kind, "Rain");
        assert_eq!(summary.weather_condition.description, "chuva leve");
    }

    #[test]
    fn test_empty_conditions_zero_filled() {
        let mut obs = observation();
        obs.weather.clear();

        let summary = WeatherSummary::from(&obs);
        assert_eq!(summary.weather_condition, WeatherCondition::default());
        assert_eq!(summary.weather_condition.kind, "");
        assert_eq!(summary.weather_condition.description, "");
    }

    #[test]
    fn test_only_first_descriptor_used() {
        let mut obs = WeatherObservation::default();
        obs.weather = vec![
            ConditionDescriptor {
                main: "Clouds".to_string(),
                description: "overcast clouds".to_string(),
                ..Default::default()
            },
            ConditionDescriptor {
                main: "Mist".to_string(),
                description: "mist".to_string(),
                ..Default::default()
            },
        ];

        let summary = WeatherSummary::from(&obs);
        assert_eq!(summary.weather_condition.kind, "Clouds");
        assert_eq!(summary.weather_condition.description, "overcast clouds");
    }

    #[test]
    fn test_wire_field_names() {
        let json = serde_json::to_value(WeatherSummary::from(&observation())).unwrap();

        assert!(json["coord"]["lat"].is_f64());
        assert!(json["percent_humidity"].is_i64());
        assert_eq!(json["weather_condition"]["type"], "Rain");
        assert!(json["weather_condition"].get("kind").is_none());
        assert!(json["visibility_level"].is_i64());
    }
}
