//! Common test fixtures for weather relay tests.
//!
//! Payloads mirror what the collector publishes: OpenWeatherMap current
//! weather responses, requested with `units=metric&lang=pt_br`.

/// A complete observation for Santos, BR with two condition descriptors.
pub const FULL_OBSERVATION: &str = r#"{
    "coord": {"lon": -46.3319, "lat": -23.9588},
    "weather": [
        {"id": 500, "main": "Rain", "description": "chuva leve", "icon": "10d"},
        {"id": 701, "main": "Mist", "description": "névoa", "icon": "50d"}
    ],
    "base": "stations",
    "main": {
        "temp": 22.14,
        "feels_like": 22.61,
        "temp_min": 21.03,
        "temp_max": 23.4,
        "pressure": 1014,
        "humidity": 84,
        "sea_level": 1014,
        "grnd_level": 1012
    },
    "visibility": 9000,
    "wind": {"speed": 5.14, "deg": 140, "gust": 7.2},
    "rain": {"1h": 0.45},
    "clouds": {"all": 75},
    "dt": 1729260000,
    "sys": {"type": 2, "id": 2031283, "country": "BR", "sunrise": 1729239331, "sunset": 1729285192},
    "timezone": -10800,
    "id": 3449433,
    "name": "Santos",
    "cod": 200
}"#;

/// Minimal observation used as the reference scenario.
pub const REFERENCE_OBSERVATION: &str = r#"{"coord":{"lat":1.0,"lon":2.0},"weather":[{"main":"Rain","description":"light rain"}],"main":{"temp":15.5,"feels_like":14.0,"temp_min":13.0,"temp_max":17.0,"humidity":80},"wind":{"speed":3.2,"deg":180},"visibility":10000}"#;

/// Exact body expected downstream for [`REFERENCE_OBSERVATION`].
pub const REFERENCE_SUMMARY: &str = r#"{"coord":{"lat":1.0,"lon":2.0},"temperature":15.5,"percent_humidity":80,"wind":{"speed":3.2,"deg":180},"weather_condition":{"type":"Rain","description":"light rain"},"feels_like":14.0,"temperature_min":13.0,"temperature_max":17.0,"visibility_level":10000}"#;

/// Observation whose condition sequence is empty.
pub const OBSERVATION_WITHOUT_CONDITIONS: &str = r#"{
    "coord": {"lon": -46.3319, "lat": -23.9588},
    "weather": [],
    "main": {"temp": 22.1, "feels_like": 22.5, "temp_min": 21.0, "temp_max": 23.0, "humidity": 70},
    "wind": {"speed": 2.0, "deg": 90},
    "visibility": 10000
}"#;

/// Observation with `null` in place of several fields.
pub const OBSERVATION_WITH_NULLS: &str = r#"{
    "coord": {"lon": 2.0, "lat": 1.0},
    "weather": null,
    "main": {"temp": 15.5, "feels_like": null, "humidity": 80},
    "wind": {"speed": 3.2, "deg": 180},
    "rain": null,
    "name": null,
    "visibility": 10000
}"#;

/// Payloads that must never decode: broken JSON, non-object roots, and
/// fields carrying the wrong JSON type. A `null` root or field is not
/// malformed; it decodes to zero values.
pub const MALFORMED_PAYLOADS: &[&str] = &[
    "",
    "not json",
    "{",
    r#"{"coord":{"lat":1.0,"lon":2.0}"#,
    "42",
    r#""a string""#,
    "[]",
    r#"{"main":"hot"}"#,
    r#"{"coord":{"lat":"north"}}"#,
    r#"{"weather":[{"main":5}]}"#,
    r#"{"weather":{"main":"Rain"}}"#,
    r#"{"wind":{"deg":"south"}}"#,
    r#"{"main":{"humidity":80.5}}"#,
];
