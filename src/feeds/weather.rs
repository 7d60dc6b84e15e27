use {
    super::get,
    crate::{
        config,
        fetch::{FetchError, Outcome},
    },
    reqwest::blocking::Client,
    serde::Deserialize,
};

/// the subset of an open-meteo forecast this feed reads.
#[derive(Debug, Deserialize)]
struct Forecast {
    current_weather: CurrentWeather,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    /// degrees celsius.
    temperature: f64,
    /// a WMO weather interpretation code.
    weathercode: i64,
}

/// the forecast endpoint for the configured location.
pub fn url() -> String {
    format!(
        "{}?latitude={}&longitude={}&current_weather=true",
        config::WEATHER_ENDPOINT,
        config::WEATHER_LATITUDE,
        config::WEATHER_LONGITUDE,
    )
}

/// fetches the current weather, formatted for display.
pub fn fetch(client: &Client) -> Outcome<String> {
    get(client, &url()).and_then(|body| parse(&body))
}

/// parses a forecast response body into a report.
pub fn parse(body: &str) -> Outcome<String> {
    if body.trim().is_empty() {
        return Err(FetchError::EmptyBody);
    }

    let Forecast {
        current_weather: CurrentWeather {
            temperature,
            weathercode,
        },
    } = serde_json::from_str::<Forecast>(body)?;

    Ok(report(config::WEATHER_LOCATION, weathercode, temperature))
}

/// formats a report, e.g. `Jalandhar: Rain 21.5°C`.
pub fn report(location: &str, code: i64, temperature: f64) -> String {
    let condition = condition(code);
    format!("{location}: {condition} {temperature:.1}°C")
}

/// maps a WMO weather code to a label. unknown codes have an empty label.
pub fn condition(code: i64) -> &'static str {
    match code {
        0 => "Clear",
        1 => "Mainly Clear",
        2 => "Partly Cloudy",
        3 => "Overcast",
        45 | 48 => "Fog",
        51 | 53 | 55 => "Drizzle",
        61 | 63 | 65 => "Rain",
        71 | 73 | 75 => "Snow",
        95 | 96 | 99 => "Thunderstorm",
        _ => "",
    }
}

/// the text shown in place of the weather after a failed fetch.
pub fn marker(error: &FetchError) -> String {
    match error {
        FetchError::Parse(_) => "Parse Error".to_owned(),
        other => format!("ERR: {}", super::truncate(&other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::fetch::ErrorKind};

    const BODY: &str = r#"{
        "latitude": 31.3,
        "longitude": 75.6,
        "current_weather": {
            "time": "2024-05-01T12:00",
            "temperature": 21.46,
            "windspeed": 7.2,
            "weathercode": 61
        }
    }"#;

    #[test]
    fn conditions() {
        assert_eq!(condition(0), "Clear");
        assert_eq!(condition(1), "Mainly Clear");
        assert_eq!(condition(2), "Partly Cloudy");
        assert_eq!(condition(3), "Overcast");
        assert_eq!(condition(48), "Fog");
        assert_eq!(condition(55), "Drizzle");
        assert_eq!(condition(61), "Rain");
        assert_eq!(condition(73), "Snow");
        assert_eq!(condition(99), "Thunderstorm");
    }

    #[test]
    fn unmapped_condition_is_empty() {
        assert_eq!(condition(17), "");
        assert_eq!(condition(-1), "");
        assert_eq!(report("Jalandhar", 17, 30.0), "Jalandhar:  30.0°C");
    }

    #[test]
    fn parses_report() {
        assert_eq!(parse(BODY).unwrap(), "Jalandhar: Rain 21.5°C");
    }

    #[test]
    fn empty_body() {
        let error = parse("  \n").unwrap_err();
        assert!(matches!(error, FetchError::EmptyBody));
    }

    #[test]
    fn missing_fields() {
        let error = parse(r#"{"current_weather": {"temperature": 20.0}}"#).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Parse);
        assert_eq!(marker(&error), "Parse Error");
    }

    #[test]
    fn malformed_body() {
        let error = parse("<html>bad gateway</html>").unwrap_err();
        assert!(matches!(error, FetchError::Parse(_)));
    }

    #[test]
    fn status_marker() {
        let error = FetchError::Status { status: 503 };
        assert_eq!(marker(&error), "ERR: HTTP 503");
    }

    #[test]
    fn transport_marker_is_truncated() {
        let error = FetchError::Transport("dns error: failed to lookup address".to_owned());
        assert_eq!(marker(&error), "ERR: dns error: failed to..");
    }

    #[test]
    fn url_names_location() {
        let url = url();
        assert!(url.starts_with(config::WEATHER_ENDPOINT));
        assert!(url.contains("latitude=31.326"));
        assert!(url.contains("longitude=75.576"));
        assert!(url.ends_with("current_weather=true"));
    }
}
