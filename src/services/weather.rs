use super::{http_client, WeatherService, PLAIN_THRESHOLD, PLAYFUL_THRESHOLD};
use crate::credentials::{CredentialStore, EnvCredentials};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const OPENWEATHERMAP_KEY_VAR: &str = "OPENWEATHERMAP_API_KEY";
pub const DEFAULT_WEATHER_URL: &str = "http://api.openweathermap.org/data/2.5/weather";

#[derive(Debug, Deserialize)]
struct WeatherBody {
    #[serde(default)]
    cod: serde_json::Value,
    #[serde(default)]
    message: Option<String>,
    main: Option<MainBlock>,
    #[serde(default)]
    weather: Vec<Condition>,
}

#[derive(Debug, Deserialize)]
struct MainBlock {
    temp: f64,
    feels_like: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct Condition {
    description: String,
}

/// Current-conditions lookup against OpenWeatherMap (imperial units).
pub struct OpenWeatherMap {
    client: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialStore>,
}

impl OpenWeatherMap {
    pub fn new(credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            client: http_client(Duration::from_secs(10)),
            base_url: DEFAULT_WEATHER_URL.to_string(),
            credentials,
        }
    }

    /// Key from `OPENWEATHERMAP_API_KEY`.
    pub fn from_env() -> Self {
        Self::new(Arc::new(EnvCredentials::from_var(OPENWEATHERMAP_KEY_VAR)))
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[async_trait]
impl WeatherService for OpenWeatherMap {
    async fn current(&self, city: &str, creativity: f64) -> String {
        let Some(key) = self.credentials.token() else {
            return missing_key_text(creativity).to_string();
        };

        let resp = self
            .client
            .get(&self.base_url)
            .query(&[("q", city), ("appid", key.as_str()), ("units", "imperial")])
            .header("x-luna-request-id", uuid::Uuid::new_v4().to_string())
            .send()
            .await;

        let body = match resp {
            Ok(r) => r.json::<WeatherBody>().await,
            Err(e) => {
                warn!(city, "weather request failed: {e}");
                return if creativity > PLAYFUL_THRESHOLD {
                    format!("The weather service is having a digital hiccup! Error: {e}")
                } else {
                    format!("Error fetching weather data: {e}")
                };
            }
        };

        match body {
            Ok(body) => {
                debug!(city, cod = %body.cod, "weather response");
                describe(city, &body, creativity)
            }
            Err(e) => {
                warn!(city, "unreadable weather response: {e}");
                format!("Weather service error: {e}")
            }
        }
    }
}

fn missing_key_text(creativity: f64) -> &'static str {
    if creativity > PLAYFUL_THRESHOLD {
        "I can't fetch live weather yet because no OpenWeatherMap API key is configured. \
         Add your key in the Settings or .env file to enable real-time weather."
    } else {
        "Weather is currently disabled because no OpenWeatherMap API key is configured. \
         Please add your key in Settings or the .env file to enable weather."
    }
}

fn is_ok_code(cod: &serde_json::Value) -> bool {
    cod.as_i64() == Some(200) || cod.as_str() == Some("200")
}

fn describe(city: &str, body: &WeatherBody, creativity: f64) -> String {
    let (Some(main), Some(cond), true) = (&body.main, body.weather.first(), is_ok_code(&body.cod))
    else {
        let msg = body.message.as_deref().unwrap_or("Unknown error");
        return if creativity > PLAYFUL_THRESHOLD {
            format!("Oops! The weather spirits aren't cooperating for {city} right now. Error: {msg}")
        } else {
            format!("Sorry, couldn't fetch weather data for {city}. Error: {msg}")
        };
    };

    let (temp, feels, humidity) = (main.temp, main.feels_like, main.humidity);
    let desc = &cond.description;
    if creativity <= PLAIN_THRESHOLD {
        format!(
            "Weather in {city}: {}, {temp}°F (feels like {feels}°F), humidity {humidity}%",
            title_case(desc)
        )
    } else if creativity <= PLAYFUL_THRESHOLD {
        format!(
            "🌤️ Weather in {city}: {}, {temp}°F (feels like {feels}°F), humidity {humidity}%",
            title_case(desc)
        )
    } else {
        let comment = if temp > 80.0 {
            " (toasty!)"
        } else if temp < 32.0 {
            " (brrr!)"
        } else if temp < 50.0 {
            " (cozy sweater weather!)"
        } else {
            ""
        };
        format!(
            "Weather report for {city}! It's {} with {temp}°F{comment} (feels like {feels}°F). \
             Humidity is hanging out at {humidity}%. Perfect for whatever adventure you're planning!",
            desc.to_lowercase()
        )
    }
}

fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(json: serde_json::Value) -> WeatherBody {
        serde_json::from_value(json).unwrap()
    }

    fn sunny() -> WeatherBody {
        body(serde_json::json!({
            "cod": 200,
            "main": {"temp": 85.5, "feels_like": 88.0, "humidity": 40},
            "weather": [{"description": "clear sky"}]
        }))
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("broken clouds"), "Broken Clouds");
    }

    #[test]
    fn test_tiers() {
        assert_eq!(
            describe("Paris", &sunny(), 0.2),
            "Weather in Paris: Clear Sky, 85.5°F (feels like 88°F), humidity 40%"
        );
        assert!(describe("Paris", &sunny(), 0.5).starts_with("🌤️ Weather in Paris"));
        let playful = describe("Paris", &sunny(), 0.9);
        assert!(playful.starts_with("Weather report for Paris! It's clear sky with 85.5°F (toasty!)"));
    }

    #[test]
    fn test_error_body() {
        let b = body(serde_json::json!({"cod": "404", "message": "city not found"}));
        assert_eq!(
            describe("Nowhere", &b, 0.5),
            "Sorry, couldn't fetch weather data for Nowhere. Error: city not found"
        );
    }

    #[tokio::test]
    async fn test_missing_key_skips_network() {
        let svc = OpenWeatherMap::new(Arc::new(EnvCredentials::with_token("")))
            .with_base_url("http://127.0.0.1:9/unreachable");
        let text = svc.current("Dayton", 0.2).await;
        assert!(text.starts_with("Weather is currently disabled"));
    }

    #[tokio::test]
    async fn test_live_shape_against_mock() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/weather")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("q".into(), "dayton,ohio".into()),
                mockito::Matcher::UrlEncoded("units".into(), "imperial".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"cod":200,"main":{"temp":30,"feels_like":25,"humidity":80},"weather":[{"description":"light snow"}]}"#)
            .create_async()
            .await;

        let svc = OpenWeatherMap::new(Arc::new(EnvCredentials::with_token("k")))
            .with_base_url(format!("{}/weather", server.url()));
        let text = svc.current("dayton,ohio", 0.9).await;
        assert!(text.contains("30°F (brrr!)"), "{text}");
        mock.assert_async().await;
    }
}
