//! Météo-France API response models

use serde::Deserialize;

/// Hourly forecast response
#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    #[serde(default)]
    pub forecast: Vec<ForecastEntry>,
}

/// One hourly forecast entry
#[derive(Debug, Deserialize)]
pub struct ForecastEntry {
    /// Valid time as unix timestamp
    pub dt: i64,
    #[serde(rename = "T")]
    pub temperature: Temperature,
    /// Cloud cover in percent
    #[serde(default)]
    pub clouds: Option<f64>,
    #[serde(default)]
    pub wind: Option<Wind>,
    #[serde(default)]
    pub rain: Option<Rain>,
    /// Precipitation probability in percent
    #[serde(default)]
    pub precipitation_probability: Option<f64>,
    #[serde(default)]
    pub weather: Option<WeatherDescription>,
}

#[derive(Debug, Deserialize)]
pub struct Temperature {
    pub value: f64,
}

/// Wind block, speeds in m/s
#[derive(Debug, Deserialize)]
pub struct Wind {
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default)]
    pub gust: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct Rain {
    /// Precipitation over the last hour in mm
    #[serde(rename = "1h", default)]
    pub one_hour: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct WeatherDescription {
    #[serde(default)]
    pub desc: Option<String>,
}

impl WeatherDescription {
    /// Whether the textual description announces a thunderstorm
    pub fn is_thunderstorm(&self) -> bool {
        self.desc
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains("orage"))
    }
}

/// Vigilance bulletin response
#[derive(Debug, Deserialize)]
pub struct VigilanceResponse {
    #[serde(default)]
    pub timelaps: Vec<Timelap>,
}

#[derive(Debug, Deserialize)]
pub struct Timelap {
    #[serde(default)]
    pub max_colors: Vec<MaxColor>,
}

/// Per-phenomenon maximum colour in a vigilance period
#[derive(Debug, Deserialize)]
pub struct MaxColor {
    /// 1=green, 2=yellow, 3=orange, 4=red
    #[serde(default)]
    pub phenomenon_max_color_id: u8,
    #[serde(default)]
    pub phenomenon_max_name: Option<String>,
}

/// Map the French phenomenon labels onto stable identifiers
pub fn canonical_phenomenon(name: &str) -> String {
    match name.to_lowercase().as_str() {
        "orages" => "thunderstorm".to_string(),
        "pluie-inondation" => "rain".to_string(),
        "vent" | "vent violent" => "wind".to_string(),
        "neige-verglas" | "neige" => "snow".to_string(),
        "inondation" => "flood".to_string(),
        "feux de forêt" | "feux de foret" => "forest_fire".to_string(),
        "canicule" => "heat".to_string(),
        "grand-froid" | "grand froid" => "cold".to_string(),
        "avalanches" => "avalanche".to_string(),
        _ => name.to_string(),
    }
}
