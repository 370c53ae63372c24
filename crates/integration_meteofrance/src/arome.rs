//! AROME instability grid client
//!
//! Fetches point values for CAPE and lifted index from the AROME WCS
//! service. Both metrics are optional enrichments; a failed fetch is
//! tolerated and logged.

use std::sync::Arc;

use domain::GeoLocation;
use quick_xml::Reader;
use quick_xml::events::Event;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::client::{MeteoFranceError, check_status};
use crate::token::MeteoTokenProvider;

/// AROME WCS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AromeConfig {
    /// WCS endpoint base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Coverage id for convective available potential energy
    #[serde(default = "default_cape_coverage")]
    pub cape_coverage: String,

    /// Coverage id for the lifted index
    #[serde(default = "default_lifted_index_coverage")]
    pub lifted_index_coverage: String,

    /// Connection timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://public-api.meteofrance.fr/public/arome/1.0/wcs/MF-NWP-HIGHRES-AROME-001-FRANCE-WCS"
        .to_string()
}

fn default_cape_coverage() -> String {
    "CONVECTIVE_AVAILABLE_POTENTIAL_ENERGY__GROUND_OR_WATER_SURFACE".to_string()
}

fn default_lifted_index_coverage() -> String {
    "LIFTED_INDEX__GROUND_OR_WATER_SURFACE".to_string()
}

const fn default_timeout() -> u64 {
    30
}

impl Default for AromeConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            cape_coverage: default_cape_coverage(),
            lifted_index_coverage: default_lifted_index_coverage(),
            timeout_secs: default_timeout(),
        }
    }
}

/// Point instability metrics for one location
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InstabilitySample {
    /// Worst CAPE over the coverage window, in J/kg
    pub cape: Option<f64>,
    /// Worst (lowest) lifted index over the coverage window, in K
    pub lifted_index: Option<f64>,
}

impl InstabilitySample {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.cape.is_none() && self.lifted_index.is_none()
    }
}

/// AROME WCS HTTP client
#[derive(Debug)]
pub struct AromeClient {
    client: Client,
    config: AromeConfig,
    tokens: Arc<MeteoTokenProvider>,
}

impl AromeClient {
    /// Create a new client sharing an existing token provider
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(
        config: AromeConfig,
        tokens: Arc<MeteoTokenProvider>,
    ) -> Result<Self, MeteoFranceError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| MeteoFranceError::RequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            config,
            tokens,
        })
    }

    /// Fetch CAPE and lifted index for a location
    ///
    /// Each coverage failure degrades to `None` for that metric; only
    /// authentication failures abort.
    ///
    /// # Errors
    ///
    /// Fails when no access token can be acquired.
    #[instrument(skip(self), fields(lat = %location.latitude(), lon = %location.longitude()))]
    pub async fn fetch_instability(
        &self,
        location: &GeoLocation,
    ) -> Result<InstabilitySample, MeteoFranceError> {
        let cape = match self.fetch_coverage(&self.config.cape_coverage, location).await {
            Ok(values) => worst_max(&values),
            Err(MeteoFranceError::Auth(e)) => return Err(MeteoFranceError::Auth(e)),
            Err(error) => {
                warn!(%error, "CAPE coverage fetch failed");
                None
            },
        };

        let lifted_index = match self
            .fetch_coverage(&self.config.lifted_index_coverage, location)
            .await
        {
            Ok(values) => worst_min(&values),
            Err(MeteoFranceError::Auth(e)) => return Err(MeteoFranceError::Auth(e)),
            Err(error) => {
                warn!(%error, "lifted index coverage fetch failed");
                None
            },
        };

        Ok(InstabilitySample { cape, lifted_index })
    }

    async fn fetch_coverage(
        &self,
        coverage_id: &str,
        location: &GeoLocation,
    ) -> Result<Vec<f64>, MeteoFranceError> {
        let url = format!(
            "{}?service=WCS&version=2.0.1&request=GetCoverage&coverageId={}&subset=lat({})&subset=long({})",
            self.config.base_url,
            coverage_id,
            location.latitude(),
            location.longitude()
        );
        debug!(url = %url, "Fetching WCS coverage");

        let token = self.tokens.get_token().await?;
        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| MeteoFranceError::RequestFailed(e.to_string()))?;

        check_status(response.status())?;

        let body = response
            .text()
            .await
            .map_err(|e| MeteoFranceError::RequestFailed(e.to_string()))?;
        parse_tuple_values(&body)
    }
}

/// Extract the numeric tuple values from a GetCoverage GML response
///
/// Values live inside `gml:tupleList` or `gml:doubleOrNilReasonTupleList`
/// elements, separated by whitespace or commas. Non-numeric entries (nil
/// reasons) are skipped.
fn parse_tuple_values(xml: &str) -> Result<Vec<f64>, MeteoFranceError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut values = Vec::new();
    let mut inside_tuple_list = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if is_tuple_list(e.name().as_ref()) {
                    inside_tuple_list = true;
                }
            },
            Ok(Event::Text(e)) => {
                if inside_tuple_list
                    && let Ok(text) = e.unescape()
                {
                    values.extend(
                        text.split(|c: char| c.is_whitespace() || c == ',')
                            .filter(|s| !s.is_empty())
                            .filter_map(|s| s.parse::<f64>().ok()),
                    );
                }
            },
            Ok(Event::End(e)) => {
                if is_tuple_list(e.name().as_ref()) {
                    inside_tuple_list = false;
                }
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(MeteoFranceError::ParseError(format!(
                    "Invalid WCS response: {e}"
                )));
            },
            Ok(_) => {},
        }
        buf.clear();
    }

    Ok(values)
}

fn is_tuple_list(name: &[u8]) -> bool {
    matches!(
        name,
        b"gml:tupleList" | b"tupleList" | b"gml:doubleOrNilReasonTupleList"
    )
}

fn worst_max(values: &[f64]) -> Option<f64> {
    values.iter().copied().fold(None, |acc, v| {
        Some(acc.map_or(v, |a: f64| if v > a { v } else { a }))
    })
}

fn worst_min(values: &[f64]) -> Option<f64> {
    values.iter().copied().fold(None, |acc, v| {
        Some(acc.map_or(v, |a: f64| if v < a { v } else { a }))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_COVERAGE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gml:RectifiedGridCoverage xmlns:gml="http://www.opengis.net/gml/3.2" gml:id="CAPE">
  <gml:rangeSet>
    <gml:DataBlock>
      <gml:tupleList>120.5 340.0,1850.25 90.0</gml:tupleList>
    </gml:DataBlock>
  </gml:rangeSet>
</gml:RectifiedGridCoverage>"#;

    #[test]
    fn tuple_values_are_extracted() {
        let values = parse_tuple_values(SAMPLE_COVERAGE).expect("should parse");
        assert_eq!(values, vec![120.5, 340.0, 1850.25, 90.0]);
    }

    #[test]
    fn nil_reasons_are_skipped() {
        let xml = r#"<root xmlns:gml="x"><gml:doubleOrNilReasonTupleList>1.0 missing 3.5</gml:doubleOrNilReasonTupleList></root>"#;
        let values = parse_tuple_values(xml).expect("should parse");
        assert_eq!(values, vec![1.0, 3.5]);
    }

    #[test]
    fn text_outside_tuple_list_is_ignored() {
        let xml = r#"<root><other>42.0</other><tupleList>7.0</tupleList></root>"#;
        let values = parse_tuple_values(xml).expect("should parse");
        assert_eq!(values, vec![7.0]);
    }

    #[test]
    fn empty_response_yields_no_values() {
        let values = parse_tuple_values("<root/>").expect("should parse");
        assert!(values.is_empty());
    }

    #[test]
    fn worst_values_pick_extremes() {
        assert_eq!(worst_max(&[120.0, 1850.0, 90.0]), Some(1850.0));
        assert_eq!(worst_min(&[2.0, -4.5, 0.0]), Some(-4.5));
        assert_eq!(worst_max(&[]), None);
        assert_eq!(worst_min(&[]), None);
    }

    #[test]
    fn empty_sample_is_detected() {
        assert!(InstabilitySample::default().is_empty());
        let sample = InstabilitySample {
            cape: Some(500.0),
            lifted_index: None,
        };
        assert!(!sample.is_empty());
    }

    #[test]
    fn config_defaults() {
        let config = AromeConfig::default();
        assert!(config.base_url.contains("arome"));
        assert!(config.cape_coverage.contains("CONVECTIVE"));
        assert!(config.lifted_index_coverage.contains("LIFTED_INDEX"));
    }
}
