//! GPS tracker position adapter
//!
//! Fetches the public KML share page of a satellite tracker and extracts
//! the most recent reported position. KML orders coordinates as
//! `lon,lat[,alt]`; the last tuple of the last placemark is the newest fix.

use application::error::ApplicationError;
use application::ports::PositionPort;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{CurrentPosition, DomainError, GeoLocation};
use quick_xml::Reader;
use quick_xml::events::Event;
use reqwest::Client;
use tracing::{debug, instrument, warn};

use crate::config::ShareMapSettings;

/// Position lookups against a KML share page
#[derive(Debug)]
pub struct ShareMapAdapter {
    client: Client,
    settings: ShareMapSettings,
}

impl ShareMapAdapter {
    /// Create an adapter for one share page
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(settings: ShareMapSettings) -> Result<Self, ApplicationError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| ApplicationError::Internal(e.to_string()))?;
        Ok(Self { client, settings })
    }
}

#[async_trait]
impl PositionPort for ShareMapAdapter {
    #[instrument(skip(self), fields(url = %self.settings.url))]
    async fn current_position(&self) -> Result<Option<CurrentPosition>, ApplicationError> {
        let response = self
            .client
            .get(&self.settings.url)
            .send()
            .await
            .map_err(|e| ApplicationError::ExternalService(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApplicationError::ExternalService(format!(
                "share page returned HTTP {status}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ApplicationError::ExternalService(e.to_string()))?;

        let Some(fix) = parse_last_fix(&body)? else {
            debug!("share page carries no placemark yet");
            return Ok(None);
        };

        let location = GeoLocation::new(fix.latitude, fix.longitude)
            .map_err(DomainError::InvalidCoordinates)?;
        let timestamp = fix.timestamp.unwrap_or_else(|| {
            warn!("placemark carries no timestamp, assuming now");
            Utc::now()
        });

        debug!(%location, %timestamp, "position resolved");
        Ok(Some(CurrentPosition {
            location,
            timestamp,
            source_url: self.settings.url.clone(),
        }))
    }
}

/// Position port for setups without a tracker share page
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledPositionAdapter;

#[async_trait]
impl PositionPort for DisabledPositionAdapter {
    async fn current_position(&self) -> Result<Option<CurrentPosition>, ApplicationError> {
        Ok(None)
    }
}

struct LastFix {
    latitude: f64,
    longitude: f64,
    timestamp: Option<DateTime<Utc>>,
}

/// Extract the newest position fix from a KML document
///
/// The last `<coordinates>` element wins, and within it the last tuple;
/// a `<when>` element seen before it supplies the timestamp.
fn parse_last_fix(xml: &str) -> Result<Option<LastFix>, ApplicationError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut element: Option<Element> = None;
    let mut last_coordinates: Option<String> = None;
    let mut last_when: Option<String> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => element = classify(e.name().as_ref()),
            Ok(Event::Text(e)) => {
                if let Some(kind) = element
                    && let Ok(text) = e.unescape()
                {
                    let text = text.trim().to_string();
                    if !text.is_empty() {
                        match kind {
                            Element::Coordinates => last_coordinates = Some(text),
                            Element::When => last_when = Some(text),
                        }
                    }
                }
            },
            Ok(Event::End(_)) => element = None,
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ApplicationError::ExternalService(format!(
                    "invalid KML share page: {e}"
                )));
            },
            Ok(_) => {},
        }
        buf.clear();
    }

    let Some(coordinates) = last_coordinates else {
        return Ok(None);
    };
    let Some(tuple) = coordinates.split_whitespace().last() else {
        return Ok(None);
    };

    let mut parts = tuple.split(',');
    let longitude = parse_coordinate(parts.next())?;
    let latitude = parse_coordinate(parts.next())?;

    let timestamp = last_when
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc));

    Ok(Some(LastFix {
        latitude,
        longitude,
        timestamp,
    }))
}

#[derive(Debug, Clone, Copy)]
enum Element {
    Coordinates,
    When,
}

/// Classify an element by local name, tolerating namespace prefixes
fn classify(name: &[u8]) -> Option<Element> {
    let local = name.rsplit(|&b| b == b':').next().unwrap_or(name);
    match local {
        b"coordinates" => Some(Element::Coordinates),
        b"when" => Some(Element::When),
        _ => None,
    }
}

fn parse_coordinate(part: Option<&str>) -> Result<f64, ApplicationError> {
    part.and_then(|s| s.trim().parse::<f64>().ok())
        .ok_or_else(|| {
            ApplicationError::ExternalService("malformed coordinates in share page".to_string())
        })
}
