//! Compact report text and subject generation
//!
//! Reports are limited to 160 characters so they survive satellite
//! messengers and SMS gateways unchanged. Every metric gets a fixed-order
//! segment; absent values render as `-` placeholders.

use domain::{AlertLevel, MetricMax, RiskKind, VigilanceAlert, WeatherAnalysis};

/// Hard limit for the report text, in characters
const MAX_REPORT_CHARS: usize = 160;

/// Kind of report being generated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Morning,
    Evening,
    Dynamic,
}

impl ReportKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Evening => "evening",
            Self::Dynamic => "dynamic",
        }
    }
}

/// Everything the formatter needs for one report
#[derive(Debug)]
pub struct ReportContext<'a> {
    pub kind: ReportKind,
    /// Stage the report covers (today's for morning/dynamic, tomorrow's
    /// for evening)
    pub stage: &'a str,
    /// Day-after stage shown in evening reports
    pub next_stage: Option<&'a str>,
    pub analysis: &'a WeatherAnalysis,
    /// Overnight minimum temperature, evening reports only
    pub night_temperature: Option<f64>,
    /// Thunderstorm outlook for the following day
    pub thunderstorm_outlook: Option<MetricMax>,
    pub alerts: &'a [VigilanceAlert],
}

/// Render the report text, truncated to 160 characters
#[must_use]
pub fn format_report(ctx: &ReportContext<'_>) -> String {
    let analysis = ctx.analysis;

    let mut stage_part = ctx.stage.replace(' ', "");
    if ctx.kind == ReportKind::Evening
        && let Some(next) = ctx.next_stage
    {
        stage_part.push('→');
        stage_part.push_str(&next.replace(' ', ""));
    }

    let thunder_part = threshold_segment(
        "Gew.",
        "%",
        first_crossing(analysis, RiskKind::Thunderstorm),
        analysis.maxima.thunderstorm_probability,
    );
    let rain_part = threshold_segment(
        "Regen",
        "%",
        first_crossing(analysis, RiskKind::Rain),
        analysis.maxima.rain_probability,
    );

    let rain_amount_part = analysis
        .maxima
        .precipitation
        .filter(|m| m.value > 0.0)
        .map_or_else(
            || "Regen -mm".to_string(),
            |m| format!("Regen{:.1}mm@{}", m.value, m.time.format("%H:%M")),
        );

    let temp_part = analysis
        .maxima
        .temperature
        .filter(|m| m.value > 0.0)
        .map_or_else(|| "Hitze -".to_string(), |m| format!("Hitze{:.1}°C", m.value));

    let wind_part = analysis
        .maxima
        .wind_speed
        .filter(|m| m.value > 0.0)
        .map_or_else(|| "Wind -".to_string(), |m| format!("Wind{:.0}km/h", m.value));

    let gust_part = analysis
        .maxima
        .wind_gusts
        .filter(|m| m.value > 0.0)
        .map_or_else(
            || "Windböen -".to_string(),
            |m| format!("Windböen{:.0}km/h", m.value),
        );

    let outlook_part = ctx.thunderstorm_outlook.filter(|m| m.value > 0.0).map_or_else(
        || "Gew.+1 -".to_string(),
        |m| format!("Gew.+1{:.0}%@{}", m.value, m.time.format("%H:%M")),
    );

    let mut parts = vec![stage_part];
    match ctx.kind {
        ReportKind::Morning => {
            parts.extend([
                thunder_part,
                rain_part,
                rain_amount_part,
                temp_part,
                wind_part,
                gust_part,
                outlook_part,
            ]);
        },
        ReportKind::Evening => {
            let night_part = ctx.night_temperature.map_or_else(
                || "Nacht -".to_string(),
                |t| format!("Nacht{t:.1}°C"),
            );
            parts.extend([
                night_part,
                thunder_part,
                rain_part,
                rain_amount_part,
                temp_part,
                wind_part,
                gust_part,
                outlook_part,
            ]);
        },
        ReportKind::Dynamic => {
            parts.push("Update:".to_string());
            // Dynamic updates drop quiet segments to save space
            if thunder_part != "Gew. -" {
                parts.push(thunder_part);
            }
            if rain_part != "Regen -" {
                parts.push(rain_part);
            }
            if rain_amount_part != "Regen -mm" {
                parts.push(rain_amount_part);
            }
            parts.extend([temp_part, wind_part, gust_part, outlook_part]);
        },
    }

    if let Some(warning) = format_vigilance_warning(ctx.alerts) {
        parts.push(warning);
    }

    truncate_report(&parts.join(" | "))
}

/// Email subject: `{base} {stage}: {LEVEL} - {phenomenon} ({type})`
///
/// The level/phenomenon block comes from the highest vigilance alert and
/// is left empty below yellow.
#[must_use]
pub fn format_subject(
    base_subject: &str,
    stage: &str,
    kind: ReportKind,
    alerts: &[VigilanceAlert],
) -> String {
    let report_type = kind.as_str();
    if let Some(alert) = highest_notable_alert(alerts) {
        let level = alert.level.as_str().to_uppercase();
        let phenomenon = translate_phenomenon(&alert.phenomenon);
        format!("{base_subject} {stage}: {level} - {phenomenon} ({report_type})")
    } else {
        format!("{base_subject} {stage}:  ({report_type})")
    }
}

/// First sample that crossed the base threshold for the given risk kind
fn first_crossing(analysis: &WeatherAnalysis, kind: RiskKind) -> Option<MetricMax> {
    analysis
        .risks
        .iter()
        .find(|r| r.kind == kind)
        .map(|r| MetricMax {
            value: r.value,
            time: r.time,
        })
}

/// `{prefix}{crossing}%@{t}({max}%@{t})`, with the parenthesis only when
/// the maximum exceeds the crossing value
fn threshold_segment(
    prefix: &str,
    unit: &str,
    crossing: Option<MetricMax>,
    max: Option<MetricMax>,
) -> String {
    let Some(crossing) = crossing.filter(|c| c.value > 0.0) else {
        return format!("{prefix} -");
    };

    let mut segment = format!(
        "{prefix}{:.0}{unit}@{}",
        crossing.value,
        crossing.time.format("%H:%M")
    );
    if let Some(max) = max
        && max.value > crossing.value
    {
        segment.push_str(&format!(
            "({:.0}{unit}@{})",
            max.value,
            max.time.format("%H:%M")
        ));
    }
    segment
}

/// Highest vigilance warning as `LEVEL Phänomen`, `None` below yellow
fn format_vigilance_warning(alerts: &[VigilanceAlert]) -> Option<String> {
    let alert = highest_notable_alert(alerts)?;
    Some(format!(
        "{} {}",
        alert.level.as_str().to_uppercase(),
        translate_phenomenon(&alert.phenomenon)
    ))
}

fn highest_notable_alert(alerts: &[VigilanceAlert]) -> Option<&VigilanceAlert> {
    alerts
        .iter()
        .max_by_key(|a| a.level.priority())
        .filter(|a| a.level.is_notable())
}

fn translate_phenomenon(phenomenon: &str) -> String {
    match phenomenon.to_ascii_lowercase().as_str() {
        "thunderstorm" => "Gewitter".to_string(),
        "rain" => "Regen".to_string(),
        "wind" => "Wind".to_string(),
        "snow" => "Schnee".to_string(),
        "flood" => "Hochwasser".to_string(),
        "forest_fire" => "Waldbrand".to_string(),
        "heat" => "Hitze".to_string(),
        "cold" => "Kälte".to_string(),
        "avalanche" => "Lawine".to_string(),
        "unknown" => "Warnung".to_string(),
        _ => phenomenon.to_string(),
    }
}

/// Clamp to 160 characters, ending in `...` when truncated
fn truncate_report(text: &str) -> String {
    if text.chars().count() <= MAX_REPORT_CHARS {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(MAX_REPORT_CHARS - 3).collect();
    truncated.push_str("...");
    truncated
}
