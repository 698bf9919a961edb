//! Alert severity and alert records

use serde::{Deserialize, Serialize};

/// System severity, ordered `Ok < Warning < Critical`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    #[default]
    Ok,
    Warning,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Ok => write!(f, "OK"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// What triggered an alert record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    TankHigh,
    FlowRestricted,
    RainSpike,
    HighRisk,
    /// Fallback record when no condition fires
    Stable,
}

impl AlertKind {
    /// Headline shown on the alert card
    pub fn title(&self) -> &'static str {
        match self {
            AlertKind::TankHigh => "Tank level high",
            AlertKind::FlowRestricted => "Flow restriction detected",
            AlertKind::RainSpike => "Rain spike detected",
            AlertKind::HighRisk => "High flood risk",
            AlertKind::Stable => "System stable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub kind: AlertKind,
    pub title: String,
    pub message: String,
}

impl AlertRecord {
    pub fn new(kind: AlertKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: kind.title().to_string(),
            message: message.into(),
        }
    }
}
