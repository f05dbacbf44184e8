use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::scan::request::{optional_text, text, CoordinateSystem, ScanId};
use crate::scan::validator::FieldId;

/// Coarse station state shown in the sidebar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Telemetry {
    #[serde(default)]
    pub az: Option<f64>,
    #[serde(default)]
    pub al: Option<f64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "starttime")]
    pub start: Option<String>,
    #[serde(default, rename = "endtime")]
    pub end: Option<String>,
}

impl Telemetry {
    pub fn is_empty(&self) -> bool {
        *self == Telemetry::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Source {
    #[serde(deserialize_with = "text")]
    pub name: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "optional_text"
    )]
    pub ras: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "optional_text"
    )]
    pub dec: Option<String>,
    #[serde(
        default,
        alias = "gallat",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "optional_text"
    )]
    pub lat: Option<String>,
    #[serde(
        default,
        alias = "gallon",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "optional_text"
    )]
    pub lon: Option<String>,
}

impl Source {
    pub fn position(&self, system: CoordinateSystem) -> (&str, &str) {
        let (first, second) = match system {
            CoordinateSystem::Equatorial => (&self.ras, &self.dec),
            CoordinateSystem::Galactic => (&self.lat, &self.lon),
        };
        (
            first.as_deref().unwrap_or_default(),
            second.as_deref().unwrap_or_default(),
        )
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    ToSchema,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ConfigSection {
    NameLoc,
    MoveLimits,
    FreqRange,
}

impl ConfigSection {
    /// Field order of the section's value sequence on the wire.
    pub fn fields(self) -> &'static [FieldId] {
        match self {
            ConfigSection::NameLoc => &[
                FieldId::StationName,
                FieldId::StationLatitude,
                FieldId::StationLongitude,
                FieldId::StationHeight,
            ],
            ConfigSection::MoveLimits => &[
                FieldId::AzimuthLower,
                FieldId::AzimuthUpper,
                FieldId::AltitudeLower,
                FieldId::AltitudeUpper,
            ],
            ConfigSection::FreqRange => &[FieldId::FreqLower, FieldId::FreqUpper],
        }
    }
}

pub type ConfigValue = serde_json::Value;

/// A recently run scan and how it ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HistoryEntry {
    #[serde(deserialize_with = "text")]
    pub name: String,
    #[serde(rename = "type", default, deserialize_with = "text")]
    pub kind: String,
    /// `month/day/year` as the station records it.
    #[serde(default, deserialize_with = "text")]
    pub date: String,
    #[serde(default, deserialize_with = "text")]
    pub status: String,
}

impl HistoryEntry {
    pub fn completed(&self) -> bool {
        self.status == "complete"
    }
}

/// Archive search. Empty `name` matches every name, `any` matches every month or year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SearchQuery {
    #[serde(default, deserialize_with = "text")]
    pub name: String,
    #[serde(default = "any", deserialize_with = "text")]
    pub month: String,
    #[serde(default = "any", deserialize_with = "text")]
    pub year: String,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            name: String::new(),
            month: any(),
            year: any(),
        }
    }
}

fn any() -> String {
    "any".to_string()
}

/// A scan whose data is stored on the station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ArchivedScan {
    pub id: ScanId,
    #[serde(deserialize_with = "text")]
    pub name: String,
    #[serde(default, deserialize_with = "text")]
    pub date: String,
}
