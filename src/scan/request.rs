use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;
use utoipa::ToSchema;

use crate::scan::validator::FieldId;

/// Sentinel the control server uses for "no named source selected".
pub const NO_SOURCE: &str = "no source";

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("{0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ScanKind {
    Track,
    Drift,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    ToSchema,
    strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TargetMode {
    #[default]
    Source,
    Coordinates,
}

/// Which coordinate pair the station's control server expects for explicit targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateSystem {
    #[default]
    Equatorial,
    Galactic,
}

impl CoordinateSystem {
    pub fn fields(self) -> [FieldId; 2] {
        match self {
            CoordinateSystem::Equatorial => [FieldId::RightAscension, FieldId::Declination],
            CoordinateSystem::Galactic => [FieldId::Latitude, FieldId::Longitude],
        }
    }

    /// Placeholder position sent when the target is a named source.
    pub fn origin(self) -> (&'static str, &'static str) {
        match self {
            CoordinateSystem::Equatorial => ("0h0m0s", "0d0m0s"),
            CoordinateSystem::Galactic => ("0", "0"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdPolicy {
    #[default]
    ServerAssigned,
    ClientProvisional,
}

/// Opaque scan identifier. Control servers hand out integers, provisional ids are UUIDs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum ScanId {
    Number(u64),
    Text(String),
}

impl ScanId {
    pub fn provisional() -> Self {
        ScanId::Text(uuid::Uuid::new_v4().to_string())
    }

    /// Servers echo ids as numbers or strings interchangeably.
    pub fn same_as(&self, other: &ScanId) -> bool {
        self == other || self.to_string() == other.to_string()
    }
}

impl fmt::Display for ScanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanId::Number(n) => write!(f, "{}", n),
            ScanId::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for ScanId {
    fn from(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.parse::<u64>() {
            Ok(n) => ScanId::Number(n),
            Err(_) => ScanId::Text(raw.to_string()),
        }
    }
}

/// A scan as typed by the operator. Values stay as raw text until validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ScanRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ScanId>,
    #[serde(default, deserialize_with = "text")]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ScanKind,
    #[serde(rename = "tracktype", default)]
    pub target: TargetMode,
    #[serde(default = "no_source", deserialize_with = "text")]
    pub source: String,
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
        skip_serializing_if = "Option::is_none",
        deserialize_with = "optional_text"
    )]
    pub lat: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "optional_text"
    )]
    pub lon: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub duration: String,
    #[serde(default, rename = "freqlower", deserialize_with = "text")]
    pub freq_lower: String,
    #[serde(default, rename = "frequpper", deserialize_with = "text")]
    pub freq_upper: String,
    #[serde(default, rename = "stepnumber", deserialize_with = "text")]
    pub step_number: String,
}

impl ScanRequest {
    pub fn from_yaml(yaml: &str) -> Result<Self, ParseError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Drift scans sweep a fixed position, so they never target a named source.
    pub fn target_mode(&self) -> TargetMode {
        match self.kind {
            ScanKind::Drift => TargetMode::Coordinates,
            ScanKind::Track => self.target,
        }
    }

    pub fn value(&self, field: FieldId) -> &str {
        let value = match field {
            FieldId::Name => Some(&self.name),
            FieldId::Source => Some(&self.source),
            FieldId::RightAscension => self.ras.as_ref(),
            FieldId::Declination => self.dec.as_ref(),
            FieldId::Latitude => self.lat.as_ref(),
            FieldId::Longitude => self.lon.as_ref(),
            FieldId::Duration => Some(&self.duration),
            FieldId::FreqLower => Some(&self.freq_lower),
            FieldId::FreqUpper => Some(&self.freq_upper),
            FieldId::StepNumber => Some(&self.step_number),
            _ => None,
        };
        value.map(String::as_str).unwrap_or("")
    }

    fn position_mut(&mut self, field: FieldId) -> Option<&mut Option<String>> {
        match field {
            FieldId::RightAscension => Some(&mut self.ras),
            FieldId::Declination => Some(&mut self.dec),
            FieldId::Latitude => Some(&mut self.lat),
            FieldId::Longitude => Some(&mut self.lon),
            _ => None,
        }
    }

    /// Applies the single-target invariant: the inactive target group is zeroed or reset
    /// and the other coordinate system's pair is dropped.
    pub fn normalized(mut self, system: CoordinateSystem) -> Self {
        let mode = self.target_mode();
        self.target = mode;

        let (first, second) = system.origin();
        let [first_field, second_field] = system.fields();
        for field in [
            FieldId::RightAscension,
            FieldId::Declination,
            FieldId::Latitude,
            FieldId::Longitude,
        ] {
            if field != first_field && field != second_field {
                if let Some(slot) = self.position_mut(field) {
                    *slot = None;
                }
            }
        }

        match mode {
            TargetMode::Source => {
                if let Some(slot) = self.position_mut(first_field) {
                    *slot = Some(first.to_string());
                }
                if let Some(slot) = self.position_mut(second_field) {
                    *slot = Some(second.to_string());
                }
            }
            TargetMode::Coordinates => {
                self.source = NO_SOURCE.to_string();
                for field in [first_field, second_field] {
                    if let Some(slot) = self.position_mut(field) {
                        slot.get_or_insert_with(String::new);
                    }
                }
            }
        }
        self
    }
}

fn no_source() -> String {
    NO_SOURCE.to_string()
}

struct TextVisitor;

impl de::Visitor<'_> for TextVisitor {
    type Value = String;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a string or a number")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
        Ok(v)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<String, E> {
        Ok(v.to_string())
    }
}

struct Lenient(String);

impl<'de> Deserialize<'de> for Lenient {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(TextVisitor).map(Lenient)
    }
}

/// Accepts bare numbers wherever the form carries text, keeping them as written.
pub(crate) fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(TextVisitor)
}

pub(crate) fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Lenient>::deserialize(deserializer).map(|value| value.map(|l| l.0))
}
