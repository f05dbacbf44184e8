use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;
use utoipa::ToSchema;

use crate::control::{ConfigSection, SearchQuery, Source};
use crate::scan::request::{CoordinateSystem, ScanRequest, TargetMode, NO_SOURCE};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    ToSchema,
    strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FieldId {
    Name,
    Source,
    RightAscension,
    Declination,
    Latitude,
    Longitude,
    Duration,
    FreqLower,
    FreqUpper,
    StepNumber,
    StationName,
    StationLatitude,
    StationLongitude,
    StationHeight,
    AzimuthLower,
    AzimuthUpper,
    AltitudeLower,
    AltitudeUpper,
    Month,
    Year,
}

/// Inclusive numeric bounds checked after the syntax rule passes.
pub struct Range {
    pub label: &'static str,
    pub min: f64,
    pub max: f64,
}

pub struct Rule {
    pattern: LazyLock<Regex>,
    message: &'static str,
    range: Option<Range>,
}

macro_rules! rule {
    ($pattern:expr, $message:expr) => {
        Rule {
            pattern: LazyLock::new(|| Regex::new($pattern).expect("invalid validation pattern")),
            message: $message,
            range: None,
        }
    };
    ($pattern:expr, $message:expr, $label:expr, $min:expr, $max:expr) => {
        Rule {
            pattern: LazyLock::new(|| Regex::new($pattern).expect("invalid validation pattern")),
            message: $message,
            range: Some(Range {
                label: $label,
                min: $min,
                max: $max,
            }),
        }
    };
}

const REAL: &str = r"^[0-9]+\.?[0-9]*$";
const SIGNED_REAL: &str = r"^-?[0-9]+\.?[0-9]*$";

pub static RIGHT_ASCENSION: Rule = rule!(
    r"^0*(?:[0-9]|1\d|2[0-3])h0*(?:[0-9]|[1-5]\d)m0*(?:[0-9]|[1-5]\d)s$|^0*24h0+m0+s$",
    "Right ascension must be specified in sidereal time."
);
pub static DECLINATION: Rule = rule!(
    r"^-?0*(?:[0-9]|[1-8]\d)d0*(?:[0-9]|[1-5]\d)m0*(?:[0-9]|[1-5]\d)s$|^-?0*90d0+m0+s$",
    "Declination must be between 90 and -90 degrees."
);
pub static GALACTIC_LATITUDE: Rule = rule!(
    SIGNED_REAL,
    "Latitude must be a real number.",
    "latitude",
    -90.0,
    90.0
);
pub static GALACTIC_LONGITUDE: Rule = rule!(
    REAL,
    "Longitude must be a real number.",
    "longitude",
    0.0,
    360.0
);
pub static DURATION: Rule = rule!(
    r"^0*[0-7]h0*(?:[0-9]|[1-5]\d)m0*(?:[0-9]|[1-5]\d)s$|^0*8h0+m0+s$",
    "Duration must be eight hours or less."
);
pub static FREQ_LOWER: Rule = rule!(
    REAL,
    "Minimum frequency must be a real number.",
    "minimum frequency",
    0.0,
    10000.0
);
pub static FREQ_UPPER: Rule = rule!(
    REAL,
    "Maximum frequency must be a real number.",
    "maximum frequency",
    0.0,
    10000.0
);
pub static STEP_NUMBER: Rule = rule!(
    r"^[1-9][0-9]*$",
    "Step number must be a positive integer.",
    "step number",
    1.0,
    1000000.0
);
pub static NAME: Rule = rule!(
    r"^.{1,30}$",
    "Name must be no more than 30 characters long."
);
pub static SEARCH_NAME: Rule = rule!(
    r"^.{0,30}$",
    "Name must be no more than 30 characters long."
);
pub static SEARCH_MONTH: Rule = rule!(
    r"^(?:any|[1-9]|1[0-2])$",
    "Month must be a number from 1 to 12."
);
pub static SEARCH_YEAR: Rule = rule!(r"^(?:any|\d{4})$", "Year must have four digits.");
pub static STATION_NAME: Rule = rule!(
    r"^.{1,100}$",
    "Station name must be no more than 100 characters long."
);
pub static STATION_LATITUDE: Rule = rule!(
    SIGNED_REAL,
    "Latitude must be a real number.",
    "latitude",
    -90.0,
    90.0
);
pub static STATION_LONGITUDE: Rule = rule!(
    SIGNED_REAL,
    "Longitude must be a real number.",
    "longitude",
    -180.0,
    180.0
);
pub static STATION_HEIGHT: Rule = rule!(
    REAL,
    "Height must be a real number.",
    "height",
    0.0,
    10000.0
);
pub static AZIMUTH_LOWER: Rule = rule!(
    REAL,
    "Azimuth limits must be real numbers.",
    "lower azimuth",
    0.0,
    360.0
);
pub static AZIMUTH_UPPER: Rule = rule!(
    REAL,
    "Azimuth limits must be real numbers.",
    "upper azimuth",
    0.0,
    360.0
);
pub static ALTITUDE_LOWER: Rule = rule!(
    REAL,
    "Altitude limits must be real numbers.",
    "lower altitude",
    0.0,
    180.0
);
pub static ALTITUDE_UPPER: Rule = rule!(
    REAL,
    "Altitude limits must be real numbers.",
    "upper altitude",
    0.0,
    180.0
);

impl Rule {
    pub fn check(&self, value: &str) -> Result<(), String> {
        if !self.pattern.is_match(value) {
            return Err(self.message.to_string());
        }
        if let Some(range) = &self.range {
            let parsed: f64 = value.parse().map_err(|_| self.message.to_string())?;
            if parsed < range.min || parsed > range.max {
                return Err(format!(
                    "Value of {} must be between {} and {}.",
                    range.label, range.min, range.max
                ));
            }
        }
        Ok(())
    }
}

/// Numeric `lower <= upper`. Values that do not parse are left to their syntax rules.
pub fn check_order(lower: &str, upper: &str, message: &str) -> Result<(), String> {
    match (lower.parse::<f64>(), upper.parse::<f64>()) {
        (Ok(l), Ok(u)) if l > u => Err(message.to_string()),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct FieldError {
    pub field: FieldId,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    /// The one message surfaced as the form's tip.
    pub fn summary(&self) -> &str {
        self.errors
            .first()
            .map(|e| e.message.as_str())
            .unwrap_or_default()
    }

    #[cfg(test)]
    pub fn contains(&self, field: FieldId) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.summary())
    }
}

impl std::error::Error for ValidationErrors {}

/// Runs every rule and keeps every failure, in evaluation order.
#[derive(Debug, Default)]
pub struct Validation {
    errors: Vec<FieldError>,
}

impl Validation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, field: FieldId, value: &str, rule: &Rule) -> bool {
        match rule.check(value) {
            Ok(()) => true,
            Err(message) => self.fail(field, message),
        }
    }

    pub fn order(&mut self, field: FieldId, lower: &str, upper: &str, message: &str) -> bool {
        match check_order(lower, upper, message) {
            Ok(()) => true,
            Err(message) => self.fail(field, message),
        }
    }

    pub fn require(&mut self, field: FieldId, ok: bool, message: &str) -> bool {
        ok || self.fail(field, message.to_string())
    }

    fn fail(&mut self, field: FieldId, message: String) -> bool {
        self.errors.push(FieldError { field, message });
        false
    }

    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors {
                errors: self.errors,
            })
        }
    }
}

fn check_position(v: &mut Validation, system: CoordinateSystem, first: &str, second: &str) {
    match system {
        CoordinateSystem::Equatorial => {
            v.check(FieldId::RightAscension, first, &RIGHT_ASCENSION);
            v.check(FieldId::Declination, second, &DECLINATION);
        }
        CoordinateSystem::Galactic => {
            v.check(FieldId::Latitude, first, &GALACTIC_LATITUDE);
            v.check(FieldId::Longitude, second, &GALACTIC_LONGITUDE);
        }
    }
}

pub fn validate_scan(
    request: &ScanRequest,
    system: CoordinateSystem,
) -> Result<(), ValidationErrors> {
    let mut v = Validation::new();

    match request.target_mode() {
        TargetMode::Source => {
            let source = request.source.trim();
            v.require(
                FieldId::Source,
                !source.is_empty() && source != NO_SOURCE,
                "Must select a source.",
            );
        }
        TargetMode::Coordinates => {
            let [first, second] = system.fields();
            check_position(&mut v, system, request.value(first), request.value(second));
        }
    }

    v.check(FieldId::Duration, &request.duration, &DURATION);
    let lower = v.check(FieldId::FreqLower, &request.freq_lower, &FREQ_LOWER);
    let upper = v.check(FieldId::FreqUpper, &request.freq_upper, &FREQ_UPPER);
    if lower && upper {
        v.order(
            FieldId::FreqUpper,
            &request.freq_lower,
            &request.freq_upper,
            "Minimum frequency must not exceed maximum frequency.",
        );
    }
    v.check(FieldId::StepNumber, &request.step_number, &STEP_NUMBER);
    v.check(FieldId::Name, &request.name, &NAME);

    v.finish()
}

pub fn validate_source(source: &Source, system: CoordinateSystem) -> Result<(), ValidationErrors> {
    let mut v = Validation::new();
    v.check(FieldId::Name, &source.name, &NAME);
    let (first, second) = source.position(system);
    check_position(&mut v, system, first, second);
    v.finish()
}

pub fn validate_search(query: &SearchQuery) -> Result<(), ValidationErrors> {
    let mut v = Validation::new();
    v.check(FieldId::Name, query.name.trim(), &SEARCH_NAME);
    v.check(FieldId::Month, query.month.trim(), &SEARCH_MONTH);
    v.check(FieldId::Year, query.year.trim(), &SEARCH_YEAR);
    v.finish()
}

pub fn validate_section(section: ConfigSection, values: &[String]) -> Result<(), ValidationErrors> {
    let fields = section.fields();
    let mut v = Validation::new();

    if values.len() != fields.len() {
        v.require(
            fields[0],
            false,
            &format!(
                "Section {} takes {} values, got {}.",
                section,
                fields.len(),
                values.len()
            ),
        );
        return v.finish();
    }

    match section {
        ConfigSection::NameLoc => {
            v.check(FieldId::StationName, &values[0], &STATION_NAME);
            v.check(FieldId::StationLatitude, &values[1], &STATION_LATITUDE);
            v.check(FieldId::StationLongitude, &values[2], &STATION_LONGITUDE);
            v.check(FieldId::StationHeight, &values[3], &STATION_HEIGHT);
        }
        ConfigSection::MoveLimits => {
            let az = v.check(FieldId::AzimuthLower, &values[0], &AZIMUTH_LOWER)
                & v.check(FieldId::AzimuthUpper, &values[1], &AZIMUTH_UPPER);
            if az {
                v.order(
                    FieldId::AzimuthUpper,
                    &values[0],
                    &values[1],
                    "Lower azimuth limit must not exceed the upper limit.",
                );
            }
            let alt = v.check(FieldId::AltitudeLower, &values[2], &ALTITUDE_LOWER)
                & v.check(FieldId::AltitudeUpper, &values[3], &ALTITUDE_UPPER);
            if alt {
                v.order(
                    FieldId::AltitudeUpper,
                    &values[2],
                    &values[3],
                    "Lower altitude limit must not exceed the upper limit.",
                );
            }
        }
        ConfigSection::FreqRange => {
            let freq = v.check(FieldId::FreqLower, &values[0], &FREQ_LOWER)
                & v.check(FieldId::FreqUpper, &values[1], &FREQ_UPPER);
            if freq {
                v.order(
                    FieldId::FreqUpper,
                    &values[0],
                    &values[1],
                    "Minimum frequency must not exceed maximum frequency.",
                );
            }
        }
    }

    v.finish()
}
