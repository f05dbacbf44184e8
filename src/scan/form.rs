use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::control::{ControlApi, ControlError};
use crate::scan::request::{
    CoordinateSystem, IdPolicy, ScanId, ScanKind, ScanRequest, TargetMode, NO_SOURCE,
};
use crate::scan::validator::{validate_scan, FieldId, ValidationErrors};
use crate::schedule::{ScheduleService, ScheduleSnapshot};

pub const DEFAULT_TIP: &str = "All fields are mandatory.";
const SUBMIT_FAILED_TIP: &str = "The scan could not be sent to the telescope. Please try again.";

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("scan rejected: {0}")]
    Invalid(ValidationErrors),
    #[error(transparent)]
    Control(#[from] ControlError),
}

/// What the operator currently sees of the new-scan form.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct FormView {
    pub open: bool,
    pub kind: ScanKind,
    pub target: TargetMode,
    pub visible: Vec<FieldId>,
    pub draft: ScanRequest,
    pub invalid: Vec<FieldId>,
    pub tip: String,
}

/// The operator's scan draft for this session.
///
/// Exactly one target group is enabled at a time. Writes to a hidden field are ignored,
/// and switching groups clears the group being hidden.
#[derive(Debug)]
pub struct SubmissionForm {
    system: CoordinateSystem,
    id_policy: IdPolicy,
    draft: ScanRequest,
    invalid: Vec<FieldId>,
    tip: String,
    open: bool,
}

fn blank() -> ScanRequest {
    ScanRequest {
        id: None,
        name: String::new(),
        kind: ScanKind::Track,
        target: TargetMode::Source,
        source: NO_SOURCE.to_string(),
        ras: None,
        dec: None,
        lat: None,
        lon: None,
        duration: String::new(),
        freq_lower: String::new(),
        freq_upper: String::new(),
        step_number: String::new(),
    }
}

impl SubmissionForm {
    pub fn new(system: CoordinateSystem, id_policy: IdPolicy) -> Self {
        Self {
            system,
            id_policy,
            draft: blank(),
            invalid: Vec::new(),
            tip: DEFAULT_TIP.to_string(),
            open: false,
        }
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    fn reset(&mut self) {
        self.draft = blank();
        self.invalid.clear();
        self.tip = DEFAULT_TIP.to_string();
        self.open = false;
    }

    pub fn configure_for(&mut self, kind: ScanKind, target: TargetMode) {
        let target = match kind {
            ScanKind::Drift => TargetMode::Coordinates,
            ScanKind::Track => target,
        };
        if self.draft.kind == kind && self.draft.target == target {
            return;
        }
        log::debug!("scan form switched to {} / {}", kind, target);
        self.draft.kind = kind;
        self.draft.target = target;

        match target {
            TargetMode::Source => {
                self.draft.ras = None;
                self.draft.dec = None;
                self.draft.lat = None;
                self.draft.lon = None;
            }
            TargetMode::Coordinates => self.draft.source = NO_SOURCE.to_string(),
        }
        let visible = self.visible_fields();
        self.invalid.retain(|field| visible.contains(field));
    }

    pub fn visible_fields(&self) -> Vec<FieldId> {
        let mut fields = vec![FieldId::Name];
        match self.draft.target {
            TargetMode::Source => fields.push(FieldId::Source),
            TargetMode::Coordinates => fields.extend(self.system.fields()),
        }
        fields.extend([
            FieldId::Duration,
            FieldId::FreqLower,
            FieldId::FreqUpper,
            FieldId::StepNumber,
        ]);
        fields
    }

    /// Returns false when the field is hidden in the current mode and nothing changed.
    pub fn set(&mut self, field: FieldId, value: &str) -> bool {
        if !self.visible_fields().contains(&field) {
            log::debug!("ignoring write to hidden field {}", field);
            return false;
        }
        let value = value.trim().to_string();
        match field {
            FieldId::Name => self.draft.name = value,
            FieldId::Source => self.draft.source = value,
            FieldId::RightAscension => self.draft.ras = Some(value),
            FieldId::Declination => self.draft.dec = Some(value),
            FieldId::Latitude => self.draft.lat = Some(value),
            FieldId::Longitude => self.draft.lon = Some(value),
            FieldId::Duration => self.draft.duration = value,
            FieldId::FreqLower => self.draft.freq_lower = value,
            FieldId::FreqUpper => self.draft.freq_upper = value,
            FieldId::StepNumber => self.draft.step_number = value,
            _ => return false,
        }
        true
    }

    /// Loads a whole request, switching the form to the request's mode first.
    pub fn fill(&mut self, request: &ScanRequest) {
        self.configure_for(request.kind, request.target_mode());
        for field in self.visible_fields() {
            self.set(field, request.value(field));
        }
    }

    pub fn draft(&self) -> ScanRequest {
        self.draft.clone().normalized(self.system)
    }

    /// Validates and submits the draft. Nothing is sent while any field is invalid.
    /// On success the form closes and resets, on a network failure it stays as it was.
    pub async fn submit<A: ControlApi>(
        &mut self,
        schedule: &ScheduleService<A>,
    ) -> Result<ScheduleSnapshot, SubmitError> {
        let mut request = self.draft();
        if let Err(errors) = validate_scan(&request, self.system) {
            self.invalid = errors.errors.iter().map(|e| e.field).collect();
            self.tip = errors.summary().to_string();
            return Err(SubmitError::Invalid(errors));
        }
        self.invalid.clear();
        self.tip = DEFAULT_TIP.to_string();

        if self.id_policy == IdPolicy::ClientProvisional {
            request.id = Some(ScanId::provisional());
        }

        match schedule.submit(&request).await {
            Ok(snapshot) => {
                log::info!("scan '{}' submitted", request.name);
                self.reset();
                Ok(snapshot)
            }
            Err(e) => {
                log::warn!("submitting scan '{}' failed: {}", request.name, e);
                self.tip = SUBMIT_FAILED_TIP.to_string();
                Err(e.into())
            }
        }
    }

    pub fn view(&self) -> FormView {
        FormView {
            open: self.open,
            kind: self.draft.kind,
            target: self.draft.target,
            visible: self.visible_fields(),
            draft: self.draft.clone(),
            invalid: self.invalid.clone(),
            tip: self.tip.clone(),
        }
    }
}
