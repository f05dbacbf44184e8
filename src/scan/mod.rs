pub mod form;
pub mod request;
pub mod validator;

pub use form::{FormView, SubmissionForm, SubmitError};
pub use request::{ScanId, ScanRequest};
