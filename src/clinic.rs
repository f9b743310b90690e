//! Clinic workflows
//!
//! The operations behind each screen of the clinic: admin doctor management,
//! patient self-registration, the doctor's queue and the medical record entry.
//!
//! Components:
//! - `forms`: raw form input and required-field validation.
//! - `service`: `ClinicService`, role checks plus record store calls per screen.
//! - `dashboard`: the doctor's patient queue and the registration URL.
//! - `email`: visit summary drafts as `mailto:` URLs.
//! - `vitals`: derived vitals (BMI).

pub mod dashboard;
pub mod email;
pub mod forms;
pub mod service;
pub mod vitals;

pub use dashboard::{registration_url, PatientQueue};
pub use email::EmailDraft;
pub use forms::{DoctorForm, ManualEntryForm, RecordForm, RegistrationForm};
pub use service::{ClinicService, PatientDetail};
