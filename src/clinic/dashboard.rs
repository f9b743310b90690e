use serde::Serialize;

use crate::storage::types::{Patient, PatientStatus};

/// Doctor dashboard view of the patients collection, newest registration first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PatientQueue {
    pub waiting: Vec<Patient>,
    pub completed: Vec<Patient>,
}

impl PatientQueue {
    pub fn from_patients(mut patients: Vec<Patient>) -> Self {
        patients.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let (waiting, completed) = patients
            .into_iter()
            .partition(|p| p.status == PatientStatus::Waiting);
        Self { waiting, completed }
    }
}

/// Address of the self-registration page, the payload of the dashboard QR code.
pub fn registration_url(public_base_url: &str) -> String {
    format!("{}/patient/register", public_base_url.trim_end_matches('/'))
}
