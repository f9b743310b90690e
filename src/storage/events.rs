use serde::Serialize;

/// Published by the record store after every successful write.
///
/// Views subscribe instead of polling; an event only says which key changed,
/// readers reload the collection themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StoreEvent {
    DoctorsChanged,
    PatientsChanged,
    RecordsChanged,
    SessionChanged,
}

impl StoreEvent {
    /// Name used as the SSE event type.
    pub fn name(&self) -> &'static str {
        match self {
            StoreEvent::DoctorsChanged => "doctors",
            StoreEvent::PatientsChanged => "patients",
            StoreEvent::RecordsChanged => "medicalRecords",
            StoreEvent::SessionChanged => "currentUser",
        }
    }
}
