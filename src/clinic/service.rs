use log::{info, warn};
use serde::Serialize;
use uuid::Uuid;

use crate::clinic::dashboard::PatientQueue;
use crate::clinic::email::EmailDraft;
use crate::clinic::forms::{DoctorForm, ManualEntryForm, RecordForm, RegistrationForm};
use crate::clinic::vitals::body_mass_index;
use crate::error_handling::types::ClinicError;
use crate::session_management::SessionGate;
use crate::storage::record_store::RecordStore;
use crate::storage::types::{Doctor, MedicalRecord, NewMedicalRecord, Patient};

/// A patient together with the records of earlier visits, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientDetail {
    pub patient: Patient,
    pub records: Vec<MedicalRecord>,
}

/// Screen-level operations: role checks, form validation and the record store
/// calls each screen makes.
///
/// Every operation either completes all of its writes or returns before the
/// first one; a failed validation never changes stored state.
#[derive(Clone)]
pub struct ClinicService {
    store: RecordStore,
}

impl ClinicService {
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    // Admin dashboard

    pub fn list_doctors(&self, gate: &SessionGate) -> Result<Vec<Doctor>, ClinicError> {
        gate.require_admin()?;
        Ok(self.store.list_doctors()?)
    }

    pub fn add_doctor(&self, gate: &SessionGate, form: DoctorForm) -> Result<Doctor, ClinicError> {
        gate.require_admin()?;
        let doctor = form.validate()?;
        if self.store.list_doctors()?.iter().any(|d| d.username == doctor.username) {
            warn!("Adding a second doctor with username {:?}", doctor.username);
        }
        Ok(self.store.add_doctor(doctor)?)
    }

    pub fn delete_doctor(&self, gate: &SessionGate, id: Uuid) -> Result<bool, ClinicError> {
        gate.require_admin()?;
        Ok(self.store.delete_doctor(id)?)
    }

    // Patient registration

    /// Self-registration; needs no session.
    pub fn register_patient(&self, form: RegistrationForm) -> Result<Patient, ClinicError> {
        let patient = form.validate()?;
        Ok(self.store.add_patient(patient)?)
    }

    // Doctor dashboard

    pub fn add_patient_manually(
        &self,
        gate: &SessionGate,
        form: ManualEntryForm,
    ) -> Result<Patient, ClinicError> {
        gate.require_doctor()?;
        let patient = form.validate()?;
        Ok(self.store.add_patient(patient)?)
    }

    pub fn queue(&self, gate: &SessionGate) -> Result<PatientQueue, ClinicError> {
        gate.require_doctor()?;
        Ok(PatientQueue::from_patients(self.store.list_patients()?))
    }

    pub fn patient_detail(&self, gate: &SessionGate, id: Uuid) -> Result<PatientDetail, ClinicError> {
        gate.require_doctor()?;
        let patient = self.find_patient(id)?;
        let records = self.store.patient_records(id)?;
        Ok(PatientDetail { patient, records })
    }

    /// Appends a record signed by the logged-in doctor and completes the patient.
    pub fn save_medical_record(
        &self,
        gate: &SessionGate,
        patient_id: Uuid,
        form: RecordForm,
    ) -> Result<MedicalRecord, ClinicError> {
        let doctor = gate.require_doctor()?;
        let patient = self.find_patient(patient_id)?;
        let (diagnosis, mut findings) = form.validate()?;
        if let (Some(weight), Some(height)) = (&findings.vitals.weight, &findings.vitals.height) {
            findings.vitals.bmi = body_mass_index(weight, height);
        }

        let record = self.store.add_medical_record(NewMedicalRecord {
            patient_id: patient.id,
            doctor_id: doctor.id.clone(),
            doctor_name: doctor.display_name().to_string(),
            diagnosis,
            findings,
        })?;
        self.store.complete_patient(patient.id)?;
        info!("{} saved record {} for patient {}", doctor.username, record.id, patient.id);
        Ok(record)
    }

    /// Email draft of the patient's latest record.
    pub fn email_draft(&self, gate: &SessionGate, patient_id: Uuid) -> Result<EmailDraft, ClinicError> {
        gate.require_doctor()?;
        let patient = self.find_patient(patient_id)?;
        let records = self.store.patient_records(patient_id)?;
        let latest = records.last().ok_or(ClinicError::NoRecords(patient_id))?;
        EmailDraft::for_record(&patient, latest)
    }

    fn find_patient(&self, id: Uuid) -> Result<Patient, ClinicError> {
        self.store
            .get_patient(id)?
            .ok_or(ClinicError::PatientNotFound(id))
    }
}
