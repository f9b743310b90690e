//! Record store
//!
//! `RecordStore` keeps the three entity collections (doctors, patients and
//! medical records) as JSON arrays, each under its own key of a
//! [`KeyValueStore`]. Reads and writes are whole-collection: every write
//! re-serializes the entire collection back to the backend.
//!
//! A key that was never written reads as an empty collection. A value that no
//! longer parses is logged and also read as empty; the next write to that key
//! replaces it.
//!
//! Collection writes are read-modify-write; clones of a store share one lock
//! held across the three steps, so concurrent writers never drop each other's
//! entries.
//!
//! Every successful write publishes a [`StoreEvent`] to subscribers.
//!
//! ```no_run
//! use std::sync::{Arc, Mutex, MutexGuard};
//! use clinic_desk::storage::{MemoryStorage, RecordStore};
//!
//! let store = RecordStore::new(Arc::new(MemoryStorage::new()));
//! let mut events = store.subscribe();
//! println!("{} patient(s) waiting", store.list_patients()?.len());
//! # Ok::<(), clinic_desk::error_handling::types::StorageError>(())
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use log::{debug, error, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error_handling::types::StorageError;
use crate::storage::events::StoreEvent;
use crate::storage::storage_trait::KeyValueStore;
use crate::storage::types::{
    Doctor, MedicalRecord, NewDoctor, NewMedicalRecord, NewPatient, Patient, PatientStatus,
};

/// Storage keys of the persisted layout.
pub mod keys {
    pub const DOCTORS: &str = "doctors";
    pub const PATIENTS: &str = "patients";
    pub const MEDICAL_RECORDS: &str = "medicalRecords";
    pub const CURRENT_USER: &str = "currentUser";
}

const EVENT_CAPACITY: usize = 64;

#[derive(Clone)]
pub struct RecordStore {
    backend: Arc<dyn KeyValueStore>,
    events: broadcast::Sender<StoreEvent>,
    write_lock: Arc<Mutex<()>>,
}

impl RecordStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            backend,
            events,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Receives one event per write made after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    pub(crate) fn publish(&self, event: StoreEvent) {
        // An error only means nobody is listening.
        let _ = self.events.send(event);
    }

    /// Reads and parses the value under `key`. Missing and malformed values are `None`.
    pub(crate) fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let Some(raw) = self.backend.get_item(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!("Ignoring malformed value under key {}: {}", key, e);
                Ok(None)
            }
        }
    }

    pub(crate) fn write_json<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        event: StoreEvent,
    ) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value).map_err(|e| {
            error!("Failed to serialize value for key {}: {}", key, e);
            StorageError::Serialization(e.to_string())
        })?;
        self.backend.set_item(key, &raw)?;
        self.publish(event);
        Ok(())
    }

    pub(crate) fn remove_key(&self, key: &str, event: StoreEvent) -> Result<(), StorageError> {
        self.backend.remove_item(key)?;
        self.publish(event);
        Ok(())
    }

    fn lock_collections(&self) -> Result<MutexGuard<'_, ()>, StorageError> {
        self.write_lock.lock().map_err(|e| {
            error!("Record store lock poisoned: {}", e);
            StorageError::ConnectionFailed
        })
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, StorageError> {
        let items: Vec<T> = self.read_json(key)?.unwrap_or_default();
        debug!("Loaded {} item(s) from {}", items.len(), key);
        Ok(items)
    }

    // Doctors

    pub fn list_doctors(&self) -> Result<Vec<Doctor>, StorageError> {
        self.load(keys::DOCTORS)
    }

    pub fn add_doctor(&self, doctor: NewDoctor) -> Result<Doctor, StorageError> {
        let _guard = self.lock_collections()?;
        let mut doctors = self.list_doctors()?;
        let doctor = Doctor {
            id: Uuid::new_v4(),
            name: doctor.name,
            username: doctor.username,
            password: doctor.password,
            specialty: doctor.specialty,
            created_at: Utc::now(),
        };
        doctors.push(doctor.clone());
        self.write_json(keys::DOCTORS, &doctors, StoreEvent::DoctorsChanged)?;
        info!("Added doctor {} ({})", doctor.id, doctor.username);
        Ok(doctor)
    }

    /// Removes the doctor with `id`. Returns whether a doctor was removed.
    pub fn delete_doctor(&self, id: Uuid) -> Result<bool, StorageError> {
        let _guard = self.lock_collections()?;
        let mut doctors = self.list_doctors()?;
        let before = doctors.len();
        doctors.retain(|d| d.id != id);
        if doctors.len() == before {
            debug!("No doctor {} to delete", id);
            return Ok(false);
        }
        self.write_json(keys::DOCTORS, &doctors, StoreEvent::DoctorsChanged)?;
        info!("Deleted doctor {}", id);
        Ok(true)
    }

    // Patients

    pub fn list_patients(&self) -> Result<Vec<Patient>, StorageError> {
        self.load(keys::PATIENTS)
    }

    pub fn get_patient(&self, id: Uuid) -> Result<Option<Patient>, StorageError> {
        Ok(self.list_patients()?.into_iter().find(|p| p.id == id))
    }

    pub fn add_patient(&self, patient: NewPatient) -> Result<Patient, StorageError> {
        let _guard = self.lock_collections()?;
        let mut patients = self.list_patients()?;
        let patient = Patient {
            id: Uuid::new_v4(),
            name: patient.name,
            age: patient.age,
            gender: patient.gender,
            contact: patient.contact,
            email: patient.email,
            symptoms: patient.symptoms,
            previous_diagnosis: patient.previous_diagnosis,
            reports: patient.reports,
            status: PatientStatus::Waiting,
            created_at: Utc::now(),
        };
        patients.push(patient.clone());
        self.write_json(keys::PATIENTS, &patients, StoreEvent::PatientsChanged)?;
        info!("Registered patient {}", patient.id);
        Ok(patient)
    }

    /// Moves a waiting patient to `Completed`.
    ///
    /// This is the only status transition. Unknown ids and patients that are
    /// already completed leave the collection untouched. Returns whether the
    /// status changed.
    pub fn complete_patient(&self, id: Uuid) -> Result<bool, StorageError> {
        let _guard = self.lock_collections()?;
        let mut patients = self.list_patients()?;
        let Some(patient) = patients.iter_mut().find(|p| p.id == id) else {
            debug!("No patient {} to complete", id);
            return Ok(false);
        };
        if patient.status == PatientStatus::Completed {
            return Ok(false);
        }
        patient.status = PatientStatus::Completed;
        self.write_json(keys::PATIENTS, &patients, StoreEvent::PatientsChanged)?;
        info!("Patient {} completed", id);
        Ok(true)
    }

    // Medical records

    pub fn list_medical_records(&self) -> Result<Vec<MedicalRecord>, StorageError> {
        self.load(keys::MEDICAL_RECORDS)
    }

    /// Records of one patient, oldest first.
    pub fn patient_records(&self, patient_id: Uuid) -> Result<Vec<MedicalRecord>, StorageError> {
        let mut records = self.list_medical_records()?;
        records.retain(|r| r.patient_id == patient_id);
        Ok(records)
    }

    pub fn add_medical_record(&self, record: NewMedicalRecord) -> Result<MedicalRecord, StorageError> {
        let _guard = self.lock_collections()?;
        let mut records = self.list_medical_records()?;
        let record = MedicalRecord {
            id: Uuid::new_v4(),
            patient_id: record.patient_id,
            doctor_id: record.doctor_id,
            doctor_name: record.doctor_name,
            diagnosis: record.diagnosis,
            findings: record.findings,
            created_at: Utc::now(),
        };
        records.push(record.clone());
        self.write_json(keys::MEDICAL_RECORDS, &records, StoreEvent::RecordsChanged)?;
        info!("Added medical record {} for patient {}", record.id, record.patient_id);
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory_storage::MemoryStorage;
    use crate::storage::types::{ClinicalFindings, Gender};
    use tokio::sync::broadcast::error::TryRecvError;

    fn store() -> RecordStore {
        RecordStore::new(Arc::new(MemoryStorage::new()))
    }

    fn new_patient(name: &str) -> NewPatient {
        NewPatient {
            name: name.to_string(),
            age: 40,
            gender: Gender::Other,
            contact: "555-0100".into(),
            email: None,
            symptoms: "cough".into(),
            previous_diagnosis: None,
            reports: None,
        }
    }

    fn new_doctor(username: &str) -> NewDoctor {
        NewDoctor {
            name: format!("Dr. {}", username),
            username: username.to_string(),
            password: "secret".into(),
            specialty: None,
        }
    }

    #[test]
    fn test_add_patient_starts_waiting() {
        let store = store();
        let first = store.add_patient(new_patient("A")).unwrap();
        let second = store.add_patient(new_patient("B")).unwrap();
        assert_ne!(first.id, second.id);

        let listed = store.list_patients().unwrap();
        assert_eq!(listed, vec![first.clone(), second]);
        assert_eq!(listed[0].status, PatientStatus::Waiting);
        assert_eq!(store.get_patient(first.id).unwrap(), Some(first));
    }

    #[test]
    fn test_complete_patient_is_one_way() {
        let store = store();
        let patient = store.add_patient(new_patient("A")).unwrap();
        assert!(store.complete_patient(patient.id).unwrap());
        assert!(!store.complete_patient(patient.id).unwrap());
        assert!(!store.complete_patient(Uuid::new_v4()).unwrap());
        assert_eq!(
            store.get_patient(patient.id).unwrap().unwrap().status,
            PatientStatus::Completed
        );
    }

    #[test]
    fn test_delete_doctor_removes_only_that_doctor() {
        let store = store();
        let keep = store.add_doctor(new_doctor("keep")).unwrap();
        let drop = store.add_doctor(new_doctor("drop")).unwrap();
        assert!(store.delete_doctor(drop.id).unwrap());
        assert!(!store.delete_doctor(drop.id).unwrap());
        assert_eq!(store.list_doctors().unwrap(), vec![keep]);
    }

    #[test]
    fn test_patient_records_filters_and_keeps_order() {
        let store = store();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        for (patient_id, diagnosis) in [(a, "first"), (b, "other"), (a, "second")] {
            store
                .add_medical_record(NewMedicalRecord {
                    patient_id,
                    doctor_id: "d".into(),
                    doctor_name: "Dr. D".into(),
                    diagnosis: diagnosis.into(),
                    findings: ClinicalFindings::default(),
                })
                .unwrap();
        }
        let diagnoses: Vec<_> = store
            .patient_records(a)
            .unwrap()
            .into_iter()
            .map(|r| r.diagnosis)
            .collect();
        assert_eq!(diagnoses, vec!["first", "second"]);
        assert_eq!(store.list_medical_records().unwrap().len(), 3);
    }

    #[test]
    fn test_malformed_collection_reads_as_empty() {
        let backend = Arc::new(MemoryStorage::new());
        backend.set_item(keys::PATIENTS, "{not json").unwrap();
        let store = RecordStore::new(backend.clone());
        assert!(store.list_patients().unwrap().is_empty());

        store.add_patient(new_patient("A")).unwrap();
        assert_eq!(store.list_patients().unwrap().len(), 1);
    }

    #[test]
    fn test_writes_publish_events() {
        let store = store();
        let mut rx = store.subscribe();
        let patient = store.add_patient(new_patient("A")).unwrap();
        store.complete_patient(patient.id).unwrap();
        store.add_doctor(new_doctor("x")).unwrap();

        assert_eq!(rx.try_recv().unwrap(), StoreEvent::PatientsChanged);
        assert_eq!(rx.try_recv().unwrap(), StoreEvent::PatientsChanged);
        assert_eq!(rx.try_recv().unwrap(), StoreEvent::DoctorsChanged);
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[test]
    fn test_reads_do_not_publish() {
        let store = store();
        let mut rx = store.subscribe();
        store.list_doctors().unwrap();
        store.complete_patient(Uuid::new_v4()).unwrap();
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
    }

    #[test]
    fn test_concurrent_adds_keep_every_patient() {
        let dir = tempfile::tempdir().unwrap();
        let backend = crate::storage::file_storage::FileStorage::new(dir.path()).unwrap();
        let store = RecordStore::new(Arc::new(backend));

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || store.add_patient(new_patient(&format!("P{}", i))).unwrap())
            })
            .collect();
        let added: Vec<Patient> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let listed = store.list_patients().unwrap();
        assert_eq!(listed.len(), 16);
        for patient in &added {
            assert!(listed.contains(patient));
        }
    }

    #[test]
    fn test_delete_unknown_doctor_writes_nothing() {
        let store = store();
        store.add_doctor(new_doctor("keep")).unwrap();
        let mut rx = store.subscribe();
        assert!(!store.delete_doctor(Uuid::new_v4()).unwrap());
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
        assert_eq!(store.list_doctors().unwrap().len(), 1);
    }
}
