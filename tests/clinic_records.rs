use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use clinic_desk::clinic::{ClinicService, DoctorForm, RecordForm, RegistrationForm};
use clinic_desk::error_handling::types::AuthError;
use clinic_desk::session_management::{Role, SessionGate};
use clinic_desk::storage::types::{
    BloodGroup, ChronicCondition, ClinicalFindings, Complaint, Examination, Gender, GeneralSign,
    History, HistoryEntry, Investigations, NewDoctor, NewMedicalRecord, NewPatient, Onset,
    PatientStatus, Treatment, Vitals,
};
use clinic_desk::storage::{FileStorage, KeyValueStore, MemoryStorage, RecordStore, StoreEvent};
use tokio_test::{assert_err, assert_ok};
use uuid::Uuid;

fn memory_store() -> RecordStore {
    RecordStore::new(Arc::new(MemoryStorage::new()))
}

fn new_patient(name: &str) -> NewPatient {
    NewPatient {
        name: name.to_string(),
        age: 33,
        gender: Gender::Other,
        contact: "555-0199".to_string(),
        email: Some(format!("{}@example.com", name.to_lowercase())),
        symptoms: "fever".to_string(),
        previous_diagnosis: None,
        reports: None,
    }
}

fn new_doctor(username: &str) -> NewDoctor {
    NewDoctor {
        name: format!("Dr. {}", username),
        username: username.to_string(),
        password: "secret".to_string(),
        specialty: None,
    }
}

#[test]
fn added_patients_wait_with_fresh_ids() {
    let store = memory_store();
    for name in ["Ana", "Bruno", "Carla"] {
        assert_ok!(store.add_patient(new_patient(name)));
    }

    let patients = assert_ok!(store.list_patients());
    let names: Vec<_> = patients.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Ana", "Bruno", "Carla"]);
    assert!(patients.iter().all(|p| p.status == PatientStatus::Waiting));
    let ids: HashSet<Uuid> = patients.iter().map(|p| p.id).collect();
    assert_eq!(ids.len(), 3);
}

#[test]
fn saving_a_record_completes_the_patient_for_good() {
    let store = memory_store();
    let service = ClinicService::new(store.clone());
    let mut gate = assert_ok!(SessionGate::restore(store.clone()));

    assert_ok!(gate.login("admin", "admin123"));
    assert_ok!(service.add_doctor(
        &gate,
        DoctorForm {
            name: "Dr. Lopes".into(),
            username: "lopes".into(),
            password: "pw".into(),
            ..Default::default()
        },
    ));
    assert_ok!(gate.logout());
    assert_ok!(gate.login("lopes", "pw"));

    let patient = assert_ok!(service.register_patient(RegistrationForm {
        name: "Rita".into(),
        age: "29".into(),
        gender: "female".into(),
        contact: "555-0123".into(),
        symptoms: "headache".into(),
        ..Default::default()
    }));
    assert_eq!(patient.status, PatientStatus::Waiting);

    for diagnosis in ["Migraine", "Tension headache"] {
        let form = RecordForm {
            diagnosis: diagnosis.into(),
            ..Default::default()
        };
        assert_ok!(service.save_medical_record(&gate, patient.id, form));
        let stored = assert_ok!(store.get_patient(patient.id)).unwrap();
        assert_eq!(stored.status, PatientStatus::Completed);
    }

    let records = assert_ok!(store.patient_records(patient.id));
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.doctor_name == "Dr. Lopes"));
}

#[test]
fn admin_pair_wins_regardless_of_doctors() {
    let store = memory_store();
    assert_ok!(store.add_doctor(NewDoctor {
        password: "not-admin123".into(),
        ..new_doctor("admin")
    }));
    let mut gate = assert_ok!(SessionGate::restore(store));

    let session = assert_ok!(gate.login("admin", "admin123"));
    assert_eq!(session.role, Role::Admin);
    assert_eq!(session.id, "admin");
}

#[test]
fn doctor_credentials_must_match_exactly() {
    let store = memory_store();
    let doctor = assert_ok!(store.add_doctor(new_doctor("mferreira")));
    let mut gate = assert_ok!(SessionGate::restore(store));

    let session = assert_ok!(gate.login("mferreira", "secret"));
    assert_eq!(session.role, Role::Doctor);
    assert_eq!(session.id, doctor.id.to_string());
    assert_eq!(session.name.as_deref(), Some("Dr. mferreira"));
    assert_ok!(gate.logout());

    assert_eq!(assert_err!(gate.login("mferreira", "Secret")), AuthError::InvalidCredentials);
    assert_eq!(assert_err!(gate.login("MFerreira", "secret")), AuthError::InvalidCredentials);
    assert!(gate.current().is_none());
}

#[test]
fn deleting_a_doctor_touches_nothing_else() {
    let store = memory_store();
    let keep = assert_ok!(store.add_doctor(new_doctor("keep")));
    let gone = assert_ok!(store.add_doctor(new_doctor("gone")));
    let patient = assert_ok!(store.add_patient(new_patient("Paulo")));
    assert_ok!(store.add_medical_record(NewMedicalRecord {
        patient_id: patient.id,
        doctor_id: gone.id.to_string(),
        doctor_name: gone.name.clone(),
        diagnosis: "Flu".into(),
        findings: Default::default(),
    }));
    let patients_before = assert_ok!(store.list_patients());
    let records_before = assert_ok!(store.list_medical_records());

    assert!(assert_ok!(store.delete_doctor(gone.id)));

    assert_eq!(assert_ok!(store.list_doctors()), vec![keep]);
    assert_eq!(assert_ok!(store.list_patients()), patients_before);
    assert_eq!(assert_ok!(store.list_medical_records()), records_before);
    assert!(!assert_ok!(store.delete_doctor(gone.id)));
}

#[test]
fn file_backend_round_trips_every_collection() {
    let dir = tempfile::tempdir().unwrap();
    let written = {
        let store = RecordStore::new(Arc::new(assert_ok!(FileStorage::new(dir.path()))));
        assert_ok!(store.add_doctor(new_doctor("one")));
        assert_ok!(store.add_patient(new_patient("Two")));
        (
            assert_ok!(store.list_doctors()),
            assert_ok!(store.list_patients()),
        )
    };

    let reopened = RecordStore::new(Arc::new(assert_ok!(FileStorage::new(dir.path()))));
    assert_eq!(assert_ok!(reopened.list_doctors()), written.0);
    assert_eq!(assert_ok!(reopened.list_patients()), written.1);
    assert!(dir.path().join("doctors.json").exists());
    assert!(dir.path().join("patients.json").exists());
}

fn full_findings() -> ClinicalFindings {
    let text = |s: &str| Some(s.to_string());
    ClinicalFindings {
        vitals: Vitals {
            blood_pressure: text("130/85"),
            heart_rate: text("88"),
            respiratory_rate: text("18"),
            body_temperature: text("37.9"),
            oxygen_saturation: text("95"),
            weight: text("82"),
            height: text("180"),
            bmi: text("25.3"),
            blood_group: Some(BloodGroup::AbNegative),
        },
        history: History {
            allergies: text("penicillin"),
            smoking_alcohol: text("ex-smoker"),
            current_medications: text("metformin"),
            past_surgery: text("appendectomy"),
            past_history: vec![
                HistoryEntry {
                    condition: ChronicCondition::Diabetes,
                    duration: text("6 years"),
                },
                HistoryEntry {
                    condition: ChronicCondition::HeartDisease,
                    duration: None,
                },
            ],
            general_examination: vec![GeneralSign::Pallor, GeneralSign::Edema],
        },
        complaint: Complaint {
            chief_complaint: text("chest tightness"),
            symptom_duration: text("2 days"),
            associated_symptoms: text("sweating"),
            onset_type: Some(Onset::Sudden),
        },
        examination: Examination {
            physical_examination: text("diaphoretic"),
            systemic_examination: text("S1 S2 normal"),
            provisional_diagnosis: text("unstable angina"),
        },
        investigations: Investigations {
            blood_tests: text("troponin"),
            urine_tests: text("routine"),
            imaging: text("chest x-ray"),
            cardiac: text("ECG"),
            other_tests: text("lipid profile"),
        },
        treatment: Treatment {
            icd_code: text("I20.0"),
            medications: text("aspirin 75 mg"),
            diet_advice: text("low salt"),
            procedures: text("none"),
            follow_up_date: NaiveDate::from_ymd_opt(2026, 11, 2),
            referral: text("cardiology"),
            doctor_notes: text("review in one week"),
        },
    }
}

#[test]
fn file_backend_round_trips_populated_medical_records() {
    let dir = tempfile::tempdir().unwrap();
    let patient_id = Uuid::new_v4();
    let written = {
        let store = RecordStore::new(Arc::new(assert_ok!(FileStorage::new(dir.path()))));
        for diagnosis in ["Unstable angina", "Stable angina"] {
            assert_ok!(store.add_medical_record(NewMedicalRecord {
                patient_id,
                doctor_id: Uuid::new_v4().to_string(),
                doctor_name: "Dr. Costa".into(),
                diagnosis: diagnosis.into(),
                findings: full_findings(),
            }));
        }
        assert_ok!(store.list_medical_records())
    };

    let reopened = RecordStore::new(Arc::new(assert_ok!(FileStorage::new(dir.path()))));
    let read = assert_ok!(reopened.list_medical_records());
    assert_eq!(read, written);
    assert_eq!(read[0].diagnosis, "Unstable angina");
    assert_eq!(read[1].findings, full_findings());
}

#[test]
fn malformed_blob_reads_as_empty_and_is_overwritten() {
    let backend = Arc::new(MemoryStorage::new());
    assert_ok!(backend.set_item("patients", "{ not json"));
    let store = RecordStore::new(backend.clone());

    assert!(assert_ok!(store.list_patients()).is_empty());
    assert_ok!(store.add_patient(new_patient("Fresh")));
    assert_eq!(assert_ok!(store.list_patients()).len(), 1);
    let raw = assert_ok!(backend.get_item("patients")).unwrap();
    assert!(raw.starts_with('['));
}

#[tokio::test]
async fn writes_publish_events_in_order() {
    let store = memory_store();
    let mut events = store.subscribe();
    let mut gate = assert_ok!(SessionGate::restore(store.clone()));

    let patient = assert_ok!(store.add_patient(new_patient("Eva")));
    assert_ok!(store.complete_patient(patient.id));
    assert_ok!(gate.login("admin", "admin123"));
    assert_ok!(gate.logout());

    for expected in [
        StoreEvent::PatientsChanged,
        StoreEvent::PatientsChanged,
        StoreEvent::SessionChanged,
        StoreEvent::SessionChanged,
    ] {
        assert_eq!(assert_ok!(events.recv().await), expected);
    }
    assert!(events.try_recv().is_err());
}
