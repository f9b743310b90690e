//! Form input and required-field validation.
//!
//! Forms arrive as raw strings, the way an HTML form posts them. Each
//! `validate` turns one into the typed value the record store accepts, or
//! reports every missing required field at once. Empty optional fields
//! become `None`.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error_handling::types::ValidationError;
use crate::storage::types::{
    ClinicalFindings, Complaint, Examination, GeneralSign, History, HistoryEntry, Investigations,
    NewDoctor, NewPatient, Treatment, Vitals,
};

/// Contact stored for manually entered patients who gave none.
pub const DEFAULT_CONTACT: &str = "N/A";
/// Symptoms stored for manually entered patients who gave none.
pub const DEFAULT_SYMPTOMS: &str = "To be assessed";

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn optional(value: String) -> Option<String> {
    if is_blank(&value) {
        None
    } else {
        Some(value.trim().to_string())
    }
}

fn require(fields: &[(&'static str, &str)]) -> Result<(), ValidationError> {
    let missing: Vec<&'static str> = fields
        .iter()
        .filter(|(_, value)| is_blank(value))
        .map(|(name, _)| *name)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::MissingFields(missing))
    }
}

fn parse_field<T: std::str::FromStr>(field: &'static str, value: &str) -> Result<T, ValidationError>
where
    T::Err: ToString,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ValidationError::InvalidField {
            field,
            reason: e.to_string(),
        })
}

fn parse_optional<T: std::str::FromStr>(
    field: &'static str,
    value: &str,
) -> Result<Option<T>, ValidationError>
where
    T::Err: ToString,
{
    if is_blank(value) {
        Ok(None)
    } else {
        parse_field(field, value).map(Some)
    }
}

/// Admin form for creating a doctor account.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DoctorForm {
    pub name: String,
    pub username: String,
    pub password: String,
    pub specialty: String,
}

impl DoctorForm {
    pub fn validate(self) -> Result<NewDoctor, ValidationError> {
        require(&[
            ("name", self.name.as_str()),
            ("username", self.username.as_str()),
            ("password", self.password.as_str()),
        ])?;
        Ok(NewDoctor {
            name: self.name.trim().to_string(),
            username: self.username.trim().to_string(),
            password: self.password,
            specialty: optional(self.specialty),
        })
    }
}

/// Patient self-registration form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegistrationForm {
    pub name: String,
    pub age: String,
    pub gender: String,
    pub contact: String,
    pub email: String,
    pub symptoms: String,
    pub previous_diagnosis: String,
    pub reports: String,
}

impl RegistrationForm {
    pub fn validate(self) -> Result<NewPatient, ValidationError> {
        require(&[
            ("name", self.name.as_str()),
            ("age", self.age.as_str()),
            ("gender", self.gender.as_str()),
            ("contact", self.contact.as_str()),
            ("symptoms", self.symptoms.as_str()),
        ])?;
        Ok(NewPatient {
            name: self.name.trim().to_string(),
            age: parse_field("age", self.age.as_str())?,
            gender: parse_field("gender", self.gender.as_str())?,
            contact: self.contact.trim().to_string(),
            email: optional(self.email),
            symptoms: self.symptoms.trim().to_string(),
            previous_diagnosis: optional(self.previous_diagnosis),
            reports: optional(self.reports),
        })
    }
}

/// Quick entry used by a doctor for walk-in patients.
///
/// Email is required so the record can be mailed afterwards; contact and
/// symptoms fall back to placeholders.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ManualEntryForm {
    pub name: String,
    pub age: String,
    pub gender: String,
    pub contact: String,
    pub email: String,
    pub symptoms: String,
}

impl ManualEntryForm {
    pub fn validate(self) -> Result<NewPatient, ValidationError> {
        require(&[
            ("name", self.name.as_str()),
            ("age", self.age.as_str()),
            ("gender", self.gender.as_str()),
            ("email", self.email.as_str()),
        ])?;
        Ok(NewPatient {
            name: self.name.trim().to_string(),
            age: parse_field("age", self.age.as_str())?,
            gender: parse_field("gender", self.gender.as_str())?,
            contact: optional(self.contact).unwrap_or_else(|| DEFAULT_CONTACT.to_string()),
            email: optional(self.email),
            symptoms: optional(self.symptoms).unwrap_or_else(|| DEFAULT_SYMPTOMS.to_string()),
            previous_diagnosis: None,
            reports: None,
        })
    }
}

/// Medical record entry form. Only the final diagnosis is required.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecordForm {
    pub diagnosis: String,

    pub blood_pressure: String,
    pub heart_rate: String,
    pub respiratory_rate: String,
    pub body_temperature: String,
    pub oxygen_saturation: String,
    pub weight: String,
    pub height: String,
    pub blood_group: String,

    pub allergies: String,
    pub smoking_alcohol: String,
    pub current_medications: String,
    pub past_surgery: String,
    pub past_history: Vec<HistoryEntry>,
    pub general_examination: Vec<GeneralSign>,

    pub chief_complaint: String,
    pub symptom_duration: String,
    pub associated_symptoms: String,
    pub onset_type: String,

    pub physical_examination: String,
    pub systemic_examination: String,
    pub provisional_diagnosis: String,

    pub blood_tests: String,
    pub urine_tests: String,
    pub imaging: String,
    pub cardiac: String,
    pub other_tests: String,

    pub icd_code: String,
    pub medications: String,
    pub diet_advice: String,
    pub procedures: String,
    /// `YYYY-MM-DD`.
    pub follow_up_date: String,
    pub referral: String,
    pub doctor_notes: String,
}

impl RecordForm {
    /// Returns the trimmed diagnosis and the typed findings.
    ///
    /// `bmi` is left empty here; the save workflow derives it from weight and height.
    pub fn validate(self) -> Result<(String, ClinicalFindings), ValidationError> {
        require(&[("diagnosis", self.diagnosis.as_str())])?;

        let findings = ClinicalFindings {
            vitals: Vitals {
                blood_pressure: optional(self.blood_pressure),
                heart_rate: optional(self.heart_rate),
                respiratory_rate: optional(self.respiratory_rate),
                body_temperature: optional(self.body_temperature),
                oxygen_saturation: optional(self.oxygen_saturation),
                weight: optional(self.weight),
                height: optional(self.height),
                bmi: None,
                blood_group: parse_optional("bloodGroup", self.blood_group.as_str())?,
            },
            history: History {
                allergies: optional(self.allergies),
                smoking_alcohol: optional(self.smoking_alcohol),
                current_medications: optional(self.current_medications),
                past_surgery: optional(self.past_surgery),
                past_history: self
                    .past_history
                    .into_iter()
                    .map(|entry| HistoryEntry {
                        condition: entry.condition,
                        duration: entry.duration.and_then(optional),
                    })
                    .collect(),
                general_examination: self.general_examination,
            },
            complaint: Complaint {
                chief_complaint: optional(self.chief_complaint),
                symptom_duration: optional(self.symptom_duration),
                associated_symptoms: optional(self.associated_symptoms),
                onset_type: parse_optional("onsetType", self.onset_type.as_str())?,
            },
            examination: Examination {
                physical_examination: optional(self.physical_examination),
                systemic_examination: optional(self.systemic_examination),
                provisional_diagnosis: optional(self.provisional_diagnosis),
            },
            investigations: Investigations {
                blood_tests: optional(self.blood_tests),
                urine_tests: optional(self.urine_tests),
                imaging: optional(self.imaging),
                cardiac: optional(self.cardiac),
                other_tests: optional(self.other_tests),
            },
            treatment: Treatment {
                icd_code: optional(self.icd_code),
                medications: optional(self.medications),
                diet_advice: optional(self.diet_advice),
                procedures: optional(self.procedures),
                follow_up_date: parse_optional::<NaiveDate>("followUpDate", self.follow_up_date.as_str())?,
                referral: optional(self.referral),
                doctor_notes: optional(self.doctor_notes),
            },
        };
        Ok((self.diagnosis.trim().to_string(), findings))
    }
}
