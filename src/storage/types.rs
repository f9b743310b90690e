//! Entities persisted by the record store.
//!
//! Every entity serializes with camelCase field names; optional fields are
//! omitted from the JSON when absent.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Doctor fields supplied by the admin; id and timestamp are assigned on insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDoctor {
    pub name: String,
    pub username: String,
    pub password: String,
    pub specialty: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            _ => Err(format!(
                "'{}' must be one of: male, female, other",
                value
            )),
        }
    }
}

/// Visit lifecycle. `Waiting` moves to `Completed` once and never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatientStatus {
    Waiting,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: Uuid,
    pub name: String,
    pub age: u32,
    pub gender: Gender,
    pub contact: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub symptoms: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_diagnosis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reports: Option<String>,
    pub status: PatientStatus,
    pub created_at: DateTime<Utc>,
}

/// Patient fields from a registration form; id, status and timestamp are assigned on insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPatient {
    pub name: String,
    pub age: u32,
    pub gender: Gender,
    pub contact: String,
    pub email: Option<String>,
    pub symptoms: String,
    pub previous_diagnosis: Option<String>,
    pub reports: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BloodGroup {
    #[serde(rename = "A+")]
    APositive,
    #[serde(rename = "A-")]
    ANegative,
    #[serde(rename = "B+")]
    BPositive,
    #[serde(rename = "B-")]
    BNegative,
    #[serde(rename = "AB+")]
    AbPositive,
    #[serde(rename = "AB-")]
    AbNegative,
    #[serde(rename = "O+")]
    OPositive,
    #[serde(rename = "O-")]
    ONegative,
}

impl FromStr for BloodGroup {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_uppercase().as_str() {
            "A+" => Ok(BloodGroup::APositive),
            "A-" => Ok(BloodGroup::ANegative),
            "B+" => Ok(BloodGroup::BPositive),
            "B-" => Ok(BloodGroup::BNegative),
            "AB+" => Ok(BloodGroup::AbPositive),
            "AB-" => Ok(BloodGroup::AbNegative),
            "O+" => Ok(BloodGroup::OPositive),
            "O-" => Ok(BloodGroup::ONegative),
            _ => Err(format!("'{}' is not an ABO/Rh blood group", value)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Onset {
    Acute,
    Chronic,
    Gradual,
    Sudden,
}

impl FromStr for Onset {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "acute" => Ok(Onset::Acute),
            "chronic" => Ok(Onset::Chronic),
            "gradual" => Ok(Onset::Gradual),
            "sudden" => Ok(Onset::Sudden),
            _ => Err(format!(
                "'{}' must be one of: acute, chronic, gradual, sudden",
                value
            )),
        }
    }
}

/// Conditions asked about in the past medical history checklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChronicCondition {
    Diabetes,
    Hypertension,
    HeartDisease,
    Stroke,
    Cancer,
    Tb,
    Asthma,
    BloodTransfusion,
    Thyroid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub condition: ChronicCondition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

/// Findings of the general physical examination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GeneralSign {
    Pallor,
    Icterus,
    Cyanosis,
    Clubbing,
    Edema,
    Lymphadenopathy,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Vitals {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blood_pressure: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub respiratory_rate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_temperature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oxygen_saturation: Option<String>,
    /// Kilograms.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
    /// Centimetres.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bmi: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blood_group: Option<BloodGroup>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct History {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allergies: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smoking_alcohol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_medications: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub past_surgery: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub past_history: Vec<HistoryEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub general_examination: Vec<GeneralSign>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Complaint {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chief_complaint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symptom_duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub associated_symptoms: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub onset_type: Option<Onset>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Examination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub physical_examination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub systemic_examination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisional_diagnosis: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Investigations {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blood_tests: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urine_tests: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imaging: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cardiac: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other_tests: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Treatment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icd_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medications: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diet_advice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub procedures: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_up_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referral: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor_notes: Option<String>,
}

/// Optional clinical fields of a visit, flattened into the record's JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClinicalFindings {
    #[serde(flatten)]
    pub vitals: Vitals,
    #[serde(flatten)]
    pub history: History,
    #[serde(flatten)]
    pub complaint: Complaint,
    #[serde(flatten)]
    pub examination: Examination,
    #[serde(flatten)]
    pub investigations: Investigations,
    #[serde(flatten)]
    pub treatment: Treatment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalRecord {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: String,
    pub doctor_name: String,
    pub diagnosis: String,
    #[serde(flatten)]
    pub findings: ClinicalFindings,
    pub created_at: DateTime<Utc>,
}

/// Record fields from the doctor's form; id and timestamp are assigned on insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMedicalRecord {
    pub patient_id: Uuid,
    pub doctor_id: String,
    pub doctor_name: String,
    pub diagnosis: String,
    pub findings: ClinicalFindings,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn patient_json_uses_camel_case_and_omits_absent_fields() {
        let patient = Patient {
            id: Uuid::new_v4(),
            name: "Asha".into(),
            age: 34,
            gender: Gender::Female,
            contact: "555-0101".into(),
            email: None,
            symptoms: "fever".into(),
            previous_diagnosis: Some("malaria".into()),
            reports: None,
            status: PatientStatus::Waiting,
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(&patient).unwrap();
        assert_eq!(value["previousDiagnosis"], json!("malaria"));
        assert_eq!(value["status"], json!("waiting"));
        assert_eq!(value["gender"], json!("female"));
        assert!(value.get("email").is_none());
        assert!(value.get("createdAt").is_some());
    }

    #[test]
    fn record_findings_are_flattened() {
        let mut findings = ClinicalFindings::default();
        findings.vitals.blood_group = Some(BloodGroup::AbNegative);
        findings.history.past_history.push(HistoryEntry {
            condition: ChronicCondition::HeartDisease,
            duration: Some("5 years".into()),
        });
        findings.treatment.follow_up_date = NaiveDate::from_ymd_opt(2026, 11, 2);
        let record = MedicalRecord {
            id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            doctor_id: Uuid::new_v4().to_string(),
            doctor_name: "Dr. Rao".into(),
            diagnosis: "Angina".into(),
            findings,
            created_at: Utc::now(),
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["bloodGroup"], json!("AB-"));
        assert_eq!(value["pastHistory"][0]["condition"], json!("heartDisease"));
        assert_eq!(value["followUpDate"], json!("2026-11-02"));
        assert!(value.get("imaging").is_none());

        let back: MedicalRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn enum_parsing_is_case_insensitive() {
        assert_eq!("Male".parse::<Gender>(), Ok(Gender::Male));
        assert_eq!("ab+".parse::<BloodGroup>(), Ok(BloodGroup::AbPositive));
        assert_eq!(" Sudden ".parse::<Onset>(), Ok(Onset::Sudden));
        assert!("unknown".parse::<Gender>().is_err());
    }
}
