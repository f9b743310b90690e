//! Pre-filled email drafts for sending a visit summary to the patient.
//!
//! Nothing is sent from here: the draft is turned into a `mailto:` URL that
//! the operating system's mail handler opens.

use serde::Serialize;

use crate::error_handling::types::ClinicError;
use crate::storage::types::{MedicalRecord, Patient};

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";
const DATE_FORMAT: &str = "%b %d, %Y";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailDraft {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

impl EmailDraft {
    /// Drafts the summary of `record` for `patient`.
    ///
    /// Fails with `MissingEmail` when the patient left no address.
    pub fn for_record(patient: &Patient, record: &MedicalRecord) -> Result<Self, ClinicError> {
        let recipient = patient
            .email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or(ClinicError::MissingEmail)?
            .to_string();
        let visit_date = record.created_at.format(DATE_FORMAT).to_string();

        let mut body = format!("Dear {},\n\n", patient.name);
        body.push_str(&format!(
            "Here is your medical record from your visit on {}.\n\n",
            visit_date
        ));
        push_section(
            &mut body,
            "PATIENT INFORMATION",
            &format!(
                "Name: {}\nAge: {} years\nGender: {}",
                patient.name, patient.age, patient.gender
            ),
        );
        push_section(&mut body, "DIAGNOSIS", &record.diagnosis);
        let treatment = &record.findings.treatment;
        if let Some(medications) = &treatment.medications {
            push_section(&mut body, "MEDICATIONS", medications);
        }
        if let Some(advice) = &treatment.diet_advice {
            push_section(&mut body, "DIET & LIFESTYLE ADVICE", advice);
        }
        if let Some(date) = treatment.follow_up_date {
            body.push_str(&format!("Next Follow-up: {}\n\n", date.format(DATE_FORMAT)));
        }
        body.push_str(RULE);
        body.push('\n');
        body.push_str(&format!("Doctor: {}\n", record.doctor_name));
        body.push_str("\nPlease contact us if you have any questions.\n\n");
        body.push_str("Best regards,\nMedical Team");

        Ok(Self {
            recipient,
            subject: format!("Medical Record - {} - {}", patient.name, visit_date),
            body,
        })
    }

    /// `mailto:` URL with percent-encoded recipient, subject and body.
    pub fn mailto_url(&self) -> String {
        // '@' separates local part and domain, the rest of the address is encoded
        let recipient = urlencoding::encode(self.recipient.trim()).replace("%40", "@");
        format!(
            "mailto:{}?subject={}&body={}",
            recipient,
            urlencoding::encode(&self.subject),
            urlencoding::encode(&self.body)
        )
    }
}

fn push_section(body: &mut String, title: &str, content: &str) {
    body.push_str(RULE);
    body.push('\n');
    body.push_str(title);
    body.push('\n');
    body.push_str(RULE);
    body.push('\n');
    body.push_str(content);
    body.push_str("\n\n");
}
