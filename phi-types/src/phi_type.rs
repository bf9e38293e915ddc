use regex::Regex;
use serde::{Deserialize, Serialize};

/// Canonical PHI type enumeration. `Custom` is a meta-type carrying its own
/// `CustomPHIType` payload elsewhere; `Other` is the fallback for text the
/// identifier is confident is PHI but cannot classify further.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PHIType {
    Name,
    Date,
    Location,
    Id,
    MedicalRecordNumber,
    AccountNumber,
    Contact,
    Phone,
    Fax,
    Email,
    Url,
    IpAddress,
    AgeOver89,
    AgeOver90,
    Biometric,
    Photo,
    HospitalName,
    DepartmentName,
    WardNumber,
    BedNumber,
    RareDisease,
    GeneticInfo,
    DeviceId,
    Certificate,
    Ssn,
    InsuranceNumber,
    Custom,
    Other,
}

impl PHIType {
    /// The 28 canonical variants, in declaration order. Used to seed the
    /// registry's base entries and to drive `FromStr`/`Display`.
    pub const ALL: [PHIType; 28] = [
        PHIType::Name,
        PHIType::Date,
        PHIType::Location,
        PHIType::Id,
        PHIType::MedicalRecordNumber,
        PHIType::AccountNumber,
        PHIType::Contact,
        PHIType::Phone,
        PHIType::Fax,
        PHIType::Email,
        PHIType::Url,
        PHIType::IpAddress,
        PHIType::AgeOver89,
        PHIType::AgeOver90,
        PHIType::Biometric,
        PHIType::Photo,
        PHIType::HospitalName,
        PHIType::DepartmentName,
        PHIType::WardNumber,
        PHIType::BedNumber,
        PHIType::RareDisease,
        PHIType::GeneticInfo,
        PHIType::DeviceId,
        PHIType::Certificate,
        PHIType::Ssn,
        PHIType::InsuranceNumber,
        PHIType::Custom,
        PHIType::Other,
    ];

    /// Stable wire identifier, matching the Python enum's string value
    /// exactly so checkpoints/reports stay cross-compatible in spirit.
    pub fn as_str(self) -> &'static str {
        match self {
            PHIType::Name => "NAME",
            PHIType::Date => "DATE",
            PHIType::Location => "LOCATION",
            PHIType::Id => "ID",
            PHIType::MedicalRecordNumber => "MEDICAL_RECORD_NUMBER",
            PHIType::AccountNumber => "ACCOUNT_NUMBER",
            PHIType::Contact => "CONTACT",
            PHIType::Phone => "PHONE",
            PHIType::Fax => "FAX",
            PHIType::Email => "EMAIL",
            PHIType::Url => "URL",
            PHIType::IpAddress => "IP_ADDRESS",
            PHIType::AgeOver89 => "AGE_OVER_89",
            PHIType::AgeOver90 => "AGE_OVER_90",
            PHIType::Biometric => "BIOMETRIC",
            PHIType::Photo => "PHOTO",
            PHIType::HospitalName => "HOSPITAL_NAME",
            PHIType::DepartmentName => "DEPARTMENT_NAME",
            PHIType::WardNumber => "WARD_NUMBER",
            PHIType::BedNumber => "BED_NUMBER",
            PHIType::RareDisease => "RARE_DISEASE",
            PHIType::GeneticInfo => "GENETIC_INFO",
            PHIType::DeviceId => "DEVICE_ID",
            PHIType::Certificate => "CERTIFICATE",
            PHIType::Ssn => "SSN",
            PHIType::InsuranceNumber => "INSURANCE_NUMBER",
            PHIType::Custom => "CUSTOM",
            PHIType::Other => "OTHER",
        }
    }

    /// Parse the canonical wire spelling. Returns `None` for anything else,
    /// including aliases — alias resolution is the registry's job.
    pub fn from_canonical_str(s: &str) -> Option<PHIType> {
        PHIType::ALL.into_iter().find(|t| t.as_str() == s)
    }

    /// Baseline HIPAA-ish type set for everyday de-identification.
    pub fn get_standard_types() -> Vec<PHIType> {
        vec![
            PHIType::Name,
            PHIType::Date,
            PHIType::Location,
            PHIType::MedicalRecordNumber,
            PHIType::Contact,
            PHIType::AgeOver89,
            PHIType::Biometric,
        ]
    }

    /// Standard set plus a handful of additional identifiers for stricter
    /// de-identification requirements.
    pub fn get_strict_types() -> Vec<PHIType> {
        let mut types = PHIType::get_standard_types();
        types.extend([
            PHIType::AgeOver90,
            PHIType::HospitalName,
            PHIType::WardNumber,
            PHIType::RareDisease,
            PHIType::Phone,
            PHIType::Email,
        ]);
        types
    }

    pub fn is_age_related(self) -> bool {
        matches!(self, PHIType::AgeOver89 | PHIType::AgeOver90)
    }

    pub fn is_facility_related(self) -> bool {
        matches!(
            self,
            PHIType::HospitalName
                | PHIType::DepartmentName
                | PHIType::WardNumber
                | PHIType::BedNumber
        )
    }
}

impl std::fmt::Display for PHIType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user- or RAG-defined PHI type, typically discovered from a regulation
/// document. Immutable once constructed; `name`/`description` are validated
/// at construction time rather than left to blow up downstream.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CustomPHIType {
    pub name: String,
    pub description: String,
    pub pattern: Option<String>,
    #[serde(default)]
    pub examples: Vec<String>,
    pub regulation_source: Option<String>,
    #[serde(default)]
    pub is_high_risk: bool,
    pub masking_strategy: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum CustomPHITypeError {
    #[error("custom PHI type name cannot be empty")]
    EmptyName,
    #[error("custom PHI type description is required")]
    MissingDescription,
}

impl CustomPHIType {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Result<Self, CustomPHITypeError> {
        let name = name.into();
        let description = description.into();
        if name.trim().is_empty() {
            return Err(CustomPHITypeError::EmptyName);
        }
        if description.is_empty() {
            return Err(CustomPHITypeError::MissingDescription);
        }
        Ok(Self {
            name,
            description,
            pattern: None,
            examples: Vec::new(),
            regulation_source: None,
            is_high_risk: false,
            masking_strategy: None,
            aliases: Vec::new(),
        })
    }

    /// Display name used in LLM prompts and in wire formats: `CUSTOM:<name>`.
    pub fn display_name(&self) -> String {
        format!("CUSTOM:{}", self.name)
    }

    /// True if `text` is an exact example match, contains an alias
    /// (case-insensitive substring), or matches `pattern` from its start.
    pub fn matches_text(&self, text: &str) -> bool {
        if self.examples.iter().any(|e| e == text) {
            return true;
        }
        let lower = text.to_lowercase();
        if self.aliases.iter().any(|a| lower.contains(&a.to_lowercase())) {
            return true;
        }
        if let Some(pattern) = &self.pattern {
            if let Ok(re) = Regex::new(&format!("^(?:{pattern})")) {
                return re.is_match(text);
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_round_trip() {
        for t in PHIType::ALL {
            assert_eq!(PHIType::from_canonical_str(t.as_str()), Some(t));
        }
    }

    #[test]
    fn rejects_empty_name() {
        assert!(matches!(
            CustomPHIType::new("", "desc"),
            Err(CustomPHITypeError::EmptyName)
        ));
    }

    #[test]
    fn matches_text_via_examples_alias_and_pattern() {
        let mut ct = CustomPHIType::new("TW_NATIONAL_ID", "Taiwan National ID").unwrap();
        ct.examples.push("A123456789".to_string());
        ct.aliases.push("身份證".to_string());
        ct.pattern = Some(r"[A-Z][12]\d{8}".to_string());

        assert!(ct.matches_text("A123456789"));
        assert!(ct.matches_text("請出示身份證字號"));
        assert!(ct.matches_text("B234567890"));
        assert!(!ct.matches_text("no match here"));
    }

    #[test]
    fn age_and_facility_classification() {
        assert!(PHIType::AgeOver89.is_age_related());
        assert!(!PHIType::Date.is_age_related());
        assert!(PHIType::WardNumber.is_facility_related());
        assert!(!PHIType::Phone.is_facility_related());
    }
}
