/// Fold a raw label from a dataset or a model's own vocabulary to one of a
/// small fixed set of canonical names (`NAME`, `DATE`, `AGE`, `ID`, `PHONE`,
/// `EMAIL`, `LOCATION`, `FACILITY`, `OTHER`, ...). Unknown labels pass
/// through unchanged (upper-cased, spaces/hyphens folded to underscores) so
/// a dataset with its own novel type still gets consistent per-type buckets
/// instead of silently disappearing into `OTHER`.
pub fn normalize_phi_type(raw: &str) -> String {
    let key = raw.trim().to_uppercase().replace([' ', '-'], "_");
    CANONICAL_MAPPING
        .iter()
        .find(|(from, _)| *from == key)
        .map(|(_, to)| (*to).to_string())
        .unwrap_or(key)
}

const CANONICAL_MAPPING: &[(&str, &str)] = &[
    ("NAME", "NAME"),
    ("PATIENT", "NAME"),
    ("PATIENT_NAME", "NAME"),
    ("DOCTOR", "NAME"),
    ("DOCTOR_NAME", "NAME"),
    ("PERSON", "NAME"),
    ("PERSON_NAME", "NAME"),
    ("FULL_NAME", "NAME"),
    ("DATE", "DATE"),
    ("DOB", "DATE"),
    ("BIRTHDATE", "DATE"),
    ("DATE_OF_BIRTH", "DATE"),
    ("DATE_TIME", "DATE"),
    ("DATETIME", "DATE"),
    ("AGE", "AGE"),
    ("AGE_OVER_89", "AGE"),
    ("AGE_OVER_90", "AGE"),
    ("ID", "ID"),
    ("ID_NUMBER", "ID"),
    ("MRN", "ID"),
    ("MEDICAL_RECORD_NUMBER", "ID"),
    ("SSN", "ID"),
    ("MEDICALRECORD", "ID"),
    ("IDNUM", "ID"),
    ("ACCOUNT_NUMBER", "ID"),
    ("CREDIT_CARD", "ID"),
    ("CREDIT_CARD_NUMBER", "ID"),
    ("INSURANCE_NUMBER", "ID"),
    ("CERTIFICATE", "ID"),
    ("DEVICE_ID", "ID"),
    ("PHONE", "PHONE"),
    ("TELEPHONE", "PHONE"),
    ("MOBILE", "PHONE"),
    ("FAX", "PHONE"),
    ("PHONE_NUMBER", "PHONE"),
    ("EMAIL", "EMAIL"),
    ("EMAIL_ADDRESS", "EMAIL"),
    ("LOCATION", "LOCATION"),
    ("ADDRESS", "LOCATION"),
    ("STREET", "LOCATION"),
    ("CITY", "LOCATION"),
    ("STATE", "LOCATION"),
    ("ZIP", "LOCATION"),
    ("COUNTRY", "LOCATION"),
    ("STREET_ADDRESS", "LOCATION"),
    ("GPE", "LOCATION"),
    ("FACILITY", "FACILITY"),
    ("HOSPITAL", "FACILITY"),
    ("HOSPITAL_NAME", "FACILITY"),
    ("DEPARTMENT_NAME", "FACILITY"),
    ("WARD_NUMBER", "FACILITY"),
    ("BED_NUMBER", "FACILITY"),
    ("ORGANIZATION", "FACILITY"),
    ("CONTACT", "CONTACT"),
    ("URL", "URL"),
    ("IP_ADDRESS", "IP_ADDRESS"),
    ("BIOMETRIC", "BIOMETRIC"),
    ("PHOTO", "BIOMETRIC"),
    ("RARE_DISEASE", "OTHER"),
    ("GENETIC_INFO", "OTHER"),
    ("NRP", "OTHER"),
    ("TITLE", "OTHER"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_known_aliases_to_canonical_names() {
        assert_eq!(normalize_phi_type("PATIENT"), "NAME");
        assert_eq!(normalize_phi_type("dob"), "DATE");
        assert_eq!(normalize_phi_type("medical record number"), "ID");
        assert_eq!(normalize_phi_type("Fax"), "PHONE");
    }

    #[test]
    fn unknown_label_passes_through_normalised() {
        assert_eq!(normalize_phi_type("occupation info"), "OCCUPATION_INFO");
    }
}
