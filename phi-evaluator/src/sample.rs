use serde::{Deserialize, Serialize};

/// One predicted or ground-truth span: raw text plus a raw type label, as
/// they appear in a dataset annotation or a pipeline's entity list. Not
/// `phi_types::PHIEntity` — the evaluator compares against whatever label
/// vocabulary the ground-truth corpus happens to use (`PATIENT`, `DOB`, ...),
/// normalised separately from C1's own alias table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PHISample {
    pub text: String,
    pub phi_type: String,
}

impl PHISample {
    pub fn new(text: impl Into<String>, phi_type: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            phi_type: phi_type.into(),
        }
    }

    pub(crate) fn normalized_text(&self) -> String {
        self.text.trim().to_lowercase()
    }
}
