/// Built-in regulation context used when no retriever is configured or the
/// configured one fails. A condensed HIPAA Safe Harbor summary — enough for
/// the identifier to reason about the canonical PHI categories without a
/// live vector store.
pub fn minimal_context() -> &'static str {
    "HIPAA Safe Harbor de-identification standard (45 CFR 164.514(b)(2)): a \
record is de-identified when the following identifiers of the individual, \
relatives, employers, or household members are removed: names; geographic \
subdivisions smaller than a state; all elements of dates (except year) \
directly related to an individual, including birth date, admission date, \
discharge date, date of death, and all ages over 89; telephone and fax \
numbers; email addresses; Social Security numbers; medical record numbers; \
health plan beneficiary numbers; account numbers; certificate/license \
numbers; vehicle identifiers; device identifiers; URLs; IP addresses; \
biometric identifiers; full-face photographs; and any other unique \
identifying number, characteristic, or code."
}

/// Render a list of retrieved documents as `[source]\ncontent` blocks
/// joined by a blank line, or the minimal context if the list is empty.
pub fn render_context(documents: &[crate::document::Document]) -> String {
    if documents.is_empty() {
        return minimal_context().to_string();
    }
    documents
        .iter()
        .map(|d| format!("[{}]\n{}", d.source, d.page_content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    #[test]
    fn empty_documents_fall_back_to_minimal_context() {
        assert_eq!(render_context(&[]), minimal_context());
    }

    #[test]
    fn renders_source_and_content_blocks() {
        let docs = vec![Document::new("some text", "Reg A")];
        let rendered = render_context(&docs);
        assert_eq!(rendered, "[Reg A]\nsome text");
    }
}
