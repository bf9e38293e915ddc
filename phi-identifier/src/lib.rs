pub mod identify;
pub mod llm_client;
pub mod prompt;
pub mod schema;

pub use identify::{identify_chunk, run_tools, IdentificationOutcome};
pub use llm_client::{OpenAiStructuredLlmClient, StructuredLlmClient};
pub use prompt::build_prompt;
pub use schema::{phi_detection_schema, PHIDetectionResponse, PHIIdentificationResult};
