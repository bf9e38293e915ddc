pub mod document;
pub mod minimal_context;
pub mod retriever;

#[cfg(feature = "http")]
pub mod http_retriever;

pub use document::Document;
pub use minimal_context::{minimal_context, render_context};
pub use retriever::{NullRetriever, RegulationRetriever};

#[cfg(feature = "http")]
pub use http_retriever::HttpRetriever;
