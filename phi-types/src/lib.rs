pub mod entity;
pub mod phi_type;
pub mod registry;

pub use entity::PHIEntity;
pub use phi_type::{CustomPHIType, CustomPHITypeError, PHIType};
pub use registry::{PromptFormat, RegisteredType, TypeRegistry, TypeSource};
