pub mod id_validator;
pub mod phone;
pub mod regex_tool;
pub mod tool;

pub use id_validator::IdValidatorTool;
pub use phone::PhoneTool;
pub use regex_tool::RegexTool;
pub use tool::{merge_results, Tool, ToolResult};
