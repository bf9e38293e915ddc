pub mod config;
pub mod error;
pub mod io;
pub mod logging;
pub mod paths;

pub use config::{get_config, AppConfig};
pub use error::AppError;
pub use paths::OutputPathManager;
