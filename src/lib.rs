pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

pub use crate::config::UploaderConfig;
pub use crate::error::UploaderError;
pub use crate::models::{TransferRequest, UploadReport};
pub use crate::services::pipeline::Pipeline;
