pub mod config;
pub mod dashboard;
pub mod error;
pub mod io;
pub mod model;
pub mod status;
pub mod store;
pub mod summary;

pub use error::{Result, ToolError};
