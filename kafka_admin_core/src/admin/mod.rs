pub mod admin_api;
pub mod errors;
pub mod types;

// Re-export the modules here for easy import elsewhere.
pub use admin_api::*;
pub use errors::*;
pub use types::*;
