pub mod connection_manager;
pub mod console;
pub mod errors;
pub mod session;
pub mod settings;
pub mod worker;

// Re-export the modules here for easy import elsewhere.
pub use connection_manager::*;
pub use console::*;
pub use errors::*;
pub use session::*;
pub use settings::*;
pub use worker::*;
