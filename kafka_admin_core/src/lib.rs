pub mod admin;
pub mod core;
pub mod filter;
pub mod snapshot;
pub mod storage;
pub mod utils;

// re‑export ergonomic entry points
pub use crate::core::{
    AdminConsole, AdminError, ConnectionManager, ConnectionState, ErrorKind, SessionHandle,
};
pub use filter::{AclField, FilterEngine, FilterSpec, KindFilter, TopicField};
pub use snapshot::{ResourceSnapshot, ResourceView};
pub use storage::{ClusterProfile, ProfileStore};
