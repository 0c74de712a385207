pub mod profile;
pub mod store;

pub use profile::{keys, ClusterProfile};
pub use store::{ProfileStore, PROFILE_FILE_NAME};
