pub mod cluster_snapshot;
pub mod cluster_store;
pub mod common;
pub mod node;
pub mod pod;
pub mod quantity;
pub mod resources;
pub mod scheduler;
