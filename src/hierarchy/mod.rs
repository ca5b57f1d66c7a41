pub mod snapshot;
pub mod view_node;
