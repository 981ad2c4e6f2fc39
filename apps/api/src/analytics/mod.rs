pub mod handlers;
pub mod rollups;
