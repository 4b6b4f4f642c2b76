pub mod connections;
pub mod migration;
pub mod schema;
