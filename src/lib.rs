pub mod errors;
pub mod models;
pub mod notify;
pub mod registry;
pub mod server;
pub mod store;
