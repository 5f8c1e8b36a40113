pub mod analytics_impl;
pub mod backend;
pub mod profiles;
pub mod queries;
pub mod schema;

pub use backend::DuckDbBackend;
