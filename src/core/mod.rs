pub mod config;
pub mod dispatcher;
pub mod errors;
pub mod events;
pub mod kernel;
pub mod registry;
pub mod traits;
pub mod types;
pub mod validation;
