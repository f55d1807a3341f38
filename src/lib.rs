pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;

// Re-export commonly used types
pub use config::AppConfig;
pub use errors::{FreightError, FreightResult, ValidationError};
pub use handlers::create_router;
pub use state::AppState;
