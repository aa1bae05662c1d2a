pub mod app;
pub mod commands;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod state;
pub mod stats;
pub mod storage;
pub mod store;
pub mod views;

pub use app::router;
pub use commands::{Command, Outcome};
pub use config::AppConfig;
pub use errors::{PersistError, StoreError};
pub use state::AppState;
pub use storage::{LocalStorage, MemoryStorage, Persistence};
pub use store::Store;
