pub mod client;
pub mod config;
pub mod error;
pub mod headless;
pub mod loader;
pub mod models;
pub mod page;
pub mod router;
pub mod session;
pub mod state;
pub mod ui;

pub use error::{AppError, Result};
