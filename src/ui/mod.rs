//! GUI panels and application state.

pub mod components;
pub mod main_app;
pub mod navbar;
pub mod panels;
pub mod setup_wizard;
pub mod sidebar;

pub use main_app::ConsoleApp;
pub use setup_wizard::{SetupApp, SetupWizard};
