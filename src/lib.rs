pub mod app;
pub mod commands;
pub mod error;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;

pub use app::App;
pub use error::{Result, WizardError};
