pub mod devices;
pub mod environment;
pub mod rules;
pub mod scenarios;
pub mod settings;
pub mod setup;
pub mod simulation;
