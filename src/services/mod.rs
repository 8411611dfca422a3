pub mod inference;
pub mod prompts;
pub mod scenarios;
pub mod simulation;
pub mod story;
pub mod system_state;
pub mod validator;
