//! Application state module

pub mod state;

pub use state::AppState;
