pub mod settings;

pub use settings::{KeyBackend, Settings};
