pub mod error;
pub mod history;
pub mod request;
pub mod settings;
pub mod tone;

#[cfg(test)]
mod serde_tests;
