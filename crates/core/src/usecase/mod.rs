pub mod controller;

pub use controller::InteractionController;
