pub mod command;
pub mod controller;
pub mod state;

pub use command::*;
pub use controller::*;
pub use state::*;
