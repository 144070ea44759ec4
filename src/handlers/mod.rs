pub mod callbacks;
pub mod commands;
mod events;

pub use commands::Command;
pub use events::Dispatcher;
