pub mod commands;
pub mod handlers;

pub use commands::{Cli, Commands, ConfigCommands, SubsidyCommands};
pub use handlers::{handle_command, load_config};
