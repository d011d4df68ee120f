mod command_parser;
mod command_registry;
mod history;

pub use command_parser::{parse_command, ChatCommand};
pub use command_registry::CHAT_HELP_COMMANDS;
pub use history::{ChatHistory, ChatMessage, ChatRole, GREETING};
