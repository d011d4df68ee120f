use super::command_registry::{CommandKind, CommandSpec, COMMANDS};
use crate::color::Rgb;
use crate::vocab::resolve_color;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Noop,
    Instruct(String),
    Surfaces,
    Paint { surface: String, color: Rgb },
    Load { path: String },
    Help,
    Quit,
    Invalid { command: String, reason: String },
    Unknown { command: String, arg: String },
}

fn find_kind(command: &str) -> Option<CommandKind> {
    COMMANDS
        .iter()
        .find(|spec: &&CommandSpec| spec.command == command)
        .map(|spec| spec.kind)
}

fn split_args(arg: &str) -> Vec<String> {
    if arg.trim().is_empty() {
        return Vec::new();
    }
    match shell_words::split(arg) {
        Ok(parts) => parts
            .into_iter()
            .filter(|value| !value.is_empty())
            .collect(),
        Err(_) => arg.split_whitespace().map(str::to_string).collect(),
    }
}

/// Hex first, then the color lexicon, so `/paint sole red` works too.
fn parse_paint_color(raw: &str) -> Option<Rgb> {
    Rgb::parse_hex(raw).or_else(|| resolve_color(raw))
}

/// The color is always the last whitespace-separated token; it is taken
/// before shell-style splitting because `#` would start a comment there.
fn parse_paint(command: &str, arg: &str) -> ChatCommand {
    let usage = || ChatCommand::Invalid {
        command: command.to_string(),
        reason: "usage: /paint <surface> <color>".to_string(),
    };
    let Some((surface_part, raw_color)) = arg.trim().rsplit_once(char::is_whitespace) else {
        return usage();
    };
    let surface = split_args(surface_part).join(" ");
    if surface.is_empty() {
        return usage();
    }
    let Some(color) = parse_paint_color(raw_color) else {
        return ChatCommand::Invalid {
            command: command.to_string(),
            reason: format!("'{raw_color}' is not a #RRGGBB color or known color name"),
        };
    };
    ChatCommand::Paint { surface, color }
}

pub fn parse_command(text: &str) -> ChatCommand {
    let raw_trimmed = text.trim();
    if raw_trimmed.is_empty() {
        return ChatCommand::Noop;
    }

    let Some(slash_tail) = raw_trimmed.strip_prefix('/') else {
        return ChatCommand::Instruct(raw_trimmed.to_string());
    };
    let command_len = slash_tail
        .chars()
        .take_while(|ch| ch.is_ascii_alphanumeric() || *ch == '_')
        .count();
    if command_len == 0 {
        return ChatCommand::Instruct(raw_trimmed.to_string());
    }
    let command = slash_tail[..command_len].to_ascii_lowercase();
    let arg = slash_tail[command_len..].trim();

    match find_kind(&command) {
        Some(CommandKind::Surfaces) => ChatCommand::Surfaces,
        Some(CommandKind::Help) => ChatCommand::Help,
        Some(CommandKind::Quit) => ChatCommand::Quit,
        Some(CommandKind::Paint) => parse_paint(&command, arg),
        Some(CommandKind::Load) => {
            let path = split_args(arg).join(" ");
            if path.is_empty() {
                return ChatCommand::Invalid {
                    command,
                    reason: "usage: /load <path>".to_string(),
                };
            }
            ChatCommand::Load { path }
        }
        None => ChatCommand::Unknown {
            command,
            arg: arg.to_string(),
        },
    }
}
