#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CommandKind {
    Surfaces,
    Paint,
    Load,
    Help,
    Quit,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct CommandSpec {
    pub command: &'static str,
    pub kind: CommandKind,
}

pub(crate) const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        command: "surfaces",
        kind: CommandKind::Surfaces,
    },
    CommandSpec {
        command: "materials",
        kind: CommandKind::Surfaces,
    },
    CommandSpec {
        command: "paint",
        kind: CommandKind::Paint,
    },
    CommandSpec {
        command: "load",
        kind: CommandKind::Load,
    },
    CommandSpec {
        command: "help",
        kind: CommandKind::Help,
    },
    CommandSpec {
        command: "quit",
        kind: CommandKind::Quit,
    },
    CommandSpec {
        command: "exit",
        kind: CommandKind::Quit,
    },
];

pub const CHAT_HELP_COMMANDS: &[&str] = &[
    "/surfaces",
    "/paint <surface> <color>",
    "/load <path>",
    "/help",
    "/quit",
];
