//! The closed vocabulary of terminal input.
//!
//! Every recognized literal is matched whole, case-sensitively, after the
//! caller trims surrounding whitespace. `"winter deploy --devnet"` is one
//! token, not a command with a flag.

use crate::error::NorthfallError;
use crate::job::BackendCommand;
use std::fmt;

const HELP_RESPONSE: &str = "
WINTER COMMANDS:
clear              Clear the terminal
--help             Show available commands
--commands         Show northfall commands
--platform         Show platform details
--hotkeys          Show hot keys/ shortcuts
";

const HOTKEYS_RESPONSE: &str = "
HOT KEYS:
Ctrl + Shift + ~           Switch Terminal Tabs
Ctrl + Shift + d           Toggle shell
";

const PLATFORM_RESPONSE: &str = "
PLATFORM DETAILS:
portal              Northfall
version             1.0.0
shell               winter
";

const COMMANDS_RESPONSE: &str = "
SHELL COMMANDS:
winter build                to build the contract
winter test                 to run the test file


PREMIUM(+) SHELL COMMANDS:
winter deploy --devnet      to deploy the contract on devnet
winter deploy --mainnet     to deploy the contract on mainnet
";

/// Placeholder shown for every action command until backend outcomes are
/// rendered inline.
pub const FORGING_RESPONSE: &str =
    "this feature is forging in the Northfall labs, arriving in an upcoming release...";

// ---------------------------------------------------------------------------
// CommandKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// Answered immediately from the static table.
    Local,
    /// Answered with a static line, then dispatched as a backend job.
    Action,
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Clear,
    Help,
    HotKeys,
    Platform,
    Commands,
    Build,
    Test,
    DeployDevnet,
    DeployMainnet,
}

impl Command {
    pub fn all() -> &'static [Command] {
        &[
            Command::Clear,
            Command::Help,
            Command::HotKeys,
            Command::Platform,
            Command::Commands,
            Command::Build,
            Command::Test,
            Command::DeployDevnet,
            Command::DeployMainnet,
        ]
    }

    pub fn literal(self) -> &'static str {
        match self {
            Command::Clear => "clear",
            Command::Help => "--help",
            Command::HotKeys => "--hotkeys",
            Command::Platform => "--platform",
            Command::Commands => "--commands",
            Command::Build => "winter build",
            Command::Test => "winter test",
            Command::DeployDevnet => "winter deploy --devnet",
            Command::DeployMainnet => "winter deploy --mainnet",
        }
    }

    /// Exact lookup. Returns `None` for anything outside the vocabulary.
    pub fn lookup(token: &str) -> Option<Command> {
        Command::all().iter().copied().find(|c| c.literal() == token)
    }

    pub fn kind(self) -> CommandKind {
        match self.backend_command() {
            Some(_) => CommandKind::Action,
            None => CommandKind::Local,
        }
    }

    pub fn response(self) -> &'static str {
        match self {
            Command::Clear => "",
            Command::Help => HELP_RESPONSE,
            Command::HotKeys => HOTKEYS_RESPONSE,
            Command::Platform => PLATFORM_RESPONSE,
            Command::Commands => COMMANDS_RESPONSE,
            Command::Build | Command::Test | Command::DeployDevnet | Command::DeployMainnet => {
                FORGING_RESPONSE
            }
        }
    }

    /// The job a command submits, if it is an action command.
    pub fn backend_command(self) -> Option<BackendCommand> {
        match self {
            Command::Build => Some(BackendCommand::Build),
            Command::Test => Some(BackendCommand::Test),
            Command::DeployDevnet => Some(BackendCommand::DeployDevnet),
            Command::DeployMainnet => Some(BackendCommand::DeployMainnet),
            Command::Clear
            | Command::Help
            | Command::HotKeys
            | Command::Platform
            | Command::Commands => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.literal())
    }
}

impl std::str::FromStr for Command {
    type Err = NorthfallError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::lookup(s).ok_or_else(|| NorthfallError::UnknownCommand(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Free-function surface
// ---------------------------------------------------------------------------

pub fn is_recognized(token: &str) -> bool {
    Command::lookup(token).is_some()
}

pub fn static_response_for(token: &str) -> Option<&'static str> {
    Command::lookup(token).map(Command::response)
}

/// Text of the error line echoed for input outside the vocabulary.
pub fn not_found_message(input: &str) -> String {
    format!("northfall: command not found: {input}. Try --help")
}
