// SPDX-License-Identifier: GPL-3.0-only

//! Terminal input handlers
//!
//! Lines typed on stdin are commands, except while a permission prompt is
//! open: then the line is the answer.

use crate::app::state::{Flow, Message, PermissionState, Screen};
use std::str::FromStr;

pub const HELP: &str = "Commands: menu, select <camera>, pause, resume, retry-permission, stats, quit";

/// A terminal command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Menu,
    Select(String),
    Pause,
    Resume,
    RetryPermission,
    Stats,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map(|(word, rest)| (word, rest.trim()))
            .unwrap_or((line, ""));

        match word.to_lowercase().as_str() {
            "menu" | "cameras" => Ok(Command::Menu),
            "select" | "camera" if !rest.is_empty() => Ok(Command::Select(rest.to_string())),
            "select" | "camera" => Err("Usage: select <camera>".to_string()),
            "pause" => Ok(Command::Pause),
            "resume" => Ok(Command::Resume),
            "retry-permission" | "retry" => Ok(Command::RetryPermission),
            "stats" => Ok(Command::Stats),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" | "q" => Ok(Command::Quit),
            _ => Err(format!("Unknown command: {}", line)),
        }
    }
}

impl Command {
    /// Message carrying out the command; `None` for purely informational ones
    pub fn into_message(self) -> Option<Message> {
        match self {
            Command::Menu => Some(Message::ShowMenu),
            Command::Select(selection) => Some(Message::SelectCamera(selection)),
            Command::Pause => Some(Message::Paused),
            Command::Resume => Some(Message::Resumed),
            Command::RetryPermission => Some(Message::RetryPermission),
            Command::Stats => Some(Message::ShowStats),
            Command::Help => None,
            Command::Quit => Some(Message::Destroyed),
        }
    }
}

/// Interpret a prompt answer; anything but yes is a no
fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

impl Screen {
    pub(crate) fn handle_input(&mut self, line: &str) -> Flow {
        if self.permission_state == PermissionState::Pending {
            return self.update(Message::PermissionAnswered(is_affirmative(line)));
        }
        if line.trim().is_empty() {
            return Flow::Continue;
        }

        match line.parse::<Command>() {
            Ok(command) => match command.into_message() {
                Some(message) => self.update(message),
                None => {
                    self.surface.notify(HELP);
                    Flow::Continue
                }
            },
            Err(e) => {
                self.surface.notify(&e);
                Flow::Continue
            }
        }
    }
}
