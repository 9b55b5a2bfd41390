//! Text rendering of the call view and parsing of typed commands.

use mozart_core::ViewModel;
use std::fmt::Write;

/// A control the user can trigger from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserCommand {
    Start,
    Stop,
    Quit,
}

pub fn parse_command(input: &str) -> Option<UserCommand> {
    match input.trim().to_ascii_lowercase().as_str() {
        "start" | "s" => Some(UserCommand::Start),
        "stop" | "end" | "x" => Some(UserCommand::Stop),
        "quit" | "exit" | "q" => Some(UserCommand::Quit),
        _ => None,
    }
}

/// Rejects commands whose control is disabled in `view`.
pub fn check_enabled(view: &ViewModel, command: UserCommand) -> Result<(), &'static str> {
    match command {
        UserCommand::Start if !view.start_enabled => Err("start is not available right now"),
        UserCommand::Stop if !view.stop_enabled => Err("there is no call to end"),
        _ => Ok(()),
    }
}

pub fn render(view: &ViewModel, agent_name: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "── {agent_name} ──");
    let _ = writeln!(out, "status: {}", view.status);
    if view.start_enabled {
        let _ = writeln!(out, "  [start] {}", view.start_label);
    } else if !view.stop_enabled {
        let _ = writeln!(out, "  {}", view.start_label);
    }
    if view.stop_enabled {
        let _ = writeln!(out, "  [stop]  End call");
    }
    if let Some(error) = &view.error_banner {
        let _ = writeln!(out, "error: {error}");
    }
    out
}
