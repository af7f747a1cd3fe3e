use std::io::{self, BufRead, Write};
use std::thread;

use log::{debug, warn};
use tokio::sync::mpsc::Sender;

use crate::mode::Command;

/// Manual brightness choices offered in the menu, in percent.
pub const MANUAL_LEVELS: [u8; 5] = [10, 25, 50, 75, 100];

pub fn parse_choice(input: &str) -> Option<Command> {
    let choice = input.trim().trim_end_matches('%').to_ascii_lowercase();
    match choice.as_str() {
        "a" | "auto" => Some(Command::EnableAuto),
        "q" | "quit" | "exit" => Some(Command::Exit),
        other => other
            .parse::<u8>()
            .ok()
            .filter(|level| MANUAL_LEVELS.contains(level))
            .map(Command::SetManual),
    }
}

pub fn render() -> String {
    let levels: Vec<String> = MANUAL_LEVELS.iter().map(|l| format!("{}%", l)).collect();
    format!(
        "Brightness: [{}]  a = re-enable auto  q = exit",
        levels.join(" ")
    )
}

/// Read menu choices from stdin on a dedicated thread until stdin closes or
/// the receiver goes away.
pub fn spawn(commands: Sender<Command>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        println!("{}", render());
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!("Could not read menu input: {}", e);
                    break;
                }
            };
            match parse_choice(&line) {
                Some(command) => {
                    if commands.blocking_send(command).is_err() || command == Command::Exit {
                        break;
                    }
                }
                None if line.trim().is_empty() => {}
                None => {
                    println!("{}", render());
                    let _ = io::stdout().flush();
                }
            }
        }
        debug!("Menu input closed.");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_levels() {
        assert_eq!(parse_choice("50"), Some(Command::SetManual(50)));
        assert_eq!(parse_choice(" 100%\n"), Some(Command::SetManual(100)));
        assert_eq!(parse_choice("10"), Some(Command::SetManual(10)));
    }

    #[test]
    fn rejects_levels_off_the_menu() {
        assert_eq!(parse_choice("42"), None);
        assert_eq!(parse_choice("300"), None);
        assert_eq!(parse_choice(""), None);
    }

    #[test]
    fn parses_mode_commands() {
        assert_eq!(parse_choice("a"), Some(Command::EnableAuto));
        assert_eq!(parse_choice("AUTO"), Some(Command::EnableAuto));
        assert_eq!(parse_choice("q"), Some(Command::Exit));
        assert_eq!(parse_choice("exit"), Some(Command::Exit));
    }

    #[test]
    fn render_lists_every_level() {
        let menu = render();
        for level in MANUAL_LEVELS {
            assert!(menu.contains(&format!("{}%", level)));
        }
    }
}
