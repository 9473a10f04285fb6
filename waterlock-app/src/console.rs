//! The interactive shell: one line of stdin per gesture.

use crate::screen::{Gesture, GestureOutcome, ScreenModel};
use anyhow::Result;
use chrono::Local;
use tokio::{
    io::{self, AsyncBufReadExt, BufReader},
    signal,
    sync::mpsc,
};
use tokio_stream::{wrappers::LinesStream, StreamExt};
use waterlock_connector::controller::{StatusMessage, WaterLockController};

const HELP: &str = "commands: tap | drag <dx> <dy> | show | help | quit";

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleInput {
    Gesture(Gesture),
    Show,
    Help,
    Quit,
    Unknown(String),
}

pub fn parse_line(line: &str) -> ConsoleInput {
    let mut words = line.split_whitespace();
    match words.next() {
        Some("tap") => ConsoleInput::Gesture(Gesture::Tap),
        Some("drag") => {
            let dx = words.next().and_then(|w| w.parse::<f32>().ok());
            let dy = words.next().and_then(|w| w.parse::<f32>().ok());
            match (dx, dy, words.next()) {
                (Some(dx), Some(dy), None) => ConsoleInput::Gesture(Gesture::Drag { dx, dy }),
                _ => ConsoleInput::Unknown(line.trim().to_string()),
            }
        }
        Some("show") | None => ConsoleInput::Show,
        Some("help") => ConsoleInput::Help,
        Some("quit") | Some("exit") => ConsoleInput::Quit,
        Some(_) => ConsoleInput::Unknown(line.trim().to_string()),
    }
}

fn print_status(status: &StatusMessage) {
    let tag = if status.is_error() { "!" } else { "i" };
    println!("[{}] {}", tag, status);
}

/// Runs the shell until `quit`, end of input, or Ctrl+C.
pub async fn run(
    controller: WaterLockController,
    mut status_rx: mpsc::Receiver<StatusMessage>,
) -> Result<()> {
    let mut screen = ScreenModel::new(Local::now().time());
    println!("{}", screen.render());
    println!("{}", HELP);

    let mut lines = LinesStream::new(BufReader::new(io::stdin()).lines());
    loop {
        tokio::select! {
            line = lines.next() => match line {
                Some(Ok(line)) => match parse_line(&line) {
                    ConsoleInput::Gesture(gesture) => match screen.apply(gesture) {
                        GestureOutcome::SendWaterLock => {
                            let _ = controller.on_tap();
                        }
                        GestureOutcome::IconMoved { x, y } => {
                            tracing::debug!(x, y, "Icon moved");
                            println!("{}", screen.render());
                        }
                    },
                    ConsoleInput::Show => {
                        screen.set_clock(Local::now().time());
                        println!("{}", screen.render());
                    }
                    ConsoleInput::Help => println!("{}", HELP),
                    ConsoleInput::Quit => break,
                    ConsoleInput::Unknown(input) => println!("unknown input '{}'. {}", input, HELP),
                },
                Some(Err(err)) => {
                    tracing::error!(error = %err, "Failed to read from stdin");
                    break;
                }
                None => break,
            },
            Some(status) = status_rx.recv() => print_status(&status),
            res = signal::ctrl_c() => {
                match res {
                    Ok(()) => tracing::info!("Received Ctrl+C, initiating graceful shutdown..."),
                    Err(err) => tracing::error!(error = %err, "Failed to listen for shutdown signal."),
                }
                break;
            }
        }
    }

    controller.link().shutdown().await;
    tracing::info!("Shutdown complete.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_gestures() {
        assert_eq!(parse_line("tap"), ConsoleInput::Gesture(Gesture::Tap));
        assert_eq!(
            parse_line("  drag 4 -2.5 "),
            ConsoleInput::Gesture(Gesture::Drag { dx: 4.0, dy: -2.5 })
        );
    }

    #[test]
    fn malformed_drag_is_unknown() {
        assert_eq!(
            parse_line("drag 4"),
            ConsoleInput::Unknown("drag 4".to_string())
        );
        assert_eq!(
            parse_line("drag a b"),
            ConsoleInput::Unknown("drag a b".to_string())
        );
        assert_eq!(
            parse_line("drag 1 2 3"),
            ConsoleInput::Unknown("drag 1 2 3".to_string())
        );
    }

    #[test]
    fn parses_shell_commands() {
        assert_eq!(parse_line(""), ConsoleInput::Show);
        assert_eq!(parse_line("show"), ConsoleInput::Show);
        assert_eq!(parse_line("help"), ConsoleInput::Help);
        assert_eq!(parse_line("exit"), ConsoleInput::Quit);
        assert_eq!(
            parse_line("swim"),
            ConsoleInput::Unknown("swim".to_string())
        );
    }
}
