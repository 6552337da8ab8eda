use std::{
    io::BufRead,
    str::FromStr,
    sync::mpsc::{self, Receiver},
    thread,
};

use metronome_core::MetronomeError;

/// A line typed by the user while the metronome runs.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start,
    Stop,
    /// Start/stop button.
    Toggle,
    Tempo(f64),
    Faster,
    Slower,
    /// Terminal resized to this many columns.
    Width(u16),
    Menu,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = MetronomeError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(word) = words.next() else {
            return Ok(Command::Toggle);
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "start" => Command::Start,
            "stop" => Command::Stop,
            "toggle" | "t" => Command::Toggle,
            "+" | "faster" => Command::Faster,
            "-" | "slower" => Command::Slower,
            "menu" | "m" => Command::Menu,
            "help" | "?" => Command::Help,
            "quit" | "q" | "exit" => Command::Quit,
            "tempo" | "bpm" => {
                let value = words
                    .next()
                    .ok_or_else(|| MetronomeError::msg("`tempo` needs a value"))?;
                let bpm = value
                    .parse::<f64>()
                    .map_err(|_| MetronomeError::msg(format!("`{value}` is not a tempo")))?;
                Command::Tempo(bpm)
            }
            "width" => {
                let value = words
                    .next()
                    .ok_or_else(|| MetronomeError::msg("`width` needs a column count"))?;
                let columns = value
                    .parse::<u16>()
                    .map_err(|_| MetronomeError::msg(format!("`{value}` is not a width")))?;
                Command::Width(columns)
            }
            other => {
                return Err(MetronomeError::msg(format!("unknown command `{other}`")));
            }
        };

        if let Some(extra) = words.next() {
            return Err(MetronomeError::msg(format!("unexpected argument `{extra}`")));
        }
        Ok(command)
    }
}

pub const HELP: &str = "commands: <enter>/toggle, start, stop, tempo <bpm>, +, -, width <cols>, menu, quit";

/// Forwards stdin lines to the event loop. The reader thread only parses and
/// sends; all metronome state stays on the receiving thread. The channel
/// disconnects when stdin closes.
pub fn spawn_stdin_reader() -> Receiver<Command> {
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            match line.parse::<Command>() {
                Ok(command) => {
                    if tx.send(command).is_err() {
                        break;
                    }
                }
                Err(err) => tracing::warn!(%err, "ignoring input"),
            }
        }
        tracing::debug!("stdin closed");
    });

    rx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_commands() {
        assert_eq!("".parse::<Command>().unwrap(), Command::Toggle);
        assert_eq!("  START ".parse::<Command>().unwrap(), Command::Start);
        assert_eq!("tempo 96".parse::<Command>().unwrap(), Command::Tempo(96.0));
        assert_eq!("width 72".parse::<Command>().unwrap(), Command::Width(72));
        assert_eq!("+".parse::<Command>().unwrap(), Command::Faster);
        assert_eq!("q".parse::<Command>().unwrap(), Command::Quit);
    }

    #[test]
    fn rejects_malformed_input() {
        assert!("tempo".parse::<Command>().is_err());
        assert!("tempo fast".parse::<Command>().is_err());
        assert!("width -3".parse::<Command>().is_err());
        assert!("stop now".parse::<Command>().is_err());
        let err = "dance".parse::<Command>().unwrap_err();
        assert!(format!("{err}").contains("dance"));
    }
}
