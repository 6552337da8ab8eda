use std::{
    io::{self, Write},
    sync::mpsc::{Receiver, RecvTimeoutError},
    thread,
    time::{Duration, Instant},
};

use metronome_core::{BeatCue, Flow, Metronome, MetronomeConfig, Result, StartOutcome, TaskQueue};

use crate::{
    commands::{Command, HELP},
    stage::TerminalStage,
};

/// How long to wait for input when nothing is scheduled.
const IDLE_WAIT: Duration = Duration::from_millis(250);

pub type TerminalMetronome = Metronome<TaskQueue, Box<dyn BeatCue>, TerminalStage>;

/// Single-threaded event loop hosting the frame source and the beat pulse.
///
/// Both time sources are deadlines on one clock: the frame deadline lives
/// here, the pulse deadlines live in the metronome's [`TaskQueue`]. The loop
/// sleeps on the command channel until the earliest of them.
pub struct Driver<W: Write> {
    metronome: TerminalMetronome,
    commands: Receiver<Command>,
    out: W,
    epoch: Instant,
    frame_interval: Duration,
    next_frame: Option<Duration>,
    stop_after: Option<Duration>,
    input_open: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Continue,
    Quit,
}

impl<W: Write> Driver<W> {
    pub fn new(
        config: &MetronomeConfig,
        cue: Box<dyn BeatCue>,
        stage: TerminalStage,
        commands: Receiver<Command>,
        out: W,
    ) -> Self {
        let metronome = Metronome::new(config, TaskQueue::new(), cue, stage);
        Self {
            metronome,
            commands,
            out,
            epoch: Instant::now(),
            frame_interval: Duration::from_millis(config.frame_interval_ms),
            next_frame: None,
            stop_after: None,
            input_open: true,
        }
    }

    /// Quit once this much time has passed since the loop started.
    pub fn stop_after(mut self, limit: Option<Duration>) -> Self {
        self.stop_after = limit;
        self
    }

    pub fn run(&mut self, autostart: bool, initial_tempo: Option<f64>) -> Result<()> {
        if let Some(bpm) = initial_tempo {
            self.metronome.set_tempo(bpm);
        }
        if autostart {
            self.apply(Command::Start)?;
        }
        self.draw()?;

        loop {
            let now = self.epoch.elapsed();
            if self.stop_after.is_some_and(|limit| now >= limit) {
                break;
            }
            if !self.input_open && !self.metronome.is_running() && self.stop_after.is_none() {
                break;
            }

            let wait = self.next_deadline().map_or(IDLE_WAIT, |due| due.saturating_sub(now));
            if self.input_open {
                match self.commands.recv_timeout(wait) {
                    Ok(command) => {
                        self.metronome.sync_clock(self.epoch.elapsed());
                        if self.apply(command)? == Control::Quit {
                            break;
                        }
                    }
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => self.input_open = false,
                }
            } else {
                thread::sleep(wait);
            }

            self.tick(self.epoch.elapsed())?;
        }

        self.metronome.stop();
        writeln!(self.out)?;
        Ok(())
    }

    fn next_deadline(&self) -> Option<Duration> {
        let pulse = self.metronome.next_pulse_due();
        let deadline = match (self.next_frame, pulse) {
            (Some(frame), Some(pulse)) => Some(frame.min(pulse)),
            (frame, pulse) => frame.or(pulse),
        };
        match (deadline, self.stop_after) {
            (Some(due), Some(limit)) => Some(due.min(limit)),
            (due, limit) => due.or(limit),
        }
    }

    /// Fires everything due at `now`.
    fn tick(&mut self, now: Duration) -> Result<()> {
        self.metronome.run_due_pulses(now);

        let Some(due) = self.next_frame else {
            return Ok(());
        };
        if now < due {
            return Ok(());
        }

        match self.metronome.step(now.as_secs_f64() * 1000.0) {
            Flow::Continue => self.next_frame = Some(now + self.frame_interval),
            Flow::Halt => self.next_frame = None,
        }
        self.draw()?;
        Ok(())
    }

    fn apply(&mut self, command: Command) -> Result<Control> {
        match command {
            Command::Start => {
                if self.metronome.start() == StartOutcome::Started {
                    self.request_frame();
                }
            }
            Command::Stop => {
                self.metronome.stop();
            }
            Command::Toggle => {
                if self.metronome.toggle() {
                    self.request_frame();
                }
            }
            Command::Tempo(bpm) => {
                let tempo = self.metronome.set_tempo(bpm);
                tracing::info!(%tempo, "tempo set");
            }
            Command::Faster => {
                self.metronome.nudge_tempo(1);
            }
            Command::Slower => {
                self.metronome.nudge_tempo(-1);
            }
            Command::Width(columns) => {
                self.metronome.surface_mut().resize(columns);
                self.metronome.render();
                tracing::debug!(columns = self.metronome.surface().columns(), "stage resized");
            }
            Command::Menu => {
                if self.metronome.toggle_menu() {
                    let range = *self.metronome.tempo_range();
                    writeln!(
                        self.out,
                        "\r\x1b[2Ktempo {}..={} step {} | {HELP}",
                        range.min_bpm, range.max_bpm, range.step_bpm
                    )?;
                }
            }
            Command::Help => {
                writeln!(self.out, "\r\x1b[2K{HELP}")?;
            }
            Command::Quit => return Ok(Control::Quit),
        }

        self.draw()?;
        Ok(Control::Continue)
    }

    fn request_frame(&mut self) {
        self.next_frame = Some(self.epoch.elapsed());
    }

    fn draw(&mut self) -> io::Result<()> {
        let status = format!(
            "{} bpm [{}]",
            self.metronome.tempo_label(),
            self.metronome.button_label()
        );
        self.metronome.surface().draw(&mut self.out, &status)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use metronome_core::SilentCue;

    use super::*;

    fn driver(commands: Receiver<Command>) -> Driver<Vec<u8>> {
        let config = MetronomeConfig {
            frame_interval_ms: 5,
            ..Default::default()
        };
        Driver::new(
            &config,
            Box::new(SilentCue),
            TerminalStage::new(20),
            commands,
            Vec::new(),
        )
    }

    #[test]
    fn quits_on_command() {
        let (tx, rx) = mpsc::channel();
        tx.send(Command::Start).unwrap();
        tx.send(Command::Tempo(120.0)).unwrap();
        tx.send(Command::Quit).unwrap();

        let mut driver = driver(rx);
        driver.run(false, None).unwrap();

        assert!(!driver.metronome.is_running());
        assert_eq!(driver.metronome.tempo().bpm(), 120.0);
        let text = String::from_utf8(driver.out.clone()).unwrap();
        assert!(text.contains("[Stop]"));
    }

    #[test]
    fn closed_input_while_stopped_ends_the_loop() {
        let (tx, rx) = mpsc::channel::<Command>();
        drop(tx);

        let mut driver = driver(rx);
        driver.run(false, Some(90.0)).unwrap();
        assert_eq!(driver.metronome.tempo_label(), "90");
    }

    #[test]
    fn time_limit_stops_a_running_metronome() {
        let (_tx, rx) = mpsc::channel::<Command>();

        let mut driver = driver(rx).stop_after(Some(Duration::from_millis(60)));
        driver.run(true, Some(240.0)).unwrap();

        assert!(!driver.metronome.is_running());
        assert!(driver.metronome.position() > 0.0);
    }

    #[test]
    fn width_command_rerenders_at_rest() {
        let (_tx, rx) = mpsc::channel::<Command>();
        let mut driver = driver(rx);

        driver.apply(Command::Width(40)).unwrap();
        assert_eq!(driver.metronome.surface().columns(), 40);
        assert_eq!(driver.metronome.surface().dot_column(), 2);
    }
}
