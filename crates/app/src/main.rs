use std::{fs::File, io::BufWriter, path::PathBuf, time::Duration};

use clap::{Parser, Subcommand};
use metronome_core::{BeatCue, MetronomeConfig, SilentCue, Tempo};
use tracing_subscriber::EnvFilter;

mod commands;
mod driver;
mod simulate;
mod sound;
mod stage;

use driver::Driver;
use simulate::{SimulationPlan, TempoChange};
use stage::TerminalStage;

fn main() -> metronome_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => MetronomeConfig::load(path)?,
        None => MetronomeConfig::default(),
    };

    match cli.command {
        Commands::Run {
            tempo,
            width,
            mute,
            autostart,
            seconds,
        } => run_live(&config, tempo, width, mute, autostart, seconds),
        Commands::Simulate {
            tempo,
            seconds,
            fps,
            stage_width,
            indicator_width,
            change,
            output,
        } => {
            let plan = SimulationPlan {
                tempo_bpm: tempo.unwrap_or(config.tempo.default_bpm),
                seconds,
                fps,
                stage_width,
                indicator_width,
                changes: change,
            };
            run_simulation(&config, &plan, output.as_ref())
        }
        Commands::Interval { tempo } => {
            let tempo = config.tempo.snap(tempo);
            println!("{} ms per beat at {tempo}", tempo.interval_ms());
            Ok(())
        }
    }
}

fn run_live(
    config: &MetronomeConfig,
    tempo: Option<f64>,
    width: u16,
    mute: bool,
    autostart: bool,
    seconds: Option<f64>,
) -> metronome_core::Result<()> {
    tracing::info!(
        tempo = %tempo.map_or(config.tempo.default_tempo(), Tempo::from_bpm),
        width,
        mute,
        "starting terminal metronome"
    );
    eprintln!("{}", commands::HELP);

    let cue = open_cue(mute);
    let commands = commands::spawn_stdin_reader();
    let limit = seconds.and_then(|s| Duration::try_from_secs_f64(s).ok());

    let mut driver = Driver::new(
        config,
        cue,
        TerminalStage::new(width),
        commands,
        std::io::stdout(),
    )
    .stop_after(limit);
    driver.run(autostart, tempo)
}

fn open_cue(mute: bool) -> Box<dyn BeatCue> {
    if mute {
        return Box::new(SilentCue);
    }
    match sound::SpeakerCue::open() {
        Ok(cue) => Box::new(cue),
        Err(err) => {
            tracing::warn!(%err, "no audio output, running silently");
            Box::new(SilentCue)
        }
    }
}

fn run_simulation(
    config: &MetronomeConfig,
    plan: &SimulationPlan,
    output: Option<&PathBuf>,
) -> metronome_core::Result<()> {
    tracing::info!(?output, tempo = plan.tempo_bpm, seconds = plan.seconds, "simulating");
    let trace = simulate::simulate(config, plan)?;

    match output {
        Some(path) => {
            let writer = BufWriter::new(File::create(path)?);
            serde_json::to_writer_pretty(writer, &trace).map_err(std::io::Error::from)?;
        }
        None => {
            serde_json::to_writer_pretty(std::io::stdout().lock(), &trace)
                .map_err(std::io::Error::from)?;
            println!();
        }
    }
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Visual metronome with a heartbeat", long_about = None)]
struct Cli {
    /// JSON configuration file (tempo range, stage inset, frame cadence).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the metronome in the terminal, reading commands from stdin.
    Run {
        /// Initial tempo in beats per minute.
        #[arg(short, long)]
        tempo: Option<f64>,
        /// Stage width in terminal columns.
        #[arg(short, long, default_value_t = 60)]
        width: u16,
        /// Do not play the heartbeat.
        #[arg(long)]
        mute: bool,
        /// Start immediately instead of waiting for a command.
        #[arg(long)]
        autostart: bool,
        /// Quit after this many seconds.
        #[arg(long)]
        seconds: Option<f64>,
    },
    /// Run against a synthetic clock and print a JSON trace.
    Simulate {
        #[arg(short, long)]
        tempo: Option<f64>,
        #[arg(short, long, default_value_t = 4.0)]
        seconds: f64,
        #[arg(long, default_value_t = 60)]
        fps: u32,
        #[arg(long, default_value_t = 300.0)]
        stage_width: f64,
        #[arg(long, default_value_t = 20.0)]
        indicator_width: f64,
        /// Tempo change as SECONDS=BPM. May be repeated.
        #[arg(long, value_parser = simulate::parse_tempo_change)]
        change: Vec<TempoChange>,
        /// Write the trace here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the beat interval for a tempo.
    Interval {
        /// Tempo in beats per minute.
        #[arg(short, long)]
        tempo: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_takes_tempo_as_a_flag() {
        let cli = Cli::try_parse_from(["metronome", "interval", "--tempo", "90"]).unwrap();
        assert!(matches!(cli.command, Commands::Interval { tempo } if tempo == 90.0));

        let cli = Cli::try_parse_from(["metronome", "interval", "-t", "120"]).unwrap();
        assert!(matches!(cli.command, Commands::Interval { tempo } if tempo == 120.0));

        assert!(Cli::try_parse_from(["metronome", "interval", "90"]).is_err());
    }
}
