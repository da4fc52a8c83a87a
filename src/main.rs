use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::thread;
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand};
use log::LevelFilter;

use staffplay::{
    events_for, logger, render_svg, Config, FixedSong, Generator, RandomGenerator, Sampler,
    Session, Song, StaffError, Transport,
};

/// staffplay - engrave generated songs and play them back with note highlighting
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    log_level: LevelFilter,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Lay a song out and write it as SVG
    Render {
        #[command(flatten)]
        song: SongArgs,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Print the audio events of a song, one per line
    Events {
        #[command(flatten)]
        song: SongArgs,
    },
    /// Generate a song and write it as YAML
    Generate {
        /// Generator seed
        #[arg(long)]
        seed: Option<u64>,
        /// Number of measures
        #[arg(long)]
        measures: Option<usize>,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Run a full session in real time: generate, autoplay, highlight
    Play {
        #[command(flatten)]
        song: SongArgs,
        /// How long to run, in seconds
        #[arg(long, default_value_t = 15.0)]
        seconds: f64,
        /// Tempo override in bpm
        #[arg(long)]
        tempo: Option<f64>,
    },
}

/// Where the song comes from: a YAML file, or the random generator
#[derive(Args, Debug)]
struct SongArgs {
    /// Song YAML file
    #[arg(long)]
    song: Option<PathBuf>,
    /// Generator seed
    #[arg(long)]
    seed: Option<u64>,
    /// Number of measures to generate
    #[arg(long)]
    measures: Option<usize>,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logger::init(cli.log_level) {
        eprintln!("Could not install logger: {}", e);
    }

    let config = match &cli.config {
        Some(path) => match Config::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error reading config '{}': {}", path.display(), e);
                process::exit(1);
            }
        },
        None => Config::default(),
    };

    if let Err(e) = run(cli.command, config) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(command: Command, mut config: Config) -> Result<(), StaffError> {
    match command {
        Command::Render { song, out } => {
            let song = load_song(&song, &mut config)?;
            let svg = render_svg(&song, &config)?;
            write_output(out.as_deref(), &svg, "SVG")
        }
        Command::Events { song } => {
            let song = load_song(&song, &mut config)?;
            for event in events_for(&song, &config)? {
                println!("{}", event);
            }
            Ok(())
        }
        Command::Generate { seed, measures, out } => {
            let args = SongArgs {
                song: None,
                seed,
                measures,
            };
            let song = load_song(&args, &mut config)?;
            write_output(out.as_deref(), &song.to_yaml()?, "song")
        }
        Command::Play {
            song,
            seconds,
            tempo,
        } => {
            if let Some(tempo) = tempo {
                config.tempo = tempo;
            }
            let song = load_song(&song, &mut config)?;
            play(FixedSong(song), &config, seconds)
        }
    }
}

fn load_song(args: &SongArgs, config: &mut Config) -> Result<Song, StaffError> {
    if let Some(path) = &args.song {
        let source = fs::read_to_string(path)?;
        return Song::from_yaml(&source);
    }
    if args.seed.is_some() {
        config.generator.seed = args.seed;
    }
    let measures = args.measures.unwrap_or(config.song_duration);
    Ok(RandomGenerator::from_config(config)?.generate(measures))
}

fn write_output(path: Option<&Path>, content: &str, what: &str) -> Result<(), StaffError> {
    match path {
        Some(path) => {
            fs::write(path, content)?;
            eprintln!("Wrote {} to {}", what, path.display());
        }
        None => print!("{}", content),
    }
    Ok(())
}

fn play<G: Generator>(generator: G, config: &Config, seconds: f64) -> Result<(), StaffError> {
    let clock = Transport::from_config(&config.clock);
    let sampler = Sampler::from_config(&config.sampler, config.duration_tables()?)?;
    let mut session = Session::new(config, generator, clock, sampler)?;

    let start = Instant::now();
    session.mount(0.0)?;
    if let Some(label) = session.timestamp_label() {
        println!("Generated {}", label);
    }

    let mut highlights = 0;
    loop {
        let now = start.elapsed().as_secs_f64();
        session.pump(now)?;

        for voice in session.synchronizer().instrument_mut().take_voices() {
            println!(
                "{:>8.3}s  {:<4} {:.3}s  {} x{:.3}",
                voice.start, voice.pitch, voice.duration, voice.sample, voice.rate
            );
        }
        let count = session.synchronizer().highlights();
        if count != highlights {
            highlights = count;
            println!("          highlighted {} notes", highlights);
        }

        if now >= seconds {
            break;
        }
        thread::sleep(Duration::from_millis(10));
    }

    session.stop()?;
    println!(
        "Done: {} highlights, {} missed handles",
        session.synchronizer().highlights(),
        session.synchronizer().misses()
    );
    Ok(())
}
