use std::path::PathBuf;

use anyhow::{bail, Context};

use qpong::config::{self, Config, OpponentKind};
use qpong::logging::{self, LogDestination};
use qpong::modes;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Command {
    #[default]
    Train,
    Watch,
    Eval,
}

#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    command: Command,
    config: Option<PathBuf>,
    episodes: Option<u64>,
    seed: Option<u64>,
    checkpoint: Option<PathBuf>,
    score_log: Option<PathBuf>,
    human: bool,
    debug: bool,
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let Some(cli) = parse_args(args.get(1..).unwrap_or_default())? else {
        print_usage(args.first().map(String::as_str).unwrap_or("qpong"));
        return Ok(());
    };

    // The terminal UI owns the screen, so watch mode logs to a file
    let destination = match cli.command {
        Command::Watch => LogDestination::File(logging::default_log_file()),
        Command::Train | Command::Eval => LogDestination::Stderr,
    };
    logging::init(logging::level_for(cli.debug), &destination)?;

    let mut config = match cli.config.as_deref() {
        Some(path) => config::load_config_from(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => config::load_config().context("failed to load config")?,
    };
    apply_overrides(&mut config, &cli);

    let summary = match cli.command {
        Command::Train => modes::run_training(&config)?,
        Command::Watch => modes::run_watch(&config)?,
        Command::Eval => modes::run_evaluation(&config)?,
    };

    if cli.command == Command::Eval {
        println!(
            "Evaluated {} episodes: mean score {:.2}, best {}",
            summary.episodes, summary.mean_score, summary.record
        );
    }
    Ok(())
}

/// Parse arguments after the program name. `Ok(None)` means help was requested.
fn parse_args(args: &[String]) -> anyhow::Result<Option<CliArgs>> {
    let mut cli = CliArgs::default();
    let mut iter = args.iter();
    let mut seen_command = false;

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--help" | "-h" => return Ok(None),
            "--config" | "-c" => cli.config = Some(PathBuf::from(value(&mut iter, arg)?)),
            "--episodes" | "-n" => cli.episodes = Some(number(&mut iter, arg)?),
            "--seed" => cli.seed = Some(number(&mut iter, arg)?),
            "--checkpoint" => cli.checkpoint = Some(PathBuf::from(value(&mut iter, arg)?)),
            "--score-log" => cli.score_log = Some(PathBuf::from(value(&mut iter, arg)?)),
            "--human" => cli.human = true,
            "--debug" => cli.debug = true,
            "train" | "watch" | "eval" if !seen_command => {
                seen_command = true;
                cli.command = match arg.as_str() {
                    "watch" => Command::Watch,
                    "eval" => Command::Eval,
                    _ => Command::Train,
                };
            }
            other => bail!("unknown argument: {} (try --help)", other),
        }
    }

    if cli.human && cli.command != Command::Watch {
        bail!("--human needs the terminal: use `watch`");
    }
    Ok(Some(cli))
}

fn value<'a>(iter: &mut impl Iterator<Item = &'a String>, flag: &str) -> anyhow::Result<&'a str> {
    match iter.next() {
        Some(v) => Ok(v.as_str()),
        None => bail!("{} requires a value", flag),
    }
}

fn number<'a>(iter: &mut impl Iterator<Item = &'a String>, flag: &str) -> anyhow::Result<u64> {
    let raw = value(iter, flag)?;
    raw.parse()
        .with_context(|| format!("{} expects a non-negative integer, got {:?}", flag, raw))
}

fn apply_overrides(config: &mut Config, cli: &CliArgs) {
    if let Some(episodes) = cli.episodes {
        config.training.episodes = Some(episodes);
    }
    if let Some(seed) = cli.seed {
        config.training.seed = seed;
    }
    if let Some(path) = &cli.checkpoint {
        config.training.checkpoint_path = Some(path.clone());
    }
    if let Some(path) = &cli.score_log {
        config.training.score_log = Some(path.clone());
    }
    if cli.human {
        config.training.opponent = OpponentKind::Human;
    }
}

fn print_usage(program: &str) {
    println!("QPong - Pong with a Q-learning paddle");
    println!();
    println!("Usage:");
    println!("  {} [train]   # Train headless, one log line per episode", program);
    println!("  {} watch     # Train while drawing the match in the terminal", program);
    println!("  {} eval      # Play greedy episodes with the saved network", program);
    println!();
    println!("Options:");
    println!("  -c, --config <path>      Config file (default: {})", config::get_config_path().display());
    println!("  -n, --episodes <n>       Stop after n episodes");
    println!("      --seed <n>           Seed for the match and the agent");
    println!("      --checkpoint <path>  Model checkpoint to load and save");
    println!("      --score-log <path>   Append episode scores as JSON lines");
    println!("      --human              Drive the right paddle with the arrow keys (watch only)");
    println!("      --debug              Log at debug level");
    println!("  -h, --help               Show this message");
}
