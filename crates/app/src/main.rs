use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cakap_core::{Curriculum, SimilarityScorer};
use rand::SeedableRng;
use rand::rngs::StdRng;
use services::{Clock, ProgressionService, PromptSet, SpeechPracticeService};
use storage::JsonFileRepository;
use storage::repository::Storage;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const DEFAULT_DB_URL: &str = "sqlite://cakapgo.sqlite3";

const DEFAULT_PROMPTS: [&str; 5] = [
    "Hello",
    "Good morning",
    "Thank you",
    "How are you today",
    "Nice to meet you",
];

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingArgument { name: &'static str },
    MissingCommand,
    UnknownArg(String),
    UnknownCommand(String),
    InvalidDbUrl { raw: String },
    InvalidSeed { raw: String },
    ConflictingStores,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArgument { name } => write!(f, "missing argument: <{name}>"),
            ArgsError::MissingCommand => write!(f, "missing command"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown command: {cmd}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidSeed { raw } => write!(f, "invalid --seed value: {raw}"),
            ArgsError::ConflictingStores => write!(f, "--db and --json cannot be combined"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn require_arg(
    args: &mut impl Iterator<Item = String>,
    name: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingArgument { name })
}

/// Commands that read or write saved progress.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ProgressCommand {
    Status,
    Start { level: String },
    Complete { level: String },
    Stats,
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Progress(ProgressCommand),
    Score { expected: String, actual: String },
    Prompt { prompts: Option<PathBuf>, seed: Option<u64> },
}

/// Values taken from the environment before flags are applied.
#[derive(Debug, Default, Clone)]
struct EnvDefaults {
    db_url: Option<String>,
    prompts: Option<String>,
}

impl EnvDefaults {
    fn from_env() -> Self {
        Self {
            db_url: std::env::var("CAKAP_DB_URL").ok(),
            prompts: std::env::var("CAKAP_PROMPTS").ok(),
        }
    }
}

#[derive(Debug)]
struct Args {
    db_url: String,
    json_store: Option<PathBuf>,
    command: Command,
}

impl Args {
    fn parse(
        args: impl IntoIterator<Item = String>,
        env: EnvDefaults,
    ) -> Result<Option<Self>, ArgsError> {
        let mut args = args.into_iter();
        let mut db_url = env
            .db_url
            .map_or_else(|| DEFAULT_DB_URL.into(), normalize_sqlite_url);
        let mut json_store = None;
        let mut db_flag = false;

        let command = loop {
            let Some(arg) = args.next() else {
                return Err(ArgsError::MissingCommand);
            };
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                    db_flag = true;
                }
                "--json" => {
                    json_store = Some(PathBuf::from(require_value(&mut args, "--json")?));
                }
                "--help" | "-h" => return Ok(None),
                _ if arg.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ => break arg,
            }
        };

        let command = match command.as_str() {
            "status" => Command::Progress(ProgressCommand::Status),
            "stats" => Command::Progress(ProgressCommand::Stats),
            "reset" => Command::Progress(ProgressCommand::Reset),
            "start" => Command::Progress(ProgressCommand::Start {
                level: require_arg(&mut args, "level")?,
            }),
            "complete" => Command::Progress(ProgressCommand::Complete {
                level: require_arg(&mut args, "level")?,
            }),
            "score" => Command::Score {
                expected: require_arg(&mut args, "expected")?,
                actual: require_arg(&mut args, "actual")?,
            },
            "prompt" => parse_prompt(&mut args, env.prompts)?,
            _ => return Err(ArgsError::UnknownCommand(command)),
        };

        if let Some(extra) = args.next() {
            return Err(ArgsError::UnknownArg(extra));
        }
        if db_flag && json_store.is_some() {
            return Err(ArgsError::ConflictingStores);
        }

        Ok(Some(Self {
            db_url,
            json_store,
            command,
        }))
    }
}

fn parse_prompt(
    args: &mut impl Iterator<Item = String>,
    env_prompts: Option<String>,
) -> Result<Command, ArgsError> {
    let mut prompts = env_prompts.map(PathBuf::from);
    let mut seed = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--prompts" => prompts = Some(PathBuf::from(require_value(args, "--prompts")?)),
            "--seed" => {
                let value = require_value(args, "--seed")?;
                let parsed: u64 = value
                    .parse()
                    .map_err(|_| ArgsError::InvalidSeed { raw: value.clone() })?;
                seed = Some(parsed);
            }
            _ => return Err(ArgsError::UnknownArg(arg)),
        }
    }

    Ok(Command::Prompt { prompts, seed })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [--db <sqlite_url> | --json <file>] status");
    eprintln!("  cargo run -p app -- [--db <sqlite_url>] start <level>");
    eprintln!("  cargo run -p app -- [--db <sqlite_url>] complete <level>");
    eprintln!("  cargo run -p app -- [--db <sqlite_url>] stats");
    eprintln!("  cargo run -p app -- [--db <sqlite_url>] reset");
    eprintln!("  cargo run -p app -- score <expected> <actual>");
    eprintln!("  cargo run -p app -- prompt [--prompts <csv>] [--seed <n>]");
    eprintln!();
    eprintln!("Levels: beginner, intermediate, expert");
    eprintln!("Defaults:");
    eprintln!("  --db {DEFAULT_DB_URL}");
    eprintln!("  --json keeps progress in a JSON key-value file instead");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  CAKAP_DB_URL, CAKAP_PROMPTS, RUST_LOG");
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_prompts(path: Option<&PathBuf>) -> Result<PromptSet, Box<dyn std::error::Error>> {
    let set = match path {
        Some(path) => PromptSet::from_csv(&std::fs::read_to_string(path)?)?,
        None => PromptSet::new(DEFAULT_PROMPTS.map(String::from))?,
    };
    debug!(count = set.len(), "prompts loaded");
    Ok(set)
}

async fn open_storage(
    db_url: &str,
    json_store: Option<&Path>,
) -> Result<Storage, Box<dyn std::error::Error>> {
    if let Some(path) = json_store {
        let repo = Arc::new(JsonFileRepository::new(path));
        return Ok(Storage {
            progress: repo.clone(),
            stats: repo,
        });
    }

    // Open + migrate SQLite here so core/services stay free of I/O setup.
    prepare_sqlite_file(db_url)?;
    Ok(Storage::sqlite(db_url).await?)
}

async fn run_progression(
    storage: Storage,
    command: ProgressCommand,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut progression = ProgressionService::load(
        Clock::default(),
        Curriculum::standard(),
        storage.progress,
        storage.stats,
    )
    .await?;

    match command {
        ProgressCommand::Status => {
            for level in progression.levels() {
                println!(
                    "{:<13} {:<9} {:>2}/{:<2} lessons ({:.0}%)",
                    level.name(),
                    level.status(),
                    level.completed_lessons(),
                    level.total_lessons(),
                    level.percent_complete()
                );
            }
        }
        ProgressCommand::Start { level } => {
            let lesson = progression.start_lesson(&level)?;
            let name = progression
                .engine()
                .level(&level)
                .map_or(level.as_str(), |l| l.name());
            println!("{name} - Lesson {}: {}", lesson.number(), lesson.title);
        }
        ProgressCommand::Complete { level } => {
            let outcome = progression.complete_lesson(&level).await?;
            if outcome.just_completed {
                println!("Congratulations! You completed {} level!", outcome.level_name);
            } else if outcome.advanced {
                println!(
                    "Lesson completed! {} lessons remaining.",
                    outcome.remaining
                );
            } else {
                println!("{} level is already completed.", outcome.level_name);
            }
        }
        ProgressCommand::Stats => {
            let stats = progression.stats().await?;
            println!("Lessons completed: {}", stats.lessons_completed);
            println!("Current streak:    {} days", stats.current_streak);
            println!("Total points:      {}", stats.total_points);
        }
        ProgressCommand::Reset => {
            progression.reset().await?;
            println!("Progress reset.");
        }
    }

    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let parsed = match Args::parse(std::env::args().skip(1), EnvDefaults::from_env()) {
        Ok(Some(parsed)) => parsed,
        Ok(None) => {
            print_usage();
            return Ok(());
        }
        Err(e) => {
            eprintln!("{e}");
            print_usage();
            return Err(e.into());
        }
    };

    init_tracing();
    debug!(db_url = %parsed.db_url, command = ?parsed.command, "starting");

    match parsed.command {
        Command::Progress(command) => {
            let storage = open_storage(&parsed.db_url, parsed.json_store.as_deref()).await?;
            run_progression(storage, command).await?;
        }
        Command::Score { expected, actual } => {
            let result = SimilarityScorer::new().score_result(&expected, &actual);
            println!("Transcript: {}", result.transcript);
            println!("Score: {result}");
        }
        Command::Prompt { prompts, seed } => {
            let practice = SpeechPracticeService::new(load_prompts(prompts.as_ref())?);
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            };
            println!("Say: \"{}\"", practice.next_prompt(&mut rng));
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Option<Args>, ArgsError> {
        Args::parse(args.iter().map(|a| (*a).to_string()), EnvDefaults::default())
    }

    #[test]
    fn parses_db_flag_before_command() {
        let args = parse(&["--db", "sqlite::memory:", "complete", "beginner"])
            .unwrap()
            .unwrap();
        assert_eq!(args.db_url, "sqlite::memory:");
        assert_eq!(
            args.command,
            Command::Progress(ProgressCommand::Complete {
                level: "beginner".into()
            })
        );
    }

    #[test]
    fn env_db_url_is_used_when_flag_missing() {
        let env = EnvDefaults {
            db_url: Some("sqlite:///tmp/progress.sqlite3".into()),
            prompts: None,
        };
        let args = Args::parse(vec!["status".to_string()], env).unwrap().unwrap();
        assert_eq!(args.db_url, "sqlite:///tmp/progress.sqlite3");
        assert_eq!(args.command, Command::Progress(ProgressCommand::Status));
    }

    #[test]
    fn json_flag_selects_file_store() {
        let args = parse(&["--json", "progress.json", "stats"]).unwrap().unwrap();
        assert_eq!(args.json_store, Some(PathBuf::from("progress.json")));
        assert_eq!(args.command, Command::Progress(ProgressCommand::Stats));
    }

    #[test]
    fn db_and_json_flags_conflict() {
        let err = parse(&["--db", "sqlite::memory:", "--json", "progress.json", "status"])
            .unwrap_err();
        assert!(matches!(err, ArgsError::ConflictingStores));

        let env = EnvDefaults {
            db_url: Some("sqlite:///tmp/progress.sqlite3".into()),
            prompts: None,
        };
        let args = Args::parse(
            ["--json", "progress.json", "status"].map(String::from),
            env,
        )
        .unwrap()
        .unwrap();
        assert_eq!(args.json_store, Some(PathBuf::from("progress.json")));
    }

    #[test]
    fn score_requires_two_arguments() {
        let err = parse(&["score", "kitten"]).unwrap_err();
        assert!(matches!(err, ArgsError::MissingArgument { name: "actual" }));

        let args = parse(&["score", "kitten", "sitting"]).unwrap().unwrap();
        assert!(matches!(args.command, Command::Score { .. }));
    }

    #[test]
    fn prompt_flags_are_parsed() {
        let args = parse(&["prompt", "--prompts", "phrases.csv", "--seed", "42"])
            .unwrap()
            .unwrap();
        assert_eq!(
            args.command,
            Command::Prompt {
                prompts: Some(PathBuf::from("phrases.csv")),
                seed: Some(42),
            }
        );

        let err = parse(&["prompt", "--seed", "soon"]).unwrap_err();
        assert!(matches!(err, ArgsError::InvalidSeed { .. }));
    }

    #[test]
    fn rejects_unknown_input() {
        assert!(matches!(
            parse(&["dance"]).unwrap_err(),
            ArgsError::UnknownCommand(_)
        ));
        assert!(matches!(
            parse(&["status", "extra"]).unwrap_err(),
            ArgsError::UnknownArg(_)
        ));
        assert!(matches!(parse(&[]).unwrap_err(), ArgsError::MissingCommand));
        assert!(parse(&["--help"]).unwrap().is_none());
    }

    #[test]
    fn default_prompts_are_valid() {
        let set = load_prompts(None).unwrap();
        assert_eq!(set.len(), DEFAULT_PROMPTS.len());
    }
}
