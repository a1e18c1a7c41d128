use clap::{crate_version, value_parser, Arg, ArgAction, ArgMatches, Command};
use extkit_core::{default_log_level, Action, MissingPathPolicy};
use std::path::PathBuf;

pub const MANIFEST_FLAG: &str = "manifest";
pub const LOG_LEVEL_FLAG: &str = "log_level";
pub const LOG_DIR_FLAG: &str = "log_dir";
pub const STRICT_REMOVE_FLAG: &str = "strict_remove";
pub const EXTENSION_ARG: &str = "extension";

pub const DEFAULT_MANIFEST: &str = "extensions.json";
/// Console default; file logging falls back to `default_log_level()`.
pub const DEFAULT_STDERR_LOG_LEVEL: &str = "warn";

pub fn cli() -> Command {
    Command::new("extkit")
        .version(crate_version!())
        .about("Install or remove extension file-set overlays described by a manifest catalog")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new(MANIFEST_FLAG)
                .short('m')
                .long("manifest")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .default_value(DEFAULT_MANIFEST)
                .help("Set the manifest catalog path"),
        )
        .arg(
            Arg::new(LOG_LEVEL_FLAG)
                .long("log-level")
                .value_name("LEVEL")
                .value_parser(["trace", "debug", "info", "warn", "error"])
                .help("Set the level of logging [default: warn, or the build default with --log-dir]"),
        )
        .arg(
            Arg::new(LOG_DIR_FLAG)
                .long("log-dir")
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf))
                .help("Write rolling log files to this absolute directory instead of stderr"),
        )
        .arg(
            Arg::new(STRICT_REMOVE_FLAG)
                .long("strict-remove")
                .action(ArgAction::SetTrue)
                .help("Fail when a file to delete is already missing"),
        )
        .subcommand(
            Command::new("install")
                .about("Copy an extension's files into the project")
                .arg(extension_arg()),
        )
        .subcommand(
            Command::new("remove")
                .about("Undo an extension's install")
                .arg(extension_arg()),
        )
        .subcommand(Command::new("list").about("List extensions in the catalog"))
        .subcommand(Command::new("check").about("Validate the catalog"))
}

fn extension_arg() -> Arg {
    Arg::new(EXTENSION_ARG)
        .required(true)
        .value_name("EXTENSION")
        .help("Extension name as declared in the catalog")
}

/// What the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Apply { action: Action, extension: String },
    List,
    Check,
}

/// Parsed command-line settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub manifest: PathBuf,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
    pub missing_path: MissingPathPolicy,
    pub invocation: Invocation,
}

impl Settings {
    /// Returns `None` when no known subcommand was given.
    pub fn from_matches(matches: &ArgMatches) -> Option<Self> {
        let invocation = match matches.subcommand()? {
            ("install", sub) => Invocation::Apply {
                action: Action::Install,
                extension: sub.get_one::<String>(EXTENSION_ARG)?.clone(),
            },
            ("remove", sub) => Invocation::Apply {
                action: Action::Remove,
                extension: sub.get_one::<String>(EXTENSION_ARG)?.clone(),
            },
            ("list", _) => Invocation::List,
            ("check", _) => Invocation::Check,
            _ => return None,
        };

        let missing_path = if matches.get_flag(STRICT_REMOVE_FLAG) {
            MissingPathPolicy::Fail
        } else {
            MissingPathPolicy::Ignore
        };

        let log_dir = matches.get_one::<PathBuf>(LOG_DIR_FLAG).cloned();
        let log_level = match (matches.get_one::<String>(LOG_LEVEL_FLAG), &log_dir) {
            (Some(level), _) => level.clone(),
            (None, Some(_)) => default_log_level().to_string(),
            (None, None) => DEFAULT_STDERR_LOG_LEVEL.to_string(),
        };

        Some(Self {
            manifest: matches
                .get_one::<PathBuf>(MANIFEST_FLAG)
                .cloned()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MANIFEST)),
            log_level,
            log_dir,
            missing_path,
            invocation,
        })
    }
}
