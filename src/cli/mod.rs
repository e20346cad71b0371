//! Command-line interface for mongo-save
//!
//! This module handles:
//! - Command-line argument parsing using clap
//! - Configuration loading
//! - Resolving CLI flags, config file and environment into pipeline options
//! - Dispatching the `backup` and `restore` subcommands

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use crate::config::{self, Config, ConnectionConfig, LogLevel};
use crate::connection::sanitize_uri;
use crate::error::{ConfigError, Result};
use crate::pipeline::{self, BackupOptions, RestoreOptions};

/// Back up a MongoDB database to plain files and restore it
#[derive(Parser, Debug)]
#[command(
    name = "mongo-save",
    version,
    about = "Back up a MongoDB database to a directory and restore it",
    long_about = "Exports every collection to one Extended JSON file per document, with an
inferred schema per collection and a manifest, and loads such a directory back
into a database."
)]
pub struct CliArgs {
    /// Configuration file path (TOML, or JSON with a .json extension)
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    pub config_file: Option<PathBuf>,

    /// Quiet mode (errors only, no progress)
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Very verbose mode (trace logging)
    #[arg(long = "vv", global = true)]
    pub very_verbose: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands for mongo-save
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Back up a database into a directory
    Backup(BackupArgs),

    /// Restore a database from a backup directory
    Restore(RestoreArgs),
}

/// Arguments of `mongo-save backup`
#[derive(Args, Debug, Default)]
pub struct BackupArgs {
    /// MongoDB connection URI (env: MONGODB_URI)
    #[arg(long, value_name = "URI")]
    pub uri: Option<String>,

    /// Database name (default: taken from the URI, else "test")
    #[arg(long, value_name = "NAME")]
    pub db: Option<String>,

    /// Output directory (default: ./<db>)
    #[arg(long, value_name = "DIR")]
    pub out: Option<PathBuf>,

    /// Collections to back up (default: all)
    #[arg(long, value_name = "NAME", num_args = 1.., value_delimiter = ',')]
    pub collections: Vec<String>,

    /// Pretty-print JSON files (default: true)
    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    pub pretty: Option<bool>,

    /// Connection timeout in seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,
}

/// Arguments of `mongo-save restore`
#[derive(Args, Debug, Default)]
pub struct RestoreArgs {
    /// MongoDB connection URI (env: MONGODB_URI)
    #[arg(long, value_name = "URI")]
    pub uri: Option<String>,

    /// Target database name (default: manifest, then URI, then "test")
    #[arg(long, value_name = "NAME")]
    pub db: Option<String>,

    /// Backup directory to restore from
    #[arg(long = "in", visible_alias = "input", value_name = "DIR")]
    pub input: Option<PathBuf>,

    /// Empty each collection before restoring it (default: false)
    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    pub drop: Option<bool>,

    /// Collections to restore (default: every directory in the backup)
    #[arg(long, value_name = "NAME", num_args = 1.., value_delimiter = ',')]
    pub collections: Vec<String>,

    /// Connection timeout in seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,
}

/// CLI interface handler
pub struct CliInterface {
    /// Parsed command-line arguments
    args: CliArgs,

    /// Loaded configuration
    config: Config,
}

impl CliInterface {
    /// Parse the process arguments and load configuration
    ///
    /// # Returns
    /// * `Result<Self>` - New CLI interface or error
    pub fn new() -> Result<Self> {
        Self::from_args(CliArgs::parse())
    }

    /// Build from already parsed arguments
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let mut config = Config::load(args.config_file.as_deref())?;
        Self::apply_logging_args(&mut config, &args);
        Ok(Self { args, config })
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run the selected subcommand
    pub async fn execute(&self) -> Result<()> {
        let env_uri = config::env_uri();
        match &self.args.command {
            Commands::Backup(args) => {
                let options = args.resolve(&self.config, env_uri, self.args.quiet)?;
                info!("Backup from {}", sanitize_uri(&options.uri));
                pipeline::backup(&options).await?;
            }
            Commands::Restore(args) => {
                let options = args.resolve(&self.config, env_uri, self.args.quiet)?;
                info!("Restore into {}", sanitize_uri(&options.uri));
                pipeline::restore(&options).await?;
            }
        }
        Ok(())
    }

    /// Apply logging-related CLI arguments to configuration
    fn apply_logging_args(config: &mut Config, args: &CliArgs) {
        config.logging.level = if args.very_verbose {
            LogLevel::Trace
        } else if args.verbose {
            LogLevel::Debug
        } else if args.quiet {
            LogLevel::Error
        } else {
            config.logging.level
        };
    }
}

impl BackupArgs {
    /// Merge flags, config file and environment into backup options
    ///
    /// # Arguments
    /// * `config` - Loaded configuration file
    /// * `env_uri` - Value of `MONGODB_URI`, if any
    /// * `quiet` - Suppress progress and completion output
    pub fn resolve(
        &self,
        config: &Config,
        env_uri: Option<String>,
        quiet: bool,
    ) -> Result<BackupOptions> {
        let connection = resolve_connection(self.timeout, config)?;

        Ok(BackupOptions {
            uri: resolve_uri(self.uri.as_deref(), config, env_uri)?,
            database: self.db.clone().or_else(|| config.db.clone()),
            output: self.out.clone().or_else(|| config.out.clone()),
            collections: resolve_collections(&self.collections, config),
            pretty: self.pretty.or(config.pretty).unwrap_or(true),
            quiet,
            connection,
        })
    }
}

impl RestoreArgs {
    /// Merge flags, config file and environment into restore options
    ///
    /// # Arguments
    /// * `config` - Loaded configuration file
    /// * `env_uri` - Value of `MONGODB_URI`, if any
    /// * `quiet` - Suppress progress and completion output
    pub fn resolve(
        &self,
        config: &Config,
        env_uri: Option<String>,
        quiet: bool,
    ) -> Result<RestoreOptions> {
        let connection = resolve_connection(self.timeout, config)?;

        let input = self
            .input
            .clone()
            .or_else(|| config.input.clone())
            .ok_or_else(|| ConfigError::MissingField("in".to_string()))?;

        Ok(RestoreOptions {
            uri: resolve_uri(self.uri.as_deref(), config, env_uri)?,
            database: self.db.clone().or_else(|| config.db.clone()),
            input,
            collections: resolve_collections(&self.collections, config),
            drop: self.drop.or(config.drop).unwrap_or(false),
            quiet,
            connection,
        })
    }
}

/// URI from the flag, else the config file, else `MONGODB_URI`
fn resolve_uri(flag: Option<&str>, config: &Config, env_uri: Option<String>) -> Result<String> {
    flag.map(str::to_string)
        .or_else(|| config.uri.clone())
        .or(env_uri)
        .filter(|uri| !uri.is_empty())
        .ok_or_else(|| ConfigError::MissingField("uri".to_string()).into())
}

/// Connection settings from the file, with `--timeout` taking precedence
fn resolve_connection(flag: Option<u64>, config: &Config) -> Result<ConnectionConfig> {
    let mut connection = config.connection.clone();
    if let Some(timeout) = flag {
        connection.timeout = timeout;
    }
    connection.validate()?;
    Ok(connection)
}

fn resolve_collections(flag: &[String], config: &Config) -> Vec<String> {
    if flag.is_empty() {
        config.collections.clone().unwrap_or_default()
    } else {
        flag.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MongoSaveError;
    use tokio_test::{assert_err, assert_ok};

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(args).unwrap()
    }

    fn backup_args(args: &[&str]) -> BackupArgs {
        match parse(args).command {
            Commands::Backup(args) => args,
            other => panic!("expected backup, got {other:?}"),
        }
    }

    fn restore_args(args: &[&str]) -> RestoreArgs {
        match parse(args).command {
            Commands::Restore(args) => args,
            other => panic!("expected restore, got {other:?}"),
        }
    }

    #[test]
    fn test_backup_args_parsing() {
        let args = backup_args(&[
            "mongo-save",
            "backup",
            "--uri",
            "mongodb://localhost/shop",
            "--out",
            "./snap",
            "--collections",
            "users",
            "orders",
            "--pretty",
            "false",
        ]);
        assert_eq!(args.uri.as_deref(), Some("mongodb://localhost/shop"));
        assert_eq!(args.out, Some(PathBuf::from("./snap")));
        assert_eq!(args.collections, ["users", "orders"]);
        assert_eq!(args.pretty, Some(false));

        let args = backup_args(&["mongo-save", "backup", "--collections", "a,b", "--pretty"]);
        assert_eq!(args.collections, ["a", "b"]);
        assert_eq!(args.pretty, Some(true));
    }

    #[test]
    fn test_restore_args_parsing() {
        let args = restore_args(&["mongo-save", "restore", "--in", "./snap", "--drop"]);
        assert_eq!(args.input, Some(PathBuf::from("./snap")));
        assert_eq!(args.drop, Some(true));

        let args = restore_args(&["mongo-save", "restore", "--input", "./snap"]);
        assert_eq!(args.input, Some(PathBuf::from("./snap")));
        assert_eq!(args.drop, None);
    }

    #[test]
    fn test_global_flags() {
        let args = parse(&["mongo-save", "restore", "--in", "x", "-q", "-c", "cfg.toml"]);
        assert!(args.quiet);
        assert_eq!(args.config_file, Some(PathBuf::from("cfg.toml")));

        let args = parse(&["mongo-save", "-v", "backup"]);
        assert!(args.verbose);
        assert!(CliArgs::try_parse_from(["mongo-save"]).is_err());
    }

    #[test]
    fn test_logging_args() {
        let mut config = Config::default();
        CliInterface::apply_logging_args(&mut config, &parse(&["mongo-save", "--vv", "backup"]));
        assert_eq!(config.logging.level, LogLevel::Trace);

        let mut config = Config::default();
        CliInterface::apply_logging_args(&mut config, &parse(&["mongo-save", "-q", "backup"]));
        assert_eq!(config.logging.level, LogLevel::Error);

        let mut config = Config::default();
        config.logging.level = LogLevel::Info;
        CliInterface::apply_logging_args(&mut config, &parse(&["mongo-save", "backup"]));
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_uri_precedence() {
        let mut config = Config::default();
        let env = || Some("mongodb://env".to_string());

        let from_flag = resolve_uri(Some("mongodb://flag"), &config, env());
        assert_eq!(assert_ok!(from_flag), "mongodb://flag");

        assert_eq!(assert_ok!(resolve_uri(None, &config, env())), "mongodb://env");

        config.uri = Some("mongodb://file".to_string());
        assert_eq!(assert_ok!(resolve_uri(None, &config, env())), "mongodb://file");

        config.uri = None;
        let err = assert_err!(resolve_uri(None, &config, None));
        assert!(matches!(
            err,
            MongoSaveError::Config(ConfigError::MissingField(ref field)) if field == "uri"
        ));
    }

    #[test]
    fn test_backup_resolution() {
        let config = Config {
            db: Some("filedb".to_string()),
            pretty: Some(false),
            collections: Some(vec!["users".to_string()]),
            ..Config::default()
        };

        let args = backup_args(&["mongo-save", "backup", "--uri", "mongodb://h/x", "--timeout", "9"]);
        let options = args.resolve(&config, None, true).unwrap();
        assert_eq!(options.uri, "mongodb://h/x");
        assert_eq!(options.database.as_deref(), Some("filedb"));
        assert!(!options.pretty);
        assert_eq!(options.collections, ["users"]);
        assert_eq!(options.connection.timeout, 9);
        assert!(options.quiet);

        let args = backup_args(&[
            "mongo-save", "backup", "--db", "flagdb", "--pretty", "--collections", "orders",
        ]);
        let options = args
            .resolve(&config, Some("mongodb://env".to_string()), false)
            .unwrap();
        assert_eq!(options.uri, "mongodb://env");
        assert_eq!(options.database.as_deref(), Some("flagdb"));
        assert!(options.pretty);
        assert_eq!(options.collections, ["orders"]);
        assert_eq!(options.connection.timeout, 5);
    }

    #[test]
    fn test_restore_resolution() {
        let config = Config {
            input: Some(PathBuf::from("./from-file")),
            drop: Some(true),
            ..Config::default()
        };

        let args = restore_args(&["mongo-save", "restore", "--drop", "false"]);
        let options = args
            .resolve(&config, Some("mongodb://env".to_string()), false)
            .unwrap();
        assert_eq!(options.input, PathBuf::from("./from-file"));
        assert!(!options.drop);
        assert!(options.collections.is_empty());

        let options = RestoreArgs::default()
            .resolve(&config, Some("mongodb://env".to_string()), false)
            .unwrap();
        assert!(options.drop);

        let err = RestoreArgs::default()
            .resolve(&Config::default(), Some("mongodb://env".to_string()), false)
            .unwrap_err();
        assert!(matches!(
            err,
            MongoSaveError::Config(ConfigError::MissingField(ref field)) if field == "in"
        ));
    }

    #[test]
    fn test_zero_timeout_flag_is_rejected() {
        let env = || Some("mongodb://env".to_string());
        let config = Config::default();

        let args = backup_args(&["mongo-save", "backup", "--timeout", "0"]);
        let err = assert_err!(args.resolve(&config, env(), false));
        assert!(matches!(
            err,
            MongoSaveError::Config(ConfigError::InvalidValue { ref field, .. }) if field == "connection.timeout"
        ));

        let args = restore_args(&["mongo-save", "restore", "--in", "./snap", "--timeout", "0"]);
        assert_err!(args.resolve(&config, env(), false));

        let args = restore_args(&["mongo-save", "restore", "--in", "./snap", "--timeout", "1"]);
        let options = assert_ok!(args.resolve(&config, env(), false));
        assert_eq!(options.connection.timeout, 1);
    }
}
