//! TOML configuration file parsing and settings resolution
//!
//! Settings are resolved in three layers: built-in defaults, then the TOML
//! file, then command-line arguments.

use crate::core::validation::{validate_positive, ValidationError};
use crate::queue::Priority;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::args::Args;

const DEFAULT_PRODUCERS: usize = 2;
const DEFAULT_MESSAGES: usize = 50;

/// Message kinds the demo pipeline publishes, with their default priorities
const DEFAULT_KINDS: [(&str, Priority); 5] = [
    ("Invalidate", Priority::UberHighSingleton),
    ("Resize", Priority::High),
    ("Tile", Priority::Normal),
    ("Overlay", Priority::Normal),
    ("Prefetch", Priority::Low),
];

/// Raw contents of the configuration file; every key is optional
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigFile {
    pub color: Option<bool>,
    pub log_level: Option<String>,
    pub log_format: Option<String>,
    pub log_file: Option<String>,
    pub producers: Option<usize>,
    pub messages: Option<usize>,
    pub pace_ms: Option<u64>,
    #[serde(default)]
    pub drop_kind: Vec<String>,
    #[serde(default)]
    pub purge_kind: Vec<String>,
    /// Message kind -> priority name
    #[serde(default)]
    pub priorities: BTreeMap<String, String>,
}

/// A message kind published by the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindSpec {
    pub name: String,
    pub priority: Priority,
}

/// Fully resolved settings for one pipeline run
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub color: Option<bool>,
    pub log_level: Option<String>,
    pub log_format: Option<String>,
    pub log_file: Option<PathBuf>,
    pub producers: usize,
    pub messages: usize,
    pub pace: Duration,
    pub drop_kinds: Vec<String>,
    pub purge_kinds: Vec<String>,
    pub kinds: Vec<KindSpec>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: None,
            log_level: None,
            log_format: None,
            log_file: None,
            producers: DEFAULT_PRODUCERS,
            messages: DEFAULT_MESSAGES,
            pace: Duration::ZERO,
            drop_kinds: Vec::new(),
            purge_kinds: Vec::new(),
            kinds: DEFAULT_KINDS
                .iter()
                .map(|(name, priority)| KindSpec {
                    name: name.to_string(),
                    priority: *priority,
                })
                .collect(),
        }
    }
}

/// Default configuration file location, if the platform has a config dir
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("Handoff").join("handoff.toml"))
}

/// Pick the config file to read
///
/// An explicitly requested file must exist; the default location is
/// optional.
pub fn locate_config_file(requested: Option<&Path>) -> Result<Option<PathBuf>, ValidationError> {
    match requested {
        Some(path) if path.exists() => Ok(Some(path.to_path_buf())),
        Some(path) => Err(ValidationError::new(&format!(
            "The specified configuration file does not exist: {}",
            path.display()
        ))),
        None => Ok(default_config_path().filter(|path| path.exists())),
    }
}

/// Read and parse a configuration file
pub fn load_config_file(path: &Path) -> Result<ConfigFile, ValidationError> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        ValidationError::new(&format!(
            "Error reading configuration file {}: {}",
            path.display(),
            e
        ))
    })?;
    parse_config(&contents).map_err(|e| {
        ValidationError::new(&format!(
            "Error in configuration file {}: {}",
            path.display(),
            e.message()
        ))
    })
}

/// Parse configuration text
pub fn parse_config(contents: &str) -> Result<ConfigFile, ValidationError> {
    toml::from_str::<ConfigFile>(contents).map_err(|e| ValidationError::new(&e.to_string()))
}

/// Strip blanks and duplicates, keeping first occurrence order
fn dedup_kinds(kinds: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut result: Vec<String> = Vec::new();
    for kind in kinds {
        let kind = kind.trim().to_string();
        if !kind.is_empty() && !result.contains(&kind) {
            result.push(kind);
        }
    }
    result
}

impl Settings {
    /// Apply file values on top of the current settings
    pub fn apply_config_file(&mut self, config: ConfigFile) -> Result<(), ValidationError> {
        if let Some(color) = config.color {
            self.color = Some(color);
        }
        if let Some(log_level) = config.log_level {
            self.log_level = Some(log_level);
        }
        if let Some(log_format) = config.log_format {
            self.log_format = Some(log_format);
        }
        if let Some(log_file) = config.log_file {
            // Magic values "none" and "-" disable file logging
            self.log_file = if log_file.eq_ignore_ascii_case("none") || log_file == "-" {
                None
            } else {
                Some(PathBuf::from(log_file))
            };
        }
        if let Some(producers) = config.producers {
            self.producers = producers;
        }
        if let Some(messages) = config.messages {
            self.messages = messages;
        }
        if let Some(pace_ms) = config.pace_ms {
            self.pace = Duration::from_millis(pace_ms);
        }
        self.drop_kinds = dedup_kinds(self.drop_kinds.drain(..).chain(config.drop_kind));
        self.purge_kinds = dedup_kinds(self.purge_kinds.drain(..).chain(config.purge_kind));

        for (kind, value) in config.priorities {
            let priority = Priority::parse(&value).map_err(|_| {
                ValidationError::new(&format!(
                    "Unknown priority '{}' for message kind '{}' (expected low, normal, high or uber-high-singleton)",
                    value, kind
                ))
            })?;
            self.set_kind_priority(&kind, priority);
        }
        Ok(())
    }

    /// Apply command-line values, which take precedence over the file
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(color) = args.color_preference() {
            self.color = Some(color);
        }
        if let Some(log_level) = &args.log_level {
            self.log_level = Some(log_level.clone());
        }
        if let Some(log_format) = &args.log_format {
            self.log_format = Some(log_format.clone());
        }
        if let Some(log_file) = &args.log_file {
            self.log_file = match log_file.to_str() {
                Some(value) if value.eq_ignore_ascii_case("none") || value == "-" => None,
                _ => Some(log_file.clone()),
            };
        }
        if let Some(producers) = args.producers {
            self.producers = producers;
        }
        if let Some(messages) = args.messages {
            self.messages = messages;
        }
        if let Some(pace_ms) = args.pace_ms {
            self.pace = Duration::from_millis(pace_ms);
        }
        self.drop_kinds = dedup_kinds(self.drop_kinds.drain(..).chain(args.drop_kinds.clone()));
        self.purge_kinds = dedup_kinds(self.purge_kinds.drain(..).chain(args.purge_kinds.clone()));
    }

    fn set_kind_priority(&mut self, kind: &str, priority: Priority) {
        match self.kinds.iter_mut().find(|spec| spec.name == kind) {
            Some(spec) => spec.priority = priority,
            None => self.kinds.push(KindSpec {
                name: kind.to_string(),
                priority,
            }),
        }
    }

    /// Check the resolved settings are usable
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_positive("producers", self.producers)?;
        validate_positive("messages", self.messages)?;
        Ok(())
    }

    /// Drop or purge kinds that no producer publishes
    ///
    /// Not an error: the filters simply never match.
    pub fn unknown_filter_kinds(&self) -> Vec<&str> {
        self.drop_kinds
            .iter()
            .chain(&self.purge_kinds)
            .filter(|kind| !self.kinds.iter().any(|spec| &spec.name == *kind))
            .map(String::as_str)
            .collect()
    }

    /// Resolve settings from arguments and the config file they point at
    ///
    /// Runs before logging is initialised, so it reports through its
    /// result only.
    pub fn resolve(args: &Args) -> Result<Self, ValidationError> {
        let mut settings = Settings::default();
        if let Some(path) = locate_config_file(args.config_file.as_deref())? {
            settings.apply_config_file(load_config_file(&path)?)?;
        }
        settings.apply_args(args);
        settings.validate()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    fn priority_of(settings: &Settings, kind: &str) -> Option<Priority> {
        settings
            .kinds
            .iter()
            .find(|spec| spec.name == kind)
            .map(|spec| spec.priority)
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();

        assert_eq!(settings.producers, 2);
        assert_eq!(settings.messages, 50);
        assert_eq!(settings.pace, Duration::ZERO);
        assert_eq!(
            priority_of(&settings, "Invalidate"),
            Some(Priority::UberHighSingleton)
        );
        assert_eq!(priority_of(&settings, "Prefetch"), Some(Priority::Low));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_config_file_values_applied() {
        let config = parse_config(
            r#"
            log-level = "debug"
            log-file = "none"
            producers = 4
            pace-ms = 10
            drop-kind = ["Overlay", "Overlay"]

            [priorities]
            Tile = "high"
            Compass = "low"
            "#,
        )
        .unwrap();

        let mut settings = Settings::default();
        settings.apply_config_file(config).unwrap();

        assert_eq!(settings.log_level.as_deref(), Some("debug"));
        assert_eq!(settings.log_file, None);
        assert_eq!(settings.producers, 4);
        assert_eq!(settings.pace, Duration::from_millis(10));
        assert_eq!(settings.drop_kinds, vec!["Overlay"]);
        assert_eq!(priority_of(&settings, "Tile"), Some(Priority::High));
        assert_eq!(priority_of(&settings, "Compass"), Some(Priority::Low));
    }

    #[test]
    fn test_unknown_priority_in_config_is_rejected() {
        let config = parse_config("[priorities]\nTile = \"urgent\"\n").unwrap();
        let mut settings = Settings::default();

        let error = settings.apply_config_file(config).unwrap_err();
        assert!(error.message().contains("Unknown priority 'urgent'"));
        assert!(error.message().contains("'Tile'"));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        assert!(parse_config("producer = 3\n").is_err());
    }

    #[test]
    fn test_args_override_config_file() {
        let mut settings = Settings::default();
        settings
            .apply_config_file(parse_config("producers = 4\nmessages = 7\n").unwrap())
            .unwrap();

        let args = Args::try_parse_from(["handoff", "-p", "1", "--drop-kind", "Tile"]).unwrap();
        settings.apply_args(&args);

        assert_eq!(settings.producers, 1);
        assert_eq!(settings.messages, 7);
        assert_eq!(settings.drop_kinds, vec!["Tile"]);
    }

    #[test]
    fn test_zero_producers_fails_validation() {
        let args = Args::try_parse_from(["handoff", "--producers", "0"]).unwrap();
        let mut settings = Settings::default();
        settings.apply_args(&args);

        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_unknown_filter_kinds_reported() {
        let args = Args::try_parse_from(["handoff", "-d", "Tile,Compass", "--purge-kind", "Halo"])
            .unwrap();
        let mut settings = Settings::default();
        settings.apply_args(&args);

        assert_eq!(settings.unknown_filter_kinds(), vec!["Compass", "Halo"]);
    }

    #[test]
    fn test_resolve_reads_explicit_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "messages = 3\n[priorities]\nOverlay = \"low\"").unwrap();

        let path = file.path().to_string_lossy().to_string();
        let args = Args::try_parse_from(["handoff", "--config-file", &path]).unwrap();
        let settings = Settings::resolve(&args).unwrap();

        assert_eq!(settings.messages, 3);
        assert_eq!(priority_of(&settings, "Overlay"), Some(Priority::Low));
    }

    #[test]
    fn test_missing_explicit_config_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");

        let error = locate_config_file(Some(&missing)).unwrap_err();
        assert!(error.message().contains("does not exist"));
    }
}
