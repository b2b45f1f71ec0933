//! Mechanism for loading and sharing the analysis configuration

use crate::{analysis::ttbar::MassWindow, reconstruct::SearchMode, Result};

use eyre::{ensure, format_err, Report, WrapErr};
use log::{debug, warn};
use std::{fmt, fs, path::Path, str::FromStr};
use thiserror::Error;

/// A textual setting did not match any of the supported choices
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown {what} \"{value}\"")]
pub struct UnknownVariant {
    what: &'static str,
    value: String,
}
//
impl UnknownVariant {
    /// Report an unsupported value for some kind of setting
    pub fn new(what: &'static str, value: &str) -> Self {
        Self {
            what,
            value: value.to_owned(),
        }
    }
}

/// Available event selections
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnalysisKind {
    /// t-channel single top quark production
    SingleTop,

    /// Semi-leptonic top quark pair production
    TopPair,
}
//
impl FromStr for AnalysisKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "singletop" => Ok(Self::SingleTop),
            "ttbar" => Ok(Self::TopPair),
            _ => Err(UnknownVariant::new("analysis", s)),
        }
    }
}
//
impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SingleTop => write!(f, "singletop"),
            Self::TopPair => write!(f, "ttbar"),
        }
    }
}

/// Analysis configuration
#[derive(Clone, Debug, PartialEq)]
pub struct Configuration {
    /// Event selection to be run
    pub analysis: AnalysisKind,

    /// Path to the event records
    pub input_file: String,

    /// Truth that the events are real data (which disables event weights)
    pub is_data: bool,

    /// Path prefix of the output files
    pub output_prefix: String,

    /// Jet combination search of the ttbar reconstruction
    pub search_mode: SearchMode,

    /// Hadronic W mass window of the ttbar selection
    pub mass_window: MassWindow,
}
//
impl Configuration {
    /// Load the configuration from a file, check it, and print it out
    pub fn load(file_name: impl AsRef<Path>) -> Result<Self> {
        let file_name = file_name.as_ref();
        let config_str = fs::read_to_string(file_name)
            .wrap_err_with(|| format!("Could not read {}", file_name.display()))?;
        let config = Self::parse(&config_str)?;
        config.print();

        // The event file is only opened after configuration, so check it now
        ensure!(
            Path::new(&config.input_file).is_file(),
            "Event file {} does not exist",
            config.input_file
        );
        Ok(config)
    }

    /// Decode and check the contents of a configuration file
    pub fn parse(config_str: &str) -> Result<Self> {
        // Configuration items are the first non-whitespace chunk of text on
        // each line, the rest of the line is a free-form comment. Blank lines
        // are ignored.
        let mut config_iter = config_str
            .lines()
            .filter_map(|line| line.split_whitespace().next());

        // This closure fetches the next configuration item, tagging it with
        // the name of the configuration field which it is supposed to fill.
        let mut next_item = |name: &'static str| -> Result<ConfigItem> {
            config_iter
                .next()
                .map(|data| ConfigItem::new(name, data))
                .ok_or_else(|| format_err!("Missing configuration of {}", name))
        };

        let config = Configuration {
            analysis: next_item("analysis")?.parse::<AnalysisKind>()?,
            input_file: next_item("input_file")?.parse::<String>()?,
            is_data: next_item("is_data")?.parse_bool()?,
            output_prefix: next_item("output_prefix")?.parse::<String>()?,
            search_mode: next_item("search_mode")?.parse::<SearchMode>()?,
            mass_window: next_item("mass_window")?.parse::<MassWindow>()?,
        };
        debug!("Parsed configuration: {:?}", config);

        // Output files are named by appending an extension to the prefix
        ensure!(
            !config.output_prefix.ends_with('/'),
            "Output prefix {} should not be a directory",
            config.output_prefix
        );

        // The ttbar-specific settings have no effect on other analyses
        if config.analysis != AnalysisKind::TopPair
            && (config.search_mode != SearchMode::default()
                || config.mass_window != MassWindow::default())
        {
            warn!("Jet search and W mass window settings only affect the ttbar analysis");
        }
        Ok(config)
    }

    /// Display the configuration
    pub fn print(&self) {
        println!("ANALYSIS       : {}", self.analysis);
        println!("INPUT          : {}", self.input_file);
        println!("IS_DATA        : {}", self.is_data);
        println!("OUTPUT         : {}", self.output_prefix);
        println!("JET_SEARCH     : {:?}", self.search_mode);
        println!("W_MASS_WINDOW  : {:?}", self.mass_window);
    }
}

/// A value from the configuration file, tagged with the struct field which it
/// is supposed to map for error reporting purposes.
struct ConfigItem<'data> {
    name: &'static str,
    data: &'data str,
}
//
impl<'data> ConfigItem<'data> {
    /// Build a config item from a struct field tag and raw iterator data
    fn new(name: &'static str, data: &'data str) -> Self {
        Self { name, data }
    }

    /// Parse this data using Rust's standard parsing logic
    fn parse<T: FromStr>(self) -> Result<T>
    where
        <T as FromStr>::Err: std::error::Error + Send + Sync + 'static,
    {
        self.data
            .parse::<T>()
            .map_err(Report::new)
            .wrap_err_with(|| format!("Could not parse configuration of {}", self.name))
    }

    /// Parse a boolean, also accepting yes/no answers in any case
    fn parse_bool(self) -> Result<bool> {
        match self.data.to_lowercase().as_str() {
            "true" | "yes" => Ok(true),
            "false" | "no" => Ok(false),
            _ => self.parse::<bool>(),
        }
    }
}
