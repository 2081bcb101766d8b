use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::CatalogConfig;
use crate::types::Resolution;

/// installkit - browse and select installable items
#[derive(Parser, Debug)]
#[command(name = "installkit")]
#[command(about = "Load item and preset definitions and work out a consistent selection")]
#[command(version)]
pub struct Cli {
    /// JSON configuration file (defaults are used when omitted)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory searched for item definitions
    #[arg(long, global = true)]
    pub items_dir: Option<PathBuf>,

    /// Directory searched for preset definitions
    #[arg(long, global = true)]
    pub presets_dir: Option<PathBuf>,

    /// File suffix of item definitions (e.g. ".info")
    #[arg(long, global = true)]
    pub item_ext: Option<String>,

    /// File suffix of preset definitions (e.g. ".preset")
    #[arg(long, global = true)]
    pub preset_ext: Option<String>,

    /// Do not apply the default preset after loading
    #[arg(long, global = true)]
    pub no_default_preset: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the category tree with the current selection
    Tree,
    /// Show everything known about one item
    Show {
        /// Item id
        id: String,
    },
    /// Print the transitive dependencies of one item, or of every item
    Deps {
        /// Item id (all items when omitted)
        id: Option<String>,
    },
    /// List the available presets
    Presets,
    /// Apply a preset and/or toggle items, then print the resulting plan
    Select {
        /// Preset applied before any toggles
        #[arg(short, long)]
        preset: Option<String>,

        /// Item ids to check, in order
        #[arg(long = "check", value_name = "ID")]
        check: Vec<String>,

        /// Item ids to uncheck, in order (after the checks)
        #[arg(long = "uncheck", value_name = "ID")]
        uncheck: Vec<String>,

        /// How to handle unchecked dependencies: accept, ignore or decline
        #[arg(long, value_name = "RESOLUTION")]
        dependencies: Option<Resolution>,

        /// How to handle checked dependents: accept, ignore or decline
        #[arg(long, value_name = "RESOLUTION")]
        dependents: Option<Resolution>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Apply command line overrides on top of a base configuration
    pub fn apply_overrides(&self, mut config: CatalogConfig) -> CatalogConfig {
        if let Some(dir) = &self.items_dir {
            config.items_dir = dir.clone();
        }
        if let Some(dir) = &self.presets_dir {
            config.presets_dir = dir.clone();
        }
        if let Some(ext) = &self.item_ext {
            config.item_extension = ext.clone();
        }
        if let Some(ext) = &self.preset_ext {
            config.preset_extension = ext.clone();
        }
        if self.no_default_preset {
            config.default_preset = None;
        }
        config
    }
}
