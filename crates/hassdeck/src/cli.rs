//! Clap derive structures for the `hassdeck` CLI.
//!
//! Defines the command tree, global flags, and shared value parsers.

use clap::{Args, Parser, Subcommand, ValueEnum};

use hassdeck_core::{Category, EntityAction};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// hassdeck -- a terminal dashboard for Home Assistant
#[derive(Debug, Parser)]
#[command(
    name = "hassdeck",
    version,
    about = "Browse and control a Home Assistant hub from the command line",
    long_about = "Mirrors hub entities into a local store, groups them by area,\n\
        and issues commands with optimistic feedback.\n\n\
        Hidden entities, hidden rooms and custom names persist locally and,\n\
        when a preference store is configured, sync across devices.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Hub profile to use
    #[arg(long, short = 'p', env = "HASSDECK_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Hub URL (overrides profile)
    #[arg(long, short = 'u', env = "HASSDECK_URL", global = true)]
    pub url: Option<String>,

    /// Long-lived access token
    #[arg(long, env = "HASSDECK_TOKEN", global = true, hide_env = true)]
    pub token: Option<String>,

    /// Preference store URL (overrides profile)
    #[arg(long, env = "HASSDECK_PREFS_URL", global = true)]
    pub prefs_url: Option<String>,

    /// Keep preferences on this machine only
    #[arg(long, global = true)]
    pub local_only: bool,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "HASSDECK_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "HASSDECK_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "HASSDECK_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Connection state, entity counts and data age
    #[command(alias = "st")]
    Status,

    /// List entities, optionally by category
    #[command(alias = "ls")]
    Entities(EntitiesArgs),

    /// Entities grouped by area
    #[command(alias = "a")]
    Areas(AreasArgs),

    /// Other entities on the same device
    Related {
        /// Entity ID (e.g. sensor.kitchen_temperature)
        entity_id: String,
    },

    /// Run an action on an entity (toggle, lock, open, ...)
    #[command(alias = "do")]
    Call(CallArgs),

    /// Call an arbitrary hub service
    Service(ServiceArgs),

    /// Set a continuous value (temperature, position, tilt, speed)
    Set(SetArgs),

    /// Hide an entity or a room from the dashboard
    Hide(VisibilityArgs),

    /// Unhide an entity or a room
    Show(VisibilityArgs),

    /// Give an entity a custom display name
    Rename(RenameArgs),

    /// View and change dashboard settings
    Settings(SettingsArgs),

    /// Stream entity changes until interrupted
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Value parsers ────────────────────────────────────────────────────

fn parse_category(raw: &str) -> Result<Category, String> {
    raw.replace('-', "_")
        .parse()
        .map_err(|_| format!("unknown category '{raw}'"))
}

fn parse_action(raw: &str) -> Result<EntityAction, String> {
    raw.replace('-', "_")
        .parse()
        .map_err(|_| format!("unknown action '{raw}'"))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Entities / Areas
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct EntitiesArgs {
    /// Only this category (light, cover, binary-sensor, ...)
    #[arg(long, short = 'c', value_parser = parse_category)]
    pub category: Option<Category>,

    /// Include hidden entities
    #[arg(long)]
    pub all: bool,
}

#[derive(Debug, Args)]
pub struct AreasArgs {
    /// Edit mode: include hidden rooms and entities
    #[arg(long, short = 'e')]
    pub edit: bool,

    /// Show the entities of one area (id or name)
    pub area: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Commands
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CallArgs {
    /// Entity ID
    pub entity_id: String,

    /// Action: turn-on, turn-off, toggle, lock, unlock, open, close, stop,
    /// arm-home, arm-away, arm-night, arm-vacation, arm-custom-bypass,
    /// disarm, trigger, start, pause, return-to-base, locate, run
    #[arg(value_parser = parse_action)]
    pub action: EntityAction,
}

#[derive(Debug, Args)]
pub struct ServiceArgs {
    /// Service as domain.service (e.g. light.turn_on)
    pub service: String,

    /// Target entity ID
    pub target: String,

    /// Service data as a JSON object
    #[arg(long, short = 'd')]
    pub data: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FieldArg {
    /// Climate target temperature
    Temperature,
    /// Cover position (0-100)
    Position,
    /// Cover tilt (0-100)
    Tilt,
    /// Fan speed percentage (0-100)
    Speed,
    /// Valve position (0-100)
    Valve,
}

#[derive(Debug, Args)]
pub struct SetArgs {
    /// Entity ID
    pub entity_id: String,

    /// Field to set
    #[arg(value_enum)]
    pub field: FieldArg,

    /// New value
    #[arg(allow_negative_numbers = true)]
    pub value: f64,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Preferences
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct VisibilityArgs {
    /// Entity ID, or area id/name with --room
    pub target: String,

    /// Treat the target as a room
    #[arg(long, short = 'r')]
    pub room: bool,
}

#[derive(Debug, Args)]
pub struct RenameArgs {
    /// Entity ID
    pub entity_id: String,

    /// New display name; omit to restore the hub's name
    pub name: Option<String>,
}

#[derive(Debug, Args)]
pub struct SettingsArgs {
    #[command(subcommand)]
    pub command: SettingsCommand,
}

#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    /// Display the effective settings
    Show,

    /// Update one or more settings
    Set {
        /// Polling interval in seconds (0 uses the profile default)
        #[arg(long)]
        refresh_interval: Option<u64>,

        /// Weather entity for the header
        #[arg(long)]
        weather_source: Option<String>,

        /// Noise filter pattern (repeatable; replaces the list)
        #[arg(long = "filter")]
        filter_patterns: Vec<String>,

        /// Remove every noise filter pattern
        #[arg(long, conflicts_with = "filter_patterns")]
        clear_filters: bool,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Watch
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Only report entities of these categories (repeatable)
    #[arg(long, short = 'c', value_parser = parse_category)]
    pub category: Vec<Category>,

    /// Polling interval in seconds (overrides settings)
    #[arg(long, short = 'i')]
    pub interval: Option<u64>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current configuration (secrets masked)
    Show,

    /// Set a profile value
    Set {
        /// Key: url, token_env, insecure, timeout, ca_cert, prefs_url
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name
        name: String,
    },

    /// Store an access token in the system keyring
    SetToken {
        /// Profile name (defaults to the active profile)
        name: Option<String>,
    },

    /// Print the config file path
    Path,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
