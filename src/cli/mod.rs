//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// Standardized test-run banners and shared runtime utilities
#[derive(Parser, Debug)]
#[command(name = "testbanner")]
#[command(author = "hephaex@gmail.com")]
#[command(version)]
#[command(about = "Print test headers and summaries, plus ID, time, hash and RRULE helpers")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Config file (defaults to the path for --verb)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Deployment context: serve, run, deploy
    #[arg(long, global = true, default_value = "run")]
    pub verb: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print a test-run header
    Header {
        /// Header title
        title: String,

        /// Project name
        project: String,

        /// Run identifier
        run_id: String,

        #[command(flatten)]
        render: RenderArgs,
    },

    /// Print a test-run summary
    Summary {
        /// Overall status (e.g. PASSED, FAILED)
        status: String,

        /// Number of failed tests
        fail_count: String,

        /// Number of passed tests
        pass_count: String,

        /// Run duration (e.g. 12.3s)
        duration: String,

        /// Run identifier
        run_id: String,

        #[command(flatten)]
        render: RenderArgs,
    },

    /// Show which formatter a name resolves to
    Formatter {
        /// Formatter name (defaults to TEST_FORMAT)
        name: Option<String>,

        /// Print the script path instead of the name
        #[arg(short, long)]
        path: bool,

        /// List all formatters
        #[arg(short, long)]
        list: bool,
    },

    /// Render a document with one formatter
    Format(FormatArgs),

    /// Generate and inspect prefixed UUIDs
    Uid {
        #[command(subcommand)]
        action: UidAction,
    },

    /// Timestamps and epoch day numbers
    Time {
        #[command(subcommand)]
        action: TimeAction,
    },

    /// Generate API keys, tokens and passwords
    Secret {
        #[command(subcommand)]
        action: SecretAction,
    },

    /// Entity hash chain
    Hash {
        #[command(subcommand)]
        action: HashAction,
    },

    /// Recurrence rules
    Rrule {
        #[command(subcommand)]
        action: RruleAction,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

impl Command {
    /// Commands that only read the banner settings
    pub fn is_banner(&self) -> bool {
        matches!(
            self,
            Command::Header { .. }
                | Command::Summary { .. }
                | Command::Formatter { .. }
                | Command::Format(_)
        )
    }
}

/// Banner rendering overrides
#[derive(ClapArgs, Debug, Default, Clone)]
pub struct RenderArgs {
    /// Minimum width (overrides WIDTH)
    #[arg(short, long)]
    pub width: Option<usize>,

    /// Formatter: textbox, markdown, plaintext (overrides TEST_FORMAT)
    #[arg(short, long)]
    pub format: Option<String>,

    /// Rendering backend: builtin, script
    #[arg(short, long)]
    pub backend: Option<String>,

    /// Root of the formatter scripts (overrides SCRIPT_ROOT)
    #[arg(long)]
    pub script_root: Option<PathBuf>,
}

/// Arguments for format command, matching the formatter script flags
#[derive(Parser, Debug)]
pub struct FormatArgs {
    /// Formatter name
    pub name: String,

    /// Document title
    #[arg(long)]
    pub title: String,

    /// Body lines
    #[arg(long, num_args = 0..)]
    pub body: Vec<String>,

    /// Minimum width (textbox only)
    #[arg(long)]
    pub width: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum UidAction {
    /// Generate a UUID
    New {
        /// Add the core_ prefix
        #[arg(long, conflicts_with = "soil")]
        core: bool,

        /// Add the soil_ prefix
        #[arg(long)]
        soil: bool,
    },

    /// Add a prefix to an existing ID
    Prefix {
        id: String,

        /// Prefix kind: core, soil
        #[arg(short, long, default_value = "core")]
        kind: String,
    },

    /// Remove a known prefix
    Strip { id: String },

    /// Report which prefix an ID carries
    Check { id: String },
}

#[derive(Subcommand, Debug)]
pub enum TimeAction {
    /// Current UTC time
    Now {
        /// Print seconds since the Unix epoch
        #[arg(long)]
        unix: bool,
    },

    /// Normalize an ISO 8601 timestamp
    Parse {
        timestamp: String,

        /// Print seconds since the Unix epoch
        #[arg(long)]
        unix: bool,
    },

    /// Convert Unix seconds to ISO 8601
    FromUnix {
        #[arg(allow_hyphen_values = true)]
        seconds: i64,
    },

    /// Day number for a date (defaults to today)
    Day { date: Option<String> },

    /// Date for a day number
    Date {
        #[arg(allow_hyphen_values = true)]
        day: i64,
    },
}

#[derive(Subcommand, Debug)]
pub enum SecretAction {
    /// Plain UUID
    Uuid,

    /// API key
    ApiKey {
        /// Key kind
        #[arg(short, long, default_value = "agent")]
        kind: String,

        /// Also print the display prefix
        #[arg(long)]
        show_prefix: bool,
    },

    /// Hex token
    Token {
        /// Random bytes (output is twice as many hex characters)
        #[arg(short, long, default_value = "32")]
        bytes: usize,
    },

    /// Alphanumeric password
    Password {
        #[arg(short, long, default_value = "16")]
        length: usize,
    },
}

#[derive(Subcommand, Debug)]
pub enum HashAction {
    /// Hash an entity row given as a JSON object
    Row { json: String },

    /// Hash the next state of an entity
    Next {
        /// Updated entity row as a JSON object
        json: String,

        /// Hash of the current state
        current_hash: String,
    },

    /// Verify a chain of states stored as a JSON or YAML list
    Verify { file: PathBuf },
}

#[derive(Subcommand, Debug)]
pub enum RruleAction {
    /// Check whether a rule parses
    Validate { rule: String },

    /// List occurrences
    Expand {
        rule: String,

        /// Start (ISO 8601, defaults to now)
        #[arg(short, long)]
        start: Option<String>,

        /// Exclusive end (ISO 8601)
        #[arg(short, long)]
        end: Option<String>,

        /// Maximum occurrences
        #[arg(short = 'n', long)]
        count: Option<usize>,
    },

    /// Next occurrence after a time
    Next {
        rule: String,

        /// Reference time (ISO 8601, defaults to now)
        #[arg(short, long)]
        after: Option<String>,
    },

    /// Describe a rule in words
    Describe { rule: String },

    /// Check a validity window
    Window {
        valid_from: String,
        valid_until: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show resolved settings
    Show {
        /// Output format (toml, yaml, json)
        #[arg(short, long, default_value = "toml")]
        format: String,

        /// Show environment variables instead
        #[arg(short, long)]
        env: bool,
    },

    /// Write an example config file
    Init {
        /// Output path (defaults to the path for --verb)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Get one setting (dotted keys such as banner.width)
    Get { key: String },

    /// Print the config file path for --verb
    Path,

    /// List supported environment variables
    Env,
}
