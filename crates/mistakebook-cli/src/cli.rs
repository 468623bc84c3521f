//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use mistakebook_domain::{QuestionSelection, SortField, TimeWindow};
use std::path::PathBuf;

/// Mistakebook CLI - Upload, review, and practice exam mistakes.
#[derive(Debug, Parser)]
#[command(name = "mistakebook")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "MISTAKEBOOK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Profile to use
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    /// Backend URL, overriding environment and profile
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Verbose logging (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (IDs only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Upload an exam photo and show the analysis
    Upload(UploadArgs),

    /// Normalize a saved analysis payload without contacting the server
    Analyze(AnalyzeArgs),

    /// Show the detail of one mistake
    Detail(DetailArgs),

    /// Browse the error book
    List(ListArgs),

    /// Show the weakest knowledge points
    WeakPoints(WeakPointsArgs),

    /// Set the error type of a stored mistake
    ErrorType(ErrorTypeArgs),

    /// Delete stored mistakes
    Delete(IdsArgs),

    /// Export stored mistakes
    Export(IdsArgs),

    /// Grade answers to similar practice questions
    Practice(PracticeArgs),

    /// Manage configuration profiles
    Profile(ProfileArgs),
}

impl Command {
    /// Location of the equivalent page, used for host notifications
    pub fn pathname(&self) -> String {
        match self {
            Command::Upload(_) | Command::Analyze(_) => "/upload".to_string(),
            Command::Detail(args) => format!("/detail/{}", args.id),
            Command::List(_) | Command::ErrorType(_) | Command::Delete(_) | Command::Export(_) => {
                "/error-book".to_string()
            }
            Command::WeakPoints(_) => "/report".to_string(),
            Command::Practice(_) => "/similar-practice".to_string(),
            Command::Profile(_) => "/settings".to_string(),
        }
    }
}

/// Arguments for the upload command.
#[derive(Debug, Parser)]
pub struct UploadArgs {
    /// Image file to upload
    pub image: PathBuf,

    /// Show the detail of one question instead (1-based SECTION:QUESTION)
    #[arg(short, long)]
    pub select: Option<QuestionSelection>,
}

/// Arguments for the analyze command.
#[derive(Debug, Parser)]
pub struct AnalyzeArgs {
    /// JSON file holding an upload response or a bare analysis array
    pub file: PathBuf,

    /// Show the detail of one question instead (1-based SECTION:QUESTION)
    #[arg(short, long)]
    pub select: Option<QuestionSelection>,
}

/// Arguments for the detail command.
#[derive(Debug, Parser)]
pub struct DetailArgs {
    /// Mistake ID
    pub id: String,

    /// JSON file with a detail payload to show instead of fetching
    #[arg(long)]
    pub seed: Option<PathBuf>,

    /// Read from the legacy per-record endpoint
    #[arg(long, conflicts_with = "seed")]
    pub legacy: bool,
}

/// Arguments for the list command.
#[derive(Debug, Parser)]
pub struct ListArgs {
    /// Filter by subject; repeat to accept several
    #[arg(short, long)]
    pub subject: Vec<String>,

    /// Filter by error type; repeat to accept several
    #[arg(short, long)]
    pub error_type: Vec<String>,

    /// Filter by knowledge point
    #[arg(short, long)]
    pub knowledge_point: Option<String>,

    /// Case-insensitive text to look for in the question
    #[arg(long)]
    pub search: Option<String>,

    /// Only mistakes uploaded within this window (today, week, month, quarter, all)
    #[arg(long)]
    pub since: Option<TimeWindow>,

    /// Sort column (question, subject, knowledge-point, error-type, upload-time)
    #[arg(long)]
    pub sort: Option<SortField>,

    /// Sort descending
    #[arg(long, requires = "sort")]
    pub desc: bool,

    /// Page number (1-based)
    #[arg(long, default_value = "1")]
    pub page: usize,

    /// Rows per page, overriding the configured page size
    #[arg(long)]
    pub page_size: Option<usize>,

    /// Rows to skip on the server
    #[arg(long, default_value = "0")]
    pub skip: u64,

    /// Maximum rows fetched from the server
    #[arg(short, long, default_value = "100")]
    pub limit: u64,
}

/// Arguments for the weak-points command.
#[derive(Debug, Parser)]
pub struct WeakPointsArgs {
    /// Number of knowledge points to show
    #[arg(short = 'n', long, default_value = "5")]
    pub top_n: u32,

    /// Filter by subject
    #[arg(short, long)]
    pub subject: Option<String>,
}

/// Arguments for the error-type command.
#[derive(Debug, Parser)]
pub struct ErrorTypeArgs {
    /// Mistake record ID
    pub record_id: i64,

    /// New error type
    pub error_type: String,

    /// Specific analysis row
    #[arg(long)]
    pub analysis_id: Option<i64>,
}

/// Arguments for commands taking record IDs.
#[derive(Debug, Parser)]
pub struct IdsArgs {
    /// Mistake record IDs
    #[arg(required = true)]
    pub ids: Vec<i64>,
}

/// Arguments for the practice command.
#[derive(Debug, Parser)]
pub struct PracticeArgs {
    /// JSON file with practice questions
    pub file: PathBuf,

    /// Answers in question order, comma separated
    #[arg(short, long, value_delimiter = ',')]
    pub answers: Vec<String>,
}

/// Arguments for profile management.
#[derive(Debug, Parser)]
pub struct ProfileArgs {
    #[command(subcommand)]
    pub action: ProfileAction,
}

/// Profile management actions.
#[derive(Debug, Subcommand)]
pub enum ProfileAction {
    /// List all profiles
    List,

    /// Show active profile
    Show,

    /// Switch to a different profile
    Switch {
        /// Profile name
        name: String,
    },

    /// Create or update a profile
    Set {
        /// Profile name
        name: String,
        /// Backend URL
        #[arg(short, long)]
        url: String,
        /// Default subject for list and weak-points
        #[arg(short, long)]
        subject: Option<String>,
    },

    /// Delete a profile
    Delete {
        /// Profile name
        name: String,
    },
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}
