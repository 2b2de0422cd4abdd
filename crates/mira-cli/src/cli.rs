use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// Output format for CLI commands
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn is_json(self) -> bool {
        matches!(self, OutputFormat::Json)
    }
}

#[derive(Parser)]
#[command(name = "mira")]
#[command(version, about = "MIRA - decaying memory and tool activation for assistants")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Database path (defaults to ~/.mira/mira.db)
    #[arg(long, global = true, env = "MIRA_DB_PATH")]
    pub db_path: Option<String>,

    /// Engine configuration file (defaults to ~/.config/mira/config.toml)
    #[arg(long, global = true, env = "MIRA_CONFIG")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Store a long-term memory
    Remember(RememberArgs),

    /// Search an owner's memories
    Recall {
        owner: String,
        query: String,

        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Delete a memory and its links
    Forget { id: String },

    /// Show one memory (counts as an access)
    Show {
        id: String,

        /// Read without boosting strength
        #[arg(long)]
        no_boost: bool,
    },

    /// List an owner's strongest memories
    Strongest {
        owner: String,

        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// List an owner's most recently accessed memories
    Recent {
        owner: String,

        #[arg(long, default_value_t = 10)]
        limit: usize,

        #[arg(long, default_value_t = 0.0)]
        min_strength: f64,
    },

    /// Memory statistics for an owner
    Stats { owner: String },

    /// Link two memories
    Link(LinkArgs),

    /// List memories linked to a memory
    Links {
        id: String,

        /// Only links of this type
        #[arg(long = "type")]
        link_type: Option<String>,
    },

    /// Domain document management
    Doc {
        #[command(subcommand)]
        command: DocCommands,
    },

    /// Show active tools for an owner
    Tools {
        owner: String,

        /// Also suggest tools used together with this one
        #[arg(long)]
        suggest_for: Option<String>,
    },

    /// Feed conversation turns from stdin and print the assembled context
    Chat {
        owner: String,

        /// Importance of each user turn
        #[arg(long, default_value_t = 0.5)]
        importance: f64,
    },

    /// Run one full maintenance cycle now
    Sleep,

    /// Run the background event processor until interrupted
    Daemon,
}

#[derive(Args)]
pub struct RememberArgs {
    pub owner: String,
    pub content: String,

    /// Memory type: episodic, semantic or procedural
    #[arg(long = "type", default_value = "episodic")]
    pub memory_type: String,

    #[arg(long, default_value_t = 0.5)]
    pub importance: f64,

    /// Tag (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,
}

#[derive(Args)]
pub struct LinkArgs {
    pub source: String,
    pub target: String,

    /// Link type: related, caused_by, leads_to or contradicts
    #[arg(long = "type", default_value = "related")]
    pub link_type: String,

    #[arg(long, default_value_t = 0.5)]
    pub strength: f64,
}

#[derive(Subcommand)]
pub enum DocCommands {
    /// Create or replace a document
    Set {
        owner: String,
        title: String,
        content: String,
    },

    /// List an owner's documents
    List { owner: String },

    /// Delete a document
    Delete { id: String },
}
