use clap::{Parser, Subcommand};

const VERSION: &str = env!("GIT_VERSION");

#[derive(Parser)]
#[command(
    name = "todoai",
    version = VERSION,
    about = "Personal to-do list with an AI chat assistant",
    after_help = "\
NOTE:
  Tasks are stored in ~/.todolist.db unless --db or TODOAI_DB says otherwise.

CATEGORIES: work, study, life, other (default: other)
PRIORITIES: 1 low, 2 medium (default), 3 high, 4 urgent

CHAT:
  `todoai chat` needs QWEN_API_KEY. QWEN_API_BASE and QWEN_MODEL override
  the endpoint (default: DashScope compatible mode) and model (qwen-plus).
  The assistant can change tasks directly; there is no undo.

EXIT CODES:
  0  Success
  1  Error (validation, not found, database, model)

LOGGING:
  Set RUST_LOG=info or RUST_LOG=debug for diagnostics on stderr."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Database file path
    #[arg(long, global = true)]
    pub db: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a task
    Add {
        /// Task title
        title: String,
        #[arg(short, long)]
        description: Option<String>,
        /// work, study, life or other
        #[arg(short, long, default_value = "other")]
        category: String,
        /// 1-4 or low, medium, high, urgent
        #[arg(short, long, default_value = "2")]
        priority: String,
    },
    /// List tasks
    List {
        /// pending or completed
        #[arg(short, long)]
        status: Option<String>,
        /// work, study, life or other
        #[arg(short, long)]
        category: Option<String>,
        /// priority, created or updated
        #[arg(long, default_value = "priority")]
        sort: String,
    },
    /// Show task details
    Show {
        id: i64,
    },
    /// Mark a task completed (or pending again with -u)
    Complete {
        id: i64,
        /// Mark as pending instead
        #[arg(short, long)]
        uncomplete: bool,
    },
    /// Delete a task by ID, or pick one from a keyword search
    #[command(after_help = "\
NOTE:
  A numeric argument is a task ID; anything else is searched in titles and
  descriptions and the matches are offered as a numbered list (0 cancels).
  Asks for confirmation unless -y is given. --json never prompts: a keyword
  must then match exactly one task.")]
    Delete {
        /// Task ID or search keyword
        target: String,
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Search titles and descriptions
    Search {
        keyword: String,
    },
    /// Show statistics
    Stats,
    /// Talk to the AI assistant
    #[command(after_help = "\
IN-CHAT COMMANDS:
  list, ls     show all pending tasks
  stats        statistics and summary
  clear        forget the conversation so far
  help         this help
  exit, quit   leave")]
    Chat,
}
