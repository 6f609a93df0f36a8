use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "agency-time", about = "Time tracking for AgencyOS tasks", version)]
pub struct Cli {
    /// Path to the SQLite database [default: config database.path, then ~/.agency-time/agency-time.db]
    #[arg(long, env = "AGENCY_TIME_DB", global = true)]
    pub db: Option<String>,

    /// Path to the config file [default: ~/.agency-time/config.toml]
    #[arg(long, env = "AGENCY_TIME_CONFIG", global = true)]
    pub config: Option<String>,

    /// Acting user id
    #[arg(long = "as", env = "AGENCY_TIME_USER", global = true)]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create database and tables (idempotent)
    Init,

    /// Register a user
    #[command(name = "add-user")]
    AddUser {
        /// User id
        id: String,
        /// Role (SUPER_ADMIN, MANAGER, PROFESSIONAL, CLIENT)
        #[arg(short, long)]
        role: String,
        /// Display name
        #[arg(short, long, default_value = "")]
        name: String,
    },

    /// List users
    Users {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add a task
    Add {
        /// Task key (alphanumeric, hyphens, underscores)
        key: String,
        /// Task title
        title: String,
        /// Task description
        #[arg(short, long)]
        desc: String,
        /// Assigned user id
        #[arg(short, long)]
        assignee: String,
        /// Priority (LOW, MEDIUM, HIGH, URGENT)
        #[arg(long, default_value = "MEDIUM")]
        priority: String,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,
        /// Project key
        #[arg(short, long)]
        project: Option<String>,
    },

    /// Show task details and time statistics
    Show {
        /// Task key
        key: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List tasks
    List {
        /// Filter by assignee
        #[arg(long)]
        assignee: Option<String>,
        /// Filter by status
        #[arg(long)]
        status: Option<String>,
        /// Filter by project
        #[arg(long)]
        project: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Change a task's status
    Status {
        /// Task key
        key: String,
        /// New status (PENDING, IN_PROGRESS, COMPLETED, ON_HOLD, CANCELLED)
        status: String,
    },

    /// Reassign a task
    Assign {
        /// Task key
        key: String,
        /// New assignee user id
        assignee: String,
    },

    /// Remove a task and its timers
    Rm {
        /// Task key
        key: String,
    },

    /// Start a timer on a task
    Start {
        /// Task key
        task: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Stop a running timer
    Stop {
        /// Timer id [default: the acting user's running timer]
        timer: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the acting user's running timer
    Active {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List timers (all for managers and admins, otherwise your own)
    Timers {
        /// Only timers of this task
        #[arg(long)]
        task: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a timer
    #[command(name = "rm-timer")]
    RmTimer {
        /// Timer id
        timer: String,
    },

    /// Time statistics for a task
    Stats {
        /// Task key
        task: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
