pub mod ops;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "splitmate")]
#[command(about = "Shared-expense ledger client", long_about = None)]
pub struct Cli {
    /// Path to the config file
    #[arg(long, default_value = "splitmate.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and store the session token
    Login {
        #[arg(long)]
        login: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account and store the session token
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Revoke the session and clear local state
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Check whether the stored session is still accepted
    Session,
    /// Show aggregate balances and recent expenses
    Dashboard,
    /// Group operations
    Groups {
        #[command(subcommand)]
        cmd: GroupCommands,
    },
    /// Record a payment against a member's outstanding balance
    Settle {
        #[arg(long)]
        group: i64,
        /// User id of the member to settle with
        #[arg(long)]
        member: i64,
        #[arg(long)]
        amount: String,
        #[arg(long)]
        notes: Option<String>,
    },
    /// UI theme preference
    Theme {
        #[command(subcommand)]
        cmd: ThemeCommands,
    },
}

#[derive(Subcommand)]
pub enum GroupCommands {
    /// List all groups
    List,
    /// Show one group with its balances
    Show { id: i64 },
    /// Create a group
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
        /// User ids of the initial members
        #[arg(long, value_delimiter = ',')]
        members: Vec<i64>,
    },
}

#[derive(Subcommand)]
pub enum ThemeCommands {
    Get,
    Set { value: String },
}
