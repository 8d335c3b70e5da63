use clap::{Args, Parser, Subcommand};

pub mod allergy;
pub mod centers;
pub mod chat;
pub mod condition;
pub mod history;
pub mod profile;

pub use allergy::run_allergy;
pub use centers::run_centers;
pub use chat::run_chat;
pub use condition::run_condition;
pub use history::run_history;
pub use profile::{run_profile, run_profile_edit};

#[derive(Parser)]
#[command(name = "healthcmd")]
#[command(about = "Personal health companion for the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Talk to the health assistant
    Chat(ChatArgs),
    /// Show or edit your health profile
    Profile(ProfileArgs),
    /// Manage the allergy catalog and your active allergies
    Allergy(AllergyArgs),
    /// Manage the condition catalog and your conditions
    Condition(ConditionArgs),
    /// Past conversations: list, inspect, delete
    History(HistoryArgs),
    /// Find health centers near a coordinate
    Centers(CentersArgs),
}

#[derive(Args)]
pub struct ChatArgs {
    /// Topic recorded on the conversation
    #[arg(short, long)]
    pub reason: Option<String>,
}

#[derive(Args)]
pub struct ProfileArgs {
    /// Edit demographics interactively
    #[arg(short, long)]
    pub edit: bool,
}

#[derive(Args)]
pub struct AllergyArgs {
    #[command(subcommand)]
    pub command: AllergyCommand,
}

#[derive(Subcommand)]
pub enum AllergyCommand {
    /// List every catalog allergy with your active markers
    List,
    /// Add a catalog allergy
    Add {
        name: String,
        /// Classification: drug, food, environmental, ...
        #[arg(short, long, default_value = "drug")]
        kind: String,
    },
    /// Mark an allergy active for you
    On { name: String },
    /// Remove an allergy from your active set
    Off { name: String },
}

#[derive(Args)]
pub struct ConditionArgs {
    #[command(subcommand)]
    pub command: ConditionCommand,
}

#[derive(Subcommand)]
pub enum ConditionCommand {
    /// List every catalog condition with your markers
    List,
    /// Add a catalog condition
    Add { name: String },
    /// Record that you have this condition
    On {
        name: String,
        /// Status recorded on first activation (defaults to "Active")
        #[arg(short, long)]
        status: Option<String>,
    },
    /// Remove a condition from your record
    Off { name: String },
}

#[derive(Args)]
pub struct HistoryArgs {
    /// Print the messages and screening audit of one conversation
    #[arg(long, value_name = "ID")]
    pub show: Option<i64>,
    /// Delete a conversation and everything in it (asks first)
    #[arg(long, value_name = "ID")]
    pub delete: Option<i64>,
}

#[derive(Args)]
pub struct CentersArgs {
    /// Latitude of your position
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,
    /// Longitude of your position
    #[arg(long, allow_hyphen_values = true)]
    pub lon: f64,
    /// Maximum number of results
    #[arg(short, long, default_value = "10")]
    pub limit: usize,
    /// Ignore centers further than this many kilometers
    #[arg(long, default_value = "500")]
    pub max_km: f64,
}
