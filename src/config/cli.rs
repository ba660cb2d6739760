use crate::domain::model::CardLayout;
use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "checkout-cards")]
#[command(about = "Generate printable library checkout cards from an ISBN list")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "checkout-cards.toml")]
    pub config: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Look up every uncached identifier of the inventory and update the cache
    Populate,
    /// Render checkout cards for every catalogued item
    Cards {
        #[arg(long, value_enum, default_value_t = CardLayout::Single)]
        layout: CardLayout,

        /// Render from the cache as-is, without looking up new identifiers
        #[arg(long)]
        no_populate: bool,
    },
    /// Print the cached catalogue
    Show,
}

impl Command {
    /// Whether the command may call the lookup service.
    pub fn needs_lookup(&self) -> bool {
        match self {
            Command::Populate => true,
            Command::Cards { no_populate, .. } => !no_populate,
            Command::Show => false,
        }
    }
}
