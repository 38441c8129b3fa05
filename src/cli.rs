use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "rethumb")]
#[command(author, version, about = "Telegram bot that sends documents back with a custom thumbnail", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the bot in normal mode
    Run {
        /// Use webhook mode instead of long polling
        #[arg(long)]
        webhook: bool,
    },

    /// Print the stored user → thumbnail mapping
    Thumbnails,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
