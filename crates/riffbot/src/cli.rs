use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "riffbot")]
#[command(author, version, about = "Telegram bot that turns video links into MP3 files", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the bot (default)
    Run,

    /// Print the resolved configuration and check that yt-dlp and ffmpeg can be started
    Check,

    /// Download a link to MP3 locally, without Telegram
    Fetch {
        /// Video URL
        url: String,

        /// Directory for the MP3 (defaults to the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_no_subcommand_means_run() {
        let cli = Cli::try_parse_from(["riffbot"]).unwrap();
        assert_eq!(cli.command, None);
        let cli = Cli::try_parse_from(["riffbot", "run"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Run));
    }

    #[test]
    fn test_fetch_arguments() {
        let cli = Cli::try_parse_from(["riffbot", "fetch", "https://youtu.be/x", "-o", "/tmp/out"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Fetch {
                url: "https://youtu.be/x".to_string(),
                output: Some(PathBuf::from("/tmp/out")),
            })
        );
    }

    #[test]
    fn test_fetch_requires_url() {
        assert!(Cli::try_parse_from(["riffbot", "fetch"]).is_err());
    }
}
