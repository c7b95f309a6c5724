//! Main CLI parser and top-level argument handling.

use clap::Parser;

use crate::commands::Commands;

/// Command-line interface definition for the read-aloud tool.
///
/// This is the top-level parser that handles global options and
/// dispatches to subcommands.
#[derive(Parser)]
#[command(name = "lector")]
#[command(about = "Read text aloud through the Neuphonic speech service")]
#[command(version)]
pub struct Cli {
    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_verbose_flag_parses_before_the_subcommand() {
        let cli = Cli::parse_from(["lector", "--verbose", "voices"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Some(Commands::Voices { .. })));
    }

    #[test]
    fn read_takes_optional_text_and_speed() {
        let cli = Cli::parse_from(["lector", "read", "hello there", "--speed", "1.5"]);
        match cli.command {
            Some(Commands::Read { text, speed, follow }) => {
                assert_eq!(text.as_deref(), Some("hello there"));
                assert!((speed - 1.5).abs() < f32::EPSILON);
                assert!(!follow);
            }
            other => panic!("unexpected command: {:?}", other.is_some()),
        }
    }
}
