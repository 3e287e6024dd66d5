use clap::{arg, command, Parser, Subcommand};

#[derive(Parser)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
    #[arg(short, long)]
    pub configuration_file: Option<String>,
    #[arg(short, long)]
    pub verbosity: Option<log::LevelFilter>,
}

#[derive(Subcommand)]
pub enum Command {
    /// registers the application on the freebox
    Register {
        /// the interval in seconds to check for user validation in registration process
        pooling_interval: Option<u64>,
    },
    /// runs a diagnostic on the session
    SessionDiagnostic {
        /// show the token
        show_token: Option<bool>,
    },
    /// performs an authenticated GET on an API path and prints the result
    Get {
        /// path relative to the API base url, e.g. v4/system/
        path: String,
    },
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Command};

    #[test]
    fn parses_get_command() {
        let cli = Cli::parse_from(["gateway", "-c", "conf.toml", "get", "v4/system/"]);

        assert_eq!(Some("conf.toml".to_string()), cli.configuration_file);
        match cli.command {
            Command::Get { path } => assert_eq!("v4/system/", path),
            _ => panic!("unexpected command"),
        }
    }

    #[test]
    fn parses_register_interval() {
        let cli = Cli::parse_from(["gateway", "-v", "debug", "register", "2"]);

        assert_eq!(Some(log::LevelFilter::Debug), cli.verbosity);
        match cli.command {
            Command::Register { pooling_interval } => assert_eq!(Some(2), pooling_interval),
            _ => panic!("unexpected command"),
        }
    }
}
