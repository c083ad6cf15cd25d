use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "govchat-launcher")]
#[command(
    author,
    version,
    about = "App launcher, model context and subsidy selection tools for GovChat-NL"
)]
#[command(
    long_about = "Inspect which launcher apps a user may open, which models each app context offers, and manage saved subsidy criteria on a GovChat backend"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the launcher apps a user may open
    Apps {
        /// User attributes as JSON, e.g. '{"role":"admin"}'
        #[arg(short, long)]
        user: Option<String>,
        /// Show every app with its permission outcome
        #[arg(long)]
        all: bool,
    },

    /// Show the user manual
    Manual {
        /// Section or item id (all sections if omitted)
        section: Option<String>,
        /// Print the HTML content as-is
        #[arg(long)]
        raw: bool,
    },

    /// Show which models each route's app context offers
    Models {
        /// JSON file with the model list (bare array or {"data": [...]})
        #[arg(short, long)]
        file: PathBuf,
        /// Routes to navigate through, in order
        #[arg(short, long)]
        route: Vec<String>,
    },

    /// Saved subsidy criteria
    Subsidy {
        #[command(subcommand)]
        action: SubsidyCommands,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum SubsidyCommands {
    /// List saved results
    List,
    /// Show the criteria of a saved result
    Show {
        /// Saved id (interactive selection if omitted)
        id: Option<String>,
    },
    /// Save criteria from a JSON file
    Save {
        /// JSON file holding a subsidy result
        file: PathBuf,
        /// Name to store it under
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Extract criteria from a regulation text file
    Extract {
        /// Text file with the regulation
        file: PathBuf,
        /// Model to use on the backend
        #[arg(short, long)]
        model: Option<String>,
        /// Save the extracted criteria
        #[arg(long)]
        save: bool,
        /// Name to store it under (with --save)
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Assess an application text against the selected criteria
    Assess {
        /// Text file with the application
        file: PathBuf,
        /// Saved id of the criteria to use (last, then organisation-wide selection if omitted)
        #[arg(short, long)]
        criteria: Option<String>,
        /// Model to use on the backend
        #[arg(short, long)]
        model: Option<String>,
        /// Also produce the applicant summary and the final report
        #[arg(long)]
        complete: bool,
    },
    /// Delete a saved result
    Delete {
        /// Saved id (interactive selection if omitted)
        id: Option<String>,
    },
    /// Delete every saved result
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Select a saved result and remember it on the backend
    Select {
        /// Saved id (interactive selection if omitted)
        id: Option<String>,
        /// Only select locally
        #[arg(long)]
        no_persist: bool,
    },
    /// Show your last selection
    Selection,
    /// Show the organisation-wide selection
    Global,
    /// Make a saved result the organisation-wide selection (admins only)
    SetGlobal {
        /// Saved id (interactive selection if omitted)
        id: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Print config file path
    Path,
    /// Initialize default configuration
    Init,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_models_routes() {
        let cli = Cli::parse_from([
            "govchat-launcher",
            "models",
            "--file",
            "models.json",
            "-r",
            "/chat",
            "-r",
            "/app-launcher/versimpelaar",
        ]);
        match cli.command {
            Commands::Models { route, .. } => assert_eq!(route.len(), 2),
            _ => panic!("Wrong command"),
        }
    }

    #[test]
    fn test_parse_select_without_id() {
        let cli = Cli::parse_from(["govchat-launcher", "subsidy", "select", "--no-persist"]);
        match cli.command {
            Commands::Subsidy {
                action: SubsidyCommands::Select { id, no_persist },
            } => {
                assert!(id.is_none());
                assert!(no_persist);
            }
            _ => panic!("Wrong command"),
        }
    }

    #[test]
    fn test_parse_assess_complete() {
        let cli = Cli::parse_from([
            "govchat-launcher",
            "subsidy",
            "assess",
            "aanvraag.txt",
            "--criteria",
            "42",
            "--complete",
        ]);
        match cli.command {
            Commands::Subsidy {
                action:
                    SubsidyCommands::Assess {
                        file,
                        criteria,
                        model,
                        complete,
                    },
            } => {
                assert_eq!(file, PathBuf::from("aanvraag.txt"));
                assert_eq!(criteria.as_deref(), Some("42"));
                assert!(model.is_none());
                assert!(complete);
            }
            _ => panic!("Wrong command"),
        }
    }
}
