use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "texmux")]
#[command(about = "Workspace sync client for the Overleaf coding-assistant terminal", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Server base URL (overrides the config file)
    #[arg(long, global = true)]
    pub server: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Keep a live view of projects and sessions, following push updates
    Watch {
        /// Launch URL as opened by the editor, e.g. http://host/?project=<id>&user=<id>
        #[arg(long)]
        url: Option<String>,
        /// Don't connect to the push channel; only the initial fetch runs
        #[arg(long)]
        no_push: bool,
    },
    /// List all projects
    Projects,
    /// Map an editor project id to a workspace, creating it if needed
    Resolve {
        /// External project id from the editor
        external_id: String,
    },
}
