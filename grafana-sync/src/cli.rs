use std::path::PathBuf;

use clap::{Parser, Subcommand};
use grafana_sync_core::Auth;

#[derive(Debug, Parser)]
#[command(name = "grafana-sync", version, about = "Synchronize Grafana dashboards with a local directory tree")]
pub struct Cli {
    /// Grafana address
    #[arg(
        long,
        global = true,
        env = "GRAFANA_SYNC_ADDRESS",
        default_value = "http://localhost:3000"
    )]
    pub address: String,

    /// Directory where dashboards live
    #[arg(long, global = true, default_value = "./", value_parser = parse_directory)]
    pub directory: PathBuf,

    /// Access token used as a bearer credential
    #[arg(long, global = true, env = "GRAFANA_SYNC_ACCESS_TOKEN")]
    pub access_token: Option<String>,

    /// Username for basic authentication
    #[arg(long, global = true, requires = "password")]
    pub username: Option<String>,

    /// Password for basic authentication
    #[arg(long, global = true, requires = "username")]
    pub password: Option<String>,

    /// Dump requests and responses on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Upload local dashboards to Grafana
    Push {
        /// Datasource set on every panel before upload
        #[arg(short, long)]
        datasource: Option<String>,
    },
    /// Download remote dashboards into the local directory
    Pull {
        /// Folder titles to pull; everything when omitted
        #[arg(short = 'f', long = "sync-folders")]
        sync_folders: Vec<String>,
    },
}

impl Cli {
    /// An access token wins over basic credentials when both are given.
    pub fn auth(&self) -> Auth {
        if let Some(token) = &self.access_token {
            return Auth::Token(token.clone());
        }
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Auth::Basic {
                username: username.clone(),
                password: password.clone(),
            },
            _ => Auth::Anonymous,
        }
    }
}

fn parse_directory(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    match std::fs::metadata(&path) {
        Ok(meta) if meta.is_dir() => Ok(path),
        Ok(_) => Err(format!("'{value}' is not a directory")),
        Err(_) => Err(format!("couldn't retrieve info regarding directory '{value}'")),
    }
}
