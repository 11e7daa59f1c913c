use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::transport::ssh::SshTarget;
use crate::DeployError;

pub const DEFAULT_HOST: &str = "raspberrypi.local";
pub const DEFAULT_USERNAME: &str = "pi";
pub const DEFAULT_PROJECT_DIR: &str = "raspberry-pi-script";

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Raspberry Pi host name or address
    #[arg(long, env = "RASPBERRY_PI_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port for SSH
    #[arg(short = 'p', long, env = "RASPBERRY_PI_PORT", default_value_t = 22)]
    pub port: u16,

    /// SSH user name
    #[arg(short = 'u', long, env = "RASPBERRY_PI_USERNAME", default_value = DEFAULT_USERNAME)]
    pub username: String,

    /// SSH password
    #[arg(long, env = "RASPBERRY_PI_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Local directory to mirror
    #[arg(short = 's', long, env = "PISYNC_SOURCE", default_value = DEFAULT_PROJECT_DIR)]
    pub source: PathBuf,

    /// Remote directory (defaults to /home/<username>/raspberry-pi-script)
    #[arg(short = 't', long, env = "PISYNC_TARGET")]
    pub target: Option<PathBuf>,

    /// Command to run in the remote directory after upload (repeatable, in order)
    #[arg(short = 'c', long = "command", default_values_t = [String::from("npm install"), String::from("npm run start")])]
    pub commands: Vec<String>,

    /// Entry names to skip while uploading (glob patterns)
    #[arg(short, long, default_values_t = [String::from("node_modules")])]
    pub exclude: Vec<String>,

    /// Create missing parents of the remote directory
    #[arg(long, default_value_t = false)]
    pub create_parents: bool,

    /// Number of parallel remote deletions
    #[arg(short = 'j', long, default_value_t = 4)]
    pub parallel: usize,

    /// Hide the upload progress bar
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,

    /// Serve the HTTP sync trigger instead of deploying once
    #[arg(long, default_value_t = false)]
    pub serve: bool,

    /// Address for the HTTP sync trigger
    #[arg(long, env = "PISYNC_BIND", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// Suppress non-error messages
    #[arg(short, long, default_value_t = false)]
    pub quiet: bool,

    /// Increase verbosity
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

/// Everything one deploy run needs. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct DeployConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: Option<String>,
    pub local_dir: PathBuf,
    pub remote_dir: PathBuf,
    pub commands: Vec<String>,
    pub excludes: Vec<String>,
    pub create_parents: bool,
    pub parallel: usize,
    pub progress: bool,
}

impl DeployConfig {
    pub fn from_args(args: &Args) -> Self {
        let remote_dir = args.target.clone().unwrap_or_else(|| {
            PathBuf::from("/home").join(&args.username).join(DEFAULT_PROJECT_DIR)
        });

        Self {
            host: args.host.clone(),
            port: args.port,
            username: args.username.clone(),
            password: args.password.clone().filter(|p| !p.is_empty()),
            local_dir: args.source.clone(),
            remote_dir,
            commands: args.commands.clone(),
            excludes: args.exclude.clone(),
            create_parents: args.create_parents,
            parallel: args.parallel.max(1),
            progress: !args.no_progress && !args.serve,
        }
    }

    /// Connection settings; fails when no password is configured.
    pub fn ssh_target(&self) -> Result<SshTarget, DeployError> {
        let password = self
            .password
            .clone()
            .ok_or(DeployError::MissingCredential)?;

        Ok(SshTarget {
            host: self.host.clone(),
            port: self.port,
            user: self.username.clone(),
            password,
        })
    }
}
