use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cloudconvert-node")]
#[command(author, version, about = "CloudConvert jobs and webhooks from the command line")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check the configured API key against CloudConvert
    TestCredentials,

    /// Create, inspect and delete jobs
    #[command(subcommand)]
    Jobs(JobCommands),

    /// Inspect and delete webhook subscriptions
    #[command(subcommand)]
    Webhooks(WebhookCommands),

    /// Register the webhook trigger and receive deliveries
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Public URL CloudConvert should call
        #[arg(long)]
        public_url: Option<String>,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

#[derive(Subcommand)]
pub enum JobCommands {
    /// List jobs
    List {
        #[arg(long)]
        tag: Option<String>,

        /// One of error, finished, processing
        #[arg(long)]
        status: Option<String>,
    },

    /// Show a single job
    Get { id: String },

    /// Delete a job
    Delete { id: String },

    /// Create a job from a JSON definition
    Create(CreateArgs),
}

#[derive(Args)]
pub struct CreateArgs {
    /// File containing the job definition
    #[arg(long, required = true)]
    pub definition: PathBuf,

    #[arg(long)]
    pub tag: Option<String>,

    /// Wait for the job on the synchronous API
    #[arg(long)]
    pub sync: bool,

    /// Download export files (requires --sync)
    #[arg(long)]
    pub download: bool,

    /// Completion webhook for asynchronous jobs
    #[arg(long)]
    pub webhook_url: Option<String>,

    /// Files to upload; each becomes an autoimport-<stem> task
    #[arg(long = "input")]
    pub inputs: Vec<PathBuf>,

    /// Where downloaded files are written (defaults to server.output_dir)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum WebhookCommands {
    /// List webhook subscriptions
    List {
        /// Only show subscriptions for this URL
        #[arg(long)]
        url: Option<String>,
    },

    /// Delete a webhook subscription
    Delete { id: String },
}
