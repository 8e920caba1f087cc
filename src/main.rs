mod cli;

use cloudconvert_node::{
    config,
    node::{CloudConvertNode, NodeOutput, StaticParameters},
    output, server,
};
use cloudconvert_common::{BinaryData, NodeItem};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, CreateArgs, JobCommands, WebhookCommands};
use serde_json::json;
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "cloudconvert_node=trace,cloudconvert_common=debug,tower_http=debug".to_string()
        } else {
            "cloudconvert_node=info,cloudconvert_common=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::TestCredentials => block_on(test_credentials(config_path)),
        Commands::Jobs(command) => block_on(run_job_command(command, config_path)),
        Commands::Webhooks(command) => block_on(run_webhook_command(command, config_path)),
        Commands::Serve {
            host,
            port,
            public_url,
        } => {
            let mut config = config::load_config_or_default(config_path)?;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if public_url.is_some() {
                config.server.public_url = public_url;
            }
            block_on(server::start_server(config))
        }
        Commands::Validate {
            config: validate_path,
        } => {
            let path = validate_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("cloudconvert-node {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn block_on<F: std::future::Future<Output = Result<()>>>(future: F) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(future)
}

fn build_node(config_path: Option<&Path>) -> Result<(CloudConvertNode, config::Config)> {
    let config = config::load_config_or_default(config_path)?;
    if config.credentials.api_key.is_empty() {
        anyhow::bail!(
            "No API key configured (set credentials.api_key or {})",
            config::API_KEY_ENV
        );
    }
    Ok((CloudConvertNode::new(config::build_client(&config)), config))
}

async fn test_credentials(config_path: Option<&Path>) -> Result<()> {
    let (node, _) = build_node(config_path)?;
    let credentials = node.client().credentials();
    println!(
        "Testing key against {}",
        if credentials.sandbox { "sandbox" } else { "live" }
    );
    node.client().test_credentials().await?;
    println!("✓ Credentials are valid");
    Ok(())
}

async fn run_job_command(command: JobCommands, config_path: Option<&Path>) -> Result<()> {
    let (node, config) = build_node(config_path)?;
    let mut params = StaticParameters::new().with("resource", "job");
    let mut item = NodeItem::default();
    let mut output_dir = config.server.output_dir.clone();

    match command {
        JobCommands::List { tag, status } => {
            params.set("operation", "list");
            params.set(
                "list_options",
                json!({ "tag": tag.unwrap_or_default(), "status": status.unwrap_or_default() }),
            );
        }
        JobCommands::Get { id } => {
            params.set("operation", "get");
            params.set("jobId", id);
        }
        JobCommands::Delete { id } => {
            params.set("operation", "delete");
            params.set("jobId", id);
        }
        JobCommands::Create(args) => {
            if args.download && !args.sync {
                tracing::warn!("--download only applies to synchronous jobs");
            }
            if let Some(ref dir) = args.output_dir {
                output_dir = dir.clone();
            }
            item = input_item(&args.inputs)?;
            params = create_params(params, &args)?;
        }
    }

    let output = node.execute(&[item], &params).await?;
    print_output(output, &output_dir)
}

fn create_params(params: StaticParameters, args: &CreateArgs) -> Result<StaticParameters> {
    let definition = std::fs::read_to_string(&args.definition)
        .with_context(|| format!("Failed to read job definition: {:?}", args.definition))?;

    let mut params = params
        .with("operation", "create")
        .with("definition", definition)
        .with("sync", args.sync)
        .with("download", args.download);
    if let Some(ref tag) = args.tag {
        params.set("tag", tag.as_str());
    }
    if let Some(ref url) = args.webhook_url {
        params.set("webhook_url", url.as_str());
    }
    Ok(params)
}

/// Read upload files into one item, keyed by file stem.
fn input_item(inputs: &[PathBuf]) -> Result<NodeItem> {
    let mut item = NodeItem::default();
    for path in inputs {
        let data = std::fs::read(path)
            .with_context(|| format!("Failed to read input file: {:?}", path))?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .with_context(|| format!("Input file has no usable name: {:?}", path))?
            .to_string();
        let mut binary = BinaryData::new(data);
        if let Some(file_name) = path.file_name().and_then(|s| s.to_str()) {
            binary = binary.with_file_name(file_name);
        }
        if item.binary.insert(name.clone(), binary).is_some() {
            anyhow::bail!("Two input files share the attachment name '{}'", name);
        }
    }
    Ok(item)
}

async fn run_webhook_command(command: WebhookCommands, config_path: Option<&Path>) -> Result<()> {
    let (node, config) = build_node(config_path)?;
    let mut params = StaticParameters::new().with("resource", "webhook");

    match command {
        WebhookCommands::List { url } => {
            params.set("operation", "list");
            if let Some(url) = url {
                params.set("webhook_url", url);
            }
        }
        WebhookCommands::Delete { id } => {
            params.set("operation", "delete");
            params.set("webhook_id", id);
        }
    }

    let output = node.execute(&[NodeItem::default()], &params).await?;
    print_output(output, &config.server.output_dir)
}

fn print_output(result: NodeOutput, output_dir: &Path) -> Result<()> {
    let binary = result.is_binary();
    for item in result.into_items() {
        println!("{}", serde_json::to_string_pretty(&item.json)?);
        if binary {
            for path in output::write_attachments(output_dir, &item)? {
                println!("Saved {}", path.display());
            }
        }
    }
    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            config::load_config_or_default(None)?
        }
    };

    println!("  Environment: {}", if config.credentials.sandbox { "sandbox" } else { "live" });
    println!("  API key set: {}", !config.credentials.api_key.is_empty());
    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!(
        "  Public URL: {}",
        config.server.public_url.as_deref().unwrap_or("(not set)")
    );
    let events: Vec<&str> = config.trigger.events.iter().map(|e| e.as_str()).collect();
    println!("  Trigger events: {}", events.join(", "));
    println!("  Download exports: {}", config.trigger.download);
    println!("  Verify signatures: {}", config.trigger.verify);

    Ok(())
}
