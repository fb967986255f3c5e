use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use pelican::{
    ChannelError, ChannelEvent, ClientConfig, EventKind, PelicanApplication, PelicanClient, PowerAction, RequestOptions, listener,
};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Panel(#[from] pelican::Error),
    #[error("console failed: {0}")]
    Channel(#[from] ChannelError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("io failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "pelican-cli", about = "Pelican panel API and console CLI")]
struct Cli {
    #[arg(long, env = "PELICAN_BASE_URL")]
    base_url: String,

    #[arg(long, env = "PELICAN_API_KEY", hide_env_values = true)]
    api_key: String,

    #[arg(long, env = "PELICAN_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the account that owns the key.
    Account,
    /// List servers visible to the key.
    Servers(PageArgs),
    Server(ServerCommand),
    /// Administrative API; needs an application key.
    App(AppCommand),
}

#[derive(Args, Debug)]
struct PageArgs {
    #[arg(long)]
    page: Option<u32>,

    #[arg(long)]
    per_page: Option<u32>,
}

impl PageArgs {
    fn options(&self) -> RequestOptions {
        let mut options = RequestOptions::new();
        if let Some(page) = self.page {
            options = options.page(page);
        }
        if let Some(per_page) = self.per_page {
            options = options.per_page(per_page);
        }
        options
    }
}

#[derive(Args, Debug)]
struct ServerCommand {
    /// Short server identifier, e.g. `1a2b3c4d`.
    identifier: String,

    #[command(subcommand)]
    command: ServerSubcommand,
}

#[derive(Subcommand, Debug)]
enum ServerSubcommand {
    Details,
    Resources,
    Power {
        action: PowerAction,
    },
    Command {
        command: String,
    },
    /// Stream console events until Ctrl-C. Lines read from stdin are sent
    /// as console commands.
    Console {
        #[arg(long, default_value_t = 30)]
        max_reconnect_secs: u64,
    },
}

#[derive(Args, Debug)]
struct AppCommand {
    #[command(subcommand)]
    command: AppSubcommand,
}

#[derive(Subcommand, Debug)]
enum AppSubcommand {
    Users(PageArgs),
    Servers(PageArgs),
    Nodes(PageArgs),
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::new(cli.base_url, cli.api_key)?.with_timeout(cli.timeout_secs.map(Duration::from_secs));

    match cli.command {
        Command::Account => {
            let client = PelicanClient::new(&config)?;
            print_json(&client.account().details().await?)
        }
        Command::Servers(args) => {
            let client = PelicanClient::new(&config)?;
            print_json(&client.servers(Some(&args.options())).await?)
        }
        Command::Server(server) => run_server(&PelicanClient::new(&config)?, server).await,
        Command::App(app) => run_app(&PelicanApplication::new(&config)?, app).await,
    }
}

async fn run_server(client: &PelicanClient, server: ServerCommand) -> Result<(), CliError> {
    let context = client.server(&server.identifier);
    match server.command {
        ServerSubcommand::Details => print_json(&context.details(None).await?),
        ServerSubcommand::Resources => print_json(&context.resources().await?),
        ServerSubcommand::Power { action } => {
            context.set_power_state(action).await?;
            eprintln!("sent {}", action.as_str());
            Ok(())
        }
        ServerSubcommand::Command { command } => {
            context.send_command(&command).await?;
            Ok(())
        }
        ServerSubcommand::Console { max_reconnect_secs } => {
            let console = context
                .console_with(|options| options.max_reconnect_delay(Duration::from_secs(max_reconnect_secs)))
                .await?;
            stream_console(console).await
        }
    }
}

async fn stream_console(console: pelican::ChannelManager) -> Result<(), CliError> {
    let printer = listener(|event: &ChannelEvent| match event {
        ChannelEvent::ConsoleOutput(line) | ChannelEvent::InstallOutput(line) | ChannelEvent::TransferLogs(line) => {
            println!("{line}");
        }
        ChannelEvent::Stats(stats) => {
            eprintln!(
                "[stats] state={} cpu={:.1}% memory={}B",
                stats.state, stats.cpu_absolute, stats.memory_bytes
            );
        }
        other => eprintln!("[{}] {other:?}", other.kind()),
    });
    for kind in EventKind::ALL {
        console.on(kind, &printer);
    }

    console.connect().await?;
    eprintln!("connected; Ctrl-C to quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => match line? {
                Some(command) if !command.trim().is_empty() => console.send_command(&command),
                Some(_) => {}
                // stdin closed; keep streaming until Ctrl-C
                None => {
                    tokio::signal::ctrl_c().await?;
                    break;
                }
            },
        }
    }

    console.disconnect();
    Ok(())
}

async fn run_app(app: &PelicanApplication, command: AppCommand) -> Result<(), CliError> {
    match command.command {
        AppSubcommand::Users(args) => print_json(&app.users().list(Some(&args.options())).await?),
        AppSubcommand::Servers(args) => print_json(&app.servers().list(Some(&args.options())).await?),
        AppSubcommand::Nodes(args) => print_json(&app.nodes().list(Some(&args.options())).await?),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
