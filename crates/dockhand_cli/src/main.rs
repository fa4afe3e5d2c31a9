use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use tracing_subscriber::filter;

use dockhand_core::{Client, ClientConfig, EntityOptions, ListParams, PullOptions};

#[derive(Parser)]
#[command(name = "dockhand", about = "Thin Docker Engine API client", version)]
struct Cli {
    /// Daemon address (unix:// socket, bare socket path or tcp:// host);
    /// falls back to DOCKER_HOST, then the stock socket.
    #[arg(long, global = true)]
    host: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List images known to the daemon.
    Images {
        #[arg(long)]
        all: bool,
    },
    /// List containers.
    Containers {
        #[arg(long)]
        all: bool,
    },
    /// Pull an image from the registry.
    Pull {
        image: String,
        #[arg(long)]
        tag: Option<String>,
    },
    /// Inspect an image or container and print its JSON view.
    Inspect {
        reference: String,
        #[arg(long)]
        container: bool,
    },
    /// Show an image's layer history.
    History { image: String },
    /// Create and start a container from an image.
    Run {
        name: String,
        image: String,
        /// Extra creation payload as a JSON object, merged over the
        /// defaults.
        #[arg(long)]
        details: Option<String>,
    },
    /// Start a container.
    Start {
        name: String,
        #[arg(long, default_value_t = 0)]
        time: u64,
    },
    /// Stop a container.
    Stop {
        name: String,
        #[arg(long, default_value_t = 0)]
        time: u64,
    },
    /// Restart a container.
    Restart {
        name: String,
        #[arg(long, default_value_t = 0)]
        time: u64,
    },
    /// Delete an image or container.
    Rm {
        reference: String,
        #[arg(long)]
        container: bool,
        /// Containers only: remove even while running, with anonymous
        /// volumes.
        #[arg(long)]
        force: bool,
    },
    /// Check that the daemon answers.
    Ping,
}

fn print_view(view: Map<String, Value>) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&Value::Object(view))?);
    Ok(())
}

fn deferred() -> EntityOptions {
    EntityOptions {
        delay: true,
        ..EntityOptions::default()
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(filter::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env();
    if let Some(host) = cli.host {
        config.host = host;
    }
    let client = Client::from_config(&config)?;

    match cli.command {
        Command::Images { all } => {
            let params = ListParams {
                all,
                ..ListParams::default()
            };
            for image in client.images(&params).await? {
                print_view(image.to_serializable())?;
            }
        }

        Command::Containers { all } => {
            let params = ListParams {
                all,
                ..ListParams::default()
            };
            for container in client.containers(&params).await? {
                print_view(container.to_serializable())?;
            }
        }

        Command::Pull { image, tag } => {
            let options = PullOptions {
                tag,
                ..PullOptions::default()
            };
            let pulled = client.pull(&image, &options).await?;
            println!("pulled {}", pulled.reference());
        }

        Command::Inspect {
            reference,
            container,
        } => {
            if container {
                let container = client
                    .container(&reference, &EntityOptions::default())
                    .await?;
                print_view(container.to_serializable())?;
            } else {
                let image = client.image(&reference, &EntityOptions::default()).await?;
                print_view(image.to_serializable())?;
            }
        }

        Command::History { image } => {
            let mut image = client.image(&image, &EntityOptions::default()).await?;
            let history = image.history().await?;
            println!("{}", serde_json::to_string_pretty(history)?);
        }

        Command::Run {
            name,
            image,
            details,
        } => {
            let details: Map<String, Value> = match details {
                Some(raw) => serde_json::from_str(&raw)?,
                None => Map::new(),
            };
            let container = client.run(&name, &image, &details).await?;
            println!(
                "started {} ({})",
                container.reference(),
                container.id().unwrap_or("unknown id")
            );
        }

        Command::Start { name, time } => {
            client.container(&name, &deferred()).await?.start(time).await?;
        }

        Command::Stop { name, time } => {
            client.container(&name, &deferred()).await?.stop(time).await?;
        }

        Command::Restart { name, time } => {
            client
                .container(&name, &deferred())
                .await?
                .restart(time)
                .await?;
        }

        Command::Rm {
            reference,
            container,
            force,
        } => {
            if container {
                let container = client.container(&reference, &deferred()).await?;
                if force {
                    container.force_remove().await?;
                } else {
                    container.delete().await?;
                }
            } else {
                client.image(&reference, &deferred()).await?.delete().await?;
            }
        }

        Command::Ping => {
            client.ping().await?;
            println!("OK");
        }
    }

    Ok(())
}
