use clap::{Parser, Subcommand, ValueEnum};
use h5attr::{AttributeKind, AttributeRequest, AttributeStore, StatusCode};
use h5attr_server::{run_server, ServerConfig};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "h5attr")]
#[command(about = "Serve scalar HDF5 acquisition attributes over HTTP")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<String>,
    },
    /// Read one attribute, print status and value, then close the file
    Get {
        /// File name, relative to the data directory, or an absolute path
        file: String,
        /// Object path inside the file
        location: String,
        /// Attribute name
        name: String,
        #[arg(short, long, value_enum, default_value_t = Kind::Str)]
        kind: Kind,
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    Int,
    Float,
    Str,
}

impl From<Kind> for AttributeKind {
    fn from(k: Kind) -> Self {
        match k {
            Kind::Int => AttributeKind::Int,
            Kind::Float => AttributeKind::Float,
            Kind::Str => AttributeKind::Str,
        }
    }
}

fn load_config(path: Option<&str>) -> ServerConfig {
    match ServerConfig::load(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to load config: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn get_once(
    config: &ServerConfig,
    req: &AttributeRequest,
    kind: AttributeKind,
) -> anyhow::Result<StatusCode> {
    let store = AttributeStore::initialize(&config.store)?;
    let (status, value) = store.get(req, kind);
    store.close(req.path());
    if status.is_success() || status == StatusCode::ValueAdjusted {
        println!("{status} {value}");
    } else {
        println!("{status}");
    }
    Ok(status)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "h5attr=info,h5attr_server=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config } => {
            let cfg = load_config(config.as_deref());
            tracing::info!("Starting h5attr server: {}", cfg);

            if let Err(e) = run_server(cfg).await {
                tracing::error!("Server error: {:#}", e);
                std::process::exit(1);
            }
        }
        Commands::Get {
            file,
            location,
            name,
            kind,
            config,
        } => {
            let cfg = load_config(config.as_deref());
            let req = AttributeRequest::new(file, location, name);
            match get_once(&cfg, &req, kind.into()) {
                Ok(status) if status.is_success() => {}
                Ok(_) => std::process::exit(2),
                Err(e) => {
                    tracing::error!("{:#}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}
