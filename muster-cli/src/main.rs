use clap::Parser;
use muster_registry::server::RegistryServer;
use muster_registry::shutdown::shutdown_signal;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "muster", version)]
#[command(about = "Muster agent registry - runtime agent discovery server")]
struct Cli {
    /// Port to run the registry on
    #[arg(long, default_value_t = 8000)]
    port: u16,

    /// Host to bind the registry to
    #[arg(long, default_value = "localhost")]
    host: String,
}

#[tokio::main]
async fn main() {
    // Initialize logging once.
    let env_filter = tracing_subscriber::EnvFilter::from_default_env();
    let env_filter = match "info".parse() {
        Ok(directive) => env_filter.add_directive(directive),
        Err(_) => env_filter, // fallback to default if parsing fails
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .try_init();

    let cli = Cli::parse();
    let addr = format!("{}:{}", cli.host, cli.port);

    info!(
        host = %cli.host,
        port = cli.port,
        url = %format!("http://{addr}"),
        "Starting agent registry"
    );

    let server = RegistryServer::new();
    if let Err(e) = server.serve_with_shutdown(&addr, shutdown_signal()).await {
        tracing::error!(error = %e, "Failed to start agent registry");
        std::process::exit(1);
    }
}
