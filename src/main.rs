//! Curator CLI binary entry point.

use curator::cli::{AuthCommands, Cli, Commands};
use curator::config::CuratorConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("curator=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse_args();

    let config = match CuratorConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("Set CURATOR_CLIENT_ID, CURATOR_CLIENT_SECRET and CURATOR_REDIRECT_URI");
            eprintln!("or create {}", CuratorConfig::default_path().display());
            std::process::exit(1);
        }
    };
    let session = match cli.session(&config) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let result = match &cli.command {
        Commands::Auth(auth_args) => match auth_args.command {
            AuthCommands::Login => curator::cli::auth::handle_login(&session).await,
            AuthCommands::Status => curator::cli::auth::handle_status(&session).await,
        },
        Commands::Redirect(args) => curator::cli::auth::handle_redirect(&session, &args.url).await,
        Commands::NowPlaying => curator::cli::playback::handle_now_playing(&session).await,
        Commands::Keep => curator::cli::playback::handle_keep(&session).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
