//! Console front end for the certapps services.
//!
//! Requests are read one per line from stdin and handled against an
//! in-memory store:
//!
//! ```bash
//! printf 'POST /sign content=hello\nGET /guest\n' | cargo run -p certapps -- --user 42
//! ```

mod session;

use certapps_core::identity::LocalIdentityProvider;
use certapps_core::{App, AppConfig};
use datastore::{MemoryDatastore, StoreConfig};
use session::SessionArgs;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }
    let session_args = session::parse_args(&args)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&session_args.log)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!(
        guestbook = %config.guestbook_key(),
        greeting_limit = config.greeting_limit,
        "starting"
    );

    let app = build_app(&config, &session_args);
    let identity = session_args.user.as_deref().map(session::identity_for);

    session::run(&app, identity).await?;
    Ok(())
}

fn build_app(config: &AppConfig, args: &SessionArgs) -> App {
    let store_config = StoreConfig::new().with_eventual_delay(args.eventual_delay);
    App::new(
        config,
        Arc::new(MemoryDatastore::with_config(store_config)),
        Arc::new(LocalIdentityProvider::default()),
    )
}

fn print_help() {
    println!("certapps - guestbook, member and comfort-station console");
    println!();
    println!("USAGE:");
    println!("    certapps [OPTIONS] < requests");
    println!();
    println!("OPTIONS:");
    println!("    --user <ID>              Sign in as this identity");
    println!("    --eventual-delay <MS>    Replication lag for cross-group queries");
    println!("    --log <FILTER>           Log filter when RUST_LOG is unset (default: info)");
    println!("    -h, --help               Print this help");
    println!();
    println!("REQUESTS (one per line):");
    println!("    GET /guest");
    println!("    GET /api/comfort-stations?teamID=42");
    println!("    POST /sign content=hello");
    println!("    POST /api/comfort-station {{\"ComfortStation\":{{\"Name\":\"Depot\"}},\"Team\":{{\"KeyID\":42}}}}");
    println!();
    println!("COMMANDS:");
    println!("    #user <ID>    Sign in");
    println!("    #logout       Sign out");
    println!("    #quit         Exit");
    println!();
    println!("ENVIRONMENT:");
    println!("    CERTAPPS_GUESTBOOK         Guestbook name (default: default_guestbook)");
    println!("    CERTAPPS_GREETING_LIMIT    Greetings per page (default: 10)");
}
