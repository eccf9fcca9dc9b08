// Capsule HTTP server entrypoint.
// Use: cargo run --bin capsule-server
// Configuration comes from CAPSULE_* environment variables; see settings.rs.

use capsule::http_server::{run_http_server, AppState};
use capsule::{Database, Settings};

#[tokio::main]
async fn main() {
    let settings = Settings::from_env();
    let port = settings.http_port;

    eprintln!("Capsule Server");
    eprintln!("Database: {}", settings.database_path.display());

    if let Some(parent) = settings.database_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let db = Database::new(settings.database_path.clone()).expect("Failed to initialize database");

    let state = AppState::from_settings(settings, db);

    eprintln!();
    eprintln!("API: http://localhost:{}/", port);
    eprintln!("Health: http://localhost:{}/health", port);
    eprintln!();

    run_http_server(state, port).await;
}
