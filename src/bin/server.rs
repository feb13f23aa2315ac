//! Permflow REST API server
//!
//! Run with: cargo run --features server --bin permflow-server
//!
//! Endpoints:
//!   GET   /health                  - Liveness check
//!   POST  /bootstrap               - Create the first admin account
//!   POST  /auth/login              - Open a session
//!   POST  /auth/logout             - Revoke the current session
//!   GET   /auth/me                 - Current account
//!   GET   /auth/permissions/me     - Current account's effective permissions
//!   GET   /auth/permissions/:role  - A role's permission set
//!   POST  /auth/permissions/update - Replace a role's permission set
//!   /auth/users, /auth/users/:id   - Account administration

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use permflow::server::app;
use permflow::Store;

fn print_usage() {
    println!("Usage: permflow-server [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -d, --db-path <PATH>  Database directory (default: ./data/permflow.mdb)");
    println!("  -p, --port <PORT>     Listen port (default: 3000)");
    println!("  -h, --help            Show this help");
    println!();
    println!("Environment: PERMFLOW_DB and PORT are used when flags are absent.");
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut db_path = std::env::var("PERMFLOW_DB").unwrap_or_else(|_| "./data/permflow.mdb".into());
    let mut port = std::env::var("PORT").unwrap_or_else(|_| "3000".into());

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--db-path" | "-d" => {
                if let Some(v) = args.next() {
                    db_path = v;
                }
            }
            "--port" | "-p" => {
                if let Some(v) = args.next() {
                    port = v;
                }
            }
            "--help" | "-h" => {
                print_usage();
                return;
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                print_usage();
                std::process::exit(1);
            }
        }
    }

    tracing::info!("opening database at {}", db_path);
    let store = Arc::new(Store::open(&db_path).expect("Failed to open database"));

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await.expect("Failed to bind");
    tracing::info!("permflow server running at http://{}", addr);

    axum::serve(listener, app(store)).await.expect("Server error");
}
