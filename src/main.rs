use crate::cms::CmsClient;
use crate::db::connection::{init_db, Database};
use crate::engine::Engine;
use crate::responses::error_to_response;
use crate::router::handle;
use astra::Server;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

mod cms;
mod db;
mod domain;
mod engine;
mod errors;
mod feeds;
mod responses;
mod router;

#[cfg(test)]
mod tests;

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn main() {
    // 1️⃣ Create the database handle
    let db = Database::new(env_or("LISTINGS_DB", "listings.sqlite3"));

    // 2️⃣ Initialize database from schema.sql
    if let Err(e) = init_db(&db, "sql/schema.sql") {
        eprintln!("❌ Database initialization failed: {e}");
        std::process::exit(1);
    }

    // 3️⃣ Build the CMS client and the engine
    let cms = match CmsClient::new(env_or("CMS_BASE_URL", "http://127.0.0.1:8055")) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("❌ CMS client init failed: {e}");
            std::process::exit(1);
        }
    };

    let ttl_secs: u64 = env_or("CONFIG_TTL_SECS", "300").parse().unwrap_or(300);
    let engine = Arc::new(Engine::new(db, cms, Duration::from_secs(ttl_secs)));

    // 4️⃣ Start the server
    let addr: SocketAddr = env_or("BIND_ADDR", "127.0.0.1:3000").parse().unwrap();
    println!("Starting server at http://{addr}");

    let server = Server::bind(&addr).max_workers(8);

    let result = server.serve(move |req, _info| match handle(req, &engine) {
        Ok(resp) => resp,
        Err(err) => error_to_response(err),
    });

    if let Err(e) = result {
        eprintln!("Server ended with error: {e}");
    }

    println!("Server shut down cleanly.");
}
