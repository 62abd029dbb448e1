#![deny(clippy::all)]
#![deny(rust_2018_idioms)]

use std::net::SocketAddr;

use adserver::{
    db::{postgres_connection, setup_migrations, PostgresAdRepository},
    Application, Config,
};
use primitives::util::logging::new_logger;
use slog::info;

const DB_POOL_SIZE: usize = 32;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    let logger = new_logger("adserver");

    setup_migrations();
    let pool = postgres_connection(DB_POOL_SIZE)?;

    info!(&logger, "Starting in {:?} mode", config.env);

    let socket_addr = SocketAddr::new(config.ip_addr, config.port);
    let repository = PostgresAdRepository::new(pool);

    Application::new(config, logger, repository)
        .run(socket_addr)
        .await;

    Ok(())
}
