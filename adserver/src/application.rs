use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::Arc,
};

use axum::{handler::Handler, routing::get, Extension, Router};
use serde::Deserialize;
use slog::{error, info};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

/// an error used when deserializing a [`Config`] instance from environment variables
/// see [`Config::from_env()`]
pub use envy::Error as EnvError;

use crate::{
    db::AdRepository,
    response::not_found,
    routes::ad::{ad_list, create_ad},
    Application,
};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_IP_ADDR: IpAddr = IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0));

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Defaults to `Development`: [`Environment::default()`]
    #[serde(default)]
    pub env: Environment,
    /// The port on which the REST API will be accessible.
    #[serde(default = "default_port")]
    /// Defaults to `8080`: [`DEFAULT_PORT`]
    pub port: u16,
    /// The address on which the REST API will be accessible.
    /// `0.0.0.0` can be used for Docker.
    /// `127.0.0.1` can be used for locally running servers.
    #[serde(default = "default_ip_addr")]
    /// Defaults to `0.0.0.0`: [`DEFAULT_IP_ADDR`]
    pub ip_addr: IpAddr,
}

impl Config {
    /// Deserialize the application [`Config`] from Environment variables.
    pub fn from_env() -> Result<Self, EnvError> {
        envy::from_env()
    }
}

/// The environment in which the application is running
/// Defaults to [`Environment::Development`]
#[derive(Debug, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "camelCase")]
pub enum Environment {
    Development,
    Production,
}

impl Default for Environment {
    fn default() -> Self {
        Self::Development
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_ip_addr() -> IpAddr {
    DEFAULT_IP_ADDR
}

impl<R: AdRepository + 'static> Application<R> {
    /// Builds the `/api/v1` router with CORS and the shared application state.
    pub fn router(self: Arc<Self>) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .route("/api/v1/ad", get(ad_list::<R>).post(create_ad::<R>))
            .fallback(not_found.into_service())
            // keeps the order from top to bottom!
            .layer(ServiceBuilder::new().layer(cors).layer(Extension(self)))
    }

    /// Starts the `axum` server.
    pub async fn run(self, socket_addr: SocketAddr) {
        let logger = self.logger.clone();
        info!(&logger, "Listening on socket address: {}!", socket_addr);

        let router = Arc::new(self).router();
        let server = axum::Server::bind(&socket_addr).serve(router.into_make_service());

        if let Err(error) = server.await {
            error!(&logger, "server error: {}", error; "main" => "run");
        }
    }
}
