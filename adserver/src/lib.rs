#![deny(clippy::all)]
#![deny(rust_2018_idioms)]

//! REST API for submitting and serving advertisements.
//!
//! The matching logic itself lives in the `primitives` crate; this crate
//! provides the HTTP surface, the storage clients and the wiring between
//! them.

use slog::Logger;

use crate::db::AdRepository;

pub mod application;
pub mod db;
pub mod response;
pub mod routes {
    pub mod ad;
}

pub use application::{Config, Environment};
pub use response::ResponseError;

/// The API application, generic over the injected storage client.
///
/// It holds no mutable state of its own: request handling is a pure function
/// of the catalog snapshot, the requester attributes and the current time,
/// so handlers share a single instance behind an `Arc`.
pub struct Application<R: AdRepository> {
    pub config: Config,
    pub logger: Logger,
    pub repository: R,
}

impl<R: AdRepository + 'static> Application<R> {
    pub fn new(config: Config, logger: Logger, repository: R) -> Self {
        Self {
            config,
            logger,
            repository,
        }
    }
}
