use slog::{o, Drain, Logger};
use slog_async::Async;
use slog_term::{CompactFormat, TermDecorator};

/// Creates the terminal `Logger` used by the server binaries.
///
/// Records carry the `service` key so that multiple binaries logging to the
/// same terminal stay distinguishable.
pub fn new_logger(service: &str) -> Logger {
    let decorator = TermDecorator::new().build();
    let drain = CompactFormat::new(decorator).build().fuse();
    let drain = Async::new(drain).build().fuse();

    Logger::root(drain, o!("service" => service.to_owned()))
}
