/// Intercept messages using the `log` crate and print them to STDERR. Defaults to `info`, but
/// `RUST_LOG` overrides that, like `RUST_LOG=road_network=debug`.
///
/// Safe to call more than once, which tests and tools that embed each other do. Only the first
/// call installs a logger.
pub fn setup() {
    use env_logger::{Builder, Env};
    if let Err(err) = Builder::from_env(Env::default().default_filter_or("info")).try_init() {
        debug!("Keeping the existing logger: {}", err);
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn repeated_setup_keeps_the_first_logger() {
        super::setup();
        // The second call must not panic like env_logger's init() would
        super::setup();
        info!("still logging");
    }
}
