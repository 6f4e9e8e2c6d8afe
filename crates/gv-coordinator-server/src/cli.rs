//! Command-line overlay on top of [`gv_coordinator::CoordinatorConfig`],
//! matching the way the teacher's `api/bin/*` binaries layer `clap` (with
//! the `env` feature) over values the `config` crate otherwise loads from
//! the process environment — see `chainflip-broker-api`'s `BrokerOptions`.

use clap::Parser;

#[derive(Parser, Debug, Clone, Default)]
#[clap(version, about = "GuardianVault coordinator signing-plane server")]
pub struct CommandLineOptions {
    #[clap(long, env = "GV_HOST", help = "Address the server binds to. Overrides GV_HOST.")]
    pub host: Option<String>,

    #[clap(
        long,
        env = "GV_PORT",
        help = "Port number on which the signing plane listens. Overrides GV_PORT."
    )]
    pub port: Option<u16>,

    #[clap(long, help = "Enables verbose, human-readable logging in addition to GV_DEBUG.")]
    pub debug: bool,
}

impl CommandLineOptions {
    /// Overrides fields of `config` with whichever command-line flags were
    /// actually supplied, leaving the environment-sourced value in place
    /// otherwise.
    pub fn apply(&self, config: &mut gv_coordinator::CoordinatorConfig) {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if self.debug {
            config.debug = true;
        }
    }
}
