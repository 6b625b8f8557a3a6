use core::{net::SocketAddr, time::Duration};

use anyhow::{Context, bail};
use clap::Parser;
use snowfall::{DEFAULT_EPOCH, NodeId, SystemClock, TimeSource};

const DEFAULT_EPOCH_MS: u64 = DEFAULT_EPOCH.as_millis() as u64;

/// Runtime configuration for the `snowfall-server` binary.
///
/// All values are parsed from CLI arguments or environment variables (a `.env`
/// file is loaded first). The node identity has no safe default for a fleet:
/// every running instance must be given its own `(WORKER_ID, DATACENTER_ID)`
/// pair by whoever provisions it.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "snowfall-server",
    version,
    about = "An HTTP service handing out Snowflake IDs"
)]
pub struct CliArgs {
    /// Worker ID of this instance, unique within its datacenter (0-31).
    ///
    /// Environment variable: `WORKER_ID`
    #[arg(long, env = "WORKER_ID", default_value_t = 0, allow_negative_numbers = true)]
    pub worker_id: i64,

    /// Datacenter ID of this instance (0-31).
    ///
    /// Environment variable: `DATACENTER_ID`
    #[arg(long, env = "DATACENTER_ID", default_value_t = 0, allow_negative_numbers = true)]
    pub datacenter_id: i64,

    /// Epoch in milliseconds since 1970-01-01 UTC that ID timestamps count
    /// from.
    ///
    /// Must never change for a deployment. Moving it breaks ordering against
    /// IDs that were already issued.
    ///
    /// Environment variable: `EPOCH_MS`
    #[arg(long, env = "EPOCH_MS", default_value_t = DEFAULT_EPOCH_MS)]
    pub epoch_ms: u64,

    /// Address to listen on.
    ///
    /// Example: "0.0.0.0:8080"
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from("0.0.0.0:8080"))]
    pub server_addr: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub node: NodeId,
    pub epoch: Duration,
    pub server_addr: SocketAddr,
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let node = NodeId::new(args.worker_id, args.datacenter_id)
            .context("WORKER_ID and DATACENTER_ID must both be within 0..=31")?;

        let now = SystemClock.current_millis();
        if args.epoch_ms > now {
            bail!(
                "EPOCH_MS ({}) is in the future (now = {})",
                args.epoch_ms,
                now
            );
        }

        let server_addr = args
            .server_addr
            .parse()
            .with_context(|| format!("invalid SERVER_ADDR {:?}", args.server_addr))?;

        Ok(Self {
            node,
            epoch: Duration::from_millis(args.epoch_ms),
            server_addr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> anyhow::Result<ServerConfig> {
        let args = CliArgs::try_parse_from(
            core::iter::once("snowfall-server").chain(args.iter().copied()),
        )?;
        ServerConfig::try_from(args)
    }

    #[test]
    fn explicit_values_are_used() {
        let config = parse(&[
            "--worker-id",
            "5",
            "--datacenter-id",
            "3",
            "--epoch-ms",
            "1565193600000",
            "--server-addr",
            "127.0.0.1:9000",
        ])
        .unwrap();

        assert_eq!(config.node, NodeId::new(5, 3).unwrap());
        assert_eq!(config.epoch, Duration::from_millis(1_565_193_600_000));
        assert_eq!(config.server_addr, "127.0.0.1:9000".parse().unwrap());
    }

    #[test]
    fn out_of_range_node_identity_is_rejected() {
        for args in [
            ["--worker-id", "32"],
            ["--worker-id", "-1"],
            ["--datacenter-id", "40"],
        ] {
            let err = parse(&args).unwrap_err();
            assert!(
                err.root_cause().to_string().contains("can't be greater than 31"),
                "{err:#}"
            );
        }
    }

    #[test]
    fn future_epoch_is_rejected() {
        let future = SystemClock.current_millis() + 60_000;
        let err = parse(&["--worker-id", "1", "--epoch-ms", &future.to_string()]).unwrap_err();
        assert!(err.to_string().contains("in the future"));
    }

    #[test]
    fn bad_address_is_rejected() {
        let err = parse(&["--worker-id", "1", "--server-addr", "nowhere"]).unwrap_err();
        assert!(err.to_string().contains("SERVER_ADDR"));
    }
}
