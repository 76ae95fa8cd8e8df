use std::time::Duration;

use anyhow::{Result, bail};
use clap::Parser;
use tokio::runtime::Builder;
use tracing_subscriber::EnvFilter;

use netmapper::{
    DiscoveryConfig, GraphAnalyzer, LiveHost, NetworkScanner, SnmpProbe, TopologyBuilder, export,
};

#[derive(Parser)]
#[command(name = "netmapper", about = "Discover and analyze network topology")]
struct Cli {
    /// Seed device addresses to crawl from
    #[arg(value_name = "SEED")]
    seeds: Vec<String>,

    /// CIDR range to liveness-scan for additional seeds
    #[arg(long)]
    range: Option<String>,

    /// SNMP community string
    #[arg(long, default_value = "public")]
    community: String,

    /// Output format: json, graphml or dot
    #[arg(long, default_value = "json")]
    format: String,

    /// Per-probe timeout in milliseconds
    #[arg(long, default_value_t = 2000)]
    timeout_ms: u64,

    /// Worker bound for the fallback liveness scan
    #[arg(long, default_value_t = 50)]
    concurrency: usize,

    /// How many critical nodes the centrality ranking reports
    #[arg(long, default_value_t = 5)]
    top_n: usize,

    /// Interface to sweep from (auto-selected when omitted)
    #[arg(long)]
    interface: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    if cli.seeds.is_empty() && cli.range.is_none() {
        bail!("provide at least one seed address or --range");
    }

    let config = DiscoveryConfig {
        community: cli.community.clone(),
        probe_timeout: Duration::from_millis(cli.timeout_ms),
        scan_concurrency: cli.concurrency,
        scan_interface: cli.interface.clone(),
        top_n: cli.top_n,
        ..DiscoveryConfig::default()
    };

    let rt = Builder::new_multi_thread().enable_all().build()?;
    rt.block_on(async {
        let mut hosts: Vec<LiveHost> = cli
            .seeds
            .iter()
            .map(|seed| {
                seed.trim()
                    .parse()
                    .map(|ip| LiveHost {
                        ip,
                        mac: None,
                        open_ports: Vec::new(),
                    })
                    .map_err(|_| {
                        netmapper::DiscoveryError::InvalidInput(format!(
                            "malformed seed address {seed:?}"
                        ))
                    })
            })
            .collect::<Result<_, _>>()?;

        if let Some(range) = &cli.range {
            let scanner = NetworkScanner::new(config.clone());
            for host in scanner.scan(range).await? {
                if !hosts.iter().any(|existing| existing.ip == host.ip) {
                    hosts.push(host);
                }
            }
        }

        let builder = TopologyBuilder::new(SnmpProbe::new(&config), config.clone());
        let graph = builder.discover_hosts(&hosts).await?;
        let report = GraphAnalyzer::new(&graph).analyze(config.top_n);

        let document = export(&graph, &report, &cli.format)?;
        println!("{document}");
        Ok(())
    })
}
