use std::sync::{atomic::Ordering, Arc};

use anyhow::{Context, Result};
use bs_bridge::{Binder, BridgeConfig, Error, Exposer, Loopback};
use clap::Parser;
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod apis;

use apis::{Counter, Wallet};

#[derive(Parser, Debug)]
#[command(name = "bridge-demo", about = "Exposes sample services over an in-process bridge")]
struct Cli {
	/// Prefix of every channel name, shared by host and client
	#[arg(long)]
	channel_prefix: Option<String>,

	/// Name the counter service is exposed under
	#[arg(long, default_value = "Counter")]
	api_name: String,
}

#[tokio::main]
async fn main() -> Result<()> {
	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| "info,bs_bridge=debug".into()),
		)
		.with(tracing_subscriber::fmt::layer())
		.init();

	let cli = Cli::parse();

	let mut config = BridgeConfig::from_env();
	if let Some(channel_prefix) = cli.channel_prefix {
		config.channel_prefix = channel_prefix;
	}

	info!(channel_prefix = %config.channel_prefix, "Starting bridge");

	let transport = Loopback::new();

	// Host side
	let exposer = Exposer::with_config(transport.clone(), &config);
	let wallet = Arc::new(Wallet::default());

	exposer.expose(cli.api_name.as_str(), Arc::new(Counter::default()));
	exposer.expose_api(wallet.clone());

	// Exposing again is a no-op.
	exposer.expose(cli.api_name.as_str(), Arc::new(Counter::default()));

	// Client side
	let binder = Binder::with_config(transport.clone(), &config);

	let counter = binder
		.bind(&cli.api_name)
		.with_context(|| format!("failed to bind {}", cli.api_name))?;

	println!("counter = {}", counter.get("counter")?);
	println!("increment() = {}", counter.call("increment", Vec::new())?);
	println!(
		"incrementAsync() = {}",
		counter.call_async("incrementAsync", Vec::new()).await?
	);
	println!("counter = {}", counter.get("counter")?);

	let neo = binder.bind("BSNeo3").context("failed to bind BSNeo3")?;

	println!(
		"BSNeo3 descriptor = {}",
		serde_json::to_string_pretty(neo.descriptor())?
	);
	println!("tokens = {}", neo.get("tokens")?);
	println!("network.height = {}", neo.get("network.height")?);

	wallet.network.height.fetch_add(1, Ordering::SeqCst);
	println!("network.height = {}", neo.get("network.height")?);

	neo.object("network")?
		.call("switch", vec![json!("testnet")])?;
	println!("network.name = {}", neo.get("network.name")?);

	println!(
		"sign(\"0x01\") = {}",
		neo.call_async("sign", vec![json!("0x01")]).await?
	);
	println!("transfer(40) = {}", neo.call("transfer", vec![json!(40)])?);

	match neo.call("transfer", vec![json!(1_000)]) {
		Ok(balance) => println!("transfer(1000) = {balance}"),
		Err(Error::Remote(e)) => warn!(channel = %e.channel, "Transfer refused: {e}"),
		Err(e) => return Err(e.into()),
	}

	if let Err(e) = binder.bind("BSEthereum") {
		println!("{e}");
	}

	info!(
		round_trips = transport.total_round_trips(),
		apis = ?exposer.exposed_apis(),
		"Done"
	);

	Ok(())
}
