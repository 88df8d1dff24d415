//! Host side services exposed by the demo.

use std::{
	sync::{
		atomic::{AtomicI64, AtomicU64, Ordering},
		Arc, Mutex, PoisonError,
	},
	time::Duration,
};

use bs_bridge::{AccessError, Arguments, Level, Member, Reflect};
use serde_json::{json, Value};

#[derive(Debug, Default)]
pub struct Counter {
	counter: AtomicI64,
}

impl Counter {
	fn increment(&self) -> i64 {
		self.counter.fetch_add(1, Ordering::SeqCst) + 1
	}
}

impl Reflect for Counter {
	fn type_name(&self) -> &'static str {
		"Counter"
	}

	fn levels(&self) -> Vec<Level> {
		vec![Level::new("Counter", &["counter", "increment", "incrementAsync"])]
	}

	fn member(self: Arc<Self>, name: &str) -> Result<Member, AccessError> {
		match name {
			"counter" => Ok(Member::data(self.counter.load(Ordering::SeqCst))),
			"increment" => Ok(Member::sync_method(move |_| Ok(json!(self.increment())))),
			"incrementAsync" => Ok(Member::async_method(move |_| {
				let counter = Arc::clone(&self);
				async move {
					tokio::time::sleep(Duration::from_millis(10)).await;
					Ok(json!(counter.increment()))
				}
			})),
			_ => Err(AccessError::missing(name)),
		}
	}
}

#[derive(Debug)]
pub struct Network {
	name: Mutex<String>,
	pub height: AtomicU64,
}

impl Reflect for Network {
	fn type_name(&self) -> &'static str {
		"Network"
	}

	fn levels(&self) -> Vec<Level> {
		vec![Level::new("Network", &["name", "height", "switch"])]
	}

	fn member(self: Arc<Self>, name: &str) -> Result<Member, AccessError> {
		match name {
			"name" => Ok(Member::data(
				self.name
					.lock()
					.unwrap_or_else(PoisonError::into_inner)
					.clone(),
			)),
			"height" => Ok(Member::data(self.height.load(Ordering::SeqCst))),
			"switch" => Ok(Member::sync_method(move |args: Arguments| {
				let name = args.get::<String>(0)?;
				*self.name.lock().unwrap_or_else(PoisonError::into_inner) = name;
				Ok(Value::Null)
			})),
			_ => Err(AccessError::missing(name)),
		}
	}
}

/// A wallet service, with data and behaviour nested at several depths.
#[derive(Debug)]
pub struct Wallet {
	pub network: Arc<Network>,
	balance: AtomicU64,
}

impl Default for Wallet {
	fn default() -> Self {
		Self {
			network: Arc::new(Network {
				name: Mutex::new("mainnet".to_string()),
				height: AtomicU64::new(5_120_000),
			}),
			balance: AtomicU64::new(100),
		}
	}
}

impl Reflect for Wallet {
	fn type_name(&self) -> &'static str {
		"BSNeo3"
	}

	fn levels(&self) -> Vec<Level> {
		vec![
			Level::new("BSNeo3", &["network", "tokens", "transfer", "sign"]),
			Level::new("BSBlockchainService", &["balance", "_seed"]),
		]
	}

	fn member(self: Arc<Self>, name: &str) -> Result<Member, AccessError> {
		match name {
			"network" => Ok(Member::object(Arc::clone(&self.network))),
			"tokens" => Ok(Member::data(json!({
				"neo": { "decimals": 0 },
				"gas": { "decimals": 8 },
			}))),
			"balance" => Ok(Member::data(self.balance.load(Ordering::SeqCst))),
			"transfer" => Ok(Member::sync_method(move |args: Arguments| {
				let amount = args.get::<u64>(0)?;

				self.balance
					.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |balance| {
						balance.checked_sub(amount)
					})
					.map(|previous| json!(previous - amount))
					.map_err(|balance| format!("insufficient funds, balance is {balance}").into())
			})),
			"sign" => Ok(Member::async_method(|args: Arguments| async move {
				let payload = args.get::<String>(0)?;
				Ok(json!(format!("signed:{payload}")))
			})),
			"_seed" => Ok(Member::data("never leaves the host")),
			_ => Err(AccessError::missing(name)),
		}
	}
}
