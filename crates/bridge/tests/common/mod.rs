#![allow(dead_code)]

use bs_bridge::{
	AccessError, Arguments, Binder, BridgeConfig, Collection, Exposer, Level, Loopback, Member,
	MethodResult, Reflect,
};

use std::{
	collections::{BTreeMap, BTreeSet},
	sync::{
		atomic::{AtomicI64, AtomicU64, Ordering},
		Arc, Mutex,
	},
	time::Duration,
};

use serde_json::{json, Value};

/// Host and client wired to the same in-process transport.
pub fn bridge() -> (Arc<Loopback>, Exposer, Binder) {
	bridge_with_config(&BridgeConfig::default())
}

pub fn bridge_with_config(config: &BridgeConfig) -> (Arc<Loopback>, Exposer, Binder) {
	let transport = Loopback::new();

	let exposer = Exposer::with_config(transport.clone(), config);
	let binder = Binder::with_config(transport.clone(), config);

	(transport, exposer, binder)
}

#[derive(Debug, Default)]
pub struct Counter {
	pub counter: AtomicI64,
}

impl Counter {
	pub fn starting_at(value: i64) -> Self {
		Self {
			counter: AtomicI64::new(value),
		}
	}

	fn bump(&self) -> i64 {
		self.counter.fetch_add(1, Ordering::SeqCst) + 1
	}
}

impl Reflect for Counter {
	fn type_name(&self) -> &'static str {
		"Counter"
	}

	fn levels(&self) -> Vec<Level> {
		vec![Level::new(
			"Counter",
			&["counter", "increment", "incrementAsync", "reset", "_step"],
		)]
	}

	fn member(self: Arc<Self>, name: &str) -> Result<Member, AccessError> {
		match name {
			"counter" => Ok(Member::data(self.counter.load(Ordering::SeqCst))),
			"increment" => Ok(Member::sync_method(move |_| Ok(json!(self.bump())))),
			"incrementAsync" => Ok(Member::async_method(move |_| {
				let counter = Arc::clone(&self);
				async move {
					tokio::time::sleep(Duration::from_millis(5)).await;
					Ok(json!(counter.bump()))
				}
			})),
			"reset" => Ok(Member::sync_method(move |_| {
				self.counter.store(0, Ordering::SeqCst);
				Ok(Value::Null)
			})),
			"_step" => Ok(Member::data(1)),
			_ => Err(AccessError::missing(name)),
		}
	}
}

#[derive(Debug)]
pub struct Network {
	pub name: Mutex<String>,
	pub height: AtomicU64,
}

impl Default for Network {
	fn default() -> Self {
		Self {
			name: Mutex::new("mainnet".to_string()),
			height: AtomicU64::new(1),
		}
	}
}

impl Reflect for Network {
	fn type_name(&self) -> &'static str {
		"Network"
	}

	fn levels(&self) -> Vec<Level> {
		vec![Level::new("Network", &["name", "height", "rpc", "switch"])]
	}

	fn member(self: Arc<Self>, name: &str) -> Result<Member, AccessError> {
		match name {
			"name" => Ok(Member::data(self.name.lock().unwrap().clone())),
			"height" => Ok(Member::data(self.height.load(Ordering::SeqCst))),
			"rpc" => Ok(Member::data(json!({ "url": "https://seed1.neo.org", "timeout": 30 }))),
			"switch" => Ok(Member::sync_method(move |args: Arguments| {
				let name = args.get::<String>(0)?;
				let previous = std::mem::replace(&mut *self.name.lock().unwrap(), name);
				Ok(json!(previous))
			})),
			_ => Err(AccessError::missing(name)),
		}
	}
}

#[derive(Debug)]
pub struct Keys;

impl Reflect for Keys {
	fn type_name(&self) -> &'static str {
		"Keys"
	}

	fn levels(&self) -> Vec<Level> {
		vec![Level::new("Keys", &["address", "public"])]
	}

	fn member(self: Arc<Self>, name: &str) -> Result<Member, AccessError> {
		match name {
			"address" => Ok(Member::data("NXV7ZhHiyM1aHXwpVsRZC6BwNFP2jghXAq")),
			"public" => Ok(Member::data("03b209fd4f53a7170ea4444e0cb0a6bb6a53c2bd016926989cf85f9b0fba17a70c")),
			_ => Err(AccessError::missing(name)),
		}
	}
}

#[derive(Debug)]
pub struct Ledger;

impl Reflect for Ledger {
	fn type_name(&self) -> &'static str {
		"Ledger"
	}

	fn levels(&self) -> Vec<Level> {
		vec![Level::new("Ledger", &["model", "connect"])]
	}

	fn member(self: Arc<Self>, name: &str) -> Result<Member, AccessError> {
		match name {
			"model" => Ok(Member::data("nano-x")),
			"connect" => Ok(Member::async_method(|_| async { Ok(Value::Bool(true)) })),
			_ => Err(AccessError::missing(name)),
		}
	}
}

/// Wallet service mixing plain data, nested objects and behaviour at several depths.
#[derive(Debug, Default)]
pub struct Wallet {
	pub network: Arc<Network>,
}

impl Reflect for Wallet {
	fn type_name(&self) -> &'static str {
		"BSNeo3"
	}

	fn levels(&self) -> Vec<Level> {
		vec![
			Level::new(
				"BSNeo3",
				&[
					"constructor",
					"label",
					"network",
					"settings",
					"accounts",
					"tokens",
					"keys",
					"ledger",
					"sign",
					"_seed",
				],
			),
			Level::new("BSBlockchainService", &["label", "version"]),
		]
	}

	fn member(self: Arc<Self>, name: &str) -> Result<Member, AccessError> {
		match name {
			"constructor" => Ok(Member::data("BSNeo3")),
			"label" => Ok(Member::data("main")),
			"version" => Ok(Member::data(3)),
			"network" => Ok(Member::object(Arc::clone(&self.network))),
			"settings" => Ok(Member::data(json!({
				"locale": "en",
				"theme": { "dark": true },
			}))),
			"accounts" => Ok(Member::Collection(Collection::map(&BTreeMap::from([
				("NXV7Zh", 10_u64),
				("NZ8Zvh", 0),
			]))?)),
			"tokens" => Ok(Member::Collection(Collection::set(&BTreeSet::from([
				"GAS", "NEO",
			]))?)),
			"keys" => Ok(Member::object(Arc::new(Keys))),
			"ledger" => Ok(Member::object(Arc::new(Ledger))),
			"sign" => Ok(Member::async_method(|args: Arguments| async move {
				match args.get::<Option<String>>(0)? {
					Some(payload) => Ok(json!(format!("signed:{payload}"))),
					None => Err("nothing to sign".into()),
				}
			})),
			"_seed" => Ok(Member::data("never exposed")),
			_ => Err(AccessError::missing(name)),
		}
	}
}

fn explode() -> MethodResult {
	panic!("sensor exploded")
}

/// Service whose members fail in every way a host member can.
#[derive(Debug, Default)]
pub struct Faulty {
	pub outage: Mutex<Option<String>>,
}

impl Reflect for Faulty {
	fn type_name(&self) -> &'static str {
		"Faulty"
	}

	fn levels(&self) -> Vec<Level> {
		vec![Level::new(
			"Faulty",
			&["status", "fail", "failAsync", "breakStatus", "panic", "panicAsync"],
		)]
	}

	fn member(self: Arc<Self>, name: &str) -> Result<Member, AccessError> {
		match name {
			"status" => match self.outage.lock().unwrap().as_deref() {
				Some(reason) => Err(AccessError::unreadable(name, reason)),
				None => Ok(Member::data("ok")),
			},
			"fail" => Ok(Member::sync_method(|_| Err("boom".into()))),
			"failAsync" => Ok(Member::async_method(|_| async { Err("boom".into()) })),
			"breakStatus" => Ok(Member::sync_method(move |args: Arguments| {
				*self.outage.lock().unwrap() = Some(args.get::<String>(0)?);
				Ok(Value::Null)
			})),
			"panic" => Ok(Member::sync_method(|_| explode())),
			"panicAsync" => Ok(Member::async_method(|_| async { explode() })),
			_ => Err(AccessError::missing(name)),
		}
	}
}

/// Object that lists itself as one of its members.
#[derive(Debug)]
pub struct Looped;

impl Reflect for Looped {
	fn type_name(&self) -> &'static str {
		"Looped"
	}

	fn levels(&self) -> Vec<Level> {
		vec![Level::new("Looped", &["value", "me"])]
	}

	fn member(self: Arc<Self>, name: &str) -> Result<Member, AccessError> {
		match name {
			"value" => Ok(Member::data(1)),
			"me" => Ok(Member::Object(self)),
			_ => Err(AccessError::missing(name)),
		}
	}
}

/// Sensor with a getter that panics and data that must stay on the host.
#[derive(Debug, Default)]
pub struct Sensor {
	pub reading: AtomicI64,
}

impl Reflect for Sensor {
	fn type_name(&self) -> &'static str {
		"Sensor"
	}

	fn levels(&self) -> Vec<Level> {
		vec![Level::new(
			"Sensor",
			&["reading", "calibration", "profile", "looped", "reset"],
		)]
	}

	fn member(self: Arc<Self>, name: &str) -> Result<Member, AccessError> {
		match name {
			"reading" => Ok(Member::data(self.reading.load(Ordering::SeqCst))),
			"calibration" => panic!("calibration lost"),
			"profile" => Ok(Member::data(json!({
				"model": "th-1",
				"_secret": "k",
				"limits": { "max": 40, "#trim": 2 },
			}))),
			"looped" => Ok(Member::object(Arc::new(Looped))),
			"reset" => Ok(Member::sync_method(move |_| {
				self.reading.store(0, Ordering::SeqCst);
				Ok(Value::Null)
			})),
			_ => Err(AccessError::missing(name)),
		}
	}
}
