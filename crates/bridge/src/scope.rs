//! Process-wide bridge state, one instance per transport and channel prefix.
//!
//! Every [`Exposer`](crate::Exposer) on a given transport shares one registry and one
//! descriptor lookup endpoint, and every [`Binder`](crate::Binder) shares one cache of bound
//! mirrors, however many of them get created.

use std::sync::{Arc, Mutex, PoisonError, Weak};

struct Entry<T: ?Sized, S> {
	// Weak, so the state never keeps a transport alive. It still pins the allocation, so the
	// address can't be reused by another transport while the entry exists.
	transport: Weak<T>,
	prefix: String,
	state: Arc<S>,
}

pub(crate) struct PerTransport<T: ?Sized, S> {
	entries: Mutex<Vec<Entry<T, S>>>,
}

impl<T: ?Sized, S> PerTransport<T, S> {
	pub(crate) const fn new() -> Self {
		Self {
			entries: Mutex::new(Vec::new()),
		}
	}
}

impl<T: ?Sized, S: Default> PerTransport<T, S> {
	/// State of `transport` under `prefix`, created on first use.
	///
	/// Entries whose transport was dropped are discarded on the way.
	pub(crate) fn get(&self, transport: &Arc<T>, prefix: &str) -> Arc<S> {
		let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

		entries.retain(|entry| entry.transport.strong_count() > 0);

		let address = Arc::as_ptr(transport).cast::<()>();

		if let Some(entry) = entries.iter().find(|entry| {
			entry.prefix == prefix && entry.transport.as_ptr().cast::<()>() == address
		}) {
			return Arc::clone(&entry.state);
		}

		let state = Arc::<S>::default();

		entries.push(Entry {
			transport: Arc::downgrade(transport),
			prefix: prefix.to_string(),
			state: Arc::clone(&state),
		});

		state
	}
}
