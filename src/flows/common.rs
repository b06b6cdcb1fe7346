//! Helpers shared by the session flows.

// std
use std::ops::Deref;
// self
use crate::{_prelude::*, auth::SessionId, flows::SessionBroker, oauth::OidcFacade};

/// Joins scopes with the provider's delimiter.
pub(crate) fn format_scope(scopes: &[String], delimiter: char) -> Option<String> {
	if scopes.is_empty() {
		return None;
	}

	let mut joined = String::new();

	for (idx, scope) in scopes.iter().enumerate() {
		if idx > 0 {
			joined.push(delimiter);
		}

		joined.push_str(scope);
	}

	Some(joined)
}

/// Singleflight guard borrowed from the broker for one refresh.
///
/// Dropping the lease removes the map entry once no other request holds the guard, including
/// when the refreshing future is cancelled.
pub(crate) struct GuardLease<'a> {
	broker: &'a SessionBroker,
	session_id: &'a SessionId,
	guard: Arc<AsyncMutex<()>>,
}
impl Deref for GuardLease<'_> {
	type Target = AsyncMutex<()>;

	fn deref(&self) -> &Self::Target {
		&self.guard
	}
}
impl Drop for GuardLease<'_> {
	fn drop(&mut self) {
		let mut guards = self.broker.flow_guards.lock();

		// The map and this lease are the only holders; queued requests keep their own clone.
		if guards.get(self.session_id).is_some_and(|entry| {
			Arc::ptr_eq(entry, &self.guard) && Arc::strong_count(entry) == 2
		}) {
			guards.remove(self.session_id);
		}
	}
}

/// Leases (and creates on demand) the singleflight guard for a session.
pub(crate) fn flow_guard<'a>(
	broker: &'a SessionBroker,
	session_id: &'a SessionId,
) -> GuardLease<'a> {
	let guard = broker
		.flow_guards
		.lock()
		.entry(session_id.clone())
		.or_insert_with(|| Arc::new(AsyncMutex::new(())))
		.clone();

	GuardLease { broker, session_id, guard }
}

/// Drops the singleflight guard of a session that no longer exists.
pub(crate) fn release_guard(broker: &SessionBroker, session_id: &SessionId) {
	broker.flow_guards.lock().remove(session_id);
}

/// Builds the token-endpoint facade for the broker's client registration.
pub(crate) fn facade(broker: &SessionBroker) -> Result<OidcFacade<'_>> {
	OidcFacade::from_provider(
		&broker.provider,
		&broker.client_id,
		broker.client_secret.as_deref(),
		&broker.http_client,
		broker.strategy.as_ref(),
	)
}
