//! Thread-safe in-memory [`SessionStore`] for single-instance deployments and tests.

// self
use crate::{
	_prelude::*,
	auth::{PendingSignIn, SessionError, SessionId, SessionRecord},
	store::{CompareAndSwapOutcome, SessionStore, StoreFuture, StoreState},
};

/// Keeps sessions in-process behind a `parking_lot` lock.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Arc<RwLock<StoreState>>);
impl MemoryStore {
	/// Number of live sessions.
	pub fn session_count(&self) -> usize {
		self.0.read().sessions.len()
	}
}
impl SessionStore for MemoryStore {
	fn save(&self, record: SessionRecord) -> StoreFuture<'_, ()> {
		let state = self.0.clone();

		Box::pin(async move {
			state.write().save(record);

			Ok(())
		})
	}

	fn fetch<'a>(&'a self, session_id: &'a SessionId) -> StoreFuture<'a, Option<SessionRecord>> {
		Box::pin(async move { Ok(self.0.read().fetch(session_id)) })
	}

	fn compare_and_swap_refresh<'a>(
		&'a self,
		session_id: &'a SessionId,
		expected_refresh: Option<&'a str>,
		replacement: SessionRecord,
	) -> StoreFuture<'a, CompareAndSwapOutcome> {
		Box::pin(async move {
			Ok(self.0.write().compare_and_swap_refresh(session_id, expected_refresh, replacement))
		})
	}

	fn flag<'a>(
		&'a self,
		session_id: &'a SessionId,
		error: SessionError,
	) -> StoreFuture<'a, Option<SessionRecord>> {
		Box::pin(async move { Ok(self.0.write().flag(session_id, error)) })
	}

	fn remove<'a>(&'a self, session_id: &'a SessionId) -> StoreFuture<'a, Option<SessionRecord>> {
		Box::pin(async move { Ok(self.0.write().remove(session_id)) })
	}

	fn save_pending(&self, pending: PendingSignIn) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			self.0.write().save_pending(pending);

			Ok(())
		})
	}

	fn take_pending<'a>(&'a self, state: &'a str) -> StoreFuture<'a, Option<PendingSignIn>> {
		Box::pin(async move { Ok(self.0.write().take_pending(state)) })
	}
}
