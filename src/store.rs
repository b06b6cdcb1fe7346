//! Storage contract and built-in backends for session records and sign-in handshakes.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{PendingSignIn, SessionError, SessionId, SessionRecord, TokenSecret},
};

/// Boxed future returned by [`SessionStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract for gateway sessions.
pub trait SessionStore
where
	Self: Send + Sync,
{
	/// Persists or replaces the record keyed by its session id.
	fn save(&self, record: SessionRecord) -> StoreFuture<'_, ()>;

	/// Fetches the record for `session_id`, if present.
	fn fetch<'a>(&'a self, session_id: &'a SessionId) -> StoreFuture<'a, Option<SessionRecord>>;

	/// Atomically replaces the record if its refresh secret still equals `expected_refresh`.
	fn compare_and_swap_refresh<'a>(
		&'a self,
		session_id: &'a SessionId,
		expected_refresh: Option<&'a str>,
		replacement: SessionRecord,
	) -> StoreFuture<'a, CompareAndSwapOutcome>;

	/// Sets the error flag on a record, returning the flagged copy.
	fn flag<'a>(
		&'a self,
		session_id: &'a SessionId,
		error: SessionError,
	) -> StoreFuture<'a, Option<SessionRecord>>;

	/// Deletes a record, returning it when one existed.
	fn remove<'a>(&'a self, session_id: &'a SessionId) -> StoreFuture<'a, Option<SessionRecord>>;

	/// Persists an in-flight sign-in handshake keyed by its `state`.
	fn save_pending(&self, pending: PendingSignIn) -> StoreFuture<'_, ()>;

	/// Removes and returns the handshake for `state`; each handshake is handed out once.
	fn take_pending<'a>(&'a self, state: &'a str) -> StoreFuture<'a, Option<PendingSignIn>>;
}

/// Result of a refresh-token compare-and-swap attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareAndSwapOutcome {
	/// The refresh secret matched and the record was replaced.
	Updated,
	/// The record exists but another writer already rotated it.
	RefreshMismatch,
	/// No record exists (the session was signed out).
	Missing,
}

/// Error type produced by [`SessionStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Snapshot (de)serialization failed.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// In-process state shared by both backends.
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct StoreState {
	sessions: HashMap<SessionId, SessionRecord>,
	pending: HashMap<String, PendingSignIn>,
}
impl StoreState {
	fn save(&mut self, record: SessionRecord) {
		// Sessions whose browser never came back are swept on every insert.
		self.sweep_abandoned(OffsetDateTime::now_utc());
		self.sessions.insert(record.session_id.clone(), record);
	}

	fn sweep_abandoned(&mut self, now: OffsetDateTime) {
		let before = self.sessions.len();

		self.sessions.retain(|_, record| !record.is_abandoned_at(now));

		let swept = before - self.sessions.len();

		if swept > 0 {
			tracing::debug!(swept, "evicted abandoned sessions");
		}
	}

	fn fetch(&self, session_id: &SessionId) -> Option<SessionRecord> {
		self.sessions.get(session_id).cloned()
	}

	fn compare_and_swap_refresh(
		&mut self,
		session_id: &SessionId,
		expected_refresh: Option<&str>,
		replacement: SessionRecord,
	) -> CompareAndSwapOutcome {
		let outcome = match self.sessions.get(session_id) {
			Some(existing) if refresh_matches(existing.refresh_token.as_ref(), expected_refresh) =>
				CompareAndSwapOutcome::Updated,
			Some(_) => CompareAndSwapOutcome::RefreshMismatch,
			None => CompareAndSwapOutcome::Missing,
		};

		if outcome == CompareAndSwapOutcome::Updated {
			self.sessions.insert(session_id.clone(), replacement);
		}

		outcome
	}

	fn flag(&mut self, session_id: &SessionId, error: SessionError) -> Option<SessionRecord> {
		let record = self.sessions.get_mut(session_id)?;

		record.flag(error);

		Some(record.clone())
	}

	fn remove(&mut self, session_id: &SessionId) -> Option<SessionRecord> {
		self.sessions.remove(session_id)
	}

	fn save_pending(&mut self, pending: PendingSignIn) {
		let now = OffsetDateTime::now_utc();

		// Abandoned handshakes are swept on every insert.
		self.pending.retain(|_, existing| !existing.is_expired_at(now));
		self.pending.insert(pending.state.clone(), pending);
	}

	fn take_pending(&mut self, state: &str) -> Option<PendingSignIn> {
		self.pending.remove(state)
	}
}

fn refresh_matches(current: Option<&TokenSecret>, expected: Option<&str>) -> bool {
	current.map(TokenSecret::expose) == expected
}
