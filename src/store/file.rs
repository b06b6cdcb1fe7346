//! File-backed [`SessionStore`] that survives gateway restarts.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	auth::{PendingSignIn, SessionError, SessionId, SessionRecord},
	store::{CompareAndSwapOutcome, SessionStore, StoreError, StoreFuture, StoreState},
};

/// Persists sessions to a JSON snapshot, rewritten atomically after each mutation.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	inner: Arc<RwLock<StoreState>>,
}
impl FileStore {
	/// Opens (or creates) a store at `path`, eagerly loading an existing snapshot.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		ensure_parent_exists(&path)?;

		let mut state = load_snapshot(&path)?;

		state.sweep_abandoned(OffsetDateTime::now_utc());

		Ok(Self { path, inner: Arc::new(RwLock::new(state)) })
	}

	/// Location of the snapshot file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn mutate<T>(&self, f: impl FnOnce(&mut StoreState) -> T) -> Result<T, StoreError> {
		let mut guard = self.inner.write();
		let value = f(&mut *guard);

		persist(&self.path, &guard)?;

		Ok(value)
	}
}
impl SessionStore for FileStore {
	fn save(&self, record: SessionRecord) -> StoreFuture<'_, ()> {
		Box::pin(async move { self.mutate(|state| state.save(record)) })
	}

	fn fetch<'a>(&'a self, session_id: &'a SessionId) -> StoreFuture<'a, Option<SessionRecord>> {
		Box::pin(async move { Ok(self.inner.read().fetch(session_id)) })
	}

	fn compare_and_swap_refresh<'a>(
		&'a self,
		session_id: &'a SessionId,
		expected_refresh: Option<&'a str>,
		replacement: SessionRecord,
	) -> StoreFuture<'a, CompareAndSwapOutcome> {
		Box::pin(async move {
			self.mutate(|state| {
				state.compare_and_swap_refresh(session_id, expected_refresh, replacement)
			})
		})
	}

	fn flag<'a>(
		&'a self,
		session_id: &'a SessionId,
		error: SessionError,
	) -> StoreFuture<'a, Option<SessionRecord>> {
		Box::pin(async move { self.mutate(|state| state.flag(session_id, error)) })
	}

	fn remove<'a>(&'a self, session_id: &'a SessionId) -> StoreFuture<'a, Option<SessionRecord>> {
		Box::pin(async move { self.mutate(|state| state.remove(session_id)) })
	}

	fn save_pending(&self, pending: PendingSignIn) -> StoreFuture<'_, ()> {
		Box::pin(async move { self.mutate(|state| state.save_pending(pending)) })
	}

	fn take_pending<'a>(&'a self, state: &'a str) -> StoreFuture<'a, Option<PendingSignIn>> {
		Box::pin(async move { self.mutate(|inner| inner.take_pending(state)) })
	}
}

fn load_snapshot(path: &Path) -> Result<StoreState, StoreError> {
	if !path.exists() {
		return Ok(StoreState::default());
	}

	let bytes = fs::read(path).map_err(|e| StoreError::Backend {
		message: format!("Failed to read {}: {e}", path.display()),
	})?;

	if bytes.is_empty() {
		return Ok(StoreState::default());
	}

	serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
		message: format!("Failed to parse {}: {e}", path.display()),
	})
}

fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
	if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
		fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
			message: format!("Failed to create store directory {}: {e}", parent.display()),
		})?;
	}

	Ok(())
}

fn persist(path: &Path, state: &StoreState) -> Result<(), StoreError> {
	let serialized = serde_json::to_vec_pretty(state).map_err(|e| StoreError::Serialization {
		message: format!("Failed to serialize store snapshot: {e}"),
	})?;
	let tmp_path = path.with_extension("tmp");

	{
		let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
			message: format!("Failed to create {}: {e}", tmp_path.display()),
		})?;

		file.write_all(&serialized).map_err(|e| StoreError::Backend {
			message: format!("Failed to write {}: {e}", tmp_path.display()),
		})?;
		file.sync_all().map_err(|e| StoreError::Backend {
			message: format!("Failed to sync {}: {e}", tmp_path.display()),
		})?;
	}

	fs::rename(&tmp_path, path).map_err(|e| StoreError::Backend {
		message: format!("Failed to replace {}: {e}", path.display()),
	})
}
