// self
use agro_gateway::{
	_preludet::*,
	auth::{PendingSignIn, SessionError, SessionId, SessionRecord, SessionStatus, TokenSecret},
	store::{CompareAndSwapOutcome, MemoryStore, SessionStore},
};

fn session_id(value: &str) -> SessionId {
	SessionId::new(value).expect("Failed to build session identifier for memory store tests.")
}

fn build_record(id: &SessionId, access: &str, refresh: Option<&str>) -> SessionRecord {
	let issued = OffsetDateTime::now_utc();
	let mut builder = SessionRecord::builder(id.clone())
		.access_token(access)
		.issued_at(issued)
		.expires_at(issued + Duration::hours(1));

	if let Some(value) = refresh {
		builder = builder.refresh_token(value);
	}

	builder.build().expect("Session record fixture should build successfully.")
}

#[tokio::test]
async fn save_fetch_and_remove() {
	let store = MemoryStore::default();
	let id = session_id("sess-round-trip");

	store
		.save(build_record(&id, "access-1", Some("refresh-1")))
		.await
		.expect("Saving into the memory store should succeed.");

	let fetched = store
		.fetch(&id)
		.await
		.expect("Fetching from the memory store should succeed.")
		.expect("Saved session should be present.");

	assert_eq!(fetched.access_token.expose(), "access-1");
	assert_eq!(store.session_count(), 1);

	let removed = store.remove(&id).await.expect("Removal should succeed.");

	assert!(removed.is_some());
	assert!(store.fetch(&id).await.expect("Fetch should succeed.").is_none());
	assert!(store.remove(&id).await.expect("Second removal should succeed.").is_none());
}

#[tokio::test]
async fn concurrent_cas_allows_single_winner() {
	let store = MemoryStore::default();
	let id = session_id("sess-race");

	store
		.save(build_record(&id, "access-base", Some("refresh-base")))
		.await
		.expect("Saving the base record should succeed.");

	let spawn_swap = |label: &'static str| {
		let store = store.clone();
		let id = id.clone();

		tokio::spawn(async move {
			let replacement =
				build_record(&id, &format!("access-{label}"), Some(&format!("refresh-{label}")));

			store
				.compare_and_swap_refresh(&id, Some("refresh-base"), replacement)
				.await
				.expect("CAS task should complete successfully.")
		})
	};
	let (outcome_a, outcome_b) = tokio::join!(spawn_swap("a"), spawn_swap("b"));
	let outcomes = [
		outcome_a.expect("CAS task A should not panic."),
		outcome_b.expect("CAS task B should not panic."),
	];

	assert_eq!(outcomes.iter().filter(|o| **o == CompareAndSwapOutcome::Updated).count(), 1);
	assert!(outcomes.contains(&CompareAndSwapOutcome::RefreshMismatch));

	let winner = store
		.fetch(&id)
		.await
		.expect("Fetching the final record should succeed.")
		.expect("Final record should remain present.");

	assert!(matches!(
		winner.refresh_token.as_ref().map(TokenSecret::expose),
		Some("refresh-a") | Some("refresh-b")
	));
}

#[tokio::test]
async fn cas_on_signed_out_session_reports_missing() {
	let store = MemoryStore::default();
	let id = session_id("sess-gone");
	let outcome = store
		.compare_and_swap_refresh(&id, Some("refresh"), build_record(&id, "access", None))
		.await
		.expect("CAS should report a missing record.");

	assert_eq!(outcome, CompareAndSwapOutcome::Missing);
	assert_eq!(store.session_count(), 0);
}

#[tokio::test]
async fn flagged_records_report_failed_status() {
	let store = MemoryStore::default();
	let id = session_id("sess-flag");

	store.save(build_record(&id, "access", Some("refresh"))).await.expect("Save should succeed.");

	let flagged = store
		.flag(&id, SessionError::RefreshAccessTokenError)
		.await
		.expect("Flagging should succeed.")
		.expect("Flagged record should be returned.");

	assert_eq!(flagged.error, Some(SessionError::RefreshAccessTokenError));
	assert_eq!(flagged.status(), SessionStatus::Failed);
	assert!(
		store
			.flag(&session_id("sess-unknown"), SessionError::RefreshAccessTokenError)
			.await
			.expect("Flagging an unknown session should succeed.")
			.is_none()
	);
}

#[tokio::test]
async fn pending_handshakes_are_single_use() {
	let store = MemoryStore::default();

	store
		.save_pending(PendingSignIn::new("state-1", TokenSecret::new("verifier"), "/forum"))
		.await
		.expect("Saving a handshake should succeed.");

	let pending = store
		.take_pending("state-1")
		.await
		.expect("Taking a handshake should succeed.")
		.expect("Handshake should be present.");

	assert_eq!(pending.return_to, "/forum");
	assert_eq!(pending.pkce_verifier.expose(), "verifier");
	assert!(store.take_pending("state-1").await.expect("Second take should succeed.").is_none());
}

#[tokio::test]
async fn saving_evicts_sessions_nobody_can_resume() {
	let store = MemoryStore::default();
	let mut long_gone = build_record(&session_id("sess-long-gone"), "access", Some("refresh"));
	let mut unrefreshable = build_record(&session_id("sess-no-refresh"), "access", None);
	let mut idle = build_record(&session_id("sess-idle"), "access", Some("refresh"));

	long_gone.expires_at -= SessionRecord::RETENTION + Duration::hours(2);
	unrefreshable.expires_at -= Duration::hours(2);
	idle.expires_at -= Duration::hours(2);

	for record in [long_gone, unrefreshable, idle] {
		store.save(record).await.expect("Save should succeed.");
	}

	store
		.save(build_record(&session_id("sess-active"), "access", Some("refresh")))
		.await
		.expect("Save should succeed.");

	assert_eq!(store.session_count(), 2);
	assert!(store.fetch(&session_id("sess-idle")).await.expect("Fetch should succeed.").is_some());
	assert!(
		store.fetch(&session_id("sess-long-gone")).await.expect("Fetch should succeed.").is_none()
	);
}
