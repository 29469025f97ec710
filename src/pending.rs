//! Registry of in-flight authorization attempts, keyed by their one-time state token.
//!
//! `issue()` registers a state and hands back an [`AuthorizationFuture`]; the callback
//! handler later consumes that state exactly once and resolves the future. Entries
//! carry a deadline so an abandoned browser tab does not hold its slot forever:
//! [`PendingAuthorizations::purge_expired`] resolves overdue futures with
//! [`Error::AuthorizationExpired`] and drops them. The flow layer purges
//! opportunistically on every issue/complete call, so no background task is needed.

// crates.io
use tokio::sync::oneshot;
// self
use crate::{_prelude::*, auth::Credential};

/// Outcome delivered to an [`AuthorizationFuture`] once the callback completes.
pub type AuthorizationOutcome = Result<Credential>;

/// In-memory map from state token to a single-resolution outcome slot.
pub struct PendingAuthorizations {
	slots: Mutex<HashMap<String, PendingSlot>>,
	ttl: Duration,
}

struct PendingSlot {
	resolver: oneshot::Sender<AuthorizationOutcome>,
	deadline: OffsetDateTime,
}

impl PendingAuthorizations {
	/// Default lifetime of an unresolved authorization attempt.
	pub const DEFAULT_TTL: Duration = Duration::minutes(10);

	/// Creates an empty registry with the default entry lifetime.
	pub fn new() -> Self {
		Self { slots: Mutex::new(HashMap::new()), ttl: Self::DEFAULT_TTL }
	}

	/// Overrides the entry lifetime.
	pub fn with_ttl(mut self, ttl: Duration) -> Self {
		self.set_ttl(ttl);

		self
	}

	/// Changes the entry lifetime for future registrations.
	///
	/// Already-registered attempts keep the deadline they were given.
	pub fn set_ttl(&mut self, ttl: Duration) {
		self.ttl = ttl;
	}

	/// Registers a fresh state token and returns the future its callback resolves.
	pub fn register(&self, state: impl Into<String>) -> AuthorizationFuture {
		let (resolver, rx) = oneshot::channel();
		let deadline = OffsetDateTime::now_utc() + self.ttl;

		self.slots.lock().insert(state.into(), PendingSlot { resolver, deadline });

		AuthorizationFuture { rx }
	}

	/// Removes and returns the resolver for `state`.
	///
	/// Removal happens atomically under the registry lock, so a state can be consumed
	/// exactly once; a replayed callback gets `None`.
	pub fn consume(&self, state: &str) -> Option<PendingResolver> {
		self.slots
			.lock()
			.remove(state)
			.map(|slot| PendingResolver { state: state.to_owned(), resolver: slot.resolver })
	}

	/// Drops entries past their deadline, resolving their futures with
	/// [`Error::AuthorizationExpired`]. Returns how many entries were purged.
	pub fn purge_expired(&self, now: OffsetDateTime) -> usize {
		let expired: Vec<PendingSlot> = {
			let mut slots = self.slots.lock();
			let states: Vec<String> = slots
				.iter()
				.filter(|(_, slot)| slot.deadline <= now)
				.map(|(state, _)| state.clone())
				.collect();

			states.into_iter().filter_map(|state| slots.remove(&state)).collect()
		};
		let count = expired.len();

		for slot in expired {
			let _ = slot.resolver.send(Err(Error::AuthorizationExpired));
		}

		if count > 0 {
			tracing::debug!(count, "purged expired pending authorizations");
		}

		count
	}

	/// Number of unresolved attempts.
	pub fn len(&self) -> usize {
		self.slots.lock().len()
	}

	/// Returns `true` when no attempt is pending.
	pub fn is_empty(&self) -> bool {
		self.slots.lock().is_empty()
	}
}
impl Default for PendingAuthorizations {
	fn default() -> Self {
		Self::new()
	}
}
impl Debug for PendingAuthorizations {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PendingAuthorizations")
			.field("pending", &self.len())
			.field("ttl", &self.ttl)
			.finish()
	}
}

/// Resolver taken out of the registry by [`PendingAuthorizations::consume`].
pub struct PendingResolver {
	state: String,
	resolver: oneshot::Sender<AuthorizationOutcome>,
}
impl PendingResolver {
	/// The consumed state token.
	pub fn state(&self) -> &str {
		&self.state
	}

	/// Delivers the callback outcome to the waiting [`AuthorizationFuture`].
	///
	/// Delivery failure means the issuer dropped its future; the outcome still
	/// belongs to the callback caller, so it is simply discarded here.
	pub fn resolve(self, outcome: AuthorizationOutcome) {
		let _ = self.resolver.send(outcome);
	}
}
impl Debug for PendingResolver {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PendingResolver").field("state", &self.state).finish()
	}
}

/// Future returned by `issue()`; resolves when the matching callback completes, the
/// attempt expires, or the registry is dropped.
pub struct AuthorizationFuture {
	rx: oneshot::Receiver<AuthorizationOutcome>,
}
impl Future for AuthorizationFuture {
	type Output = AuthorizationOutcome;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		Pin::new(&mut self.rx).poll(cx).map(|received| match received {
			Ok(outcome) => outcome,
			// Registry (or its resolver) dropped without an explicit outcome.
			Err(_) => Err(Error::AuthorizationExpired),
		})
	}
}
impl Debug for AuthorizationFuture {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("AuthorizationFuture(..)")
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;
	use crate::auth::ScopeList;

	fn credential() -> Credential {
		Credential::new(
			"access",
			Duration::seconds(60),
			datetime!(2025-06-01 12:00 UTC),
			ScopeList::default(),
			None,
		)
	}

	#[tokio::test]
	async fn state_is_consumed_exactly_once() {
		let registry = PendingAuthorizations::new();
		let future = registry.register("state-1");
		let resolver = registry.consume("state-1").expect("First consume should succeed.");

		assert!(registry.consume("state-1").is_none(), "Replay must not find the state.");

		resolver.resolve(Ok(credential()));

		let outcome = future.await.expect("Resolved future should carry the credential.");

		assert_eq!(outcome.access_token().expose(), "access");
	}

	#[tokio::test]
	async fn purge_resolves_overdue_futures() {
		let registry = PendingAuthorizations::new().with_ttl(Duration::ZERO);
		let future = registry.register("stale");
		let purged = registry.purge_expired(OffsetDateTime::now_utc() + Duration::seconds(1));

		assert_eq!(purged, 1);
		assert!(registry.is_empty());
		assert!(matches!(future.await, Err(Error::AuthorizationExpired)));
	}

	#[tokio::test]
	async fn dropping_the_registry_expires_waiters() {
		let registry = PendingAuthorizations::new();
		let future = registry.register("orphan");

		drop(registry);

		assert!(matches!(future.await, Err(Error::AuthorizationExpired)));
	}

	#[test]
	fn fresh_entries_survive_a_purge() {
		let registry = PendingAuthorizations::new();
		let _future = registry.register("fresh");

		assert_eq!(registry.purge_expired(OffsetDateTime::now_utc()), 0);
		assert_eq!(registry.len(), 1);
	}
}
