//! Self-correcting token bucket with a FIFO fairness queue.
//!
//! A bucket of `limit` tokens refills continuously at one token per
//! `window / limit` (the charge rate), capped at capacity. [`RateLimiter::acquire`]
//! claims a token synchronously when one is available and the queue is empty;
//! otherwise the caller joins the tail of a FIFO queue serviced by a single drain
//! task. The drain grants the head whenever a token has accrued, re-attempting the
//! new head with no artificial gap, and sleeps exactly until the next token
//! otherwise, so callers are granted strictly in arrival order, paced only by the
//! refill rate.
//!
//! [`RateLimiter::correct_from_provider`] lets server-reported quota counters
//! override local estimation drift at any moment, including mid-queue; a sleeping
//! drain is nudged awake so a generous correction takes effect immediately.

// crates.io
use tokio::{
	sync::{Notify, oneshot},
	time::{Instant, sleep_until},
};
// self
use crate::_prelude::*;

/// Continuously-refilling token bucket reconciled against server-reported quota.
///
/// Cloning is cheap; clones share the same bucket. Queued waiting relies on the
/// Tokio timer, so `acquire` must be called from within a Tokio runtime.
#[derive(Clone)]
pub struct RateLimiter {
	bucket: Arc<Mutex<Bucket>>,
	nudge: Arc<Notify>,
}
impl RateLimiter {
	/// Creates a full bucket for a quota of `limit` requests per `window`.
	///
	/// # Panics
	///
	/// Panics if `limit` is zero.
	pub fn new(window: StdDuration, limit: u32) -> Self {
		assert!(limit > 0, "rate limiter window limit must be positive");

		Self {
			bucket: Arc::new(Mutex::new(Bucket {
				window,
				limit,
				remaining: f64::from(limit),
				last_update: Instant::now(),
				queue: VecDeque::new(),
				drain_armed: false,
			})),
			nudge: Arc::new(Notify::new()),
		}
	}

	/// Acquires one unit of quota; the returned future resolves when it is granted.
	///
	/// The attempt is claimed at call time: an immediately-available token is debited
	/// before this function returns, and a caller that must wait occupies its queue
	/// slot right away. Dropping a still-queued future gives its slot up without
	/// consuming a token; a future granted at call time has already debited its
	/// token, which is lost if the future is dropped unawaited.
	pub fn acquire(&self) -> Acquire {
		let (rx, arm) = {
			let mut bucket = self.bucket.lock();

			bucket.refill(Instant::now());

			if bucket.queue.is_empty() && bucket.remaining >= 1.0 {
				bucket.remaining -= 1.0;

				return Acquire { state: AcquireState::Granted };
			}

			let (waiter, rx) = oneshot::channel();

			bucket.queue.push_back(waiter);
			tracing::trace!(queued = bucket.queue.len(), "rate limiter exhausted, queueing");

			let arm = !bucket.drain_armed;

			bucket.drain_armed = true;

			(rx, arm)
		};

		if arm {
			tokio::spawn(drain(self.bucket.clone(), self.nudge.clone()));
		}

		Acquire { state: AcquireState::Queued(rx) }
	}

	/// Reconciles the bucket against the provider's authoritative counters.
	///
	/// `reported_remaining` is the quota the server still grants inside the current
	/// window and `resets_in` the time until that window resets. The local estimate is
	/// replaced with `reported_remaining - resets_in / charge_rate`, which may well be
	/// negative after heavy use elsewhere.
	pub fn correct_from_provider(&self, resets_in: StdDuration, reported_remaining: f64) {
		{
			let mut bucket = self.bucket.lock();
			let refill_until_reset = resets_in.as_secs_f64() / bucket.charge_rate_secs();

			bucket.remaining = reported_remaining - refill_until_reset;
			bucket.last_update = Instant::now();

			tracing::debug!(
				remaining = bucket.remaining,
				reported_remaining,
				resets_in_secs = resets_in.as_secs_f64(),
				"rate limiter corrected from provider counters"
			);
		}

		// Wake a sleeping drain so a generous correction takes effect right away.
		self.nudge.notify_one();
	}

	/// Current token estimate after a lazy refill.
	pub fn remaining(&self) -> f64 {
		let mut bucket = self.bucket.lock();

		bucket.refill(Instant::now());

		bucket.remaining
	}

	/// Number of callers currently waiting for a grant.
	pub fn queue_len(&self) -> usize {
		self.bucket.lock().queue.len()
	}
}
impl Debug for RateLimiter {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let bucket = self.bucket.lock();

		f.debug_struct("RateLimiter")
			.field("window", &bucket.window)
			.field("limit", &bucket.limit)
			.field("remaining", &bucket.remaining)
			.field("queued", &bucket.queue.len())
			.finish()
	}
}

struct Bucket {
	window: StdDuration,
	limit: u32,
	remaining: f64,
	last_update: Instant,
	queue: VecDeque<oneshot::Sender<()>>,
	drain_armed: bool,
}
impl Bucket {
	fn charge_rate_secs(&self) -> f64 {
		self.window.as_secs_f64() / f64::from(self.limit)
	}

	fn refill(&mut self, now: Instant) {
		let elapsed = now.saturating_duration_since(self.last_update);

		self.remaining = (self.remaining + elapsed.as_secs_f64() / self.charge_rate_secs())
			.min(f64::from(self.limit));
		self.last_update = now;
	}

	fn time_to_next_token(&self) -> StdDuration {
		let deficit = (1.0 - self.remaining).max(0.0);

		StdDuration::from_secs_f64(deficit * self.charge_rate_secs())
	}

	fn drain_step(&mut self, now: Instant) -> DrainStep {
		self.refill(now);

		loop {
			let Some(head) = self.queue.front() else {
				self.drain_armed = false;

				return DrainStep::Idle;
			};

			if head.is_closed() {
				// Caller gave up while queued; its slot costs nothing.
				self.queue.pop_front();

				continue;
			}
			if self.remaining < 1.0 {
				return DrainStep::SleepUntil(now + self.time_to_next_token());
			}

			self.remaining -= 1.0;

			if let Some(waiter) = self.queue.pop_front()
				&& waiter.send(()).is_err()
			{
				// Lost the race with a cancellation; refund the token.
				self.remaining += 1.0;
			}
		}
	}
}

enum DrainStep {
	Idle,
	SleepUntil(Instant),
}

async fn drain(bucket: Arc<Mutex<Bucket>>, nudge: Arc<Notify>) {
	loop {
		let step = bucket.lock().drain_step(Instant::now());

		match step {
			DrainStep::Idle => return,
			DrainStep::SleepUntil(deadline) => {
				tokio::select! {
					_ = sleep_until(deadline) => {},
					_ = nudge.notified() => {},
				}
			},
		}
	}
}

enum AcquireState {
	Granted,
	Queued(oneshot::Receiver<()>),
}

/// Future returned by [`RateLimiter::acquire`].
pub struct Acquire {
	state: AcquireState,
}
impl Future for Acquire {
	type Output = ();

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		match &mut self.state {
			AcquireState::Granted => Poll::Ready(()),
			AcquireState::Queued(rx) => Pin::new(rx).poll(cx).map(|_| ()),
		}
	}
}
impl Debug for Acquire {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self.state {
			AcquireState::Granted => f.write_str("Acquire(granted)"),
			AcquireState::Queued(_) => f.write_str("Acquire(queued)"),
		}
	}
}
