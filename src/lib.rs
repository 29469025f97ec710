//! Client-side governor for Reddit's OAuth2 API: credential lifecycle, quota-aware
//! throttling, and authorized request execution in one crate.
//!
//! The crate ties three pieces together:
//! - [`flows::Authenticator`] drives the authorization-code flow (issue an authorize URL,
//!   complete the one-shot callback, refresh) and owns the pending-state registry.
//! - [`limiter::RateLimiter`] is a continuously-refilling token bucket with a FIFO wait
//!   queue, reconciled against Reddit's reported quota counters.
//! - [`api::ApiClient`] executes authorized calls: acquire a permit, attach the bearer
//!   token, classify the response, and feed the reported rate-limit metadata back into
//!   the bucket.
//!
//! The HTTP listener/router that receives the callback, the storage layer that persists
//! a [`auth::CredentialRecord`], and process configuration sources are external
//! collaborators; the crate only exposes the seams they plug into.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod flows;
pub mod http;
pub mod limiter;
pub mod pending;

mod _prelude {
	pub use std::{
		collections::{HashMap, VecDeque},
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
		task::{Context, Poll},
		time::Duration as StdDuration,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::Client as ReqwestClient;
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
#[cfg(test)] use httpmock as _;
