//! Credential domain: redacted token secrets, order-preserving scope lists, and the
//! persisted credential record shape.

pub mod credential;
pub mod scope;
pub mod secret;

pub use credential::*;
pub use scope::*;
pub use secret::*;
