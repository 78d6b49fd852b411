//! Authorization decisions for Gatehouse.
//!
//! Given an already authenticated [`Identity`](gatehouse_protocol::Identity),
//! decide whether it may proceed. Nothing here touches HTTP; the
//! `gatehouse` crate wraps these decisions in axum middleware.
//!
//! # Key types
//!
//! - [`Gate`] — the three requirements: role, self-or-role, team
//! - [`Target`] — what the request is about (user and/or team from the path)
//! - [`MembershipSource`] — team-membership lookups, implemented by the caller
//! - [`AuthzError`] — why a request was denied
//!
//! Every gate fails closed: if the membership lookup errors, the answer is
//! an error, never "allow".

mod error;
mod gate;
mod membership;

pub use error::{AuthzError, MembershipError};
pub use gate::{Gate, Target, may_manage};
pub use membership::MembershipSource;
