//! Error types for the authorization layer.

/// Why an authorization check did not allow the request.
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// The identity is valid but its role or membership is insufficient.
    #[error("forbidden")]
    Forbidden,

    /// The gate needs a path parameter the route does not provide. This is
    /// a routing mistake, not a client error.
    #[error("route is missing the {0} parameter required by its gate")]
    MissingTarget(&'static str),

    /// The membership lookup failed. The request is denied.
    #[error(transparent)]
    Membership(#[from] MembershipError),
}

/// A failed team-membership lookup in the relational store.
#[derive(Debug, thiserror::Error)]
#[error("membership lookup failed: {0}")]
pub struct MembershipError(pub String);
