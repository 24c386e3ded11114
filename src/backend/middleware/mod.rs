//! Middleware Module
//!
//! Request processing that runs before handlers.
//!
//! - **`auth`** - bearer-token middleware plus the `AuthUser` and
//!   `OptionalAuthUser` extractors
//! - **`invite`** - `InviteToken` extractor (path segment, then `X-Invite-Token`)
//! - **`client`** - `ClientIp` extractor for login rate limiting, and the
//!   `ClientIpSource` policy deciding whether proxy headers are believed

pub mod auth;
pub mod client;
pub mod invite;

pub use auth::{auth_middleware, bearer_token, AuthUser, AuthenticatedUser, OptionalAuthUser};
pub use client::{ClientIp, ClientIpSource};
pub use invite::{InviteToken, INVITE_TOKEN_HEADER};
