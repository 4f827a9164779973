//! Outbound HTTP plumbing shared by every API call.
//!
//! - [`transport`] - the [`Transport`] seam, [`ApiResponse`] and [`FetchError`]
//! - [`link`] - RFC 8288 `Link` header parsing for page continuation
//! - [`ratelimit`] - the process-wide [`RateLimiter`]
//!
//! The GitHub client, the response cache and test fakes all implement
//! [`Transport`], so callers are written once against the trait and the
//! stack underneath can be rearranged freely.

pub mod link;
pub mod ratelimit;
pub mod transport;

pub use link::{next_link, parse_link_header, LinkValue};
pub use ratelimit::{InvalidRate, RateLimiter};
pub use transport::{read_limited_text, ApiResponse, FetchError, Transport, MAX_RESPONSE_SIZE};
