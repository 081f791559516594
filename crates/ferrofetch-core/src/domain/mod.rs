//! # Domain Models
//!
//! Request-side value types shared by the fetcher and its collaborators.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Ticker`] | Opaque instrument identifier, forwarded verbatim |
//! | [`DateRange`] | Start/end date strings for historic price requests |
//! | [`ResponseFormat`] | Requested payload format (json, csv) |
//! | [`Endpoint`] | Data kinds served through the token-gated request path |
//!
//! None of these types interpret their contents: tickers and dates are
//! interpolated into request paths as given.

mod date_range;
mod endpoint;
mod format;
mod ticker;

pub(crate) use date_range::format_iso_date;
pub use date_range::{parse_iso_date, DateRange};
pub use endpoint::Endpoint;
pub use format::ResponseFormat;
pub use ticker::Ticker;
