//! Release collection and feed export.
//!
//! - [`collect`] - concurrent latest-release lookup for a list of repositories
//! - [`opml`] - OPML 2.0 outline document for feed readers
//! - [`osmos`] - osmosfeed `sources` list
//!
//! # Example
//!
//! ```ignore
//! use starfeed::feed::{collect, opml};
//!
//! let records = collect(&transport, &repos).await;
//! opml::export_to_file(&records, Path::new(opml::DEFAULT_OPML_FILE))?;
//! ```

mod aggregator;
pub mod opml;
pub mod osmos;

pub use aggregator::collect;
