//! Configuration for dirgrid.

pub mod settings;

pub use settings::{Config, ListingConfig, RecentConfig, ThumbnailConfig};
