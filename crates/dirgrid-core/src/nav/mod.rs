//! Navigation state that outlives a single listing.

pub mod recent;

pub use recent::{RecentPaths, RecentPathsStore, MAX_RECENT_PATHS};
