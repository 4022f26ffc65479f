//! Companion utilities for a screen-reading game tracker.
//!
//! The substantial piece is [`telemetry`]: it supervises the PresentMon
//! frame-time exporter and turns its CSV stream into a polled
//! frames-per-second reading. [`region`] and [`seeds`] only define the
//! interfaces of the interactive setup overlay and the log-scraper
//! collaborators, which live outside this crate.

pub mod region;
pub mod seeds;
pub mod telemetry;

pub use region::{Rect, RegionPicker};
pub use seeds::SeedScraper;
pub use telemetry::FrameTracker;
