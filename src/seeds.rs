use anyhow::Result;

/// Log-file seed scraper: scans the game's session log and reports the most
/// recent map seed. Implemented by a collaborator that knows the log's
/// location and line format; this crate only consumes what it returns.
pub trait SeedScraper {
    /// Scan the log once and return the last seed found, if any.
    fn scan_latest(&mut self) -> Result<Option<String>>;
}
