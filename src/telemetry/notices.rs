use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

/// Kind of non-data line the exporter prints around its CSV output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamNotice {
    /// The exporter reported a failure (trace session denied, etc.)
    Error,
    /// An existing trace session was stopped or replaced
    SessionRestart,
    /// Version banners, hints, localized chatter
    Info,
}

static RE_ERROR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(^error\b|error:|failed|denied|unable to)").unwrap());

static RE_RESTART: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(restart|existing session|trace session)").unwrap());

impl StreamNotice {
    /// Classify one non-data exporter line. Errors take priority over
    /// restart banners since failure text often mentions the session too.
    pub fn classify(line: &str) -> StreamNotice {
        if RE_ERROR.is_match(line) {
            return StreamNotice::Error;
        }
        if RE_RESTART.is_match(line) {
            return StreamNotice::SessionRestart;
        }
        StreamNotice::Info
    }
}

/// Route one non-data exporter line to the log at a level matching its kind.
pub(crate) fn log_line(line: &str) {
    match StreamNotice::classify(line) {
        StreamNotice::Error => warn!("exporter: {line}"),
        StreamNotice::SessionRestart => debug!("exporter session notice: {line}"),
        StreamNotice::Info => debug!("exporter: {line}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_error() {
        assert_eq!(
            StreamNotice::classify("error: failed to start trace session"),
            StreamNotice::Error
        );
        assert_eq!(StreamNotice::classify("Access denied."), StreamNotice::Error);
    }

    #[test]
    fn test_detect_restart() {
        assert_eq!(
            StreamNotice::classify("Stopping existing session and restarting"),
            StreamNotice::SessionRestart
        );
        assert_eq!(
            StreamNotice::classify("Trace session started"),
            StreamNotice::SessionRestart
        );
    }

    #[test]
    fn test_plain_banner_is_info() {
        assert_eq!(StreamNotice::classify("PresentMon 2.0.0"), StreamNotice::Info);
    }
}
