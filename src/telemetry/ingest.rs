use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, error};

use super::notices;
use super::Shared;

/// Substring that marks the per-frame latency column in the exporter's
/// header row. Matched case-insensitively because casing has varied across
/// PresentMon releases.
const LATENCY_HEADER: &str = "msbetweenpresents";

/// Read the exporter's output line by line until the stream ends or
/// `running` is cleared, appending valid latency samples to `shared`.
///
/// The column order of the CSV is not fixed, so the loop runs in two
/// phases: every line is scanned for the latency header until its index is
/// found, then that fixed index is extracted from each following row.
/// Malformed input is discarded at the smallest granularity that contains
/// it: invalid bytes are dropped from the line, short rows and unparseable
/// or non-positive fields are skipped whole. Nothing here propagates an
/// error to the caller.
pub(crate) async fn run<R>(reader: R, shared: Arc<Mutex<Shared>>, running: Arc<AtomicBool>)
where
    R: AsyncBufRead + Unpin,
{
    let mut segments = reader.split(b'\n');
    let mut latency_idx: Option<usize> = None;

    loop {
        if !running.load(Ordering::SeqCst) {
            break;
        }

        let raw = match segments.next_segment().await {
            Ok(Some(raw)) => raw,
            // Producer exited and the pipe closed: normal termination.
            Ok(None) => break,
            Err(e) => {
                if running.load(Ordering::SeqCst) {
                    error!("telemetry pipe read failed: {e}");
                }
                break;
            }
        };

        let line = decode_dropping_invalid(&raw);
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(',').collect();
        match latency_idx {
            None => match find_latency_column(&fields) {
                Some(idx) => {
                    debug!(column = idx, "located {LATENCY_HEADER} column");
                    latency_idx = Some(idx);
                }
                // Restart banners and other chatter can precede the header.
                None => notices::log_line(line),
            },
            Some(idx) => {
                if let Some(ms) = parse_latency(&fields, idx) {
                    super::lock(&shared).frame_times.push(ms);
                }
            }
        }
    }

    debug!("telemetry ingest loop finished");
}

/// UTF-8 decode that drops invalid byte sequences instead of failing the
/// line. Localized exporter builds emit bytes outside UTF-8 in some
/// columns; the rest of the line is still usable.
pub(crate) fn decode_dropping_invalid(raw: &[u8]) -> String {
    raw.utf8_chunks().map(|chunk| chunk.valid()).collect()
}

fn find_latency_column(fields: &[&str]) -> Option<usize> {
    fields
        .iter()
        .position(|f| f.to_ascii_lowercase().contains(LATENCY_HEADER))
}

/// Extract the latency field of one data row. `None` for rows that are too
/// short, non-numeric at the target column, or carry a non-positive value
/// (zero or negative frame time marks a non-frame row).
fn parse_latency(fields: &[&str], idx: usize) -> Option<f64> {
    let ms: f64 = fields.get(idx)?.trim().parse().ok()?;
    (ms > 0.0).then_some(ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    async fn ingest(data: &[u8]) -> Vec<f64> {
        let shared = Arc::new(Mutex::new(Shared::default()));
        let running = Arc::new(AtomicBool::new(true));
        run(BufReader::new(data), Arc::clone(&shared), running).await;
        let samples = super::super::lock(&shared).frame_times.clone();
        samples
    }

    #[tokio::test]
    async fn header_is_found_in_any_column_and_case() {
        let samples = ingest(b"Application,MSBETWEENPRESENTS,Runtime\na,9.5,b\n").await;
        assert_eq!(samples, vec![9.5]);

        let samples = ingest(b"msbetweenpresents\n16.7\n").await;
        assert_eq!(samples, vec![16.7]);
    }

    #[tokio::test]
    async fn lines_before_header_are_consumed_without_samples() {
        let data = b"PresentMon 2.0\nstopping existing session\n\
                     App,MsBetweenPresents\na,8.0\n";
        assert_eq!(ingest(data).await, vec![8.0]);
    }

    #[tokio::test]
    async fn no_header_means_no_samples() {
        assert_eq!(ingest(b"a,b,c\n1.0,2.0,3.0\n").await, Vec::<f64>::new());
    }

    #[tokio::test]
    async fn short_rows_are_skipped() {
        let data = b"a,b,MsBetweenPresents\nx,1.0\nx,y,4.0\n";
        assert_eq!(ingest(data).await, vec![4.0]);
    }

    #[tokio::test]
    async fn non_numeric_and_non_positive_fields_are_skipped() {
        let data = b"App,MsBetweenPresents\na,N/A\na,0.0\na,-3.5\na,6.25\n";
        assert_eq!(ingest(data).await, vec![6.25]);
    }

    #[tokio::test]
    async fn blank_and_crlf_lines_are_tolerated() {
        let data = b"App,MsBetweenPresents\r\n\r\n\na,12.5\r\n";
        assert_eq!(ingest(data).await, vec![12.5]);
    }

    #[tokio::test]
    async fn invalid_bytes_outside_the_field_are_dropped() {
        // 0xFF/0xFE are not valid UTF-8; the value survives the decode.
        let data = b"App,MsBetweenPresents\ngame-\xff\xfe.exe,8.0\n";
        assert_eq!(ingest(data).await, vec![8.0]);
    }

    #[tokio::test]
    async fn invalid_bytes_destroying_the_field_skip_the_row() {
        let data = b"App,MsBetweenPresents\ngame.exe,\xff\xfe\ngame.exe,8.0\n";
        assert_eq!(ingest(data).await, vec![8.0]);
    }

    #[tokio::test]
    async fn cleared_running_flag_stops_the_loop() {
        let shared = Arc::new(Mutex::new(Shared::default()));
        let running = Arc::new(AtomicBool::new(false));
        let data: &[u8] = b"App,MsBetweenPresents\na,8.0\n";
        run(BufReader::new(data), Arc::clone(&shared), running).await;
        assert!(super::super::lock(&shared).frame_times.is_empty());
    }

    #[test]
    fn decode_drops_only_the_invalid_bytes() {
        assert_eq!(decode_dropping_invalid(b"abc"), "abc");
        assert_eq!(decode_dropping_invalid(b"a\xffb\xfe\xfdc"), "abc");
        // Valid multi-byte sequences pass through untouched.
        assert_eq!(decode_dropping_invalid("gr\u{fc}n".as_bytes()), "gr\u{fc}n");
    }

    #[test]
    fn latency_parse_rejects_junk() {
        assert_eq!(parse_latency(&["a", "8.5"], 1), Some(8.5));
        assert_eq!(parse_latency(&["a", " 8.5 "], 1), Some(8.5));
        assert_eq!(parse_latency(&["a"], 1), None);
        assert_eq!(parse_latency(&["a", "NaN"], 1), None);
        assert_eq!(parse_latency(&["a", "0"], 1), None);
    }
}
