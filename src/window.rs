//! # Query Window Planning
//!
//! Nightscout answers glucose queries over wide ranges slowly or not at all,
//! so a request for `[start, end]` is split into consecutive windows no wider
//! than the configured maximum and fetched one after the other. The maximum
//! may be narrowed by configuration but never widened past 7 days.
//!
//! ## Algorithm
//! ```text
//! current_start = start
//! loop:
//!     current_end = min(end, current_start + max_span)
//!     fetch [current_start, current_end]          (both bounds inclusive)
//!     if current_end < end: current_start = current_end
//!     else: stop
//! ```
//!
//! Adjacent windows share their boundary instant. The server's range filter
//! is inclusive on both sides, so a reading taken exactly at a boundary can
//! appear twice in the concatenated result. [`dedupe_by_id`] removes such
//! repeats when the caller asks for it.
//!
//! At least one window is always produced, also for an empty or inverted
//! range; the server then answers with whatever matches that filter.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use std::future::Future;
use tracing::debug;

/// Default and widest span of one glucose query.
pub const DEFAULT_MAX_SPAN_DAYS: i64 = 7;

/// Clamp a requested span to `(0, 7 days]`; non-positive spans get 7 days.
pub fn effective_span(max_span: Duration) -> Duration {
    let ceiling = Duration::days(DEFAULT_MAX_SPAN_DAYS);
    if max_span > Duration::zero() {
        max_span.min(ceiling)
    } else {
        ceiling
    }
}

/// One bounded sub-range, inclusive on both ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueryWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Split `[start, end]` into windows no wider than `max_span`, itself capped
/// at 7 days.
///
/// # Example
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use nightscout_client::window::plan_windows;
///
/// let start = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
/// let end = Utc.with_ymd_and_hms(2023, 1, 20, 0, 0, 0).unwrap();
/// let windows = plan_windows(start, end, Duration::days(7));
///
/// assert_eq!(windows.len(), 3);
/// assert_eq!(windows[2].end, end);
/// ```
pub fn plan_windows(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    max_span: Duration,
) -> Vec<QueryWindow> {
    let max_span = effective_span(max_span);

    let mut windows = Vec::new();
    let mut current_start = start;

    loop {
        let current_end = window_end(current_start, end, max_span);
        windows.push(QueryWindow {
            start: current_start,
            end: current_end,
        });

        if current_end < end {
            current_start = current_end;
        } else {
            break;
        }
    }

    windows
}

/// `min(end, start + max_span)`, saturating at the end of representable time.
fn window_end(start: DateTime<Utc>, end: DateTime<Utc>, max_span: Duration) -> DateTime<Utc> {
    match start.checked_add_signed(max_span) {
        Some(limit) if limit < end => limit,
        _ => end,
    }
}

/// Fetch every window in order and concatenate the results.
///
/// Each window is awaited before the next one is requested. The first error
/// aborts the whole operation; no partial results are returned.
pub async fn fetch_windows<T, E, F, Fut>(windows: &[QueryWindow], mut fetch: F) -> Result<Vec<T>, E>
where
    F: FnMut(QueryWindow) -> Fut,
    Fut: Future<Output = Result<Vec<T>, E>>,
{
    let mut collected = Vec::new();

    for (index, window) in windows.iter().enumerate() {
        debug!(
            window = index + 1,
            of = windows.len(),
            start = %window.start,
            end = %window.end,
            "fetching window"
        );
        let mut batch = fetch(*window).await?;
        collected.append(&mut batch);
    }

    Ok(collected)
}

/// Drop items whose key was already seen, keeping the first occurrence.
pub fn dedupe_by_id<T, K, F>(items: Vec<T>, mut key: F) -> Vec<T>
where
    K: Eq + std::hash::Hash,
    F: FnMut(&T) -> K,
{
    let mut seen = HashSet::new();
    items.into_iter().filter(|item| seen.insert(key(item))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 1, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_three_windows_for_nineteen_days() {
        let windows = plan_windows(day(1), day(20), Duration::days(7));
        assert_eq!(
            windows,
            vec![
                QueryWindow { start: day(1), end: day(8) },
                QueryWindow { start: day(8), end: day(15) },
                QueryWindow { start: day(15), end: day(20) },
            ]
        );
    }

    #[test]
    fn test_window_count_is_ceiling_and_windows_are_contiguous() {
        let span = Duration::days(7);
        let start = day(1);
        for hours in [1i64, 24 * 7, 24 * 7 + 1, 24 * 14, 24 * 20 + 5, 24 * 27] {
            let end = start + Duration::hours(hours);
            let windows = plan_windows(start, end, span);

            let expected = (hours + span.num_hours() - 1) / span.num_hours();
            assert_eq!(windows.len() as i64, expected, "span of {hours}h");

            assert_eq!(windows.first().unwrap().start, start);
            assert_eq!(windows.last().unwrap().end, end);
            for pair in windows.windows(2) {
                assert_eq!(pair[0].end, pair[1].start);
            }
            assert!(windows.iter().all(|w| w.end - w.start <= span));
        }
    }

    #[test]
    fn test_degenerate_ranges_yield_one_window() {
        assert_eq!(plan_windows(day(5), day(5), Duration::days(7)).len(), 1);

        let inverted = plan_windows(day(5), day(2), Duration::days(7));
        assert_eq!(inverted, vec![QueryWindow { start: day(5), end: day(2) }]);
    }

    #[test]
    fn test_non_positive_span_falls_back_to_default() {
        let windows = plan_windows(day(1), day(20), Duration::zero());
        assert_eq!(windows.len(), 3);
    }

    #[test]
    fn test_wide_span_is_capped_at_seven_days() {
        let windows = plan_windows(day(1), day(20), Duration::days(30));
        assert_eq!(windows.len(), 3);
        assert!(windows.iter().all(|w| w.end - w.start <= Duration::days(7)));

        assert_eq!(effective_span(Duration::days(3)), Duration::days(3));
        assert_eq!(effective_span(Duration::MAX), Duration::days(7));
        assert_eq!(effective_span(Duration::days(-2)), Duration::days(7));
    }

    #[tokio::test]
    async fn test_fetch_windows_concatenates_in_order() {
        let windows = plan_windows(day(1), day(20), Duration::days(7));
        let result: Result<Vec<DateTime<Utc>>, String> =
            fetch_windows(&windows, |w| async move { Ok(vec![w.start, w.end]) }).await;

        assert_eq!(
            result.unwrap(),
            vec![day(1), day(8), day(8), day(15), day(15), day(20)]
        );
    }

    #[tokio::test]
    async fn test_fetch_windows_aborts_on_first_error() {
        let windows = plan_windows(day(1), day(20), Duration::days(7));
        let mut calls = 0;
        let result: Result<Vec<u32>, String> = fetch_windows(&windows, |w| {
            calls += 1;
            let fail = w.start == day(8);
            async move {
                if fail {
                    Err("timeout".to_string())
                } else {
                    Ok(vec![1])
                }
            }
        })
        .await;

        assert_eq!(result.unwrap_err(), "timeout");
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_dedupe_keeps_first_occurrence() {
        let items = vec![("a", 1), ("b", 2), ("a", 3), ("c", 4), ("b", 5)];
        let unique = dedupe_by_id(items, |item| item.0);
        assert_eq!(unique, vec![("a", 1), ("b", 2), ("c", 4)]);
    }
}
