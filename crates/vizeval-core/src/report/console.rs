use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::aspect::Aspect;
use crate::report::progress::{ProgressEvent, ProgressSink};
use crate::scoring::{ILLEGAL_RATE, INVALID_RATE, PASS_RATE, QUALITY_SCORE, READABILITY_SCORE};

#[must_use]
pub fn format_progress_line(done: usize, total: usize) -> String {
    format!("Running test {}/{}...", done, total)
}

const PROGRESS_MIN_INTERVAL_MS: u64 = 200;

pub(crate) fn progress_step(total: usize) -> usize {
    if total <= 10 {
        1
    } else {
        std::cmp::max(1, total / 10)
    }
}

struct ThrottleState {
    last_emit: Option<Instant>,
}

/// Throttled stderr progress. `None` for runs of zero or one test. The
/// final update is always printed.
pub fn default_progress_sink(total: usize) -> Option<ProgressSink> {
    if total <= 1 {
        return None;
    }
    let step = progress_step(total);
    let state = Arc::new(Mutex::new(ThrottleState { last_emit: None }));
    Some(Arc::new(move |ev: ProgressEvent| {
        if ev.total == 0 {
            return;
        }
        let now = Instant::now();
        let should_emit = {
            let mut g = state.lock().unwrap_or_else(PoisonError::into_inner);
            let emit_final = ev.done == ev.total;
            let emit_step = ev.done % step == 0 || ev.done == 1;
            let interval_ok = g
                .last_emit
                .map(|t| {
                    now.saturating_duration_since(t)
                        >= Duration::from_millis(PROGRESS_MIN_INTERVAL_MS)
                })
                .unwrap_or(true);
            let ok = emit_final || (emit_step && interval_ok);
            if ok {
                g.last_emit = Some(now);
            }
            ok
        };
        if should_emit {
            eprintln!("{}", format_progress_line(ev.done, ev.total));
        }
    }))
}

/// `rate` metrics as percentages, everything else with one decimal.
pub fn format_score_line(name: &str, value: f64) -> String {
    if name.ends_with("rate") {
        format!("  {}: {:.1}%", name, value * 100.0)
    } else {
        format!("  {}: {:.1}", name, value)
    }
}

/// Headline metrics first, then fail rates in pipeline order, then anything
/// else alphabetically.
pub fn ordered_metrics(scores: &BTreeMap<String, f64>) -> Vec<(&str, f64)> {
    let mut order: Vec<String> = [INVALID_RATE, ILLEGAL_RATE, PASS_RATE, READABILITY_SCORE, QUALITY_SCORE]
        .iter()
        .map(|k| k.to_string())
        .collect();
    order.extend(Aspect::ALL.iter().map(Aspect::fail_rate_key));

    let mut out: Vec<(&str, f64)> = order
        .iter()
        .filter_map(|k| scores.get_key_value(k.as_str()))
        .map(|(k, v)| (k.as_str(), *v))
        .collect();
    out.extend(
        scores
            .iter()
            .filter(|(k, _)| !order.iter().any(|o| o == *k))
            .map(|(k, v)| (k.as_str(), *v)),
    );
    out
}

pub fn render_scores(scores: &BTreeMap<String, f64>) -> String {
    let mut out = String::from("Scores:\n");
    for (name, value) in ordered_metrics(scores) {
        out.push_str(&format_score_line(name, value));
        out.push('\n');
    }
    if let Some(pass) = scores.get(PASS_RATE) {
        out.push_str(&format!("\nPASS RATE: {:.1}%\n", pass * 100.0));
    }
    out
}

pub fn print_scores(scores: &BTreeMap<String, f64>) {
    println!("{}", render_scores(scores));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_progress_line_contains_done_and_total() {
        let s = format_progress_line(3, 10);
        assert_eq!(s, "Running test 3/10...");
    }

    #[test]
    fn default_progress_sink_none_for_total_0_or_1() {
        assert!(default_progress_sink(0).is_none());
        assert!(default_progress_sink(1).is_none());
        assert!(default_progress_sink(2).is_some());
    }

    #[test]
    fn progress_step_logic() {
        assert_eq!(progress_step(5), 1);
        assert_eq!(progress_step(10), 1);
        assert_eq!(progress_step(25), 2);
        assert_eq!(progress_step(100), 10);
    }

    #[test]
    fn rates_print_as_percentages() {
        assert_eq!(format_score_line("pass_rate", 0.4567), "  pass_rate: 45.7%");
        assert_eq!(format_score_line("quality_score", 3.26), "  quality_score: 3.3");
        assert_eq!(
            format_score_line("data check_fail_rate", 0.0),
            "  data check_fail_rate: 0.0%"
        );
    }

    #[test]
    fn headline_metrics_come_first() {
        let mut scores = BTreeMap::new();
        scores.insert("code execution_fail_rate".to_string(), 0.1);
        scores.insert(QUALITY_SCORE.to_string(), 3.0);
        scores.insert(PASS_RATE.to_string(), 0.5);
        scores.insert("zzz_extra".to_string(), 1.0);

        let names: Vec<&str> = ordered_metrics(&scores).into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            names,
            vec![PASS_RATE, QUALITY_SCORE, "code execution_fail_rate", "zzz_extra"]
        );

        let text = render_scores(&scores);
        assert!(text.starts_with("Scores:\n  pass_rate: 50.0%\n"));
        assert!(text.ends_with("\nPASS RATE: 50.0%\n"));
    }
}
