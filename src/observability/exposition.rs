//! Reader for the Prometheus text exposition format.
//!
//! Test support only: lets assertions pick single samples out of a
//! rendered snapshot.

/// Read one sample value out of a text exposition payload.
///
/// Matches `name` exactly and requires the sample's label set to equal
/// `labels` (order-insensitive).
pub fn sample_value(payload: &str, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
    payload
        .lines()
        .filter(|line| !line.starts_with('#'))
        .find_map(|line| {
            let (series, value) = line.rsplit_once(' ')?;
            let (series_name, series_labels) = match series.split_once('{') {
                Some((n, rest)) => (n, parse_labels(rest.strip_suffix('}')?)),
                None => (series, Vec::new()),
            };
            if series_name != name || series_labels.len() != labels.len() {
                return None;
            }
            let all_match = labels
                .iter()
                .all(|(k, v)| series_labels.iter().any(|(sk, sv)| sk == k && sv == v));
            if !all_match {
                return None;
            }
            value.parse().ok()
        })
}

/// Sum every sample of `name` regardless of labels.
pub fn sample_sum(payload: &str, name: &str) -> f64 {
    payload
        .lines()
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| {
            let (series, value) = line.rsplit_once(' ')?;
            let series_name = series.split_once('{').map_or(series, |(n, _)| n);
            (series_name == name).then(|| value.parse::<f64>().ok()).flatten()
        })
        .sum()
}

fn parse_labels(raw: &str) -> Vec<(String, String)> {
    raw.split("\",")
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            Some((key.trim().to_string(), value.trim_matches('"').to_string()))
        })
        .collect()
}

