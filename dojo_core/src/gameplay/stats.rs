use dojo_schema::{TierCounts, TimingStats};

/// Arithmetic mean; `None` below two samples, where it is not shown.
pub fn mean(samples: &[f64]) -> Option<f64> {
    if samples.len() < 2 {
        return None;
    }
    Some(samples.iter().sum::<f64>() / samples.len() as f64)
}

/// Sample standard deviation (divides by `n - 1`).
pub fn sample_std(samples: &[f64]) -> Option<f64> {
    let m = mean(samples)?;
    let sum_sq: f64 = samples.iter().map(|e| (e - m) * (e - m)).sum();
    Some((sum_sq / (samples.len() as f64 - 1.0)).sqrt())
}

/// Median; the mean of the two middle values for an even count.
pub fn median(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

/// `100 * (judged - misses) / judged`; `None` before the first judged tap.
pub fn accuracy_pct(counts: &TierCounts) -> Option<f64> {
    let total = counts.total();
    if total == 0 {
        return None;
    }
    Some(100.0 * f64::from(total - counts.miss) / f64::from(total))
}

pub fn timing_stats(errors_ms: &[f64], counts: Option<&TierCounts>) -> TimingStats {
    TimingStats {
        samples: errors_ms.len(),
        mean_ms: mean(errors_ms),
        std_ms: sample_std(errors_ms),
        accuracy_pct: counts.and_then(accuracy_pct),
    }
}
