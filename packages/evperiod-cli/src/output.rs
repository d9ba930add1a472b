use evperiod_rs::{AnalysisResult, EstimatorKind};
use std::io::Write;
use std::path::Path;

/// Write JSON string to stdout or a file.
pub fn write_output(json: &str, output_path: Option<&str>) -> Result<(), String> {
    match output_path {
        Some(path) => std::fs::write(Path::new(path), json)
            .map_err(|e| format!("Failed to write output file '{}': {}", path, e)),
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(json.as_bytes())
                .and_then(|_| handle.write_all(b"\n"))
                .map_err(|e| format!("Failed to write to stdout: {}", e))
        }
    }
}

/// Serialize a value to JSON (pretty or compact).
pub fn to_json<T: serde::Serialize>(value: &T, compact: bool) -> Result<String, String> {
    let json = if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    };
    json.map_err(|e| format!("JSON serialization failed: {}", e))
}

/// Per-pixel table of mean period and spread for every estimator.
pub fn summary_table(result: &AnalysisResult) -> String {
    let mut out = format!("  {:<8} {:<10}", "Pixel", "Events");
    for kind in EstimatorKind::ALL {
        out.push_str(&format!(" {:>24}", kind.abbreviation()));
    }
    out.push('\n');
    out.push_str(&format!("  {}\n", "-".repeat(20 + 25 * EstimatorKind::ALL.len())));

    for pixel in &result.pixels {
        out.push_str(&format!(
            "  {:<8} {:<10}",
            pixel.pixel,
            format!("{}/{}", pixel.accepted_events, pixel.total_events)
        ));
        for kind in EstimatorKind::ALL {
            let cell = match pixel.summary(kind).and_then(|s| s.stats) {
                Some(s) => format!("{:.1} ± {:.1} (n={})", s.mean, s.std, s.count),
                None => "-".to_string(),
            };
            out.push_str(&format!(" {:>24}", cell));
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use evperiod_rs::{AnalysisConfig, Event, PeriodRunner, PixelEvents};

    #[test]
    fn test_compact_json_is_single_line() {
        let value = serde_json::json!({"a": [1, 2], "b": {"c": true}});
        assert!(!to_json(&value, true).unwrap().contains('\n'));
        assert!(to_json(&value, false).unwrap().contains('\n'));
    }

    #[test]
    fn test_summary_table_rows() {
        let events = (0..41)
            .map(|i| Event::new(i * 1_000_000, i % 2 == 0))
            .collect();
        let pixels = vec![PixelEvents::new(4, events), PixelEvents::new(9, vec![])];
        let result = PeriodRunner::new(AnalysisConfig::new(5.0))
            .unwrap()
            .analyze(&pixels)
            .unwrap();
        let table = summary_table(&result);
        assert_eq!(table.lines().count(), 4);
        assert!(table.contains("FLT"));
        assert!(table.contains("2000000.0 ± 0.0"));
        assert!(table.contains("0/0"));
    }
}
