//! Shared parameter handling for `run` and `batch`.

use crate::cli::AnalysisArgs;
use evperiod_rs::{active_pixels, read_events_file, AnalysisConfig, PeriodRunner, PixelEvents};
use std::path::Path;

/// Check that an event file exists and is a regular file.
pub fn validate_file(file_path: &str) -> Result<(), String> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {}", file_path));
    }
    if !path.is_file() {
        return Err(format!("Not a file: {}", file_path));
    }
    Ok(())
}

/// Load the optional JSON config and apply flag overrides on top.
pub fn build_config(args: &AnalysisArgs) -> Result<AnalysisConfig, String> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => {
            let cutoff = args
                .cutoff_period
                .ok_or("--cutoff-period is required unless --config provides it")?;
            AnalysisConfig::new(cutoff)
        }
    };

    if let Some(cutoff) = args.cutoff_period {
        config.cutoff_period = cutoff;
    }
    if let Some(pass_dt) = args.pass_dt {
        config.noise.pass_dt = pass_dt;
    }
    if let Some(dead_dt) = args.dead_dt {
        config.noise.dead_dt = Some(dead_dt);
    }
    if let Some(hz) = args.ground_truth {
        config.ground_truth_hz = Some(hz);
    }
    if let Some(bins) = args.bins {
        config.histogram_bins = Some(bins);
    }

    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn load_config(path: &str) -> Result<AnalysisConfig, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config '{}': {}", path, e))?;
    serde_json::from_str(&text).map_err(|e| format!("Invalid config '{}': {}", path, e))
}

pub fn build_runner(config: AnalysisConfig, threads: Option<usize>) -> Result<PeriodRunner, String> {
    let runner = PeriodRunner::new(config).map_err(|e| e.to_string())?;
    match threads {
        Some(0) => Err("--threads must be at least 1".to_string()),
        Some(n) => runner.with_threads(n).map_err(|e| e.to_string()),
        None => Ok(runner),
    }
}

/// Read an event file, keeping the requested pixels.
///
/// An empty `pixels` list with no `top` keeps everything.
pub fn load_pixels(
    file_path: &str,
    pixels: &[u32],
    top: Option<usize>,
) -> Result<Vec<PixelEvents>, String> {
    let all = read_events_file(Path::new(file_path)).map_err(|e| e.to_string())?;

    if let Some(n) = top {
        let keep = active_pixels(&all).into_iter().take(n).collect::<Vec<_>>();
        return Ok(select(all, &keep));
    }
    if pixels.is_empty() {
        return Ok(all);
    }

    let missing: Vec<String> = pixels
        .iter()
        .filter(|p| !all.iter().any(|e| e.pixel == **p))
        .map(|p| p.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(format!(
            "Pixel(s) not present in {}: {}",
            file_path,
            missing.join(", ")
        ));
    }
    Ok(select(all, pixels))
}

/// Keep `pixels` in the given order
fn select(all: Vec<PixelEvents>, pixels: &[u32]) -> Vec<PixelEvents> {
    let mut all: Vec<Option<PixelEvents>> = all.into_iter().map(Some).collect();
    pixels
        .iter()
        .filter_map(|p| {
            all.iter_mut()
                .find(|e| e.as_ref().is_some_and(|e| e.pixel == *p))
                .and_then(Option::take)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn event_file(lines: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        file.write_all(lines.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_cutoff_required_without_config() {
        let err = build_config(&AnalysisArgs::default()).unwrap_err();
        assert!(err.contains("--cutoff-period"));
    }

    #[test]
    fn test_flags_override_config_file() {
        let cfg = event_file(
            r#"{"cutoff_period": 8.0, "noise": {"pass_dt": 100}, "histogram_bins": 20}"#,
        );
        let args = AnalysisArgs {
            config: Some(cfg.path().to_str().unwrap().to_string()),
            pass_dt: Some(250),
            ground_truth: Some(500.0),
            ..Default::default()
        };
        let config = build_config(&args).unwrap();
        assert_eq!(config.cutoff_period, 8.0);
        assert_eq!(config.noise.pass_dt, 250);
        assert_eq!(config.noise.resolved_dead_dt(), 250);
        assert_eq!(config.histogram_bins, Some(20));
        assert_eq!(config.ground_truth_hz, Some(500.0));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let args = AnalysisArgs {
            cutoff_period: Some(0.0),
            ..Default::default()
        };
        assert!(build_config(&args).is_err());

        let args = AnalysisArgs {
            cutoff_period: Some(5.0),
            dead_dt: Some(-1),
            ..Default::default()
        };
        assert!(build_config(&args).is_err());
    }

    #[test]
    fn test_malformed_config_file() {
        let cfg = event_file("{not json");
        let args = AnalysisArgs {
            config: Some(cfg.path().to_str().unwrap().to_string()),
            ..Default::default()
        };
        assert!(build_config(&args).unwrap_err().contains("Invalid config"));
    }

    #[test]
    fn test_zero_threads_rejected() {
        assert!(build_runner(AnalysisConfig::new(5.0), Some(0)).is_err());
        assert!(build_runner(AnalysisConfig::new(5.0), Some(2)).is_ok());
    }

    #[test]
    fn test_pixel_selection() {
        let file = event_file("0 1 2\n1 0 5\n2 1 5\n3 0 5\n4 1 9\n5 0 9\n");
        let path = file.path().to_str().unwrap();

        assert_eq!(load_pixels(path, &[], None).unwrap().len(), 3);

        let picked = load_pixels(path, &[9, 2], None).unwrap();
        assert_eq!(picked.iter().map(|p| p.pixel).collect::<Vec<_>>(), vec![9, 2]);

        let top = load_pixels(path, &[], Some(1)).unwrap();
        assert_eq!(top[0].pixel, 5);

        assert!(load_pixels(path, &[4], None).unwrap_err().contains("4"));
    }

    #[test]
    fn test_validate_file() {
        assert!(validate_file("/nonexistent/events.txt").is_err());
        let dir = tempfile::tempdir().unwrap();
        assert!(validate_file(dir.path().to_str().unwrap()).is_err());
    }
}
