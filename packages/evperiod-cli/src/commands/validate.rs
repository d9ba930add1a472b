use crate::cli::ValidateArgs;
use crate::exit_codes;
use crate::output;
use evperiod_rs::{read_events_file, validate_monotonic};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct ValidateOutput {
    file: String,
    exists: bool,
    readable: bool,
    size_bytes: Option<u64>,
    pixels: Option<usize>,
    events: Option<usize>,
    on_events: Option<usize>,
    first_timestamp: Option<i64>,
    last_timestamp: Option<i64>,
    monotonic: Option<bool>,
    error: Option<String>,
}

pub fn execute(args: ValidateArgs) -> i32 {
    let path = Path::new(&args.events);

    let exists = path.exists();
    let readable = path.is_file() && std::fs::File::open(path).is_ok();
    let size_bytes = if readable {
        std::fs::metadata(path).ok().map(|m| m.len())
    } else {
        None
    };

    let mut result = ValidateOutput {
        file: args.events.clone(),
        exists,
        readable,
        size_bytes,
        pixels: None,
        events: None,
        on_events: None,
        first_timestamp: None,
        last_timestamp: None,
        monotonic: None,
        error: None,
    };

    if !exists {
        result.error = Some(format!("File not found: {}", args.events));
    } else if !readable {
        result.error = Some(format!("File is not readable: {}", args.events));
    } else {
        match read_events_file(path) {
            Ok(pixels) => {
                let all = pixels.iter().flat_map(|p| p.events.iter());
                result.pixels = Some(pixels.len());
                result.events = Some(all.clone().count());
                result.on_events = Some(all.clone().filter(|e| e.polarity).count());
                result.first_timestamp = all.clone().map(|e| e.timestamp).min();
                result.last_timestamp = all.map(|e| e.timestamp).max();

                let unordered = pixels
                    .iter()
                    .find_map(|p| validate_monotonic(&p.events).err().map(|e| (p.pixel, e)));
                result.monotonic = Some(unordered.is_none());
                if let Some((pixel, e)) = unordered {
                    result.error = Some(format!("Pixel {}: {}", pixel, e));
                }
            }
            Err(e) => result.error = Some(e.to_string()),
        }
    }

    if args.json {
        match output::to_json(&result, false) {
            Ok(json) => {
                if let Err(e) = output::write_output(&json, None) {
                    eprintln!("Error: {}", e);
                    return exit_codes::EXECUTION_ERROR;
                }
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                return exit_codes::EXECUTION_ERROR;
            }
        }
    } else if let Some(ref err) = result.error {
        eprintln!("Error: {}", err);
    } else {
        println!(
            "File '{}' is valid ({} events across {} pixels, {} bytes)",
            args.events,
            result.events.unwrap_or(0),
            result.pixels.unwrap_or(0),
            size_bytes.unwrap_or(0)
        );
    }

    if result.error.is_some() {
        exit_codes::INPUT_ERROR
    } else {
        exit_codes::SUCCESS
    }
}
