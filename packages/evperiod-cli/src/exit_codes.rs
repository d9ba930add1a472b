use evperiod_rs::EvPeriodError;

pub const SUCCESS: i32 = 0;
/// Bad arguments, unreadable or malformed input
pub const INPUT_ERROR: i32 = 1;
/// Analysis or output failed
pub const EXECUTION_ERROR: i32 = 2;
/// Batch finished with some files failed
pub const PARTIAL_FAILURE: i32 = 3;

/// Exit code for a library error
pub fn for_error(err: &EvPeriodError) -> i32 {
    match err {
        EvPeriodError::IoError(_) | EvPeriodError::SerializationError(_) => EXECUTION_ERROR,
        _ => INPUT_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_mapping() {
        assert_eq!(for_error(&EvPeriodError::InvalidCutoffPeriod(0.0)), INPUT_ERROR);
        assert_eq!(
            for_error(&EvPeriodError::NonMonotonicTimestamps {
                index: 1,
                previous: 5,
                current: 2
            }),
            INPUT_ERROR
        );
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        assert_eq!(for_error(&EvPeriodError::IoError(io)), EXECUTION_ERROR);
    }
}
