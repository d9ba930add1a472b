use crate::cli::PolesArgs;
use crate::exit_codes;
use crate::output;
use evperiod_rs::{AnalysisConfig, FrequencyResponse};

pub fn execute(args: PolesArgs) -> i32 {
    let response = match FrequencyResponse::for_cutoff_period(args.cutoff_period) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_codes::for_error(&e);
        }
    };

    if args.json {
        match output::to_json(&response, false) {
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
    } else {
        println!("Cutoff period:      {} events", response.cutoff_period);
        println!("Cutoff frequency:   {:.6} rad/event", response.cutoff_omega);
        println!("Detrend pole:       alpha = {:.9}", response.poles.alpha);
        println!("Smoothing pole:     beta  = {:.9}", response.poles.beta);
        println!(
            "Response peak:      {:.6} rad/event (period {:.4} events)",
            response.peak_omega, response.peak_period
        );
        println!(
            "|H|^2 at cutoff:    detrend {:.4}, smoothing {:.4}, cascade/peak {:.4}",
            response.detrend_response_sq_at_cutoff,
            response.smoothing_response_sq_at_cutoff,
            response.relative_response_at_cutoff
        );
        println!(
            "Warm-up:            {} samples",
            AnalysisConfig::new(response.cutoff_period).warm_up_samples()
        );
    }

    exit_codes::SUCCESS
}
