use crate::cli::EstimatorsArgs;
use crate::exit_codes;
use crate::output;
use evperiod_rs::ESTIMATOR_REGISTRY;

pub fn execute(args: EstimatorsArgs) -> i32 {
    if args.json {
        match output::to_json(&ESTIMATOR_REGISTRY, false) {
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
        println!("Available period estimators:\n");
        println!("  {:<8} {:<28} {:<10}", "Abbrev", "Name", "Sub-sample");
        println!("  {}", "-".repeat(48));
        for e in ESTIMATOR_REGISTRY {
            println!(
                "  {:<8} {:<28} {:<10}",
                e.abbreviation,
                e.name,
                if e.sub_sample { "yes" } else { "no" }
            );
        }
        println!();
        for e in ESTIMATOR_REGISTRY {
            println!("  {}: {}", e.abbreviation, e.documentation);
        }
    }

    exit_codes::SUCCESS
}
