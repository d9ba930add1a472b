use crate::cli::RunArgs;
use crate::exit_codes;
use crate::output;
use crate::params;

pub fn execute(args: RunArgs) -> i32 {
    if let Err(msg) = params::validate_file(&args.events) {
        eprintln!("Error: {}", msg);
        return exit_codes::INPUT_ERROR;
    }

    let config = match params::build_config(&args.analysis) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return exit_codes::INPUT_ERROR;
        }
    };

    let pixels = match params::load_pixels(&args.events, &args.pixel, args.top) {
        Ok(p) => p,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return exit_codes::INPUT_ERROR;
        }
    };

    let runner = match params::build_runner(config, args.analysis.threads) {
        Ok(r) => r,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return exit_codes::INPUT_ERROR;
        }
    };

    if !args.quiet {
        let config = runner.config();
        eprintln!("Estimating periods in {}...", args.events);
        eprintln!("  Pixels: {}", pixels.len());
        eprintln!(
            "  Cutoff period: {} events (alpha={:.6}, beta={:.6})",
            config.cutoff_period,
            runner.poles().alpha,
            runner.poles().beta
        );
        eprintln!(
            "  Noise filter: pass_dt={} ns, dead_dt={} ns",
            config.noise.pass_dt,
            config.noise.resolved_dead_dt()
        );
    }

    let result = match runner.analyze(&pixels) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Analysis failed: {}", e);
            return exit_codes::for_error(&e);
        }
    };

    let json = match output::to_json(&result, args.compact) {
        Ok(j) => j,
        Err(e) => {
            eprintln!("Error serializing result: {}", e);
            return exit_codes::EXECUTION_ERROR;
        }
    };
    if let Err(e) = output::write_output(&json, args.output.as_deref()) {
        eprintln!("Error: {}", e);
        return exit_codes::EXECUTION_ERROR;
    }

    if !args.quiet {
        eprint!("\n{}", output::summary_table(&result));
        if let Some(ref path) = args.output {
            eprintln!("Results written to {}", path);
        }
    }
    exit_codes::SUCCESS
}
