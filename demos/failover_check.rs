//! Check where a failover record points, or run a scenario file.
//!
//! ```text
//! cargo run --example failover_check -- test.hello-localstack.com 12345.execute-api.localhost.localstack.cloud
//! cargo run --example failover_check -- --scenario failover.json
//! ```
//!
//! Server, pattern and retry settings come from `FAILOVER_*` variables.

use failover_probe::dns::Name;
use failover_probe::failover::{
    ConvergenceChecker, FailoverConfig, FailoverScenario, NoopHook, ScenarioRunner, TargetEndpoint,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = FailoverConfig::from_env()?;
    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.as_slice() {
        [flag, path] if flag == "--scenario" => {
            let scenario = FailoverScenario::from_path(path)?;
            let runner = ScenarioRunner::from_config(&config)?;

            println!("=== Running scenario for {} ===", scenario.hostname);
            let report = runner.run(&scenario, &mut NoopHook).await?;
            for step in &report.steps {
                let mark = if step.passed() { "PASS" } else { "FAIL" };
                println!("[{}] {}: {}", mark, step.label, step.result.summary());
            }
            println!("\n{}", report.to_json()?);

            if !report.passed() {
                std::process::exit(1);
            }
        }
        [hostname, expected] => {
            let checker = ConvergenceChecker::from_config(&config)?;
            let result = match checker
                .wait_with_config(&Name::new(hostname), &Name::new(expected), &config)
                .await
            {
                Ok(result) => result,
                Err(e) if e.is_input_error() => {
                    eprintln!("bad arguments: {}", e);
                    std::process::exit(2);
                }
                Err(e) => return Err(e.into()),
            };

            println!("{}", result.summary());
            for (i, outcome) in result.history.iter().enumerate() {
                println!("  attempt {}: {}", i + 1, outcome);
            }

            let endpoint = TargetEndpoint::new("http").port(4566).path("/dev/productApi");
            if let Some(url) = endpoint.url_for(&result.final_outcome) {
                println!("API endpoint: {}", url);
            }

            if !result.converged {
                std::process::exit(1);
            }
        }
        _ => {
            eprintln!("usage: failover_check <hostname> <expected-target>");
            eprintln!("       failover_check --scenario <file.json>");
            std::process::exit(2);
        }
    }

    Ok(())
}
