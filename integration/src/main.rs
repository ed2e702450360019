//! Deploys the presale contracts and runs the base presale scenario against them.
//! Assumes that a development node is already running.

use clap::Parser;
use cli::Cli;
use eyre::Result;
use scenario::{run_base_scenario, StepLog};
use tracing::error;

mod cli;
mod constants;
mod participants;
mod scenario;

#[tokio::main]
async fn main() -> Result<()> {
    // Stdout is reserved for the step log
    tracing_subscriber::fmt()
        .pretty()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut log = StepLog::default();
    let res = run_base_scenario(&cli, &mut log).await;
    print_step_log(log.to_json(), res)
}

/// Print the rendered step log on stdout and return the scenario's result, which a
/// rendering failure never replaces
fn print_step_log(rendered: Result<String>, res: Result<()>) -> Result<()> {
    match rendered {
        Ok(json) => println!("{json}"),
        Err(e) => error!("failed to render the step log: {e}"),
    }

    res
}

#[cfg(test)]
mod tests {
    use eyre::eyre;

    use super::*;

    #[test]
    fn test_render_failure_keeps_scenario_result() {
        let res = print_step_log(Err(eyre!("render")), Err(eyre!("burnTokens reverted")));
        assert_eq!(res.unwrap_err().to_string(), "burnTokens reverted");

        assert!(print_step_log(Err(eyre!("render")), Ok(())).is_ok());
    }

    #[test]
    fn test_rendered_log_keeps_scenario_result() {
        let res = print_step_log(Ok("[]".to_string()), Err(eyre!("overMinting succeeded")));
        assert_eq!(res.unwrap_err().to_string(), "overMinting succeeded");
    }
}
