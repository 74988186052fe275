use anyhow::{anyhow, Result};
use sir_quant::log::info;
use sir_quant::runner::run_with_args;

fn main() -> Result<()> {
    let output = run_with_args().map_err(|e| anyhow!("{e}"))?;
    for line in output.summary_lines() {
        println!("{line}");
    }
    for path in &output.reports {
        info!("wrote report {}", path.display());
    }
    Ok(())
}
