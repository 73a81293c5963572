mod examples;

use examples::{euler_bump, settling_column, volume_fraction_advection};
use pp_fvm::config::SolverConfig;
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => SolverConfig::from_json_file(path)?,
        None => SolverConfig::default(),
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.level())
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // euler_bump(&config)?;
    // settling_column(&config)?;
    volume_fraction_advection(&config)?;
    Ok(())
}
