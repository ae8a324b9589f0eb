//! Blade design iteration command-line interface.
//!
//! ```sh
//! blade-design run design.toml
//! blade-design apply design.toml
//! blade-design show design.toml
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use itertools::izip;

use blade_design::{
    config::load_config,
    design::{build_design, run_design, write_design},
    simulation::ProcessSimulation,
};

#[derive(Parser)]
#[command(name = "blade-design")]
#[command(about = "Modify a reference rotor blade and simulate the new design")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the design files, run the solver and save the design.
    Run {
        /// Path to the run configuration file.
        config: PathBuf,
    },
    /// Write the design files without running the solver.
    Apply {
        /// Path to the run configuration file.
        config: PathBuf,
    },
    /// Print baseline and modified geometry side by side.
    Show {
        /// Path to the run configuration file.
        config: PathBuf,
    },
    /// Check the configuration and that the baseline files can be read.
    Validate {
        /// Path to the run configuration file.
        config: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config } => {
            let job = load_config(&config)
                .with_context(|| format!("loading {}", config.display()))?;
            let Some(sim) = job.simulation.clone() else {
                bail!("{} has no [simulation] section", config.display());
            };
            let outcome = run_design(&job, &ProcessSimulation::new(sim))
                .with_context(|| format!("design {}", job.design_name))?;
            println!("Design {} simulated.", job.design_name);
            for file in &outcome.outputs.files {
                println!("  {}", file.display());
            }
            Ok(())
        }
        Commands::Apply { config } => {
            let job = load_config(&config)
                .with_context(|| format!("loading {}", config.display()))?;
            let written =
                write_design(&job).with_context(|| format!("design {}", job.design_name))?;
            println!("Wrote {}", written.files.htc_path.display());
            println!("Wrote {}", written.files.ae_path.display());
            Ok(())
        }
        Commands::Show { config } => {
            let job = load_config(&config)
                .with_context(|| format!("loading {}", config.display()))?;
            let geometry = build_design(&job)?;
            let r = geometry.baseline.normalized_radius();
            println!(
                "{:>7} {:>9} {:>9} {:>9} {:>9} {:>7} {:>7}",
                "r/R", "c base", "c new", "θ base", "θ new", "t/c", "t/c new"
            );
            for (r, base, new) in izip!(
                r.iter(),
                geometry.baseline.sections(),
                geometry.design.sections()
            ) {
                println!(
                    "{:>7.4} {:>9.4} {:>9.4} {:>9.3} {:>9.3} {:>7.2} {:>7.2}",
                    r, base.chord, new.chord, base.twist, new.twist, base.rel_thickness, new.rel_thickness
                );
            }
            Ok(())
        }
        Commands::Validate { config } => {
            let job = load_config(&config)
                .with_context(|| format!("loading {}", config.display()))?;
            let geometry = build_design(&job)?;
            println!(
                "Configuration is valid: {} sections, {} modifiers",
                geometry.baseline.len(),
                job.modifiers.len()
            );
            Ok(())
        }
    }
}
