//! slicesim command-line interface.
//!
//! Run wavelength sweeps from TOML configuration files:
//! ```sh
//! slicesim run job.toml
//! slicesim validate job.toml
//! slicesim patterns slits.json
//! ```

mod config;
mod runner;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use slicesim_core::slicing::SliceLayout;
use slicesim_core::slit::SlitPattern;
use slicesim_core::validation::validate_sampling;

#[derive(Parser)]
#[command(name = "slicesim")]
#[command(about = "slicesim: single-wavelength image-slicer IFU simulation")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a wavelength sweep from a TOML configuration file.
    Run {
        /// Path to the job configuration file.
        config: PathBuf,
        /// Output directory (overrides config file setting).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check a configuration file and print the slice layout without
    /// simulating.
    Validate {
        /// Path to the job configuration file.
        config: PathBuf,
    },
    /// List the patterns in a slit-pattern file.
    Patterns {
        /// Path to a `.json` or `.toml` pattern file.
        file: PathBuf,
    },
}

fn config_dir(config: &Path) -> PathBuf {
    config
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, output } => {
            println!("slicesim");
            println!("========");
            let job = config::load_config(&config)?;
            println!("Configuration: {}", config.display());

            let out_dir = output.unwrap_or_else(|| PathBuf::from(&job.output.directory));
            let result = runner::run_sweep(&job, &config_dir(&config), &out_dir)?;

            println!("Sweep complete: {} wavelengths.", result.wavelengths.len());
            Ok(())
        }
        Commands::Validate { config } => {
            let job = config::load_config(&config)?;
            let simulator = runner::build_simulator(&job, &config_dir(&config))?;

            let pupil = simulator.pupil();
            let sampling = validate_sampling(pupil.sampling, pupil.gamma)?;
            for warning in &sampling.warnings {
                println!("  Warning: {:?}", warning);
            }

            let slits_path = job.slits_path(&config_dir(&config));
            let pattern = slicesim_slits::load_pattern(&slits_path, &job.simulation.sim_slit_name)?;
            let layout = SliceLayout::compute(
                pupil.data.dim(),
                sampling.gamma,
                job.simulation.slice_resel_per_slice,
                pattern.geometry(),
            )?;
            println!(
                "  Slices: {} x {} px each, crop {}",
                layout.slice_pixel_width, layout.slice_pixel_height, layout.crop
            );
            for (i, region) in layout.regions.iter().enumerate() {
                println!("    [{}] {}", i, region);
            }

            println!("Configuration is valid: {}", config.display());
            Ok(())
        }
        Commands::Patterns { file } => {
            let patterns = slicesim_slits::load_file(&file)?;
            println!("Slit patterns in {}:", file.display());
            println!();
            for entry in &patterns.patterns {
                let g = &entry.pattern_data;
                println!(
                    "  {:<16} {} slitlets x {} spaxels, length {}, stack width {:.4} ({:?})",
                    entry.name,
                    g.n_slitlets,
                    g.n_spaxels_per_slitlet,
                    g.slitlet_length,
                    g.stack_width(),
                    g.stacking_axis
                );
            }
            Ok(())
        }
    }
}
