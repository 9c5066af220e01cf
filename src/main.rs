use std::{path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use scripts::{plot_circuit, plot_mass_spring, simulate::{self, System}};
use submodules::{config::{ConfigFile, RecipeOverrides, RecipeSettings}, dataset::Method, error::Result, sample_table::SampleTable};
use tracing::error;
use tracing_subscriber::EnvFilter;

mod scripts;
mod submodules;

#[derive(Parser, Debug)]
#[command(name = "ode-plots")]
#[command(about = "Plot mass-spring and RC-circuit simulation output")]
struct Cli {
    /// JSON file overriding the built-in recipe settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Time evolution and phase plot of the mass-spring runs
    MassSpring(RecipeOverrides),
    /// Source and capacitor voltage of the circuit run
    Circuit(RecipeOverrides),
    /// Both plot recipes with their defaults
    All,
    /// Generate the data files with every integration method
    Simulate {
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
        #[arg(long, default_value_t = 150)]
        steps: usize,
        #[arg(long, value_enum, value_delimiter = ',')]
        methods: Option<Vec<Method>>,
        #[arg(long, value_enum, default_value = "all")]
        system: System,
    },
    /// Load a table and print the selected columns as JSON
    Inspect {
        file: PathBuf,
        #[arg(long, value_delimiter = ',', default_value = "0,1,2")]
        columns: Vec<usize>,
    },
}

fn recipe(base: RecipeSettings, from_file: &RecipeOverrides, from_cli: &RecipeOverrides) -> RecipeSettings {
    let mut settings = base;
    settings.apply(from_file);
    settings.apply(from_cli);
    settings
}

fn run(cli: Cli) -> Result<()> {
    let config = ConfigFile::load_or_default(cli.config.as_deref())?;
    let no_flags = RecipeOverrides::default();

    match cli.command {
        Commands::MassSpring(flags) => {
            plot_mass_spring::run(&recipe(RecipeSettings::mass_spring(), &config.mass_spring, &flags))?;
        }
        Commands::Circuit(flags) => {
            plot_circuit::run(&recipe(RecipeSettings::circuit(), &config.circuit, &flags))?;
        }
        Commands::All => {
            plot_mass_spring::run(&recipe(RecipeSettings::mass_spring(), &config.mass_spring, &no_flags))?;
            plot_circuit::run(&recipe(RecipeSettings::circuit(), &config.circuit, &no_flags))?;
        }
        Commands::Simulate { data_dir, steps, methods, system } => {
            let methods = methods.unwrap_or_else(|| Method::ALL.to_vec());
            simulate::run(&data_dir, steps, &methods, system, &config.simulation)?;
        }
        Commands::Inspect { file, columns } => {
            let table = SampleTable::load(&file, &columns)?;
            println!("{}", serde_json::to_string_pretty(&table)?);
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ode_plots=info")))
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_the_config_file() {
        let cli = Cli::parse_from(["ode-plots", "mass-spring", "--steps", "40", "--methods", "crank,implicit"]);
        let Commands::MassSpring(flags) = cli.command else { panic!("wrong subcommand") };
        let from_file = RecipeOverrides { steps: Some(10), plot_dir: Some("out".into()), ..Default::default() };

        let settings = recipe(RecipeSettings::mass_spring(), &from_file, &flags);
        assert_eq!(settings.steps, 40);
        assert_eq!(settings.methods, vec![Method::Crank, Method::Implicit]);
        assert_eq!(settings.plot_dir, PathBuf::from("out"));
    }

    #[test]
    fn show_flag_takes_an_optional_value() {
        let show = |args: &[&str]| match Cli::parse_from(args).command {
            Commands::MassSpring(flags) | Commands::Circuit(flags) => flags.show,
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(show(&["ode-plots", "mass-spring"]), None);
        assert_eq!(show(&["ode-plots", "mass-spring", "--show"]), Some(true));
        assert_eq!(show(&["ode-plots", "circuit", "--show=false"]), Some(false));

        let from_file = RecipeOverrides { show: Some(true), ..Default::default() };
        let flags = RecipeOverrides { show: Some(false), ..Default::default() };
        assert!(!recipe(RecipeSettings::circuit(), &from_file, &flags).show);
    }

    #[test]
    fn inspect_defaults_to_three_columns() {
        let cli = Cli::parse_from(["ode-plots", "inspect", "data/crank150.txt"]);
        match cli.command {
            Commands::Inspect { columns, .. } => assert_eq!(columns, vec![0, 1, 2]),
            other => panic!("unexpected {other:?}"),
        }
    }
}
