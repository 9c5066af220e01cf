use std::path::{Path, PathBuf};

use clap::ValueEnum;
use ndarray::{arr1, Array1};
use rayon::prelude::*;
use tracing::info;

use crate::submodules::{config::SimulationSettings, dataset::{Method, PathTemplate}, error::{PlotError, Result}, ode::{integrate, OdeFunction, TimeStepperKinds}, sample_table::SampleTable, type_lib::NumericData};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum System {
    MassSpring,
    Circuit,
    Pendulum,
    All,
}

impl System {
    fn includes(self, other: System) -> bool {
        self == System::All || self == other
    }
}

/// Writes one table per method and system into `data_dir`, the files the
/// plot recipes read by default.
pub fn run(data_dir: &Path, steps: usize, methods: &[Method], system: System, settings: &SimulationSettings) -> Result<Vec<PathBuf>> {
    if steps == 0 {
        return Err(PlotError::Config("steps must be positive".to_string()));
    }
    std::fs::create_dir_all(data_dir).map_err(|e| PlotError::io(data_dir, e))?;

    let written = methods.par_iter().map(|&method| -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        if system.includes(System::MassSpring) {
            let path = PathTemplate::new(PathTemplate::MASS_SPRING).resolve(data_dir, method, steps, None)?;
            let start = arr1(&settings.mass_spring_start);
            simulate_one(&settings.mass_spring, method, &start, settings.mass_spring_t_end, steps, &path)?;
            written.push(path);
        }
        if system.includes(System::Circuit) {
            let path = PathTemplate::new(PathTemplate::CIRCUIT).resolve(data_dir, method, steps, None)?;
            let start = arr1(&[settings.circuit_start]);
            simulate_one(&settings.circuit, method, &start, settings.circuit_t_end, steps, &path)?;
            written.push(path);
        }
        if system.includes(System::Pendulum) {
            let path = PathTemplate::new(PathTemplate::PENDULUM).resolve(data_dir, method, steps, None)?;
            let start = arr1(&settings.pendulum_start);
            simulate_one(&settings.pendulum, method, &start, settings.pendulum_t_end, steps, &path)?;
            written.push(path);
        }
        Ok(written)
    }).collect::<Result<Vec<_>>>()?;

    Ok(written.into_iter().flatten().collect())
}

fn simulate_one(rhs: &dyn OdeFunction, method: Method, start: &Array1<NumericData>, t_end: NumericData, steps: usize, path: &Path) -> Result<()> {
    let mut stepper = TimeStepperKinds::for_method(method);
    let table = integrate(rhs, &mut stepper, start, t_end, steps)?;
    info!(%method, steps, path = %path.display(), "simulated");
    SampleTable::save(path, &table)
}
