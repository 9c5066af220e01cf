use std::path::PathBuf;

use tracing::info;

use crate::submodules::{dataset::Method, error::Result, plotting::{self, Figure}, config::RecipeSettings, sample_table::SampleTable};

pub mod plot_circuit;
pub mod plot_mass_spring;
pub mod simulate;

/// A figure together with the file it is saved to.
pub struct PlannedFigure {
    pub path: PathBuf,
    pub figure: Figure,
}

/// Loads one table per configured method; the first failure aborts.
pub fn load_tables(settings: &RecipeSettings) -> Result<Vec<(Method, SampleTable)>> {
    settings.methods.iter().map(|&method| -> Result<(Method, SampleTable)> {
        let path = settings.data_path(method)?;
        Ok((method, SampleTable::load(path, &settings.columns)?))
    }).collect()
}

pub fn render(planned: &[PlannedFigure], settings: &RecipeSettings) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(planned.len());
    for PlannedFigure { path, figure } in planned {
        figure.save(path, settings.size)?;
        if settings.show {
            plotting::show(path);
        }
        written.push(path.clone());
    }
    info!(count = written.len(), "figures written");
    Ok(written)
}
