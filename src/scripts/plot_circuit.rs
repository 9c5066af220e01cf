use std::path::PathBuf;

use crate::submodules::{config::RecipeSettings, dataset::Method, error::Result, plotting::{Figure, LegendPosition, Trace}, sample_table::SampleTable};

use super::{load_tables, render, PlannedFigure};

/// Source and capacitor voltage over time. A single run keeps the bare
/// `U_0`/`U_C` labels; several runs are told apart by method.
pub fn voltage_figure(tables: &[(Method, SampleTable)]) -> Result<Figure> {
    let mut figure = Figure::new("Voltage change in time", "time", "voltage")
        .legend(LegendPosition::UpperLeft);
    let suffix = |method: &Method| if tables.len() > 1 { format!(" ({method})") } else { String::new() };

    for (method, table) in tables {
        figure = figure
            .with_trace(Trace::solid(format!("U_0{}", suffix(method)), table.points(0, 1)?))
            .with_trace(Trace::solid(format!("U_C{}", suffix(method)), table.points(0, 2)?));
    }
    Ok(figure)
}

pub fn build(settings: &RecipeSettings) -> Result<Vec<PlannedFigure>> {
    settings.validate()?;
    let tables = load_tables(settings)?;
    Ok(vec![PlannedFigure {
        path: settings.plot_dir.join(format!("ElectricCircuit_{}.png", settings.steps)),
        figure: voltage_figure(&tables)?,
    }])
}

pub fn run(settings: &RecipeSettings) -> Result<Vec<PathBuf>> {
    let planned = build(settings)?;
    render(&planned, settings)
}
