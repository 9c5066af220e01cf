use std::path::PathBuf;

use crate::submodules::{config::RecipeSettings, dataset::Method, error::Result, plotting::{parse_hex_color, Figure, LegendPosition, Trace}, sample_table::SampleTable};

use super::{load_tables, render, PlannedFigure};

pub fn time_evolution(tables: &[(Method, SampleTable)]) -> Result<Figure> {
    let mut figure = Figure::new("Mass-Spring System Time Evolution", "time", "value")
        .legend(LegendPosition::UpperRight);
    for (method, table) in tables {
        let color = parse_hex_color(method.color())?;
        figure = figure
            .with_trace(Trace::dashed(format!("{method} position"), table.points(0, 1)?).color(color))
            .with_trace(Trace::solid(format!("{method} velocity"), table.points(0, 2)?).color(color));
    }
    Ok(figure)
}

pub fn phase_plot(tables: &[(Method, SampleTable)]) -> Result<Figure> {
    let mut figure = Figure::new("Mass-Spring System Phase Plot", "position", "velocity")
        .legend(LegendPosition::UpperRight);
    for (method, table) in tables {
        let color = parse_hex_color(method.color())?;
        figure = figure.with_trace(Trace::solid(method.as_str(), table.points(1, 2)?).color(color));
    }
    Ok(figure)
}

pub fn build(settings: &RecipeSettings) -> Result<Vec<PlannedFigure>> {
    settings.validate()?;
    let tables = load_tables(settings)?;
    let steps = settings.steps;

    Ok(vec![
        PlannedFigure {
            path: settings.plot_dir.join(format!("MassSpringSystemTimeEvolution_{steps}.png")),
            figure: time_evolution(&tables)?,
        },
        PlannedFigure {
            path: settings.plot_dir.join(format!("MassSpringPhasePlot_{steps}.png")),
            figure: phase_plot(&tables)?,
        },
    ])
}

pub fn run(settings: &RecipeSettings) -> Result<Vec<PathBuf>> {
    let planned = build(settings)?;
    render(&planned, settings)
}
