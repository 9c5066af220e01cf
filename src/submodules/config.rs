use std::path::{Path, PathBuf};

use clap::Args;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{dataset::{Method, PathTemplate}, error::{PlotError, Result}, ode::{MassSpring, Pendulum, RcCircuit}, type_lib::NumericData};

/// Settings of one plot recipe after defaults, config file and flags are merged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeSettings {
    pub data_dir: PathBuf,
    pub plot_dir: PathBuf,
    pub steps: usize,
    pub methods: Vec<Method>,
    pub set: Option<String>,
    pub template: PathTemplate,
    /// Template used when a set is given and no template was configured.
    pub set_template: PathTemplate,
    #[serde(skip)]
    pub template_configured: bool,
    pub columns: Vec<usize>,
    pub size: (u32, u32),
    pub show: bool,
}

impl RecipeSettings {
    pub fn mass_spring() -> Self {
        RecipeSettings {
            data_dir: PathBuf::from("data"),
            plot_dir: PathBuf::from("plots"),
            steps: 150,
            methods: Method::ALL.to_vec(),
            set: None,
            template: PathTemplate::new(PathTemplate::MASS_SPRING),
            set_template: PathTemplate::new(PathTemplate::BY_SET),
            template_configured: false,
            columns: vec![0, 1, 2],
            size: (1024, 768),
            show: false,
        }
    }

    pub fn circuit() -> Self {
        RecipeSettings {
            steps: 100,
            methods: vec![Method::Explicit],
            template: PathTemplate::new(PathTemplate::CIRCUIT),
            set_template: PathTemplate::new(PathTemplate::CIRCUIT_BY_SET),
            ..RecipeSettings::mass_spring()
        }
    }

    pub fn apply(&mut self, overrides: &RecipeOverrides) {
        if let Some(data_dir) = &overrides.data_dir {
            self.data_dir = data_dir.clone();
        }
        if let Some(plot_dir) = &overrides.plot_dir {
            self.plot_dir = plot_dir.clone();
        }
        if let Some(steps) = overrides.steps {
            self.steps = steps;
        }
        if let Some(methods) = &overrides.methods {
            self.methods = methods.clone();
        }
        if let Some(template) = &overrides.template {
            self.template = PathTemplate::new(template.clone());
            self.template_configured = true;
        }
        // an explicit template from any layer wins over the set default
        if let Some(set) = &overrides.set {
            self.set = Some(set.clone());
            if !self.template_configured {
                self.template = self.set_template.clone();
            }
        }
        if let Some(columns) = &overrides.columns {
            self.columns = columns.clone();
        }
        if let Some(size) = overrides.size {
            self.size = size;
        }
        if let Some(show) = overrides.show {
            self.show = show;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.steps == 0 {
            return Err(PlotError::Config("steps must be positive".to_string()));
        }
        if self.methods.is_empty() {
            return Err(PlotError::Config("at least one method is required".to_string()));
        }
        if self.columns.len() != 3 {
            return Err(PlotError::Config(format!("expected three columns (time, a, b), got {:?}", self.columns)));
        }
        if self.size.0 == 0 || self.size.1 == 0 {
            return Err(PlotError::Config(format!("image size {:?} is empty", self.size)));
        }
        Ok(())
    }

    pub fn data_path(&self, method: Method) -> Result<PathBuf> {
        self.template.resolve(&self.data_dir, method, self.steps, self.set.as_deref())
    }
}

/// Partial recipe settings, read from the config file or the command line.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Args)]
#[serde(default, deny_unknown_fields)]
pub struct RecipeOverrides {
    /// Directory holding the simulator output
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Directory the PNG files are written to (must exist)
    #[arg(long)]
    pub plot_dir: Option<PathBuf>,

    /// Step count of the runs to plot
    #[arg(long)]
    pub steps: Option<usize>,

    /// Methods to compare, comma separated
    #[arg(long, value_enum, value_delimiter = ',')]
    pub methods: Option<Vec<Method>>,

    /// Dataset set identifier, substituted for {set}
    #[arg(long)]
    pub set: Option<String>,

    /// File name template with {method}, {steps} and {set}
    #[arg(long)]
    pub template: Option<String>,

    /// Columns holding time and the two plotted quantities
    #[arg(long, value_delimiter = ',')]
    pub columns: Option<Vec<usize>>,

    #[arg(skip)]
    pub size: Option<(u32, u32)>,

    /// Open each saved image in the desktop viewer (`--show=false` turns a configured viewer off)
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub show: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationSettings {
    pub mass_spring: MassSpring,
    pub mass_spring_start: [NumericData; 2],
    pub mass_spring_t_end: NumericData,
    pub circuit: RcCircuit,
    pub circuit_start: NumericData,
    pub circuit_t_end: NumericData,
    pub pendulum: Pendulum,
    pub pendulum_start: [NumericData; 2],
    pub pendulum_t_end: NumericData,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        SimulationSettings {
            mass_spring: MassSpring::default(),
            mass_spring_start: [1.0, 0.0],
            mass_spring_t_end: 4.0 * std::f64::consts::PI,
            circuit: RcCircuit::default(),
            circuit_start: 0.0,
            circuit_t_end: 0.1,
            pendulum: Pendulum::default(),
            pendulum_start: [std::f64::consts::FRAC_PI_4, 0.0],
            pendulum_t_end: 10.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub mass_spring: RecipeOverrides,
    pub circuit: RecipeOverrides,
    pub simulation: SimulationSettings,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| PlotError::io(path, e))?;
        let config = serde_json::from_str(&text).map_err(|source| PlotError::Json { path: path.to_path_buf(), source })?;
        info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(ConfigFile::default()), ConfigFile::load)
    }
}
