use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::error::{PlotError, Result};

/// Integration scheme a data file was produced with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Explicit,
    Implicit,
    Improved,
    Crank,
}

impl Method {
    pub const ALL: [Method; 4] = [Method::Explicit, Method::Implicit, Method::Improved, Method::Crank];

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Explicit => "explicit",
            Method::Implicit => "implicit",
            Method::Improved => "improved",
            Method::Crank => "crank",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Method::Explicit => "#1f77b4",
            Method::Implicit => "#ff7f0e",
            Method::Improved => "#d62728",
            Method::Crank => "#2ca02c",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PathTemplate(pub String);

impl PathTemplate {
    pub const MASS_SPRING: &'static str = "{method}{steps}.txt";
    pub const CIRCUIT: &'static str = "circuit_{method}.txt";
    pub const BY_SET: &'static str = "set{set}/{method}{steps}.txt";
    pub const CIRCUIT_BY_SET: &'static str = "set{set}/circuit_{method}.txt";
    pub const PENDULUM: &'static str = "pendulum_{method}{steps}.txt";

    pub fn new(template: impl Into<String>) -> Self {
        PathTemplate(template.into())
    }

    /// Substitutes `{method}`, `{steps}` and `{set}`.
    pub fn render(&self, method: Method, steps: usize, set: Option<&str>) -> Result<String> {
        let mut out = String::with_capacity(self.0.len() + 16);
        let mut rest = self.0.as_str();

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let close = rest[open..].find('}').ok_or_else(|| self.error("unclosed '{'"))? + open;
            match &rest[open + 1..close] {
                "method" => out.push_str(method.as_str()),
                "steps" => out.push_str(&steps.to_string()),
                "set" => out.push_str(set.ok_or_else(|| self.error("needs a set identifier but none was given"))?),
                other => return Err(self.error(&format!("unknown placeholder {{{other}}}"))),
            }
            rest = &rest[close + 1..];
        }
        out.push_str(rest);
        Ok(out)
    }

    pub fn resolve(&self, data_dir: &Path, method: Method, steps: usize, set: Option<&str>) -> Result<PathBuf> {
        Ok(data_dir.join(self.render(method, steps, set)?))
    }

    fn error(&self, message: &str) -> PlotError {
        PlotError::Template { template: self.0.clone(), message: message.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mass_spring_names() {
        let template = PathTemplate::new(PathTemplate::MASS_SPRING);
        let names = Method::ALL.iter()
            .map(|&m| template.render(m, 150, None).unwrap())
            .collect::<Vec<_>>();
        assert_eq!(names, ["explicit150.txt", "implicit150.txt", "improved150.txt", "crank150.txt"]);
    }

    #[test]
    fn circuit_name_ignores_steps() {
        let template = PathTemplate::new(PathTemplate::CIRCUIT);
        assert_eq!(template.render(Method::Explicit, 100, None).unwrap(), "circuit_explicit.txt");
    }

    #[test]
    fn set_identifier_is_substituted() {
        let template = PathTemplate::new(PathTemplate::BY_SET);
        let path = template.resolve(Path::new("demos/data"), Method::Crank, 40, Some("2")).unwrap();
        assert_eq!(path, PathBuf::from("demos/data/set2/crank40.txt"));
    }

    #[test]
    fn missing_set_is_an_error() {
        let template = PathTemplate::new(PathTemplate::BY_SET);
        assert!(matches!(template.render(Method::Crank, 40, None), Err(PlotError::Template { .. })));
    }

    #[test]
    fn unknown_placeholder_is_an_error() {
        let template = PathTemplate::new("{scheme}{steps}.txt");
        assert!(template.render(Method::Implicit, 10, None).is_err());
        assert!(PathTemplate::new("{method").render(Method::Implicit, 10, None).is_err());
    }

    #[test]
    fn methods_deserialize_from_file_tokens() {
        let methods: Vec<Method> = serde_json::from_str(r#"["explicit", "crank"]"#).unwrap();
        assert_eq!(methods, vec![Method::Explicit, Method::Crank]);
        assert_eq!(Method::Improved.to_string(), "improved");
    }
}
