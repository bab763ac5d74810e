// kettle-core/src/build/env.rs
//! The environment install steps run in: variables handed to the child
//! processes and the values behind `#{...}` interpolations.

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

use kettle_common::error::{KettleError, Result};
use kettle_common::model::InstallStep;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static INTERPOLATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#\{([^}]*)\}").expect("interpolation pattern is valid"));

/// Names that may appear inside `#{...}` in an install step.
pub const KNOWN_INTERPOLATIONS: [&str; 9] = [
    "prefix",
    "bin",
    "lib",
    "include",
    "share",
    "man",
    "buildpath",
    "std_cmake_parameters",
    "std_cmake_args",
];

/// Names of every `#{...}` interpolation in `text`, in order.
pub fn interpolations(text: &str) -> Vec<&str> {
    INTERPOLATION
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().trim()))
        .collect()
}

pub fn check_interpolation(name: &str) -> std::result::Result<(), String> {
    if KNOWN_INTERPOLATIONS.contains(&name) {
        Ok(())
    } else {
        Err(format!(
            "unknown interpolation #{{{name}}} (known: {})",
            KNOWN_INTERPOLATIONS.join(", ")
        ))
    }
}

/// Checks every interpolation in every string of `step`.
pub fn check_step_interpolations(step: &InstallStep) -> std::result::Result<(), String> {
    step.parts()
        .into_iter()
        .flat_map(interpolations)
        .try_for_each(check_interpolation)
}

#[derive(Debug, Clone)]
pub struct BuildEnvironment {
    prefix: PathBuf,
    buildpath: PathBuf,
    vars: HashMap<String, String>,
}

impl BuildEnvironment {
    /// `prefix` is the keg being installed into, `buildpath` the fetched
    /// source tree, `dependency_prefixes` the kegs or bin directories of the
    /// located dependencies (their `bin` goes first on `PATH`).
    pub fn new(prefix: &Path, buildpath: &Path, dependency_prefixes: &[PathBuf]) -> Self {
        let mut path_entries: Vec<PathBuf> = Vec::new();
        for dep in dependency_prefixes {
            let bin = dep.join("bin");
            let entry = if bin.is_dir() { bin } else { dep.clone() };
            if !path_entries.contains(&entry) {
                path_entries.push(entry);
            }
        }
        if let Some(system_path) = env::var_os("PATH") {
            path_entries.extend(env::split_paths(&system_path));
        }
        let path = env::join_paths(&path_entries)
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|e| {
                debug!("Could not join PATH entries ({}), using inherited PATH", e);
                env::var("PATH").unwrap_or_default()
            });

        let cmake_prefix_path = dependency_prefixes
            .iter()
            .filter(|p| p.join("bin").is_dir())
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(";");

        let mut vars = HashMap::new();
        vars.insert("PATH".to_string(), path);
        vars.insert("KETTLE_PREFIX".to_string(), prefix.display().to_string());
        vars.insert("MAKEFLAGS".to_string(), format!("-j{}", num_cpus::get()));
        if !cmake_prefix_path.is_empty() {
            vars.insert("CMAKE_PREFIX_PATH".to_string(), cmake_prefix_path);
        }

        debug!(
            "Build environment for {} (buildpath {}): {:?}",
            prefix.display(),
            buildpath.display(),
            vars.keys().collect::<Vec<_>>()
        );

        Self {
            prefix: prefix.to_path_buf(),
            buildpath: buildpath.to_path_buf(),
            vars,
        }
    }

    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    pub fn buildpath(&self) -> &Path {
        &self.buildpath
    }

    pub fn vars(&self) -> &HashMap<String, String> {
        &self.vars
    }

    fn std_cmake_parameters(&self) -> String {
        format!(
            "-DCMAKE_INSTALL_PREFIX='{}' -DCMAKE_BUILD_TYPE=None -DCMAKE_FIND_FRAMEWORK=LAST -Wno-dev",
            self.prefix.display()
        )
    }

    fn value_of(&self, name: &str) -> Option<String> {
        let path = match name {
            "prefix" => self.prefix.clone(),
            "bin" | "lib" | "include" | "share" => self.prefix.join(name),
            "man" => self.prefix.join("share").join("man"),
            "buildpath" => self.buildpath.clone(),
            "std_cmake_parameters" | "std_cmake_args" => return Some(self.std_cmake_parameters()),
            _ => return None,
        };
        Some(path.display().to_string())
    }

    /// Replaces every `#{...}` in `text` with its value.
    pub fn interpolate(&self, text: &str) -> Result<String> {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for caps in INTERPOLATION.captures_iter(text) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let value = self.value_of(name.as_str().trim()).ok_or_else(|| {
                KettleError::BuildEnvError(format!(
                    "unknown interpolation #{{{}}} in `{}`",
                    name.as_str(),
                    text
                ))
            })?;
            out.push_str(&text[last..whole.start()]);
            out.push_str(&value);
            last = whole.end();
        }
        out.push_str(&text[last..]);
        Ok(out)
    }

    /// Interpolates every string of `step`, keeping its shape.
    pub fn render_step(&self, step: &InstallStep) -> Result<InstallStep> {
        Ok(match step {
            InstallStep::Shell(script) => InstallStep::Shell(self.interpolate(script)?),
            InstallStep::Exec { program, args } => InstallStep::Exec {
                program: self.interpolate(program)?,
                args: args
                    .iter()
                    .map(|arg| self.interpolate(arg))
                    .collect::<Result<Vec<_>>>()?,
            },
        })
    }
}
