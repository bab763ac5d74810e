// kettle-core/src/build/receipt.rs
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use kettle_common::dependency::DependencyExt;
use kettle_common::error::Result;
use kettle_common::model::{InstallStep, Recipe, SourceLocation};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const RECEIPT_FILE_NAME: &str = "INSTALL_RECEIPT.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuiltOn {
    pub os: String,
    pub arch: String,
}

/// Written into a keg once every install step has succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallReceipt {
    pub name: String,
    pub version: String,
    pub time: String,
    pub source: SourceLocation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    pub dependencies: Vec<String>,
    pub install_steps: Vec<InstallStep>,
    pub built_on: BuiltOn,
}

pub fn write_receipt(recipe: &Recipe, version: &str, keg_path: &Path) -> Result<PathBuf> {
    fs::create_dir_all(keg_path)?;
    let receipt_path = keg_path.join(RECEIPT_FILE_NAME);

    let receipt = InstallReceipt {
        name: recipe.name.clone(),
        version: version.to_string(),
        time: chrono::Utc::now().to_rfc3339(),
        source: recipe.source.clone(),
        homepage: recipe.homepage.clone(),
        dependencies: recipe
            .dependencies
            .names()
            .into_iter()
            .map(str::to_string)
            .collect(),
        install_steps: recipe.install_steps.clone(),
        built_on: BuiltOn {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        },
    };

    let receipt_json = serde_json::to_string_pretty(&receipt)?;
    let mut receipt_file = File::create(&receipt_path)?;
    receipt_file.write_all(receipt_json.as_bytes())?;
    debug!("Wrote install receipt {}", receipt_path.display());

    Ok(receipt_path)
}

pub fn read_receipt(keg_path: &Path) -> Result<InstallReceipt> {
    let text = fs::read_to_string(keg_path.join(RECEIPT_FILE_NAME))?;
    Ok(serde_json::from_str(&text)?)
}
