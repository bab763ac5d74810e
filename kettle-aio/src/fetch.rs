// kettle-aio/src/fetch.rs
//! Fetches a recipe's source tree. Git sources are cloned with git2;
//! local `url` sources are used in place.

use std::fs;
use std::path::{Path, PathBuf};

use git2::build::RepoBuilder;
use kettle_common::error::{KettleError, Result};
use kettle_common::model::{FetchStrategy, SourceLocation};
use tracing::{debug, error, info};

/// A source tree ready to build in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceCheckout {
    pub root: PathBuf,
    /// Created by the fetch under the work root; removed by [`SourceCheckout::cleanup`].
    pub temporary: bool,
}

impl SourceCheckout {
    /// Deletes a temporary checkout. Local source trees are never touched.
    pub fn cleanup(&self) -> Result<()> {
        if self.temporary && self.root.exists() {
            debug!("Removing checkout {}", self.root.display());
            fs::remove_dir_all(&self.root)?;
        }
        Ok(())
    }
}

/// Makes the source for `name` available. Contains blocking network and
/// filesystem I/O.
pub fn fetch_source(name: &str, source: &SourceLocation, work_root: &Path) -> Result<SourceCheckout> {
    match source.strategy {
        FetchStrategy::Git => Ok(SourceCheckout {
            root: clone_repo(name, &source.url, work_root)?,
            temporary: true,
        }),
        FetchStrategy::Url => Ok(SourceCheckout {
            root: local_source_dir(&source.url)?,
            temporary: false,
        }),
    }
}

fn clone_repo(name: &str, url: &str, work_root: &Path) -> Result<PathBuf> {
    fs::create_dir_all(work_root)?;
    let dest = work_root.join(format!("{}-{}", name, uuid::Uuid::new_v4()));
    info!("Cloning {} into {}", url, dest.display());

    RepoBuilder::new().clone(url, &dest).map_err(|e| {
        error!("Failed clone {}: {}", url, e);
        KettleError::FetchError(url.to_string(), e.message().to_string())
    })?;

    debug!("Clone complete for {}", dest.display());
    Ok(dest)
}

fn local_source_dir(url: &str) -> Result<PathBuf> {
    let path = PathBuf::from(url.strip_prefix("file://").unwrap_or(url));
    if path.is_dir() {
        debug!("Using local source directory {}", path.display());
        Ok(path)
    } else if url.contains("://") && !url.starts_with("file://") {
        Err(KettleError::FetchError(
            url.to_string(),
            "only git sources and local directories can be fetched".to_string(),
        ))
    } else {
        Err(KettleError::FetchError(
            url.to_string(),
            "local source directory does not exist".to_string(),
        ))
    }
}
