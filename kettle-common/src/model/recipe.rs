// kettle-common/src/model/recipe.rs
//! The install recipe descriptor: what to fetch, what must already be
//! present, and which commands produce the installed keg.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dependency::Dependency;
use crate::error::{KettleError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStrategy {
    Git,
    Url,
}

/// Which formula keyword declared the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceSpec {
    Head,
    #[default]
    Stable,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub url: String,
    pub strategy: FetchStrategy,
    #[serde(default)]
    pub spec: SourceSpec,
}

impl SourceLocation {
    pub fn head_git(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            strategy: FetchStrategy::Git,
            spec: SourceSpec::Head,
        }
    }
}

/// One `system` call of the install block.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InstallStep {
    /// `system "a; b"`: run through the shell.
    Shell(String),
    /// `system "prog", "arg", ...`: run directly, no shell.
    Exec { program: String, args: Vec<String> },
}

impl InstallStep {
    pub fn shell(text: impl Into<String>) -> Self {
        Self::Shell(text.into())
    }

    /// Every string the step carries, in declaration order.
    pub fn parts(&self) -> Vec<&str> {
        match self {
            Self::Shell(text) => vec![text.as_str()],
            Self::Exec { program, args } => std::iter::once(program.as_str())
                .chain(args.iter().map(String::as_str))
                .collect(),
        }
    }

    /// The command as declared, used to attribute failures.
    pub fn command_line(&self) -> String {
        self.parts().join(" ")
    }
}

impl fmt::Display for InstallStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command_line())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub name: String,
    pub class_name: String,
    pub source: SourceLocation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    pub install_steps: Vec<InstallStep>,
}

impl Recipe {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Version label used for the keg directory when none is given explicitly.
    pub fn default_version(&self) -> &str {
        match (&self.version, self.source.spec) {
            (Some(version), _) => version,
            (None, SourceSpec::Head) => "HEAD",
            (None, SourceSpec::Stable) => "stable",
        }
    }

    /// Checks the structural rules every loaded recipe must satisfy.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(KettleError::ParseError(0, "recipe name is empty".to_string()));
        }
        if self.class_name.trim().is_empty() {
            return Err(KettleError::ParseError(0, "class name is empty".to_string()));
        }
        if self.source.url.trim().is_empty() {
            return Err(KettleError::ParseError(0, "source url is empty".to_string()));
        }
        if self.install_steps.is_empty() {
            return Err(KettleError::ParseError(
                0,
                format!("recipe '{}' declares no install steps", self.name),
            ));
        }
        if let Some(step) = self
            .install_steps
            .iter()
            .find(|step| step.parts().first().is_none_or(|p| p.trim().is_empty()))
        {
            return Err(KettleError::ParseError(
                0,
                format!("recipe '{}' has an empty install step: {step:?}", self.name),
            ));
        }
        let mut seen = std::collections::HashSet::new();
        for dep in &self.dependencies {
            if dep.tags.is_empty() {
                return Err(KettleError::ParseError(
                    0,
                    format!("dependency '{}' has no tags", dep.name),
                ));
            }
            if !seen.insert(dep.name.as_str()) {
                return Err(KettleError::ParseError(
                    0,
                    format!("dependency '{}' declared more than once", dep.name),
                ));
            }
        }
        Ok(())
    }

    /// Renders the recipe in the formula DSL.
    pub fn to_dsl(&self) -> String {
        let mut out = format!("class {} < Formula\n", self.class_name);
        if let Some(desc) = &self.desc {
            out.push_str(&format!("  desc {}\n", quote(desc)));
        }
        let keyword = match self.source.spec {
            SourceSpec::Head => "head",
            SourceSpec::Stable => "url",
        };
        match self.source.strategy {
            FetchStrategy::Git => out.push_str(&format!(
                "  {keyword} {}, :using => :git\n",
                quote(&self.source.url)
            )),
            // Spell out the strategy when the url alone would read as git.
            FetchStrategy::Url if looks_like_git(&self.source.url) => out.push_str(&format!(
                "  {keyword} {}, :using => :curl\n",
                quote(&self.source.url)
            )),
            FetchStrategy::Url => {
                out.push_str(&format!("  {keyword} {}\n", quote(&self.source.url)))
            }
        }
        if let Some(version) = &self.version {
            out.push_str(&format!("  version {}\n", quote(version)));
        }
        if let Some(homepage) = &self.homepage {
            out.push_str(&format!("  homepage {}\n", quote(homepage)));
        }
        if !self.dependencies.is_empty() {
            out.push('\n');
        }
        for dep in &self.dependencies {
            let symbols = dep.tags.symbols();
            match symbols.as_slice() {
                [] => out.push_str(&format!("  depends_on {}\n", quote(&dep.name))),
                [symbol] => {
                    out.push_str(&format!("  depends_on {} => {symbol}\n", quote(&dep.name)))
                }
                many => out.push_str(&format!(
                    "  depends_on {} => [{}]\n",
                    quote(&dep.name),
                    many.join(", ")
                )),
            }
        }
        out.push_str("\n  def install\n");
        for step in &self.install_steps {
            let args: Vec<String> = step.parts().into_iter().map(quote).collect();
            out.push_str(&format!("    system {}\n", args.join(", ")));
        }
        out.push_str("  end\nend\n");
        out
    }
}

/// Whether a source url without an explicit strategy is fetched with git.
pub fn looks_like_git(url: &str) -> bool {
    url.starts_with("git://") || url.ends_with(".git")
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Converts a formula class name to its package token (`FooBar` -> `foo-bar`).
pub fn class_to_token(class_name: &str) -> String {
    let mut token = String::with_capacity(class_name.len() + 4);
    let mut prev_lower_or_digit = false;
    for c in class_name.chars() {
        if c.is_ascii_uppercase() {
            if prev_lower_or_digit {
                token.push('-');
            }
            token.push(c.to_ascii_lowercase());
            prev_lower_or_digit = false;
        } else {
            token.push(c);
            prev_lower_or_digit = c.is_ascii_lowercase() || c.is_ascii_digit();
        }
    }
    token
}
