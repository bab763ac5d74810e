// kettle-common/src/dependency/definition.rs
use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct DependencyTag: u8 {
        const RUNTIME     = 0b00000001;
        const BUILD       = 0b00000010;
        const TEST        = 0b00000100;
        const OPTIONAL    = 0b00001000;
        const RECOMMENDED = 0b00010000;
    }
}

impl Default for DependencyTag {
    fn default() -> Self {
        Self::RUNTIME
    }
}

impl DependencyTag {
    /// Maps a formula symbol (`:build`, `:optional`, ...) to its tag.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol.trim_start_matches(':') {
            "build" => Some(Self::BUILD),
            "test" => Some(Self::TEST),
            "optional" => Some(Self::OPTIONAL),
            "recommended" => Some(Self::RECOMMENDED),
            "run" | "runtime" => Some(Self::RUNTIME),
            _ => None,
        }
    }

    /// Formula symbols for every flag set, in a fixed order. Empty for a
    /// plain runtime dependency, which needs no `=>` suffix.
    pub fn symbols(&self) -> Vec<&'static str> {
        if *self == Self::RUNTIME {
            return Vec::new();
        }
        [
            (Self::RUNTIME, ":run"),
            (Self::BUILD, ":build"),
            (Self::TEST, ":test"),
            (Self::OPTIONAL, ":optional"),
            (Self::RECOMMENDED, ":recommended"),
        ]
        .into_iter()
        .filter(|(flag, _)| self.contains(*flag))
        .map(|(_, symbol)| symbol)
        .collect()
    }
}

impl fmt::Display for DependencyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    #[serde(default)]
    pub tags: DependencyTag,
}

impl Dependency {
    pub fn new_runtime(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tags: DependencyTag::RUNTIME,
        }
    }

    pub fn new_with_tags(name: impl Into<String>, tags: DependencyTag) -> Self {
        Self {
            name: name.into(),
            tags,
        }
    }

    /// Optional dependencies may be absent at install time.
    pub fn is_required(&self) -> bool {
        !self.tags.contains(DependencyTag::OPTIONAL)
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbols = self.tags.symbols();
        if symbols.is_empty() {
            return write!(f, "{}", self.name);
        }
        let labels: Vec<&str> = symbols.iter().map(|s| s.trim_start_matches(':')).collect();
        write!(f, "{} ({})", self.name, labels.join(", "))
    }
}

pub trait DependencyExt {
    fn required(&self) -> Vec<&Dependency>;
    fn optional(&self) -> Vec<&Dependency>;
    fn names(&self) -> Vec<&str>;
}

impl DependencyExt for Vec<Dependency> {
    fn required(&self) -> Vec<&Dependency> {
        self.iter().filter(|dep| dep.is_required()).collect()
    }

    fn optional(&self) -> Vec<&Dependency> {
        self.iter().filter(|dep| !dep.is_required()).collect()
    }

    fn names(&self) -> Vec<&str> {
        self.iter().map(|dep| dep.name.as_str()).collect()
    }
}
