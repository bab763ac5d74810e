// kettle-core/src/recipe/loader.rs
use std::fs;
use std::path::Path;

use kettle_common::error::{KettleError, Result};
use kettle_common::model::Recipe;
use tracing::{debug, warn};

use super::dsl;
use crate::build::env::check_step_interpolations;

/// The textual forms a recipe can be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeFormat {
    /// Formula DSL (`.rb`)
    Dsl,
    /// serde JSON form of [`Recipe`] (`.json`)
    Json,
}

impl RecipeFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("rb") => Ok(Self::Dsl),
            Some("json") => Ok(Self::Json),
            other => Err(KettleError::ParseError(
                0,
                format!(
                    "cannot tell recipe format of {} (extension {:?}, expected .rb or .json)",
                    path.display(),
                    other
                ),
            )),
        }
    }
}

/// Parses a recipe from text. Either the whole recipe loads or an error is
/// returned; nothing partial escapes.
pub fn load_recipe_str(text: &str, format: RecipeFormat) -> Result<Recipe> {
    let recipe = match format {
        RecipeFormat::Dsl => dsl::parse(text)?,
        RecipeFormat::Json => {
            let recipe: Recipe = serde_json::from_str(text).map_err(|e| {
                KettleError::ParseError(e.line(), format!("invalid recipe JSON: {e}"))
            })?;
            recipe.validate()?;
            for (index, step) in recipe.install_steps.iter().enumerate() {
                check_step_interpolations(step).map_err(|msg| {
                    KettleError::ParseError(0, format!("install step {}: {msg}", index + 1))
                })?;
            }
            recipe
        }
    };
    debug!(
        "Loaded recipe '{}' ({} dependencies, {} install steps)",
        recipe.name,
        recipe.dependencies.len(),
        recipe.install_steps.len()
    );
    Ok(recipe)
}

pub fn load_recipe_file(path: &Path) -> Result<Recipe> {
    let format = RecipeFormat::from_path(path)?;
    debug!("Loading recipe from {} as {:?}", path.display(), format);
    let text = fs::read_to_string(path).map_err(|e| {
        KettleError::Io(std::sync::Arc::new(std::io::Error::new(
            e.kind(),
            format!("Failed to read recipe {}: {}", path.display(), e),
        )))
    })?;
    let recipe = load_recipe_str(&text, format)?;

    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
        if stem != recipe.name {
            warn!(
                "Recipe file {} defines '{}', which does not match its file name",
                path.display(),
                recipe.name
            );
        }
    }
    Ok(recipe)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_follows_extension() {
        assert_eq!(
            RecipeFormat::from_path(Path::new("a/vobsub2srt.rb")).unwrap(),
            RecipeFormat::Dsl
        );
        assert_eq!(
            RecipeFormat::from_path(Path::new("vobsub2srt.json")).unwrap(),
            RecipeFormat::Json
        );
        assert!(RecipeFormat::from_path(Path::new("vobsub2srt.toml")).is_err());
        assert!(RecipeFormat::from_path(Path::new("vobsub2srt")).is_err());
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = load_recipe_str("{\"name\": ", RecipeFormat::Json).unwrap_err();
        assert!(matches!(err, KettleError::ParseError(..)));
    }

    #[test]
    fn json_recipe_without_steps_is_rejected() {
        let text = r#"{
            "name": "demo",
            "class_name": "Demo",
            "source": { "url": "https://example.com/demo.git", "strategy": "git" },
            "install_steps": []
        }"#;
        assert!(matches!(
            load_recipe_str(text, RecipeFormat::Json),
            Err(KettleError::ParseError(..))
        ));
    }

    #[test]
    fn json_steps_with_unknown_interpolation_are_rejected() {
        let text = r#"{
            "name": "demo",
            "class_name": "Demo",
            "source": { "url": "https://example.com/demo.git", "strategy": "git" },
            "install_steps": [ "make", { "program": "./configure", "args": ["--with=#{frobnicate}"] } ]
        }"#;
        match load_recipe_str(text, RecipeFormat::Json) {
            Err(KettleError::ParseError(0, msg)) => {
                assert!(msg.contains("install step 2"));
                assert!(msg.contains("frobnicate"));
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn rendered_recipe_with_escapes_and_tags_loads_back() {
        use kettle_common::dependency::{Dependency, DependencyTag};
        use kettle_common::model::InstallStep;

        let text = r##"
class FooBar < Formula
  desc "Say \"hi\"\tto bar"
  version "2.0"
  url "https://example.com/foo.git", :using => :curl
  homepage 'https://example.com'
  depends_on "cmake" => :build
  depends_on "doxygen" => [:build, :optional]
  depends_on "zlib"
  def install
    system "printf 'a\nb' > #{prefix}/greeting"
    system "make", "install", "DOCDIR=#{share}\\doc"
  end
end
"##;
        let recipe = load_recipe_str(text, RecipeFormat::Dsl).unwrap();
        assert_eq!(recipe.desc.as_deref(), Some("Say \"hi\"\tto bar"));
        assert_eq!(
            recipe.install_steps[0],
            InstallStep::shell("printf 'a\nb' > #{prefix}/greeting")
        );
        assert_eq!(
            recipe.dependencies[1],
            Dependency::new_with_tags("doxygen", DependencyTag::BUILD | DependencyTag::OPTIONAL)
        );

        let back = load_recipe_str(&recipe.to_dsl(), RecipeFormat::Dsl).unwrap();
        assert_eq!(back, recipe);

        let json = serde_json::to_string(&recipe).unwrap();
        let from_json = load_recipe_str(&json, RecipeFormat::Json).unwrap();
        assert_eq!(from_json, recipe);
        assert_eq!(
            load_recipe_str(&from_json.to_dsl(), RecipeFormat::Dsl).unwrap(),
            from_json
        );
    }

    #[test]
    fn json_recipe_loads() {
        let text = r#"{
            "name": "demo",
            "class_name": "Demo",
            "source": { "url": "https://example.com/demo.git", "strategy": "git", "spec": "head" },
            "dependencies": [ { "name": "cmake" } ],
            "install_steps": [ "./configure", { "program": "make", "args": ["install"] } ]
        }"#;
        let recipe = load_recipe_str(text, RecipeFormat::Json).unwrap();
        assert_eq!(recipe.dependencies[0].name, "cmake");
        assert_eq!(recipe.install_steps.len(), 2);
        assert_eq!(recipe.default_version(), "HEAD");
    }
}
