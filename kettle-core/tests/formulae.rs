// Loads the shipped formula files and drives real installs through /bin/sh.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use kettle_common::config::Config;
use kettle_common::dependency::Dependency;
use kettle_common::error::KettleError;
use kettle_common::model::{FetchStrategy, InstallStep, Recipe, SourceSpec};
use kettle_core::install::deps::DependencyLocation;
use kettle_core::install::InstallOptions;
use kettle_core::{
    load_recipe_file, load_recipe_str, DependencyProbe, InstallState, Installer, RecipeFormat,
    ShellRunner,
};

const VARIANT_PLAIN: &str = include_str!("../../formulae/vobsub2srt.rb");
const VARIANT_DOCS: &str = include_str!("../../formulae/packaging/vobsub2srt.rb");

struct Present(HashSet<String>);

impl DependencyProbe for Present {
    fn locate(&self, dep: &Dependency) -> Option<DependencyLocation> {
        self.0
            .contains(&dep.name)
            .then(|| DependencyLocation::Executable(PathBuf::from("/usr/bin").join(&dep.name)))
    }
}

fn everything_present() -> Present {
    Present(
        ["cmake", "tesseract", "ffmpeg"]
            .into_iter()
            .map(String::from)
            .collect(),
    )
}

#[test]
fn shipped_formula_loads_with_declared_fields() {
    let recipe = load_recipe_str(VARIANT_PLAIN, RecipeFormat::Dsl).unwrap();

    assert_eq!(recipe.name, "vobsub2srt");
    assert_eq!(recipe.class_name, "Vobsub2srt");
    assert_eq!(recipe.source.url, "git://github.com/ruediger/VobSub2SRT.git");
    assert_eq!(recipe.source.strategy, FetchStrategy::Git);
    assert_eq!(recipe.source.spec, SourceSpec::Head);
    assert_eq!(
        recipe.homepage.as_deref(),
        Some("https://github.com/ruediger/VobSub2SRT")
    );
    let deps: Vec<&str> = recipe.dependencies.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(deps, vec!["cmake", "tesseract", "ffmpeg"]);
    assert_eq!(
        recipe.install_steps,
        vec![
            InstallStep::shell("./configure #{std_cmake_parameters}"),
            InstallStep::shell("cd build; make install"),
        ]
    );
}

#[test]
fn variants_stay_distinct() {
    let plain = load_recipe_str(VARIANT_PLAIN, RecipeFormat::Dsl).unwrap();
    let docs = load_recipe_str(VARIANT_DOCS, RecipeFormat::Dsl).unwrap();

    assert_ne!(plain, docs);
    assert_eq!(plain.install_steps[0], docs.install_steps[0]);
    assert_eq!(
        docs.install_steps[1],
        InstallStep::shell("cd build; make documentation; make install")
    );

    let mut docs_without_docs = docs.clone();
    docs_without_docs.install_steps[1] = plain.install_steps[1].clone();
    assert_eq!(docs_without_docs, plain);
}

#[test]
fn rendered_dsl_and_json_load_back_unchanged() {
    let docs = load_recipe_str(VARIANT_DOCS, RecipeFormat::Dsl).unwrap();

    let from_dsl = load_recipe_str(&docs.to_dsl(), RecipeFormat::Dsl).unwrap();
    assert_eq!(from_dsl, docs);

    let json = serde_json::to_string(&docs).unwrap();
    let from_json = load_recipe_str(&json, RecipeFormat::Json).unwrap();
    assert_eq!(from_json, docs);
}

#[test]
fn formula_files_load_from_disk() {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../formulae");
    let plain = load_recipe_file(&root.join("vobsub2srt.rb")).unwrap();
    let docs = load_recipe_file(&root.join("packaging/vobsub2srt.rb")).unwrap();
    assert_eq!(plain.name, docs.name);
    assert_ne!(plain.install_steps, docs.install_steps);
}

#[test]
fn missing_file_is_an_io_error() {
    let err = load_recipe_file(&PathBuf::from("/nonexistent/kettle/demo.rb")).unwrap_err();
    assert!(matches!(err, KettleError::Io(_)));
}

fn shell_recipe(steps: &[&str]) -> Arc<Recipe> {
    let mut recipe = load_recipe_str(VARIANT_PLAIN, RecipeFormat::Dsl).unwrap();
    recipe.install_steps = steps.iter().map(|s| InstallStep::shell(*s)).collect();
    Arc::new(recipe)
}

#[cfg(unix)]
#[test]
fn shell_steps_run_in_order() {
    let prefix = tempfile::tempdir().unwrap();
    let src = tempfile::tempdir().unwrap();
    let recipe = shell_recipe(&["echo first >> log", "echo second >> log; mkdir -p #{bin}"]);
    let mut installer = Installer::new(
        recipe,
        Config::with_prefix(prefix.path()),
        InstallOptions {
            source_dir: Some(src.path().to_path_buf()),
            ..Default::default()
        },
    );

    let report = installer
        .run(&everything_present(), &mut ShellRunner)
        .unwrap();
    assert_eq!(report.state, InstallState::Installed);
    let log = std::fs::read_to_string(src.path().join("log")).unwrap();
    assert_eq!(log, "first\nsecond\n");
    assert!(report.keg_path.join("bin").is_dir());
    assert!(report.keg_path.join("INSTALL_RECEIPT.json").is_file());
}

#[cfg(unix)]
#[test]
fn failing_shell_step_stops_everything_after_it() {
    let prefix = tempfile::tempdir().unwrap();
    let src = tempfile::tempdir().unwrap();
    let recipe = shell_recipe(&["exit 7", "touch second-ran"]);
    let mut installer = Installer::new(
        recipe,
        Config::with_prefix(prefix.path()),
        InstallOptions {
            source_dir: Some(src.path().to_path_buf()),
            ..Default::default()
        },
    );

    let err = installer
        .run(&everything_present(), &mut ShellRunner)
        .unwrap_err();
    match &err {
        KettleError::StepExecutionError {
            index,
            command,
            status,
        } => {
            assert_eq!(*index, 0);
            assert_eq!(command, "exit 7");
            assert_eq!(*status, Some(7));
        }
        other => panic!("expected step failure, got {other:?}"),
    }
    assert_eq!(err.stage(), "build");
    assert!(!src.path().join("second-ran").exists());
    assert_eq!(installer.state(), InstallState::Failed);
}

#[cfg(unix)]
#[test]
fn absent_dependency_prevents_any_step() {
    let prefix = tempfile::tempdir().unwrap();
    let src = tempfile::tempdir().unwrap();
    let recipe = shell_recipe(&["touch first-ran"]);
    let mut installer = Installer::new(
        recipe,
        Config::with_prefix(prefix.path()),
        InstallOptions {
            source_dir: Some(src.path().to_path_buf()),
            ..Default::default()
        },
    );
    let probe = Present(["cmake", "ffmpeg"].into_iter().map(String::from).collect());

    let err = installer.run(&probe, &mut ShellRunner).unwrap_err();
    assert!(matches!(
        err,
        KettleError::DependencyResolutionError(ref missing) if missing == &vec!["tesseract".to_string()]
    ));
    assert!(!src.path().join("first-ran").exists());
}

#[cfg(unix)]
#[test]
fn program_that_cannot_start_fails_its_step() {
    let prefix = tempfile::tempdir().unwrap();
    let src = tempfile::tempdir().unwrap();
    let mut recipe = (*shell_recipe(&["touch first-ran", "touch third-ran"])).clone();
    recipe.install_steps.insert(
        1,
        InstallStep::Exec {
            program: "kettle-no-such-tool".to_string(),
            args: vec!["--version".to_string()],
        },
    );
    let mut installer = Installer::new(
        Arc::new(recipe),
        Config::with_prefix(prefix.path()),
        InstallOptions {
            source_dir: Some(src.path().to_path_buf()),
            ..Default::default()
        },
    );

    let err = installer
        .run(&everything_present(), &mut ShellRunner)
        .unwrap_err();
    match &err {
        KettleError::StepExecutionError {
            index,
            command,
            status,
        } => {
            assert_eq!(*index, 1);
            assert_eq!(command, "kettle-no-such-tool --version");
            assert_eq!(*status, None);
        }
        other => panic!("expected step failure, got {other:?}"),
    }
    assert_eq!(err.stage(), "build");
    assert_eq!(installer.report().executed_steps.len(), 2);
    assert!(src.path().join("first-ran").exists());
    assert!(!src.path().join("third-ran").exists());
}
