//! End-to-end generation: fixture configuration and snapshot in, artifacts out.

use std::fs;
use std::path::{Path, PathBuf};

use hostbridge::codegen::{ErrorPolicy, GeneratorOptions};
use hostbridge::core::{GenerationError, ResolutionError, UnsupportedFeature};
use hostbridge::pipeline::generate_from_str;
use hostbridge::registry::{ExposureConfig, ReflectionSnapshot, resolve};
use hostbridge::{Pipeline, PipelineError, PipelineOutcome};

const CONFIG: &str = include_str!("fixtures/game.toml");
const SNAPSHOT: &str = include_str!("fixtures/game.json");

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn pipeline(out: &Path) -> Pipeline {
    Pipeline::new(fixture("game.toml"), fixture("game.json"), out)
}

fn errors_for(config: &str, snapshot: &str) -> Vec<GenerationError> {
    generate_from_str(config, snapshot, &GeneratorOptions::default())
        .unwrap_err()
        .into_vec()
}

#[test]
fn pipeline_writes_both_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let outcome = pipeline(dir.path()).run().unwrap();
    let PipelineOutcome::Written(report) = outcome else {
        panic!("expected a write");
    };
    assert_eq!(report.written.len(), 2);

    let native = fs::read_to_string(dir.path().join("bindings.rs")).unwrap();
    assert!(native.starts_with("// @generated by hostbridge-codegen. Do not edit.\n// fingerprint: "));
    assert!(native.contains("use hostbridge_runtime::prelude::*;"));
    let managed = fs::read_to_string(dir.path().join("Bindings.g.cs")).unwrap();
    assert!(managed.starts_with("// <auto-generated/>"));
    assert!(managed.contains("namespace HostBridge.Generated"));
}

#[test]
fn rerunning_leaves_files_untouched() {
    let dir = tempfile::tempdir().unwrap();
    pipeline(dir.path()).run().unwrap();
    let before = fs::read_to_string(dir.path().join("bindings.rs")).unwrap();

    let PipelineOutcome::Written(report) = pipeline(dir.path()).run().unwrap() else {
        panic!("expected a write");
    };
    assert!(report.written.is_empty());
    assert_eq!(report.unchanged.len(), 2);
    assert_eq!(fs::read_to_string(dir.path().join("bindings.rs")).unwrap(), before);
}

#[test]
fn check_mode_reports_stale_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let err = pipeline(dir.path()).check().unwrap_err();
    assert!(matches!(err, PipelineError::Stale(ref paths) if paths.len() == 2));

    pipeline(dir.path()).run().unwrap();
    assert!(matches!(pipeline(dir.path()).check(), Ok(PipelineOutcome::UpToDate(_))));

    // A different policy changes the native artifact only
    let raise = pipeline(dir.path()).with_options(GeneratorOptions::default().with_error_policy(ErrorPolicy::Raise));
    match raise.check() {
        Err(PipelineError::Stale(paths)) => assert_eq!(paths, vec![dir.path().join("bindings.rs")]),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn regeneration_is_byte_identical() {
    let options = GeneratorOptions::default();
    let first = generate_from_str(CONFIG, SNAPSHOT, &options).unwrap();
    let second = generate_from_str(CONFIG, SNAPSHOT, &options).unwrap();
    assert_eq!(first.native.contents(), second.native.contents());
    assert_eq!(first.managed.contents(), second.managed.contents());
}

#[test]
fn overloads_get_distinct_entry_points() {
    let config = ExposureConfig::from_toml_str(CONFIG).unwrap();
    let snapshot = ReflectionSnapshot::from_json_str(SNAPSHOT).unwrap();
    let model = resolve(&config, &snapshot).unwrap();

    let log = model.entry_by_symbol("Game.Logger.Log(string)").unwrap();
    let leveled = model.entry_by_symbol("Game.Logger.Log(Game.LogLevel, string)").unwrap();
    assert_ne!(log.id, leveled.id);
    let abs_float = model.entry_by_symbol("Game.Math.Abs(float)").unwrap();
    let abs_int = model.entry_by_symbol("Game.Math.Abs(int)").unwrap();
    assert_ne!(abs_float.id, abs_int.id);

    let artifacts = hostbridge::codegen::generate(&model, &GeneratorOptions::default()).unwrap();
    let native = artifacts.native.contents();
    assert!(native.contains("pub fn log_str(self, ctx: &BridgeContext, message: &str) -> BridgeResult<()> {"));
    assert!(native.contains(
        "pub fn log_log_level_str(self, ctx: &BridgeContext, level: LogLevel, message: &str) -> BridgeResult<()> {"
    ));
    assert!(native.contains("pub fn abs_f32(ctx: &BridgeContext, value: f32) -> BridgeResult<f32> {"));
    assert!(native.contains("pub fn abs_i32(ctx: &BridgeContext, value: i32) -> BridgeResult<i32> {"));

    let managed = artifacts.managed.contents();
    assert!(managed.contains("public static int Logger_Log_string("));
    assert!(managed.contains("public static int Logger_Log_LogLevel_string("));
    assert!(managed.contains("public static int Math_Abs_float("));
    assert!(managed.contains("public static int Math_Abs_int("));
}

#[test]
fn every_exposed_kind_gets_a_mirror() {
    let artifacts = generate_from_str(CONFIG, SNAPSHOT, &GeneratorOptions::default()).unwrap();
    let native = artifacts.native.contents();
    assert!(native.contains("#[repr(C)]\n#[derive(Debug, Clone, Copy, PartialEq, ::bytemuck::Pod, ::bytemuck::Zeroable)]\npub struct Vector3 {"));
    assert!(native.contains("const _: () = assert!(std::mem::size_of::<Vector3>() == 12);"));
    assert!(native.contains("pub struct Logger(Handle);"));
    assert!(native.contains("#[repr(i32)]"));
    assert!(native.contains("pub enum LogLevel {"));
    assert!(native.contains("pub type OnTickFn = fn(&BridgeContext, f32) -> BridgeResult<()>;"));
    assert!(native.contains("pub fn subscribe(ctx: &BridgeContext, handler: Option<OnTick>) -> BridgeResult<()> {"));
}

#[test]
fn static_classes_are_not_handles() {
    let artifacts = generate_from_str(CONFIG, SNAPSHOT, &GeneratorOptions::default()).unwrap();
    let native = artifacts.native.contents();
    assert!(native.contains("/// Static members of `Game.Math`.\n#[derive(Debug, Clone, Copy)]\npub struct Math;"));
    assert!(!native.contains("impl HandleType for Clock"));
    let managed = artifacts.managed.contents();
    assert!(managed.contains("public static int Logger_Release("));
    assert!(!managed.contains("Math_Release"));
    assert!(!managed.contains("Clock_Release"));
}

#[test]
fn unknown_types_are_reported() {
    let config = format!("{CONFIG}\n[[types]]\nname = \"Game.Missing\"\n");
    let errors = errors_for(&config, SNAPSHOT);
    assert_eq!(
        errors,
        vec![GenerationError::Resolution(ResolutionError::TypeNotFound("Game.Missing".to_string()))]
    );
}

#[test]
fn struct_layout_mismatch_aborts_generation() {
    let snapshot = SNAPSHOT.replacen("\"size\": 12", "\"size\": 16", 1);
    let errors = errors_for(CONFIG, &snapshot);
    assert_eq!(errors.len(), 1);
    assert!(matches!(&errors[0], GenerationError::Layout(e) if e.type_name == "Game.Vector3" && e.field.is_none()));
}

#[test]
fn binding_an_event_is_unsupported() {
    let config = CONFIG.replace("properties = [\"Name\"]", "properties = [\"Name\"]\nevents = [\"Flushed\"]");
    let errors = errors_for(&config, SNAPSHOT);
    assert!(matches!(
        &errors[..],
        [GenerationError::Unsupported(e)] if e.feature == UnsupportedFeature::Event
    ));
}

#[test]
fn missing_inputs_are_configuration_errors() {
    let dir = tempfile::tempdir().unwrap();
    let missing = Pipeline::new(dir.path().join("nope.toml"), fixture("game.json"), dir.path());
    match missing.run() {
        Err(PipelineError::Generation(errors)) => {
            assert!(matches!(errors.iter().next(), Some(GenerationError::Configuration(_))));
        }
        other => panic!("unexpected {other:?}"),
    }
}
