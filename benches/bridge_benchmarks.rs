//! Benchmarks for the generator and the per-call cost of the bridge.
//!
//! - Generation: resolving the fixture model and emitting both artifacts
//! - Dispatch: a by-value struct call, a handle-carrying call, a callback
//! - Handles: issuing and releasing managed handles
//!
//! ## Profiling with Puffin
//!
//! ```bash
//! cargo bench --features profile-with-puffin -- --profile-time 5
//! ```

use std::hint::black_box;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use hostbridge::codegen::{GeneratorOptions, generate};
use hostbridge::core::BindingModel;
use hostbridge::registry::{ExposureConfig, ReflectionSnapshot, resolve};
use hostbridge::runtime::prelude::*;
use hostbridge::runtime::{BridgeOptions, InProcessHost, ManagedEntryTable};

const CONFIG: &str = include_str!("../tests/fixtures/game.toml");
const SNAPSHOT: &str = include_str!("../tests/fixtures/game.json");

#[cfg(feature = "profile-with-puffin")]
static FRAME_VIEW: std::sync::OnceLock<puffin::GlobalFrameView> = std::sync::OnceLock::new();

#[cfg(feature = "profile-with-puffin")]
fn setup_profiler() {
    puffin::set_scopes_on(true);
    FRAME_VIEW.get_or_init(puffin::GlobalFrameView::default);
}

#[cfg(not(feature = "profile-with-puffin"))]
fn setup_profiler() {}

#[cfg(feature = "profile-with-puffin")]
fn end_profiling_frame() {
    puffin::GlobalProfiler::lock().new_frame();
}

#[cfg(not(feature = "profile-with-puffin"))]
fn end_profiling_frame() {}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
struct Vector3 {
    x: f32,
    y: f32,
    z: f32,
}

impl BridgeStruct for Vector3 {
    const TYPE_HASH: TypeHash = TypeHash::from_name("Game.Vector3");
    const TYPE_NAME: &'static str = "Game.Vector3";
}

impl FromValue for Vector3 {
    fn from_value(value: Value) -> Result<Self, MarshalError> {
        struct_from_value(value)
    }
}

impl IntoValue for Vector3 {
    fn into_value(self) -> Value {
        struct_to_value(&self)
    }
}

fn model() -> Arc<BindingModel> {
    let config = ExposureConfig::from_toml_str(CONFIG).expect("fixture config");
    let snapshot = ReflectionSnapshot::from_json_str(SNAPSHOT).expect("fixture snapshot");
    Arc::new(resolve(&config, &snapshot).expect("fixture model"))
}

fn context(host: &Arc<InProcessHost>) -> BridgeContext {
    let model = model();
    let mut entries = ManagedEntryTable::new();
    entries
        .bind(&model, "Game.Vector3.Add(Game.Vector3)", |frame| {
            let a: Vector3 = frame.this()?;
            let b: Vector3 = frame.arg(0)?;
            frame.set_return(Vector3 {
                x: a.x + b.x,
                y: a.y + b.y,
                z: a.z + b.z,
            });
            Ok(())
        })
        .expect("bind add");
    entries
        .bind(&model, "Game.Logger.Log(string)", |frame| {
            frame.this_object()?;
            let _: String = frame.arg(0)?;
            Ok(())
        })
        .expect("bind log");
    entries
        .bind(&model, "Game.Clock.Subscribe(Game.OnTick)", |frame| {
            let handler: Handle = frame.arg(0)?;
            frame.context().invoke_native(handler, &mut [0.016f32.into_value()])?;
            Ok(())
        })
        .expect("bind subscribe");
    BridgeContext::initialize(host.clone(), entries, model, BridgeOptions::default()).expect("initialize")
}

fn entry(ctx: &BridgeContext, symbol: &str) -> EntryId {
    ctx.model().entry_by_symbol(symbol).expect("entry").id
}

fn bench_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("generation");
    let config = ExposureConfig::from_toml_str(CONFIG).expect("fixture config");
    let snapshot = ReflectionSnapshot::from_json_str(SNAPSHOT).expect("fixture snapshot");
    let model = resolve(&config, &snapshot).expect("fixture model");
    let options = GeneratorOptions::default();

    group.throughput(Throughput::Elements(model.entries().len() as u64));
    group.bench_function("resolve", |b| {
        b.iter(|| {
            let model = resolve(black_box(&config), black_box(&snapshot));
            end_profiling_frame();
            model
        });
    });
    group.bench_function("emit", |b| {
        b.iter(|| {
            let artifacts = generate(black_box(&model), &options);
            end_profiling_frame();
            artifacts
        });
    });
    group.finish();
}

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");
    let host = InProcessHost::new();
    let ctx = context(&host);

    let add = entry(&ctx, "Game.Vector3.Add(Game.Vector3)");
    let a = Vector3 { x: 1.0, y: 2.0, z: 3.0 };
    let b = Vector3 { x: 4.0, y: 5.0, z: 6.0 };
    group.bench_function("struct_by_value", |bench| {
        bench.iter(|| {
            let mut args = [a.into_value(), b.into_value()];
            let ret = ctx.call(add, black_box(&mut args));
            end_profiling_frame();
            ret
        });
    });

    let log = entry(&ctx, "Game.Logger.Log(string)");
    let object = host.alloc("Game.Logger", ());
    let logger = ctx
        .share_managed(object, TypeHash::from_name("Game.Logger"))
        .expect("logger handle");
    group.bench_function("handle_receiver", |bench| {
        bench.iter(|| {
            let mut args = [logger.clone(), "message".into_value()];
            let ret = ctx.call(log, black_box(&mut args));
            end_profiling_frame();
            ret
        });
    });

    let subscribe = entry(&ctx, "Game.Clock.Subscribe(Game.OnTick)");
    let tick = ctx
        .wrap_callback(TypeHash::from_name("Game.OnTick"), |frame| {
            let _: f32 = frame.arg(0)?;
            Ok(())
        })
        .expect("callback");
    group.bench_function("native_callback", |bench| {
        bench.iter(|| {
            let mut args = [Value::Delegate(tick)];
            let ret = ctx.call(subscribe, black_box(&mut args));
            end_profiling_frame();
            ret
        });
    });
    group.finish();
}

fn bench_handles(c: &mut Criterion) {
    let mut group = c.benchmark_group("handles");
    let host = InProcessHost::new();
    let ctx = context(&host);
    let logger_type = TypeHash::from_name("Game.Logger");
    let objects: Vec<_> = (0..64).map(|_| host.alloc("Game.Logger", ())).collect();

    group.throughput(Throughput::Elements(objects.len() as u64));
    group.bench_function("acquire_release", |b| {
        b.iter(|| {
            for &object in &objects {
                let value = ctx.share_managed(object, logger_type).expect("share");
                if let Some(handle) = value.handle() {
                    ctx.release(handle).expect("release");
                }
            }
            end_profiling_frame();
        });
    });
    group.bench_function("repeat_lookup", |b| {
        let first = ctx.share_managed(objects[0], logger_type).expect("share");
        b.iter(|| {
            let again = ctx.share_managed(black_box(objects[0]), logger_type);
            end_profiling_frame();
            again
        });
        if let Some(handle) = first.handle() {
            ctx.release(handle).expect("release");
        }
    });
    group.finish();
}

fn benches_with_profiler(c: &mut Criterion) {
    setup_profiler();
    bench_generation(c);
    bench_dispatch(c);
    bench_handles(c);
}

criterion_group!(benches, benches_with_profiler);
criterion_main!(benches);
