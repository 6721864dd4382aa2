//! Headless prototype run.
//!
//! ```text
//! prototype [config.toml]      run with the given config (defaults without one)
//! prototype --print-config     write the default config to stdout
//! ```
//!
//! `RUST_LOG` overrides the config's `run.log_filter`.

use std::path::Path;

use prototype::{App, Physics, Platform, PrototypeConfig, Renderer, Scene};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

fn main() -> eyre::Result<()> {
    let arg = std::env::args_os().nth(1);
    if arg.as_deref().is_some_and(|a| a == "--print-config") {
        print!("{}", PrototypeConfig::default().to_toml_string()?);
        return Ok(());
    }

    let config = match &arg {
        Some(path) => PrototypeConfig::load(Path::new(path))?,
        None => PrototypeConfig::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(config.run.log_filter.parse()?)
                .from_env_lossy(),
        )
        .init();

    info!(
        config = %arg.as_deref().map_or("<defaults>".into(), |p| p.to_string_lossy()),
        frames = config.run.frames,
        delta_time = config.run.delta_time,
        "starting prototype"
    );

    let mut app = App::new()
        .with_module(Physics::new(config.physics.clone(), config.capacity.clone()))
        .with_module(Scene::new(&config))
        .with_module(Renderer::new(config.capacity.clone()));

    app.start()?;
    for _ in 0..config.run.frames {
        app.step(config.run.delta_time);
    }
    log_summary(app.platform());
    app.stop();

    Ok(())
}

fn log_summary(platform: &Platform) {
    for info in platform.db.types() {
        info!(
            type_name = info.name,
            live = info.object_count,
            capacity = info.max_object_count,
            "live objects"
        );
    }

    let profiler = &platform.profiler;
    for sample in profiler.last_frame() {
        debug!(section = sample.name, micros = sample.duration.as_micros(), "last frame");
    }
    info!(
        frames = profiler.frames(),
        mean_frame_ms = profiler.mean_frame_time().as_secs_f64() * 1000.0,
        max_frame_ms = profiler.max_frame_time().as_secs_f64() * 1000.0,
        assets = platform.assets.len(),
        "run complete"
    );
}
