//! Sensorvol - headless sensor volume driver
//!
//! Loads a scene document and steps simulated time through it, rebuilding
//! and submitting sensor volumes every frame on a wgpu or headless device.

use sensorvol::config::{AppConfig, RenderBackend};
use sensorvol::{DisplayError, SensorDisplay, VisualizerOptions, VisualizerRegistry};
use sensorvol_core::time::checked_add_seconds;
use sensorvol_core::{value_or_undefined, SensorDocument};
use sensorvol_render::pipeline::view_projection;
use sensorvol_render::{HeadlessDevice, RenderDevice, WgpuDevice};

/// Create the configured device, falling back to the headless one
fn create_device(config: &AppConfig) -> Box<dyn RenderDevice> {
    match config.rendering.backend {
        RenderBackend::Headless => Box::new(HeadlessDevice::new()),
        RenderBackend::Wgpu => {
            let rendering = &config.rendering;
            let power_preference = rendering.power_preference.to_wgpu();
            match WgpuDevice::new_headless(power_preference, rendering.width, rendering.height) {
                Ok(device) => Box::new(device),
                Err(e) => {
                    log::warn!("{}. Falling back to the headless device.", e);
                    Box::new(HeadlessDevice::new())
                }
            }
        }
    }
}

fn run(config: &AppConfig) -> Result<(), DisplayError> {
    let start = config.simulation.start_time()?;
    let document = SensorDocument::load(&config.scene.path)?;

    let mut device = create_device(config);
    log::info!("Rendering with the {} backend", device.backend_name());

    let options = VisualizerOptions { slice_count: config.volume.slice_count };
    let registry = VisualizerRegistry::with_sensor_defaults();
    let mut display = SensorDisplay::new(registry, options, start);
    display.load_document(&document)?;

    // Look down at the first positioned entity from above its position
    let focus = display
        .entities()
        .iter()
        .find_map(|e| value_or_undefined(e.position.as_ref(), start));
    if let Some(focus) = focus {
        let aspect = config.rendering.width.max(1) as f32 / config.rendering.height.max(1) as f32;
        let eye = focus * 1.5;
        let matrix = view_projection(eye.to_f32_array(), focus.to_f32_array(), aspect);
        display.set_view_projection(matrix);
    }

    let mut total_commands = 0;
    for frame in 0..config.simulation.frames {
        let time = checked_add_seconds(start, frame as f64 * config.simulation.step_seconds)?;
        let report = display.update(time, device.as_mut())?;
        total_commands += report.commands;
        log::debug!(
            "Frame {}: {} opaque, {} translucent, {} vertices",
            report.frame_number,
            report.submitted.opaque,
            report.submitted.translucent,
            report.submitted.vertices
        );
    }

    log::info!(
        "Drove {} frame(s) over {} volume(s): {} commands, {} programs, {} live buffers",
        config.simulation.frames,
        display.scene().len(),
        total_commands,
        display.shaders().len(),
        device.live_buffer_count()
    );

    display.destroy(device.as_mut());
    Ok(())
}

fn main() {
    let loaded = AppConfig::load();
    let log_level = match &loaded {
        Ok(config) => config.debug.log_level.clone(),
        Err(_) => AppConfig::default().debug.log_level,
    };

    // RUST_LOG wins over the configured level
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
    log::info!("Starting sensorvol");

    let config = loaded.unwrap_or_else(|e| {
        log::warn!("Failed to load config: {}. Using defaults.", e);
        AppConfig::default()
    });

    if let Err(e) = run(&config) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
