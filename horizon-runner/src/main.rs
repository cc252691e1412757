use clap::Parser;
use crossbeam_channel::Receiver;
use hdrhistogram::Histogram;
use horizon_config::{load_config, Config, ConfigError, EncoderType, SimulationSettings, SinkType};
use horizon_core::{Extent, FixedRateScheduler, FrameTick, InputEvent, PixelSurface, RefreshScheduler};
use horizon_simulation::{PhysicsParams, Simulation, SimulationParams, StepReport};
use horizon_transport::{
    BinaryEncoder, DrawList, FileSink, Frame, FrameEncoder, FrameSink, JsonEncoder, NullSink, StdioSink,
    TransportError,
};
use log::{error, info};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

mod input;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the simulation configuration file (.json or .toml)
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Stop after this many frames instead of running until Ctrl+C
    #[arg(short, long)]
    frames: Option<u64>,

    /// Also rasterize every frame and save the last one as a PNG
    #[arg(short, long)]
    snapshot: Option<PathBuf>,

    /// Do not read pointer/resize events from stdin
    #[arg(long)]
    no_input: bool,
}

#[derive(Error, Debug)]
enum RunnerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Failed to start input reader: {0}")]
    Input(std::io::Error),

    #[error("Failed to install Ctrl+C handler: {0}")]
    Signal(#[from] ctrlc::Error),

    #[error("Failed to set up frame statistics: {0}")]
    Histogram(#[from] hdrhistogram::CreationError),

    #[error("Failed to write snapshot: {0}")]
    Snapshot(#[from] image::ImageError),

    #[error("Snapshot buffer does not match a {0}x{1} image")]
    SnapshotSize(u32, u32),
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("Event Horizon Runner");

    let args = Args::parse();
    if let Err(e) = run(&args) {
        error!("{}", e);
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), RunnerError> {
    let config = load_config(&args.config)?;
    info!("Using configuration from {}", args.config.display());

    let bounds = Extent::new(config.surface.width, config.surface.height);
    let params = simulation_params(&config.simulation);
    let mut simulation = match config.simulation.seed {
        Some(seed) => {
            info!("Seeding simulation with {}", seed);
            Simulation::with_seed(params, bounds, seed)
        }
        None => Simulation::new(params, bounds),
    };

    let encoder = create_encoder(&config);
    let mut sink = create_sink(&config)?;

    let events = if args.no_input {
        None
    } else {
        Some(input::spawn_stdin_reader().map_err(RunnerError::Input)?)
    };

    let running = Arc::new(AtomicBool::new(true));
    let handler_flag = Arc::clone(&running);
    ctrlc::set_handler(move || handler_flag.store(false, Ordering::SeqCst))?;

    let mut draw_list = DrawList::new(bounds);
    let mut raster = args.snapshot.as_ref().map(|_| pixel_surface_for(bounds));
    // Frame work times in microseconds, up to one minute
    let mut frame_times = Histogram::<u64>::new_with_bounds(1, 60_000_000, 3)?;
    let mut scheduler = FixedRateScheduler::new(config.framerate);

    info!(
        "Running {} attractors and {} particles at {} FPS",
        config.simulation.attractor_count, config.simulation.particle_count, config.framerate
    );

    let mut respawned = 0u64;
    while running.load(Ordering::SeqCst) {
        if args.frames.is_some_and(|limit| scheduler.frames() >= limit) {
            break;
        }

        let mut outcome = Ok(StepReport::default());
        let timing = scheduler.request_frame(|tick| {
            if let Some(events) = &events {
                apply_input(events, &mut simulation, &mut draw_list, raster.as_mut());
            }
            outcome = render_frame(
                tick,
                &mut simulation,
                &mut draw_list,
                raster.as_mut(),
                encoder.as_ref(),
                sink.as_mut(),
            );
        });
        respawned += outcome?.respawned() as u64;
        frame_times.saturating_record(timing.work.as_micros().max(1) as u64);
    }

    sink.flush()?;
    log_summary(&frame_times, scheduler.overruns(), respawned);

    if let (Some(path), Some(raster)) = (&args.snapshot, &raster) {
        save_snapshot(raster, path)?;
        info!("Snapshot written to {}", path.display());
    }
    Ok(())
}

fn simulation_params(settings: &SimulationSettings) -> SimulationParams {
    let physics = &settings.physics;
    SimulationParams {
        attractor_count: settings.attractor_count,
        particle_count: settings.particle_count,
        physics: PhysicsParams {
            gravity: physics.gravity,
            swirl: physics.swirl,
            influence: physics.influence,
            absorption: physics.absorption,
            friction: physics.friction,
            min_distance: physics.min_distance,
            pointer_radius: physics.pointer_radius,
            pointer_force: physics.pointer_force,
            trail_alpha: physics.trail_alpha,
        },
    }
}

fn create_encoder(config: &Config) -> Box<dyn FrameEncoder> {
    match config.output.encoder.encoder_type {
        EncoderType::Json => Box::new(JsonEncoder),
        EncoderType::Binary => Box::new(BinaryEncoder),
    }
}

fn create_sink(config: &Config) -> Result<Box<dyn FrameSink>, RunnerError> {
    let sink: Box<dyn FrameSink> = match config.output.sink.sink_type {
        SinkType::Stdio => {
            info!("Sending frames to standard output");
            Box::new(StdioSink::new())
        }
        SinkType::File => {
            let options = config.output.sink.get_file_options().ok_or_else(|| {
                ConfigError::Validation("File sink requires options with a 'path'.".to_string())
            })?;
            info!("Writing frames to {}", options.path.display());
            Box::new(FileSink::open(&options.path, options.append)?)
        }
        SinkType::Null => {
            info!("Discarding frames");
            Box::new(NullSink::default())
        }
    };
    Ok(sink)
}

fn pixel_surface_for(bounds: Extent) -> PixelSurface {
    PixelSurface::new(bounds.width.round() as u32, bounds.height.round() as u32)
}

// Drain whatever arrived since the last frame.
fn apply_input<R: rand::Rng>(
    events: &Receiver<InputEvent>,
    simulation: &mut Simulation<R>,
    draw_list: &mut DrawList,
    raster: Option<&mut PixelSurface>,
) {
    let mut resized = false;
    for event in events.try_iter() {
        match event {
            // Rejected sizes are logged and skipped by the simulation
            InputEvent::Resize { width, height } => resized |= simulation.resize(Extent::new(width, height)),
            InputEvent::PointerMove { .. } => simulation.handle_input(event),
        }
    }
    if resized {
        let bounds = simulation.bounds();
        info!("Surface resized to {}x{}", bounds.width, bounds.height);
        draw_list.resize(bounds);
        if let Some(raster) = raster {
            raster.resize(bounds.width.round() as u32, bounds.height.round() as u32);
        }
    }
}

fn render_frame<R: rand::Rng>(
    tick: FrameTick,
    simulation: &mut Simulation<R>,
    draw_list: &mut DrawList,
    raster: Option<&mut PixelSurface>,
    encoder: &dyn FrameEncoder,
    sink: &mut dyn FrameSink,
) -> Result<StepReport, TransportError> {
    let report = simulation.tick(draw_list, tick.elapsed);
    if let Some(raster) = raster {
        draw_list.replay(raster);
    }

    let bounds = simulation.bounds();
    let frame = Frame {
        index: tick.index,
        elapsed_ms: tick.elapsed.as_secs_f64() * 1000.0,
        width: bounds.width,
        height: bounds.height,
        commands: draw_list.take(),
    };
    let line = encoder.encode(&frame)?;
    sink.send(line.as_bytes())?;
    Ok(report)
}

fn log_summary(frame_times: &Histogram<u64>, overruns: u64, respawned: u64) {
    if frame_times.len() == 0 {
        info!("No frames rendered");
        return;
    }
    info!(
        "Rendered {} frames: mean {:.0}us, p99 {}us, max {}us, {} over budget, {} particles respawned",
        frame_times.len(),
        frame_times.mean(),
        frame_times.value_at_quantile(0.99),
        frame_times.max(),
        overruns,
        respawned
    );
}

fn save_snapshot(raster: &PixelSurface, path: &Path) -> Result<(), RunnerError> {
    let (width, height) = (raster.width(), raster.height());
    let image = image::RgbaImage::from_raw(width, height, raster.to_rgba8())
        .ok_or(RunnerError::SnapshotSize(width, height))?;
    image.save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use horizon_config::{PhysicsSettings, SinkConfig};
    use horizon_core::Surface;
    use std::time::Duration;

    fn small_simulation() -> Simulation {
        let params = SimulationParams { attractor_count: 1, particle_count: 5, ..SimulationParams::default() };
        Simulation::with_seed(params, Extent::new(200.0, 100.0), 11)
    }

    #[test]
    fn settings_map_onto_params() {
        let settings = SimulationSettings {
            attractor_count: 4,
            particle_count: 9,
            seed: Some(1),
            physics: PhysicsSettings { friction: 0.9, ..PhysicsSettings::default() },
        };
        let params = simulation_params(&settings);
        assert_eq!(params.attractor_count, 4);
        assert_eq!(params.particle_count, 9);
        assert_eq!(params.physics.friction, 0.9);
        assert_eq!(params.physics.gravity, PhysicsParams::default().gravity);
    }

    #[test]
    fn render_frame_ships_one_encoded_line() {
        let mut simulation = small_simulation();
        let mut draw_list = DrawList::new(simulation.bounds());
        let mut raster = pixel_surface_for(simulation.bounds());
        let mut sink = NullSink::default();
        let tick = FrameTick { index: 0, elapsed: Duration::from_millis(16) };

        let report = render_frame(tick, &mut simulation, &mut draw_list, Some(&mut raster), &BinaryEncoder, &mut sink).unwrap();

        assert!(report.respawned() <= 5);
        assert_eq!(sink.sent(), 1);
        assert_eq!(simulation.steps(), 1);
        assert!(draw_list.commands().is_empty());
        assert!(raster.to_rgba8().chunks(4).any(|px| px[..3] != [0, 0, 0]));
    }

    #[test]
    fn resize_events_resize_every_surface() {
        let mut simulation = small_simulation();
        let mut draw_list = DrawList::new(simulation.bounds());
        let mut raster = pixel_surface_for(simulation.bounds());
        let (tx, rx) = unbounded();
        tx.send(InputEvent::Resize { width: 0.0, height: 50.0 }).unwrap();
        tx.send(InputEvent::Resize { width: 320.0, height: 240.0 }).unwrap();
        tx.send(InputEvent::PointerMove { x: 5.0, y: 5.0 }).unwrap();

        apply_input(&rx, &mut simulation, &mut draw_list, Some(&mut raster));

        assert_eq!(simulation.bounds(), Extent::new(320.0, 240.0));
        assert_eq!((raster.width(), raster.height()), (320, 240));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn overflowing_resize_line_is_ignored() {
        let mut simulation = small_simulation();
        let mut draw_list = DrawList::new(simulation.bounds());
        let mut raster = pixel_surface_for(simulation.bounds());
        let (tx, rx) = unbounded();
        let lines = concat!(
            r#"{"resize":{"width":1e39,"height":600}}"#, "\n",
            r#"{"resize":{"width":1e9,"height":1e9}}"#, "\n",
        );
        input::read_events(std::io::Cursor::new(lines), &tx);

        apply_input(&rx, &mut simulation, &mut draw_list, Some(&mut raster));

        assert_eq!(simulation.bounds(), Extent::new(200.0, 100.0));
        assert_eq!(draw_list.size(), Extent::new(200.0, 100.0));
        assert_eq!((raster.width(), raster.height()), (200, 100));
        simulation.step();
    }

    #[test]
    fn file_sink_needs_options() {
        let mut config: Config =
            serde_json::from_str(r#"{ "surface": { "width": 10.0, "height": 10.0 } }"#).unwrap();
        config.output.sink = SinkConfig { sink_type: SinkType::File, options: None };
        assert!(matches!(create_sink(&config), Err(RunnerError::Config(ConfigError::Validation(_)))));
    }

    #[test]
    fn snapshot_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        let raster = PixelSurface::new(8, 4);
        save_snapshot(&raster, &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
    }
}
