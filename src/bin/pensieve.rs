use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use pensieve::{
    Effect as _, FrameDriver, Orchestrator, RasterSettings, RecordingSound, RunPhase, SceneConfig,
    Stage, Viewport,
};

#[derive(Parser, Debug)]
#[command(name = "pensieve", version)]
struct Cli {
    /// Scene JSON merged over the built-in page.
    #[arg(long, global = true)]
    scene: Option<PathBuf>,

    /// Log at debug level.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a ceremony headlessly and dump module snapshots as JSON.
    Simulate(SimulateArgs),
    /// Render one canvas at a point of the ceremony as a PNG.
    Frame(FrameArgs),
    /// Print the update order and each module's timeline window.
    Timeline,
}

#[derive(Args, Debug, Clone)]
struct RunArgs {
    /// Vial to click.
    #[arg(long, default_value = "#vial-1")]
    vial: String,

    /// Frames per second of the simulated host.
    #[arg(long, default_value_t = 60.0)]
    fps: f64,

    /// Viewport width in CSS pixels.
    #[arg(long, default_value_t = 1280.0)]
    width: f64,

    /// Viewport height in CSS pixels.
    #[arg(long, default_value_t = 720.0)]
    height: f64,

    /// Device pixel ratio.
    #[arg(long, default_value_t = 1.0)]
    dpr: f64,
}

#[derive(Args, Debug)]
struct SimulateArgs {
    #[command(flatten)]
    run: RunArgs,

    /// Simulated time in milliseconds after the click.
    #[arg(long, default_value_t = 10_000.0)]
    duration_ms: f64,

    /// Start the return this many milliseconds after the ceremony ends.
    #[arg(long)]
    return_after_ms: Option<f64>,

    /// Keep one snapshot every N frames.
    #[arg(long, default_value_t = 30)]
    every: u32,

    /// Output JSON path (stdout when omitted).
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct FrameArgs {
    #[command(flatten)]
    run: RunArgs,

    /// Milliseconds after the click.
    #[arg(long)]
    at_ms: f64,

    /// Canvas id to render.
    #[arg(long, default_value = "basin-canvas")]
    canvas: String,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let scene = read_scene(cli.scene.as_deref())?;
    match cli.cmd {
        Command::Simulate(args) => cmd_simulate(scene, args),
        Command::Frame(args) => cmd_frame(scene, args),
        Command::Timeline => cmd_timeline(scene),
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn read_scene(path: Option<&Path>) -> anyhow::Result<SceneConfig> {
    match path {
        Some(p) => SceneConfig::from_path(p)
            .with_context(|| format!("load scene '{}'", p.display())),
        None => Ok(SceneConfig::default()),
    }
}

fn start(
    scene: SceneConfig,
    run: &RunArgs,
) -> anyhow::Result<(Orchestrator<RecordingSound>, FrameDriver)> {
    let viewport = Viewport::new(run.width, run.height, run.dpr)?;
    let mut orchestrator = Orchestrator::create(
        scene,
        Stage::pensieve_page(viewport),
        RecordingSound::default(),
    )?;
    let driver = FrameDriver::new(run.fps);
    if !orchestrator.click(&run.vial, true, driver.now()) {
        anyhow::bail!("clicking '{}' did not start a ceremony", run.vial);
    }
    Ok((orchestrator, driver))
}

fn cmd_simulate(scene: SceneConfig, args: SimulateArgs) -> anyhow::Result<()> {
    let (mut o, mut driver) = start(scene, &args.run)?;
    let every = args.every.max(1);
    let mut snapshots = Vec::new();
    let mut held_at: Option<f64> = None;
    let mut frame = 0u32;

    while driver.now() < args.duration_ms {
        let now = driver.next_frame();
        o.frame(now);

        if o.phase() == RunPhase::Holding {
            let since = *held_at.get_or_insert(now);
            if args.return_after_ms.is_some_and(|after| now - since >= after) {
                o.begin_return(now);
            }
        }

        if frame % every == 0 {
            let mut snap = o.snapshot();
            snap["nowMs"] = serde_json::json!(now);
            snapshots.push(snap);
        }
        frame += 1;
    }

    let doc = serde_json::json!({
        "snapshots": snapshots,
        "sound": o.sound().calls,
    });
    let text = serde_json::to_string_pretty(&doc).context("serialize snapshots")?;
    match &args.out {
        Some(out) => {
            create_parent(out)?;
            std::fs::write(out, text).with_context(|| format!("write '{}'", out.display()))?;
            eprintln!("wrote {}", out.display());
        }
        None => println!("{text}"),
    }
    Ok(())
}

fn cmd_frame(scene: SceneConfig, args: FrameArgs) -> anyhow::Result<()> {
    let (mut o, mut driver) = start(scene, &args.run)?;
    while driver.now() < args.at_ms {
        o.frame(driver.next_frame());
    }

    let water_id = o
        .modules()
        .basin_water
        .as_ref()
        .and_then(|w| w.surface())
        .map(|s| s.id().to_owned());
    let frame = match (&o.modules().basin_water, water_id) {
        (Some(water), Some(id)) if id == args.canvas => pensieve::shade_water(water)?,
        _ => {
            let surface = o
                .surface(&args.canvas)
                .with_context(|| format!("no canvas '{}' on the stage", args.canvas))?;
            let settings = RasterSettings {
                clear_rgba: Some([8, 10, 18, 255]),
            };
            pensieve::rasterize(surface, &settings)?
        }
    };

    create_parent(&args.out)?;
    image::save_buffer_with_format(
        &args.out,
        &frame.to_straight(),
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_timeline(scene: SceneConfig) -> anyhow::Result<()> {
    let wiring = pensieve::Wiring::resolve(&scene.wiring)?;
    println!(
        "clock {} ms, return {} ms",
        scene.clock.total_duration_ms, scene.return_clock.total_duration_ms
    );
    for key in wiring.order() {
        let window = match scene.window(*key) {
            Some(w) => format!("{:.2} .. {:.2}", w.from, w.to),
            None => "-".to_owned(),
        };
        let after: Vec<&str> = wiring.dependencies(*key).iter().map(|k| k.as_str()).collect();
        if after.is_empty() {
            println!("{:<18} {window}", key.as_str());
        } else {
            println!("{:<18} {window:<12} after {}", key.as_str(), after.join(", "));
        }
    }
    Ok(())
}

fn create_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}
