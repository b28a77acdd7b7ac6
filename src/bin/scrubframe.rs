use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{ArgAction, Args, Parser, Subcommand};
use scrubframe::{
    CpuSurface, EventHub, FrameIndex, FsFrameSource, HeroConfig, HeroStatus, PinnedRegion, Scrub,
    ScrollHero, SequenceLoader, Viewport, frame_requests,
};

#[derive(Parser, Debug)]
#[command(name = "scrubframe", version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the manifest, frame locators and scroll geometry.
    Info(InfoArgs),
    /// Render the canvas at one scroll progress as a PNG.
    Frame(FrameArgs),
    /// Render evenly spaced scroll positions as numbered PNGs.
    Sweep(SweepArgs),
}

#[derive(Args, Debug)]
struct SequenceArgs {
    /// Manifest file; frames are resolved next to it. Overrides `--root` and the
    /// config's `manifestPath`.
    #[arg(long)]
    manifest: Option<PathBuf>,

    /// Directory the config's `manifestPath` is resolved against.
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Hero config JSON.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ViewportArgs {
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
struct InfoArgs {
    #[command(flatten)]
    seq: SequenceArgs,

    /// Viewport height used for the pin spacer estimate.
    #[arg(long, default_value_t = 720.0)]
    viewport_height: f64,

    /// Also load every frame and report failures.
    #[arg(long)]
    check: bool,
}

#[derive(Args, Debug)]
struct FrameArgs {
    #[command(flatten)]
    seq: SequenceArgs,

    #[command(flatten)]
    viewport: ViewportArgs,

    /// Scroll progress through the pinned region, in [0, 1].
    #[arg(long)]
    progress: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct SweepArgs {
    #[command(flatten)]
    seq: SequenceArgs,

    #[command(flatten)]
    viewport: ViewportArgs,

    /// Number of scroll positions to render (including both ends).
    #[arg(long, default_value_t = 10)]
    steps: u32,

    /// Output directory for `frame_NNNN.png` files.
    #[arg(long)]
    out_dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Info(args) => cmd_info(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Sweep(args) => cmd_sweep(args),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

/// Resolved config plus the directory its `manifestPath` is relative to.
fn load_config(seq: &SequenceArgs) -> anyhow::Result<(HeroConfig, PathBuf)> {
    let mut cfg = match &seq.config {
        Some(path) => HeroConfig::from_path(path)?,
        None => HeroConfig::default(),
    }
    .with_env_overrides();
    let mut root = seq.root.clone();
    if let Some(manifest) = &seq.manifest {
        let name = manifest.file_name().with_context(|| {
            format!("manifest path '{}' has no file name", manifest.display())
        })?;
        cfg.manifest_path = name.to_string_lossy().into_owned();
        root = manifest.parent().map(Path::to_path_buf).unwrap_or_default();
    }
    cfg.validate()?;
    Ok((cfg, root))
}

fn cmd_info(args: InfoArgs) -> anyhow::Result<()> {
    let (cfg, root) = load_config(&args.seq)?;
    let loader = SequenceLoader::new(FsFrameSource::new(root));
    let manifest = loader.fetch_manifest(&cfg.manifest_path)?;
    let requests = frame_requests(&manifest, &cfg.manifest_path);
    let region = PinnedRegion::for_frames(manifest.len(), cfg.scrub_distance, cfg.pin_top);

    println!("manifest:       {}", cfg.manifest_path);
    println!("frames:         {}", manifest.frame_count);
    if let (Some(first), Some(last)) = (requests.first(), requests.last()) {
        println!("first:          {}", first.locator);
        println!("last:           {}", last.locator);
    }
    println!("scroll length:  {:.1}px", region.scroll_length);
    println!(
        "pin spacer:     {:.1}px",
        region.spacer_height(args.viewport_height)
    );

    if args.check {
        let (_, frames) = loader.load_sequence(&cfg.manifest_path)?;
        println!("loaded:         {}/{}", frames.loaded_count(), frames.len());
        for req in frames.missing().iter().filter_map(|i| requests.get(i.0)) {
            println!("missing:        {}", req.locator);
        }
    }
    Ok(())
}

/// Load the sequence and mount a hero on a CPU canvas, ready to scroll.
fn mount_hero(
    seq: &SequenceArgs,
    viewport: &ViewportArgs,
    hub: &EventHub,
) -> anyhow::Result<ScrollHero<CpuSurface>> {
    let (mut cfg, root) = load_config(seq)?;
    cfg.scrub = Scrub::Instant;

    let loader = SequenceLoader::new(FsFrameSource::new(root));
    let mut hero = ScrollHero::new(cfg, CpuSurface::new())?;
    match hero.load_with(&loader)? {
        HeroStatus::Ready => {}
        HeroStatus::Unavailable(reason) => anyhow::bail!("sequence unavailable: {reason}"),
        other => anyhow::bail!("sequence did not finish loading: {other:?}"),
    }

    let vp = Viewport::new(viewport.width, viewport.height, viewport.dpr)?;
    hero.activate(hub, vp)?;
    Ok(hero)
}

fn render_at(hero: &mut ScrollHero<CpuSurface>, progress: f64) -> anyhow::Result<()> {
    let region = hero
        .region()
        .context("hero has no scroll region (manifest not loaded)")?;
    let progress = progress.clamp(0.0, 1.0);
    // on_scroll redraws whenever the frame value moves; otherwise the canvas
    // already shows this position
    hero.on_scroll(region.top + progress * region.scroll_length)?;
    if let (Some(frames), Some(value)) = (hero.frames(), hero.scrub_value())
        && let Some(index) = FrameIndex::from_scrub(value, frames.len())
        && frames.get(index).is_none()
    {
        tracing::warn!(
            index = index.0,
            progress,
            "frame missing; canvas keeps previous frame"
        );
    }
    Ok(())
}

fn write_png(hero: &ScrollHero<CpuSurface>, out: &Path) -> anyhow::Result<()> {
    if let Some(parent) = out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    let (width, height) = hero.surface().backing_size();
    image::save_buffer_with_format(
        out,
        hero.surface().data(),
        width,
        height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", out.display()))?;
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let hub = EventHub::new();
    let mut hero = mount_hero(&args.seq, &args.viewport, &hub)?;
    render_at(&mut hero, args.progress)?;
    write_png(&hero, &args.out)?;
    hero.deactivate();
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_sweep(args: SweepArgs) -> anyhow::Result<()> {
    if args.steps == 0 {
        anyhow::bail!("--steps must be > 0");
    }
    let hub = EventHub::new();
    let mut hero = mount_hero(&args.seq, &args.viewport, &hub)?;
    for step in 0..args.steps {
        let progress = if args.steps == 1 {
            0.0
        } else {
            f64::from(step) / f64::from(args.steps - 1)
        };
        render_at(&mut hero, progress)?;
        let out = args.out_dir.join(format!("frame_{step:04}.png"));
        write_png(&hero, &out)?;
    }
    hero.deactivate();
    eprintln!("wrote {} frames to {}", args.steps, args.out_dir.display());
    Ok(())
}
