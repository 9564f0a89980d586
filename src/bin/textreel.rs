use std::{io::BufRead as _, path::PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use sha2::Digest as _;
use textreel::{FramePacer as _, Surface as _};

#[derive(Parser, Debug)]
#[command(name = "textreel", version)]
struct Cli {
    /// Log debug events to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play the slideshow and record it (requires `ffmpeg` on PATH).
    Run(RunArgs),
    /// Render a single frame of the slideshow as a PNG.
    Frame(FrameArgs),
    /// Print the sentence sequence as JSON.
    Segment(InputArgs),
}

#[derive(Parser, Debug)]
struct InputArgs {
    /// Input document (plain text, or HTML with `--html` or an .html/.htm extension).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Treat the input as HTML and narrate only its visible text.
    #[arg(long)]
    html: bool,
}

#[derive(Parser, Debug)]
struct StyleArgs {
    /// TrueType/OpenType font used for the text.
    #[arg(long)]
    font: PathBuf,

    /// Surface width in pixels.
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Surface height in pixels.
    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Font size in pixels.
    #[arg(long, default_value_t = 24.0)]
    font_size: f32,

    /// Background color (#rrggbb or #rrggbbaa).
    #[arg(long, default_value = "#ffffff")]
    background: String,

    /// Text color (#rrggbb or #rrggbbaa).
    #[arg(long, default_value = "#000000")]
    foreground: String,

    /// Print diagnostics about the font (family name + SHA-256 of font bytes).
    #[arg(long)]
    dump_font: bool,
}

#[derive(Parser, Debug)]
struct RunArgs {
    #[command(flatten)]
    input: InputArgs,

    #[command(flatten)]
    style: StyleArgs,

    /// Directory the recording is exported into.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Capture frame rate.
    #[arg(long, default_value_t = 60)]
    fps: u32,

    /// Render on a virtual clock as fast as possible instead of in real time.
    #[arg(long)]
    offline: bool,

    /// Cancel the run after this many milliseconds of run time.
    #[arg(long)]
    stop_after_ms: Option<u64>,

    /// Cancel the run when a line is entered on stdin.
    #[arg(long)]
    stop_on_enter: bool,

    /// Print the run report as JSON on stdout.
    #[arg(long)]
    report: bool,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    input: InputArgs,

    #[command(flatten)]
    style: StyleArgs,

    /// Time offset into the slideshow, in milliseconds.
    #[arg(long, default_value_t = 0)]
    at_ms: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Command::Run(args) => cmd_run(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Segment(args) => cmd_segment(args),
    }
}

fn text_source(input: &InputArgs) -> anyhow::Result<Box<dyn textreel::TextSource>> {
    let is_html = input.html
        || input
            .in_path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("htm"));
    Ok(if is_html {
        Box::new(textreel::HtmlDocument::from_file(&input.in_path)?)
    } else {
        Box::new(textreel::PlainText::from_file(&input.in_path)?)
    })
}

fn frame_style(args: &StyleArgs) -> anyhow::Result<textreel::FrameStyle> {
    let style = textreel::FrameStyle {
        background: textreel::Rgba8::from_hex(&args.background)?,
        foreground: textreel::Rgba8::from_hex(&args.foreground)?,
        font_size_px: args.font_size,
        line_height_px: args.font_size * 1.25,
        ..textreel::FrameStyle::default()
    };
    style.validate()?;
    Ok(style)
}

fn make_surface(args: &StyleArgs) -> anyhow::Result<textreel::CpuSurface> {
    let size = textreel::Size::new(args.width, args.height)?;
    let surface = textreel::CpuSurface::from_font_file(size, &args.font)?;
    if args.dump_font {
        eprintln!("font diagnostics:");
        eprintln!("  source:  {}", args.font.display());
        eprintln!("  family:  {}", surface.font_family());
        eprintln!("  sha256:  {}", sha256_hex(surface.font_bytes()));
    }
    Ok(surface)
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    let source = text_source(&args.input)?;
    let style = frame_style(&args.style)?;
    let surface = make_surface(&args.style)?;
    let fps = textreel::Fps::new(args.fps, 1)?;

    let cancel = textreel::CancelToken::new();
    if args.stop_on_enter {
        let token = cancel.clone();
        std::thread::spawn(move || {
            let mut line = String::new();
            if std::io::stdin().lock().read_line(&mut line).is_ok() {
                token.cancel();
            }
        });
    }

    let pacer: Box<dyn textreel::FramePacer> = if args.offline {
        Box::new(textreel::OfflinePacer::new(fps))
    } else {
        Box::new(textreel::RealtimePacer::new(fps))
    };
    let pacer: Box<dyn textreel::FramePacer> = match args.stop_after_ms {
        Some(ms) => Box::new(CancelAfter {
            inner: pacer,
            at: textreel::Millis(ms),
            token: cancel.clone(),
        }),
        None => pacer,
    };

    let host = textreel::RunHost {
        presentation: Box::new(textreel::HeadlessPresentation::new(surface)),
        media: Box::new(textreel::FfmpegMedia::new(textreel::FfmpegOpts {
            bg_rgba: [
                style.background.r,
                style.background.g,
                style.background.b,
                255,
            ],
            ..textreel::FfmpegOpts::default()
        })),
        exporter: Box::new(textreel::DirExport::new(&args.out_dir)),
        pacer,
    };
    let opts = textreel::RunOpts { fps, style };

    let mut run = textreel::RunController::start(source.as_ref(), host, opts)
        .with_context(|| format!("start run for '{}'", args.input.in_path.display()))?;
    let report = run.run_to_end(&cancel)?;

    if args.report {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    match &report.exported {
        Some(name) => eprintln!("wrote {}", args.out_dir.join(name).display()),
        None => eprintln!("nothing recorded"),
    }
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let source = text_source(&args.input)?;
    let style = frame_style(&args.style)?;
    let mut surface = make_surface(&args.style)?;
    let sentences = textreel::segment(&source.extract_visible_text()?);

    // Step the driver on a virtual clock up to the requested offset.
    let fps = textreel::Fps::default();
    let mut driver = textreel::AnimationDriver::new(sentences, style);
    let mut pacer = textreel::OfflinePacer::new(fps);
    pacer.request_frame();
    while let Some(now) = pacer.next_frame() {
        let tick = driver.tick(now, &mut surface)?;
        if tick != textreel::Tick::Continue || now >= textreel::Millis(args.at_ms) {
            break;
        }
        pacer.request_frame();
    }
    if driver.frames_rendered() == 0 {
        anyhow::bail!("input has no text to render");
    }

    let frame = surface.snapshot()?;
    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        &args.out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_segment(args: InputArgs) -> anyhow::Result<()> {
    let source = text_source(&args)?;
    let sentences = textreel::segment(&source.extract_visible_text()?);
    println!("{}", serde_json::to_string_pretty(&sentences)?);
    Ok(())
}

/// Pacer wrapper that requests cancellation once run time reaches `at`.
struct CancelAfter {
    inner: Box<dyn textreel::FramePacer>,
    at: textreel::Millis,
    token: textreel::CancelToken,
}

impl textreel::FramePacer for CancelAfter {
    fn request_frame(&mut self) {
        self.inner.request_frame();
    }

    fn cancel_frame(&mut self) {
        self.inner.cancel_frame();
    }

    fn next_frame(&mut self) -> Option<textreel::Millis> {
        let now = self.inner.next_frame()?;
        if now >= self.at {
            self.token.cancel();
        }
        Some(now)
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = sha2::Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        out.push_str(&format!("{:02x}", b));
    }
    out
}
