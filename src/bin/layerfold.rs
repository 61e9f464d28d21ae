use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use layerfold::{
    BgOptions, DocObserver, Document, FlattenOpts, FrameIndex, Image, ImageId, LayerId, LayerKind,
    LayerMergedDown, Prefs, RenderOpts, Renderer, SelectedLayers, Sprite, SpriteFile,
};

#[derive(Parser, Debug)]
#[command(name = "layerfold", version)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the canvas, frame count and layer tree of a sprite document.
    Info(InfoArgs),
    /// Flatten a set of layers into one image layer.
    Flatten(FlattenArgs),
    /// Merge a layer into the image layer right below it.
    MergeDown(MergeDownArgs),
    /// Render a single frame as a PNG.
    Render(RenderArgs),
    /// Flatten, undo, and check that the sprite is restored exactly.
    UndoCheck(UndoCheckArgs),
}

#[derive(Parser, Debug)]
struct InfoArgs {
    /// Input sprite JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Args, Debug)]
struct PrefsArgs {
    /// Preferences JSON (background color, blend formula, undo limit).
    #[arg(long)]
    prefs: Option<PathBuf>,

    /// Override the background color, e.g. `#ffffff` or `#00000000`.
    #[arg(long)]
    bg_color: Option<String>,

    /// Use the legacy blend formula instead of the alpha-aware one.
    #[arg(long)]
    legacy_blend: bool,
}

#[derive(Parser, Debug)]
struct FlattenArgs {
    /// Input sprite JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output sprite JSON.
    #[arg(long)]
    out: PathBuf,

    /// Layers to flatten (`3` or `L3`, comma separated). Defaults to every top-level layer.
    #[arg(long, value_delimiter = ',', value_parser = parse_layer_id)]
    layer: Vec<LayerId>,

    /// Flatten into the bottom-most selected layer instead of a new layer.
    #[arg(long)]
    merge_down: bool,

    #[command(flatten)]
    prefs: PrefsArgs,
}

#[derive(Parser, Debug)]
struct MergeDownArgs {
    /// Input sprite JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output sprite JSON.
    #[arg(long)]
    out: PathBuf,

    /// Layer to merge into the one below it.
    #[arg(long, value_parser = parse_layer_id)]
    layer: LayerId,

    #[command(flatten)]
    prefs: PrefsArgs,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input sprite JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Frame index (0-based).
    #[arg(long, default_value_t = 0)]
    frame: u32,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    #[command(flatten)]
    prefs: PrefsArgs,
}

#[derive(Parser, Debug)]
struct UndoCheckArgs {
    /// Input sprite JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Layers to flatten (`3` or `L3`, comma separated). Defaults to every top-level layer.
    #[arg(long, value_delimiter = ',', value_parser = parse_layer_id)]
    layer: Vec<LayerId>,

    /// Flatten into the bottom-most selected layer instead of a new layer.
    #[arg(long)]
    merge_down: bool,

    #[command(flatten)]
    prefs: PrefsArgs,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Info(args) => cmd_info(args),
        Command::Flatten(args) => cmd_flatten(args),
        Command::MergeDown(args) => cmd_merge_down(args),
        Command::Render(args) => cmd_render(args),
        Command::UndoCheck(args) => cmd_undo_check(args),
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

fn parse_layer_id(s: &str) -> Result<LayerId, String> {
    let digits = s.strip_prefix(['L', 'l']).unwrap_or(s);
    digits
        .parse::<u64>()
        .map(LayerId)
        .map_err(|e| format!("invalid layer id '{s}': {e}"))
}

fn read_sprite(path: &Path) -> anyhow::Result<Sprite> {
    SpriteFile::load(path).with_context(|| format!("load sprite '{}'", path.display()))
}

fn write_sprite(sprite: &Sprite, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    SpriteFile::save(sprite, path).with_context(|| format!("write sprite '{}'", path.display()))
}

fn load_prefs(args: &PrefsArgs) -> anyhow::Result<Prefs> {
    let mut prefs = match &args.prefs {
        Some(path) => {
            Prefs::load(path).with_context(|| format!("load prefs '{}'", path.display()))?
        }
        None => Prefs::default(),
    };
    if let Some(hex) = &args.bg_color {
        prefs.bg_color =
            layerfold::parse_hex_color(hex).with_context(|| format!("parse --bg-color '{hex}'"))?;
    }
    if args.legacy_blend {
        prefs.new_blend = false;
    }
    Ok(prefs)
}

fn selection(sprite: &Sprite, ids: &[LayerId]) -> anyhow::Result<SelectedLayers> {
    if !ids.is_empty() {
        return Ok(ids.iter().copied().collect());
    }
    let root = sprite.try_layer(sprite.root())?;
    Ok(root.children().iter().copied().collect())
}

fn cmd_info(args: InfoArgs) -> anyhow::Result<()> {
    let sprite = read_sprite(&args.in_path)?;
    let canvas = sprite.canvas();
    println!(
        "canvas {}x{}, {} frame(s), {} layer(s)",
        canvas.width,
        canvas.height,
        sprite.total_frames(),
        sprite.layer_count()
    );
    let root = sprite.try_layer(sprite.root())?;
    for &child in root.children().iter().rev() {
        print_layer(&sprite, child, 0)?;
    }
    Ok(())
}

/// Prints top to bottom, the way layer panels list them.
fn print_layer(sprite: &Sprite, id: LayerId, depth: usize) -> anyhow::Result<()> {
    let layer = sprite.try_layer(id)?;
    let indent = "  ".repeat(depth);
    let mut flags = vec![];
    if layer.is_background() {
        flags.push("background");
    }
    if !layer.is_visible() {
        flags.push("hidden");
    }
    match layer.kind() {
        LayerKind::Image { cels } => {
            println!(
                "{indent}{id} image \"{}\" opacity={} blend={} cels={} {}",
                layer.name(),
                layer.opacity(),
                layer.blend_mode().as_str(),
                cels.len(),
                flags.join(" ")
            );
        }
        LayerKind::Group { children } => {
            println!(
                "{indent}{id} group \"{}\" opacity={} {}",
                layer.name(),
                layer.opacity(),
                flags.join(" ")
            );
            for &child in children.iter().rev() {
                print_layer(sprite, child, depth + 1)?;
            }
        }
    }
    Ok(())
}

fn cmd_flatten(args: FlattenArgs) -> anyhow::Result<()> {
    let sprite = read_sprite(&args.in_path)?;
    let prefs = load_prefs(&args.prefs)?;
    let opts = FlattenOpts {
        new_blend: prefs.new_blend,
        merge_down: args.merge_down,
    };
    let sel = selection(&sprite, &args.layer)?;
    let mut doc = Document::new(sprite, prefs);

    match layerfold::flatten_layers(&mut doc, &sel, opts)? {
        Some(id) => tracing::info!(layer = %id, "flattened"),
        None => eprintln!("nothing to flatten"),
    }

    write_sprite(doc.sprite(), &args.out)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

#[derive(Debug)]
struct LogMerges;

impl DocObserver for LogMerges {
    fn on_layer_merged_down(&mut self, ev: &LayerMergedDown) {
        tracing::info!(src = %ev.src, dst = %ev.dst, "layer merged down");
    }
}

fn cmd_merge_down(args: MergeDownArgs) -> anyhow::Result<()> {
    let sprite = read_sprite(&args.in_path)?;
    let prefs = load_prefs(&args.prefs)?;
    let mut doc = Document::new(sprite, prefs);
    doc.add_observer(Box::new(LogMerges));

    layerfold::merge_down_layer(&mut doc, args.layer)
        .with_context(|| format!("merge down {}", args.layer))?;

    write_sprite(doc.sprite(), &args.out)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let sprite = read_sprite(&args.in_path)?;
    let prefs = load_prefs(&args.prefs)?;
    let canvas = sprite.canvas();

    let bg = if args.prefs.bg_color.is_some() {
        BgOptions::Solid(prefs.bg_color)
    } else {
        BgOptions::None
    };
    let renderer = Renderer::new(RenderOpts {
        new_blend: prefs.new_blend,
        bg,
    });
    let mut frame = Image::new(ImageId(0), canvas.width, canvas.height);
    renderer.render_sprite(&mut frame, &sprite, FrameIndex(args.frame))?;

    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        frame.data(),
        frame.width(),
        frame.height(),
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_undo_check(args: UndoCheckArgs) -> anyhow::Result<()> {
    let sprite = read_sprite(&args.in_path)?;
    let prefs = load_prefs(&args.prefs)?;
    let opts = FlattenOpts {
        new_blend: prefs.new_blend,
        merge_down: args.merge_down,
    };
    let sel = selection(&sprite, &args.layer)?;
    let before = SpriteFile::from_sprite(&sprite);
    let mut doc = Document::new(sprite, prefs);

    if layerfold::flatten_layers(&mut doc, &sel, opts)?.is_none() {
        eprintln!("nothing to flatten");
        return Ok(());
    }
    let after = SpriteFile::from_sprite(doc.sprite());

    doc.undo()?;
    anyhow::ensure!(
        SpriteFile::from_sprite(doc.sprite()) == before,
        "undo did not restore the original sprite"
    );
    doc.redo()?;
    anyhow::ensure!(
        SpriteFile::from_sprite(doc.sprite()) == after,
        "redo did not reproduce the flattened sprite"
    );

    eprintln!("undo round trip ok");
    Ok(())
}
