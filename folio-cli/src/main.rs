//! Folio command line
//!
//! Lays out a JSON document description on pages, then writes PNG pages
//! and/or the display lists.
//!
//! - folio doc.json -o out.png          # out.png, out-2.png, ...
//! - folio doc.json --display-list dl.json
//! - folio doc.json --dump-boxes --no-pagination

mod document;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgAction, Parser, ValueEnum};
use folio_common::CancelToken;
use folio_common::warning::{clear_warnings, warning_count};
use folio_css::{build_box_tree, layout_document, DisplayListOutputDevice, LayoutContext, PageConfig, Painter, StyleSession};
use folio_render::{FontSet, ImageStore, RasterDevice};
use owo_colors::OwoColorize;

use document::DocumentSpec;

/// Folio: paginated CSS box layout for document descriptions
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(author, version, about, long_about = None)]
#[command(after_help = r#"EXAMPLES:
    # Render every page to PNG
    folio report.json -o report.png

    # Dump the display lists as JSON
    folio report.json --display-list report.dl.json

    # Inspect the box tree of an unpaginated layout
    folio report.json --dump-boxes --no-pagination
"#)]
struct Cli {
    /// Document description (JSON)
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Write pages as PNG; pages after the first get a `-N` suffix
    #[arg(short, long, value_name = "PNG")]
    output: Option<PathBuf>,

    /// Write the display lists of all pages as JSON
    #[arg(long, value_name = "JSON")]
    display_list: Option<PathBuf>,

    /// Page size preset, overriding the document's layout settings
    #[arg(long, value_enum)]
    page: Option<PagePreset>,

    /// Lay out as one continuous page, ignoring page breaks
    #[arg(long)]
    no_pagination: bool,

    /// Print the laid-out box tree
    #[arg(long)]
    dump_boxes: bool,

    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PagePreset {
    A4,
    Letter,
}

impl PagePreset {
    fn config(self) -> PageConfig {
        match self {
            Self::A4 => PageConfig::a4(),
            Self::Letter => PageConfig::letter(),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    clear_warnings();

    let text = fs::read_to_string(&cli.input).with_context(|| format!("failed to read '{}'", cli.input.display()))?;
    let spec =
        DocumentSpec::from_json(&text).with_context(|| format!("invalid document '{}'", cli.input.display()))?;

    let mut options = spec.layout.clone().unwrap_or_default();
    if let Some(preset) = cli.page {
        options.page = preset.config();
    }
    if cli.no_pagination {
        options.page_breaks_allowed = false;
    }

    let (dom, styles) = spec.build();
    let base = cli.input.parent().unwrap_or_else(|| Path::new("."));
    let images = load_images(&spec, base);
    let fonts = FontSet::load_system();
    let metrics = fonts.layout_metrics();
    let session = StyleSession::new()?;

    let mut ctx = LayoutContext::new(&dom, &styles, &session)
        .with_options(options.clone())
        .with_metrics(metrics.as_ref())
        .with_image_sizes(images.sizes());
    let mut tree = build_box_tree(&ctx)?;
    layout_document(&mut tree, &mut ctx)?;
    let lists = Painter::new(&tree, &ctx).paint()?;
    println!("{} {} page(s), {} boxes", "Laid out".green().bold(), lists.len(), tree.len());

    if cli.dump_boxes
        && let Some(root) = tree.root()
    {
        println!("\n{}", "=== Box Tree ===".bold());
        print!("{}", tree.dump(&dom, root));
    }

    if let Some(path) = &cli.display_list {
        let json = serde_json::to_string_pretty(&lists)?;
        fs::write(path, json).with_context(|| format!("failed to write '{}'", path.display()))?;
        println!("{} {}", "Display list:".cyan(), path.display());
    }

    if let Some(output) = &cli.output {
        let cancel = CancelToken::new();
        for (page_no, list) in lists.iter().enumerate() {
            let mut device = RasterDevice::for_page(&options.page, &fonts, &images)?;
            device.render(list, &cancel)?;
            let path = page_path(output, page_no);
            device.save_png(&path)?;
            println!("{} {}", "Page:".cyan(), path.display());
        }
    }

    let warnings = warning_count();
    if warnings > 0 {
        eprintln!("{} {warnings} distinct warning(s); rerun with -v for details", "note:".yellow());
    }
    Ok(())
}

/// Decode the document's images. Unreadable files are reported and skipped;
/// their boxes keep the default replaced size.
fn load_images(spec: &DocumentSpec, base: &Path) -> ImageStore {
    let mut store = ImageStore::new();
    for (uri, file) in &spec.images {
        let path = base.join(file);
        let result = fs::read(&path)
            .map_err(anyhow::Error::from)
            .and_then(|bytes| Ok(store.insert_encoded(uri, &bytes)?));
        if let Err(e) = result {
            eprintln!("{} image '{uri}' ({}): {e}", "warning:".yellow(), path.display());
        }
    }
    store
}

/// `out.png` for the first page, `out-2.png`, `out-3.png`, ... after it.
fn page_path(output: &Path, page_no: usize) -> PathBuf {
    if page_no == 0 {
        return output.to_path_buf();
    }
    let stem = output.file_stem().map_or_else(|| "page".into(), |s| s.to_string_lossy());
    let name = match output.extension() {
        Some(ext) => format!("{stem}-{}.{}", page_no + 1, ext.to_string_lossy()),
        None => format!("{stem}-{}", page_no + 1),
    };
    output.with_file_name(name)
}
