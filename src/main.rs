use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use qrlabel_pdf::manifest::write_manifest;
use qrlabel_pdf::prefs::{PrefKey, PrefsStore};
use qrlabel_pdf::session::Session;
use qrlabel_pdf::{Error, ExtractOptions, LabelSheet, Unit};

#[derive(Parser, Debug)]
#[command(author, version, about = "Print QR code labels for boxes from a spreadsheet or pasted rows")]
struct Args {
    #[command(subcommand)]
    source: Source,

    /// Page layout: a grid of small codes on A4, or one shipping label per page
    #[arg(long, value_enum, default_value_t = Layout::Grid)]
    layout: Layout,

    /// Label width for --layout label (remembered)
    #[arg(long)]
    width: Option<f32>,

    /// Label height for --layout label (remembered)
    #[arg(long)]
    height: Option<f32>,

    /// Unit of --width/--height
    #[arg(long, value_enum, default_value_t = UnitArg::In)]
    unit: UnitArg,

    /// Text placed before each identifier in the QR payload, e.g. a form URL (remembered)
    #[arg(long)]
    url_prefix: Option<String>,

    /// Column holding the identifier (default: detected, else "id")
    #[arg(long)]
    id_field: Option<String>,

    /// Drop rows with a blank identifier (default for pasted rows)
    #[arg(long, conflicts_with = "keep_blank_ids")]
    drop_blank_ids: bool,

    /// Keep rows with a blank identifier (default for workbooks)
    #[arg(long)]
    keep_blank_ids: bool,

    /// Caption font size in points
    #[arg(long)]
    font_size: Option<f32>,

    /// Output PDF
    #[arg(short, long, default_value = "qrcodes.pdf")]
    output: PathBuf,

    /// Identifier manifest
    #[arg(long, default_value = "containers.csv")]
    manifest: PathBuf,

    /// Omit the `id` header line from the manifest
    #[arg(long)]
    no_manifest_header: bool,
}

#[derive(Subcommand, Debug)]
enum Source {
    /// Read rows from an .xlsx workbook
    Sheet {
        input: PathBuf,
        /// Sheet to read; first match wins
        #[arg(long = "sheet-name", default_values = ["qr_export", "export_format"])]
        sheet_names: Vec<String>,
    },
    /// Read tab-separated rows (header first) from a file, or stdin with "-"
    Paste {
        #[arg(default_value = "-")]
        input: PathBuf,
    },
    /// Make up N fresh identifiers
    Generate {
        #[arg(short, long)]
        count: usize,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Layout {
    Grid,
    Label,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum UnitArg {
    In,
    Mm,
    Pt,
}

impl From<UnitArg> for Unit {
    fn from(u: UnitArg) -> Self {
        match u {
            UnitArg::In => Unit::In,
            UnitArg::Mm => Unit::Mm,
            UnitArg::Pt => Unit::Pt,
        }
    }
}

const DEFAULT_LABEL_WIDTH: f32 = 4.0;
const DEFAULT_LABEL_HEIGHT: f32 = 6.0;

/// Command-line value if given (and remembered), else the stored one.
fn remembered(store: &mut PrefsStore, key: PrefKey, given: Option<String>) -> Option<String> {
    match given {
        Some(v) => {
            if let Err(e) = store.set(key, &v) {
                log::warn!("Could not save {}: {e}", key.as_str());
            }
            Some(v)
        }
        None => store.get(key).map(str::to_string),
    }
}

fn parse_dimension(key: PrefKey, value: Option<String>, default: f32) -> Result<f32, Error> {
    match value {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{} '{v}' is not a number", key.as_str()))),
        None => Ok(default),
    }
}

fn run(args: Args) -> Result<(), Error> {
    let mut store = match PrefsStore::open_default() {
        Ok(store) => store,
        Err(e) => {
            log::warn!("{e}; preferences go to a temporary file");
            PrefsStore::open(std::env::temp_dir().join("qrlabel-prefs.json"))
        }
    };
    log::debug!("Preferences: {}", store.path().display());
    let url_prefix = remembered(&mut store, PrefKey::UrlPrefix, args.url_prefix.clone()).unwrap_or_default();

    let mut sheet = match args.layout {
        Layout::Grid => LabelSheet::a4_grid()?,
        Layout::Label => {
            let w = remembered(&mut store, PrefKey::LabelWidth, args.width.map(|v| v.to_string()));
            let h = remembered(&mut store, PrefKey::LabelHeight, args.height.map(|v| v.to_string()));
            LabelSheet::shipping_label(
                parse_dimension(PrefKey::LabelWidth, w, DEFAULT_LABEL_WIDTH)?,
                parse_dimension(PrefKey::LabelHeight, h, DEFAULT_LABEL_HEIGHT)?,
                args.unit.into(),
            )?
        }
    };
    if let Some(size) = args.font_size {
        sheet = LabelSheet::new(sheet.geometry, sheet.padding, sheet.captions, size)?;
    }

    let blank_policy = if args.drop_blank_ids {
        Some(true)
    } else if args.keep_blank_ids {
        Some(false)
    } else {
        None
    };
    let configure = |mut opts: ExtractOptions| {
        if let Some(field) = &args.id_field {
            opts = opts.with_id_field(field);
        }
        if let Some(drop) = blank_policy {
            opts = opts.with_drop_blank_ids(drop);
        }
        opts
    };

    let mut session = Session::new();
    match &args.source {
        Source::Sheet { input, sheet_names } => {
            let data = std::fs::read(input).map_err(|e| {
                Error::Io(std::io::Error::new(e.kind(), format!("{}: {}", e, input.display())))
            })?;
            session.load_workbook(&data, sheet_names.as_slice(), &configure(ExtractOptions::for_workbook()))?;
        }
        Source::Paste { input } => {
            let text = if input.as_os_str() == "-" {
                let mut buf = String::new();
                std::io::stdin().read_to_string(&mut buf)?;
                buf
            } else {
                std::fs::read_to_string(input)?
            };
            session.load_paste(&text, &configure(ExtractOptions::for_paste()));
        }
        Source::Generate { count } => {
            session.load_generated(*count);
        }
    }

    let Some(set) = session.records().cloned() else {
        log::warn!("No data loaded; nothing to print");
        return Ok(());
    };
    if set.is_empty() {
        log::warn!("All rows were filtered out; nothing to print");
        return Ok(());
    }

    let export = session.export(&sheet, &url_prefix)?;
    std::fs::write(&args.output, &export.pdf)?;
    log::info!(
        "Wrote {} ({} labels on {} pages)",
        args.output.display(),
        set.len(),
        export.pages
    );
    write_manifest(&args.manifest, set.identifiers(), !args.no_manifest_header)?;
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("Something went wrong while generating labels. Please check the input and try again.");
            ExitCode::FAILURE
        }
    }
}
