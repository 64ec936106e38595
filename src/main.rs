//! note2pdf – export an HTML note file to PDF.
//!
//! Usage:
//!   note2pdf <note.html> [--title "My Note"] [--out-dir DIR] [--config cfg.json]
//!            [--layout-json layout.json] [--landscape]
//!
//! The PDF is named after the sanitized title (e.g. "My Notes!!" →
//! `my_notes__.pdf`) and written to `--out-dir`, by default the directory of
//! the input file.

use std::{
    env, fs,
    path::{Path, PathBuf},
    process,
};

use note_to_pdf::host::FileNoteHost;
use note_to_pdf::image_loader::HttpFetcher;
use note_to_pdf::layout_config::LayoutConfig;
use note_to_pdf::pipeline::{PageOrientation, PipelineConfig};
use note_to_pdf::{ExportOutcome, Exporter};

#[tokio::main]
async fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    let mut input_path: Option<PathBuf> = None;
    let mut out_dir: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;
    let mut layout_path: Option<PathBuf> = None;
    let mut landscape = false;
    let mut title: Option<String> = None;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--landscape" | "-l" => landscape = true,
            "--title" | "-t" => title = Some(required_value(&mut iter, arg, &args[0])),
            "--out-dir" | "-o" => out_dir = Some(required_value(&mut iter, arg, &args[0]).into()),
            "--config" | "-c" => config_path = Some(required_value(&mut iter, arg, &args[0]).into()),
            "--layout-json" => layout_path = Some(required_value(&mut iter, arg, &args[0]).into()),
            "--help" | "-h" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            other if other.starts_with('-') => {
                eprintln!("Unknown flag: {other}");
                print_usage(&args[0]);
                process::exit(1);
            }
            path => {
                if input_path.is_some() {
                    eprintln!("Unexpected argument: {path}");
                    print_usage(&args[0]);
                    process::exit(1);
                }
                input_path = Some(PathBuf::from(path));
            }
        }
    }

    let Some(input) = input_path else {
        eprintln!("Error: no input file specified.");
        print_usage(&args[0]);
        process::exit(1);
    };

    let mut config = match &config_path {
        Some(path) => {
            let loaded = fs::read_to_string(path)
                .map_err(|e| e.to_string())
                .and_then(|json| PipelineConfig::from_json(&json).map_err(|e| e.to_string()));
            match loaded {
                Ok(c) => c,
                Err(e) => {
                    eprintln!("Error loading config '{}': {e}", path.display());
                    process::exit(1);
                }
            }
        }
        None => PipelineConfig::default(),
    };
    if landscape {
        config.orientation = PageOrientation::Landscape;
    }

    let out_dir = out_dir.unwrap_or_else(|| {
        input
            .parent()
            .map(PathBuf::from)
            .unwrap_or_default()
    });

    let fetcher = match HttpFetcher::from_config(&config) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let host = FileNoteHost::new(&input, title, out_dir);
    let exporter = Exporter::new(host, fetcher, config);
    let (outcome, layout) = exporter.export_with_layout().await;

    if let (Some(layout_path), Some(layout)) = (&layout_path, &layout) {
        if let Err(e) = write_layout(layout, layout_path) {
            eprintln!("Error writing layout '{}': {e}", layout_path.display());
            process::exit(1);
        }
    }

    match outcome {
        ExportOutcome::Exported { pages, bytes, .. } => {
            log::debug!("{pages} page(s), {bytes} bytes");
        }
        ExportOutcome::NoSelection | ExportOutcome::Failed(_) => process::exit(1),
    }
}

fn required_value<'a>(iter: &mut impl Iterator<Item = &'a String>, flag: &str, prog: &str) -> String {
    match iter.next() {
        Some(v) => v.clone(),
        None => {
            eprintln!("Missing value for {flag}");
            print_usage(prog);
            process::exit(1);
        }
    }
}

/// Dump the page record of the exported document as JSON.
fn write_layout(layout: &LayoutConfig, path: &Path) -> std::io::Result<()> {
    fs::write(path, layout.to_json())
}

fn print_usage(prog: &str) {
    eprintln!("note2pdf – export an HTML note to PDF");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {prog} <note.html> [--title \"My Note\"] [--out-dir DIR] [--config cfg.json]");
    eprintln!("          [--layout-json layout.json] [--landscape]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  <note.html>     Note markup to export");
    eprintln!();
    eprintln!("Flags:");
    eprintln!("  --title, -t     Note title (default: input filename stem)");
    eprintln!("  --out-dir, -o   Output directory (default: directory of the input)");
    eprintln!("  --config, -c    JSON pipeline config; missing fields use defaults");
    eprintln!("  --layout-json   Also write the layout record of the saved PDF as JSON");
    eprintln!("  --landscape     Use landscape page orientation");
    eprintln!("  --help          Print this message");
}
