//! hud-layout - inspect and maintain persisted HUD layouts.
//!
//! Usage:
//!   hud-layout path                                # Print the layout document path
//!   hud-layout show                                # List persisted element records
//!   hud-layout show --anchor TopRight              # Only records on one anchor
//!   hud-layout rescale --width 2560 --height 1440  # Preview a resolution change
//!   hud-layout reset --id minimap                  # Forget one element's layout

use clap::{Parser, Subcommand};
use hud_layout::geometry::ScreenSize;
use hud_layout::layout::{ElementRecord, LayoutDocument};
use hud_layout::widget::AnchorPoint;
use hud_layout::{Error, LayoutConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hud-layout")]
#[command(about = "Inspect and maintain persisted HUD layouts")]
struct Cli {
    /// Layout document to operate on (defaults to the configured location)
    #[arg(short, long, global = true)]
    file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the resolved layout document path
    Path,

    /// List every persisted element record
    Show {
        /// Only show records on this anchor (e.g. TopRight, bottom_left)
        #[arg(long)]
        anchor: Option<String>,
    },

    /// Apply the resolution-scaling rule to the document
    Rescale {
        /// Target screen width in pixels
        #[arg(long)]
        width: u32,

        /// Target screen height in pixels
        #[arg(long)]
        height: u32,

        /// Write the rescaled document back instead of only printing it
        #[arg(long)]
        write: bool,
    },

    /// Remove persisted records so elements fall back to their defaults
    Reset {
        /// Only remove this element (default: all)
        #[arg(long)]
        id: Option<String>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let path = cli
        .file
        .unwrap_or_else(|| LayoutConfig::load().layout_path());

    match cli.command {
        Commands::Path => println!("{}", path.display()),
        Commands::Show { anchor } => show(&path, anchor.as_deref())?,
        Commands::Rescale { width, height, write } => {
            rescale(&path, ScreenSize::new(width, height), write)?
        }
        Commands::Reset { id } => reset(&path, id.as_deref())?,
    }
    Ok(())
}

fn print_record(record: &ElementRecord) {
    if record.size_only {
        println!("{:<24} {:<12} size={}x{}", record.id, "(size only)", record.width, record.height);
        return;
    }
    println!(
        "{:<24} {:<12} offset=({:.1}, {:.1}) size={}x{}",
        record.id, record.anchor.as_str(), record.offset_x, record.offset_y, record.width, record.height
    );
}

fn show(path: &std::path::Path, anchor: Option<&str>) -> hud_layout::Result<()> {
    let filter = anchor
        .map(|name| AnchorPoint::from_str(name).ok_or_else(|| Error::UnknownAnchor(name.to_string())))
        .transpose()?;
    let document = LayoutDocument::read(path)?;
    println!(
        "{} (format v{}, saved at {}x{})",
        path.display(),
        document.format_version,
        document.saved_screen_width,
        document.saved_screen_height
    );
    for record in document
        .elements
        .iter()
        .filter(|r| filter.is_none_or(|a| r.anchor == a))
    {
        print_record(record);
    }
    Ok(())
}

fn rescale(path: &std::path::Path, screen: ScreenSize, write: bool) -> hud_layout::Result<()> {
    let mut document = LayoutDocument::read(path)?;
    if document.migrate(screen) {
        println!("Legacy document has no saved resolution; tagged as {}x{}", screen.width, screen.height);
    }
    let from = document.saved_screen();
    document.rescale(screen);
    println!(
        "{}x{} -> {}x{}",
        from.width, from.height, screen.width, screen.height
    );
    for record in &document.elements {
        print_record(record);
    }
    if write {
        document.write_atomic(path)?;
        println!("Wrote {}", path.display());
    }
    Ok(())
}

fn reset(path: &std::path::Path, id: Option<&str>) -> hud_layout::Result<()> {
    let mut document = LayoutDocument::read(path)?;
    let before = document.elements.len();
    match id {
        Some(id) => {
            document.elements.retain(|r| r.id != id);
            if document.elements.len() == before {
                return Err(Error::Other(format!("No record for '{}' in {}", id, path.display())));
            }
        }
        None => document.elements.clear(),
    }
    document.write_atomic(path)?;
    println!("Removed {} record(s)", before - document.elements.len());
    Ok(())
}
