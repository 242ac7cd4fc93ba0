use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use vixynt_bridge::{HostBridge, LocalBridge, batch};
use vixynt_catalog::gallery::{self, GalleryQuery, SortKey, SortOrder, TypeFilter};
use vixynt_catalog::{Catalog, ViewMode};
use vixynt_core::Selection;
use vixynt_core::mask;
use vixynt_labels::{export_csv, export_json, image_file_name, import_file};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Where the catalog database lives. Defaults to the platform data dir.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Rasterize a selection into a black/white PNG mask
    Mask {
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
        /// Selection JSON, e.g. '{"type":"rect","x1":10,"y1":10,"x2":50,"y2":40}'
        #[arg(long)]
        selection: String,
        #[arg(long)]
        out: PathBuf,
    },
    /// Label file utilities
    Labels {
        #[command(subcommand)]
        command: LabelsCommand,
    },
    /// Show or change stored preferences
    Prefs {
        #[arg(long)]
        view_mode: Option<ViewMode>,
        #[arg(long)]
        sidebar_collapsed: Option<bool>,
    },
    /// List the images in a directory the way the gallery shows them
    Gallery {
        dir: PathBuf,
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long, value_enum, default_value_t = FilterArg::All)]
        filter: FilterArg,
        #[arg(long, value_enum, default_value_t = SortArg::Name)]
        sort: SortArg,
        #[arg(long)]
        desc: bool,
        /// Number of pages to print
        #[arg(long, default_value_t = 1)]
        pages: usize,
    },
}

#[derive(Subcommand, Debug)]
pub enum LabelsCommand {
    /// Convert between .json and .csv label files
    Convert {
        input: PathBuf,
        output: PathBuf,
        /// Image the labels belong to, recorded in the output
        #[arg(long)]
        image: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum FilterArg {
    All,
    Jpg,
    Png,
    Webp,
    Gif,
}

impl From<FilterArg> for TypeFilter {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::All => TypeFilter::All,
            FilterArg::Jpg => TypeFilter::Jpg,
            FilterArg::Png => TypeFilter::Png,
            FilterArg::Webp => TypeFilter::Webp,
            FilterArg::Gif => TypeFilter::Gif,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum SortArg {
    Name,
    Type,
    Size,
    Date,
}

impl From<SortArg> for SortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Name => SortKey::Name,
            SortArg::Type => SortKey::Type,
            SortArg::Size => SortKey::Size,
            SortArg::Date => SortKey::Date,
        }
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Mask {
            width,
            height,
            selection,
            out,
        } => {
            let coverage = write_mask(&selection, width, height, &out)?;
            println!("{} ({:.1}% selected)", out.display(), coverage * 100.0);
        }
        Command::Labels {
            command:
                LabelsCommand::Convert {
                    input,
                    output,
                    image,
                },
        } => {
            let count = convert_labels(&input, &output, image.as_deref())?;
            println!("{count} labels written to {}", output.display());
        }
        Command::Prefs {
            view_mode,
            sidebar_collapsed,
        } => {
            let catalog = open_catalog(cli.data_dir)?;
            if let Some(mode) = view_mode {
                catalog.set_view_mode(mode)?;
            }
            if let Some(collapsed) = sidebar_collapsed {
                catalog.set_sidebar_collapsed(collapsed)?;
            }
            println!("view_mode = {}", catalog.view_mode()?);
            println!("sidebar_collapsed = {}", catalog.sidebar_collapsed()?);
        }
        Command::Gallery {
            dir,
            search,
            filter,
            sort,
            desc,
            pages,
        } => {
            let query = GalleryQuery {
                search,
                filter: filter.into(),
                sort: sort.into(),
                order: if desc { SortOrder::Desc } else { SortOrder::Asc },
            };
            for (path, size) in list_gallery(&dir, &query, pages).await? {
                println!("{size:>12}  {}", path.display());
            }
        }
    }
    Ok(())
}

pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vixynt")
}

fn open_catalog(data_dir: Option<PathBuf>) -> Result<Catalog> {
    let data_dir = data_dir.unwrap_or_else(default_data_dir);
    fs::create_dir_all(&data_dir)
        .with_context(|| format!("create data dir {}", data_dir.display()))?;
    let path = data_dir.join("vixynt.db");
    let catalog = Catalog::open(&path)?;
    info!(path = %path.display(), "catalog opened");
    Ok(catalog)
}

/// Rasterize `selection_json` and write the PNG. Returns the selected
/// fraction of the image.
fn write_mask(selection_json: &str, width: u32, height: u32, out: &Path) -> Result<f32> {
    let selection: Selection =
        serde_json::from_str(selection_json).context("parse selection JSON")?;
    let mask_image = mask::rasterize(&selection, width, height);
    let png = mask::encode_mask_png(&mask_image)?;
    fs::write(out, png).with_context(|| format!("write {}", out.display()))?;
    Ok(mask::coverage(&mask_image))
}

fn convert_labels(input: &Path, output: &Path, image: Option<&str>) -> Result<usize> {
    let labels = import_file(input)?;
    let ext = output
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    let content = match ext.as_str() {
        "json" => export_json(image, &labels)?,
        "csv" => export_csv(image_file_name(image), &labels),
        other => bail!("cannot write labels as '{other}', use .json or .csv"),
    };
    fs::write(output, content).with_context(|| format!("write {}", output.display()))?;
    info!(input = %input.display(), output = %output.display(), count = labels.len(), "labels converted");
    Ok(labels.len())
}

async fn list_gallery(dir: &Path, query: &GalleryQuery, pages: usize) -> Result<Vec<(PathBuf, u64)>> {
    let bridge = Arc::new(LocalBridge::new());
    let images = bridge
        .list_images(dir)
        .await
        .with_context(|| format!("list images in {}", dir.display()))?;
    let stats = batch::stats_for_all(Arc::clone(&bridge), images.clone()).await;
    let sorted = gallery::sort_and_filter(&images, &stats, query);
    Ok(gallery::visible(&sorted, pages)
        .iter()
        .map(|p| (p.clone(), stats.get(p).map(|s| s.size).unwrap_or(0)))
        .collect())
}
