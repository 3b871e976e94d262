use anyhow::{ensure, format_err, Context, Result};
use clap::Parser;
use image::{ImageBuffer, Luma};
use mrnet::{
    dataset::PlaneInventory,
    label::TaskLabels,
    processor::{ResizeFilter, SlicePreprocessor, DEFAULT_IMAGE_SIZE},
    task::{Plane, Split},
    volume::{load_volume, volume_path},
};
use ndarray::Axis;
use prettytable::{cell, row, Table};
use std::{
    env,
    path::{Path, PathBuf},
};
use tracing::info;
use tracing_subscriber::{filter::LevelFilter, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
enum Opts {
    /// Print exam, label and slice statistics per split and plane
    Info {
        /// directory containing <split>/<plane>/<exam_id>.npy
        #[clap(long)]
        data_dir: PathBuf,
        /// directory containing <split>-<task>.csv
        #[clap(long)]
        label_dir: PathBuf,
        /// only scan this split
        #[clap(long)]
        split: Option<Split>,
        /// only scan this plane
        #[clap(long)]
        plane: Option<Plane>,
    },
    /// Preprocess one slice and save it as a grayscale PNG
    ExportSlice {
        #[clap(long)]
        data_dir: PathBuf,
        #[clap(long)]
        split: Split,
        #[clap(long)]
        plane: Plane,
        #[clap(long)]
        exam_id: String,
        /// slice index in the volume
        #[clap(long)]
        slice: usize,
        #[clap(long, default_value_t = DEFAULT_IMAGE_SIZE)]
        image_size: usize,
        /// output PNG file
        #[clap(long)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    // setup tracing
    let filter_layer = {
        let filter = EnvFilter::from_default_env();
        if env::var("RUST_LOG").is_err() {
            filter.add_directive(LevelFilter::INFO.into())
        } else {
            filter
        }
    };
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(tracing_subscriber::fmt::layer().compact())
        .init();

    match Opts::parse() {
        Opts::Info {
            data_dir,
            label_dir,
            split,
            plane,
        } => {
            info(&data_dir, &label_dir, split, plane)?;
        }
        Opts::ExportSlice {
            data_dir,
            split,
            plane,
            exam_id,
            slice,
            image_size,
            output,
        } => {
            export_slice(
                &data_dir.join(split.as_str()),
                plane,
                &exam_id,
                slice,
                image_size,
                &output,
            )?;
        }
    }

    Ok(())
}

fn info(
    data_dir: &Path,
    label_dir: &Path,
    split: Option<Split>,
    plane: Option<Plane>,
) -> Result<()> {
    let splits: Vec<_> = split.map(|split| vec![split]).unwrap_or_else(|| Split::ALL.to_vec());
    let planes: Vec<_> = plane.map(|plane| vec![plane]).unwrap_or_else(|| Plane::ALL.to_vec());

    let mut table = Table::new();
    table.add_row(row![
        "split",
        "plane",
        "exams",
        "with volume",
        "usable",
        "acl+",
        "meniscus+",
        "slices",
        "slices min/mean/max"
    ]);

    for split in splits {
        let labels = TaskLabels::load(label_dir, split)?;
        let split_dir = data_dir.join(split.as_str());

        for &plane in &planes {
            info!("scanning {} {}", split, plane);
            let inventory = PlaneInventory::scan(&split_dir, &labels, split, plane)?;
            let range = inventory
                .slice_count_range()
                .map(|(min, mean, max)| format!("{}/{:.1}/{}", min, mean, max))
                .unwrap_or_else(|| "-".to_string());

            table.add_row(row![
                split,
                plane,
                inventory.exams,
                inventory.with_volume,
                inventory.usable,
                inventory.acl_positive,
                inventory.meniscus_positive,
                inventory.total_slices(),
                range
            ]);
        }
    }

    table.printstd();
    Ok(())
}

fn export_slice(
    split_dir: &Path,
    plane: Plane,
    exam_id: &str,
    slice_index: usize,
    image_size: usize,
    output: &Path,
) -> Result<()> {
    let path = volume_path(split_dir, plane, exam_id);
    let volume =
        load_volume(&path)?.ok_or_else(|| format_err!("'{}' does not exist", path.display()))?;
    let num_slices = volume.len_of(Axis(0));
    ensure!(
        slice_index < num_slices,
        "slice index {} is out of range, the volume has {} slices",
        slice_index,
        num_slices
    );

    let processor = SlicePreprocessor::square(image_size, 1, ResizeFilter::default())?;
    let image = processor.process(volume.index_axis(Axis(0), slice_index))?;
    let channel = image.index_axis(Axis(2), 0);

    let (height, width) = channel.dim();
    let pixels: Vec<u8> = channel
        .iter()
        .map(|&value| (value * 255.0).round().clamp(0.0, 255.0) as u8)
        .collect();
    let buffer: ImageBuffer<Luma<u8>, _> =
        ImageBuffer::from_raw(width as u32, height as u32, pixels)
            .ok_or_else(|| format_err!("image buffer does not match its size"))?;
    buffer
        .save(output)
        .with_context(|| format!("failed to write '{}'", output.display()))?;

    info!(
        "saved slice {} of exam '{}' to '{}'",
        slice_index,
        exam_id,
        output.display()
    );
    Ok(())
}
