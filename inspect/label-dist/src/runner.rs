//! 程序运行函数.

use crate::result::{InspectResult, PreviewResult};
use std::env;
use std::path::PathBuf;
use std::thread;
use tumor_berry::loader::SampleLoader;
use tumor_berry::report::{self, SplitTable};
use tumor_berry::transform::Compose;
use tumor_berry::{vis, DatasetCatalog, Error, Result, Split};
use utils::loader;

/// 预览图输出路径的环境变量.
const PREVIEW_VAR: &str = "TUMOR_PREVIEW";

/// 预览图的样本数与列数.
const PREVIEW_SAMPLES: usize = 8;
const PREVIEW_COLUMNS: usize = 4;

/// 分类数据集: 训练集与测试集的类别计数.
///
/// 验证集显式排除在报告之外; 它是否存在只记录在日志里.
fn classification() -> Result<SplitTable> {
    let catalog = loader::cls_catalog()?;
    if catalog.has_split(Split::Validation) {
        log::info!("validation split is present but excluded from the report");
    } else {
        log::info!("validation split is absent");
    }
    report::split_report(&catalog, Split::except(Split::Validation))
}

/// 分割数据集: 各划分中空掩膜与含病灶掩膜的计数.
///
/// 一个划分都不存在时返回 `Error::MissingSplit`, 不输出空表.
fn segmentation(catalog: Result<DatasetCatalog>) -> Result<SplitTable> {
    let catalog = catalog?;
    let splits = catalog.available_splits();
    if splits.is_empty() {
        return Err(Error::MissingSplit {
            split: Split::Train,
            root: catalog.root().to_path_buf(),
        });
    }

    let loader = SampleLoader::default();
    let columns = splits
        .into_iter()
        .map(|split| {
            let dataset = catalog.dataset(split)?;
            log::debug!("counting masks of `{split}` ({} samples)", dataset.len());
            Ok((split, report::mask_presence(&dataset, &loader)?))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(SplitTable::from_counts(columns))
}

/// `$TUMOR_PIPELINE` 给出的流水线, 或默认的预览流水线.
fn pipeline() -> Result<Compose> {
    match loader::pipeline_from_env()? {
        Some(p) => Ok(p),
        None => utils::preview_pipeline(),
    }
}

/// 把 LGG 数据集第一个可用划分的前几个样本画成网格.
fn preview() -> PreviewResult {
    let out = env::var(PREVIEW_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("lgg-preview.png"));

    let catalog = loader::seg_catalog()?;
    let split = catalog
        .available_splits()
        .first()
        .copied()
        .ok_or_else(|| Error::MissingSplit {
            split: Split::Train,
            root: catalog.root().to_path_buf(),
        })?;
    let dataset = catalog.dataset(split)?;

    let pipeline = pipeline()?;
    log::info!("preview pipeline: {}", pipeline.describe());
    let sample_loader = SampleLoader::new(pipeline).with_seed(0);
    let pairs = sample_loader
        .iter(&dataset)
        .take(PREVIEW_SAMPLES)
        .map(|(_, r)| r.map(|l| l.pair))
        .collect::<Result<Vec<_>>>()?;

    vis::save_grid(&pairs, PREVIEW_COLUMNS, &out)?;
    Ok(out)
}

/// 实际运行.
pub fn run() -> InspectResult {
    println!("Inspecting datasets with {} cpus...", utils::cpus());
    thread::scope(|s| {
        let cls = s.spawn(classification);
        let lgg = s.spawn(|| segmentation(loader::seg_catalog()));
        let bx = s.spawn(|| segmentation(loader::box_catalog()));
        let pv = s.spawn(preview);

        let sections = [("brain-tumor", cls), ("lgg", lgg), ("box", bx)]
            .map(|(name, th)| (name, th.join().expect("Thread joining error")));
        InspectResult::new(sections, pv.join().expect("Thread joining error"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};
    use tumor_berry::report::{EMPTY_MASK, LESION_MASK};
    use tumor_berry::Layout;

    #[test]
    fn test_segmentation_without_splits_is_missing_split() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("TCGA_CS_4941")).unwrap();
        let catalog = DatasetCatalog::open(root.path(), Layout::lgg());
        assert!(matches!(
            segmentation(catalog),
            Err(Error::MissingSplit {
                split: Split::Train,
                ..
            })
        ));
    }

    #[test]
    fn test_segmentation_counts_masks() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("train/p");
        std::fs::create_dir_all(&dir).unwrap();
        for (i, lesion) in [(1, true), (2, false)] {
            RgbImage::from_pixel(4, 4, Rgb([9, 9, 9]))
                .save(dir.join(format!("p_{i}.png")))
                .unwrap();
            let v = if lesion { 255 } else { 0 };
            GrayImage::from_pixel(4, 4, Luma([v]))
                .save(dir.join(format!("p_{i}_mask.png")))
                .unwrap();
        }

        let table = segmentation(DatasetCatalog::open(root.path(), Layout::lgg())).unwrap();
        assert_eq!(table.splits(), [Split::Train]);
        assert_eq!(table.get(LESION_MASK, Split::Train), Some(1));
        assert_eq!(table.get(EMPTY_MASK, Split::Train), Some(1));
    }
}
