//! 对 `tumor-berry::dataset` 的更一层封装. 提供更直接的数据集目录.

use std::env;
use std::path::PathBuf;
use tumor_berry::transform::Compose;
use tumor_berry::{DatasetCatalog, Error, Layout, Result};

/// 脑肿瘤分类数据集目录的环境变量.
pub const CLS_DIR_VAR: &str = "TUMOR_CLS_DIR";

/// LGG 分割数据集目录的环境变量.
pub const SEG_DIR_VAR: &str = "TUMOR_SEG_DIR";

/// 图像/掩膜分目录的分割数据集目录的环境变量.
pub const BOX_DIR_VAR: &str = "TUMOR_BOX_DIR";

/// 变换流水线配置文件的环境变量.
pub const PIPELINE_VAR: &str = "TUMOR_PIPELINE";

/// 1. 若环境变量 `var` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/{name}`. 无法确定主目录时返回 `None`.
fn dir_from_env_or_home(var: &str, name: &str) -> Option<PathBuf> {
    match env::var(var) {
        Ok(d) if !d.is_empty() => Some(PathBuf::from(d)),
        _ => tumor_berry::dataset::home_dataset_dir_with([name]),
    }
}

fn open(dir: Option<PathBuf>, var: &str, name: &str, layout: Layout) -> Result<DatasetCatalog> {
    let dir =
        dir.ok_or_else(|| Error::InvalidArgument(format!("无法确定用户主目录, 请设置 `${var}`")))?;
    log::info!("loading `{name}` from {}", dir.display());
    DatasetCatalog::open(dir, layout)
}

/// 获取分类数据集基本路径: `$TUMOR_CLS_DIR` 或 `$HOME/dataset/brain-tumor`.
#[inline]
pub fn cls_dir_from_env_or_home() -> Option<PathBuf> {
    dir_from_env_or_home(CLS_DIR_VAR, "brain-tumor")
}

/// 获取 LGG 数据集基本路径: `$TUMOR_SEG_DIR` 或 `$HOME/dataset/lgg-mri-segmentation`.
#[inline]
pub fn seg_dir_from_env_or_home() -> Option<PathBuf> {
    dir_from_env_or_home(SEG_DIR_VAR, "lgg-mri-segmentation")
}

/// 获取分目录分割数据集基本路径: `$TUMOR_BOX_DIR` 或 `$HOME/dataset/box-segmentation`.
#[inline]
pub fn box_dir_from_env_or_home() -> Option<PathBuf> {
    dir_from_env_or_home(BOX_DIR_VAR, "box-segmentation")
}

/// 打开分类数据集 (按类别分目录).
pub fn cls_catalog() -> Result<DatasetCatalog> {
    open(cls_dir_from_env_or_home(), CLS_DIR_VAR, "brain-tumor", Layout::ClassFolders)
}

/// 打开 LGG 分割数据集 (`_mask` 后缀).
pub fn seg_catalog() -> Result<DatasetCatalog> {
    open(seg_dir_from_env_or_home(), SEG_DIR_VAR, "lgg-mri-segmentation", Layout::lgg())
}

/// 打开分目录分割数据集 (`images/`, `masks/`).
pub fn box_catalog() -> Result<DatasetCatalog> {
    open(box_dir_from_env_or_home(), BOX_DIR_VAR, "box-segmentation", Layout::separate_dirs())
}

/// 若设置了 `$TUMOR_PIPELINE`, 从该 JSON 文件构造流水线.
pub fn pipeline_from_env() -> Result<Option<Compose>> {
    match env::var(PIPELINE_VAR) {
        Ok(p) if !p.is_empty() => Compose::from_json_file(p).map(Some),
        _ => Ok(None),
    }
}
