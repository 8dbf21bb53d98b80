//! JSON manifest 布局.
//!
//! ```json
//! {
//!   "task": "classification",
//!   "splits": {
//!     "train": [{ "image": "imgs/a.png", "label": "benign" }],
//!     "test":  [{ "image": "imgs/b.png", "label": "malignant" }]
//!   }
//! }
//! ```
//!
//! 分割任务的条目写作 `{ "image": "...", "mask": "..." }`. 相对路径以 manifest
//! 所在目录为基准.
//!
//! 可选的 `"classes": [...]` 显式给出类别集合; 此时条目中出现集合外的类别名会得到
//! `Error::UnknownLabel`. 缺省时类别集合为所有条目类别名的并集.

use super::{Sample, Task};
use crate::{Error, LabelIndex, Result, Split};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// manifest 中的一个条目.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// 图像路径.
    pub image: PathBuf,

    /// 分类任务的类别名.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// 分割任务的掩膜路径.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<PathBuf>,
}

/// 已解析的 manifest.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Manifest {
    task: Task,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    classes: Option<Vec<String>>,
    splits: BTreeMap<Split, Vec<ManifestEntry>>,
    #[serde(skip)]
    base: PathBuf,
}

impl Manifest {
    /// 读取并解析 `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let mut manifest: Manifest =
            serde_json::from_str(&text).map_err(|source| Error::Manifest {
                path: path.to_path_buf(),
                source,
            })?;
        manifest.base = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();
        Ok(manifest)
    }

    /// 相对路径的基准目录.
    #[inline]
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// 任务类型.
    #[inline]
    pub fn task(&self) -> Task {
        self.task
    }

    /// 是否列出了 `split`?
    #[inline]
    pub fn has_split(&self, split: Split) -> bool {
        self.splits.contains_key(&split)
    }

    /// 类别名 (可能重复): 显式声明的 `classes`, 或所有条目中出现过的类别名.
    pub fn class_names(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        match &self.classes {
            Some(classes) => Box::new(classes.iter().map(String::as_str)),
            None => Box::new(
                self.splits
                    .values()
                    .flatten()
                    .filter_map(|e| e.label.as_deref()),
            ),
        }
    }

    /// 把 `split` 的条目解析为样本. 顺序由 `DatasetCatalog::samples` 统一按图像路径排序.
    pub(crate) fn samples(&self, split: Split, labels: Option<&LabelIndex>) -> Result<Vec<Sample>> {
        let entries = self.splits.get(&split).ok_or_else(|| Error::MissingSplit {
            split,
            root: self.base.clone(),
        })?;

        entries
            .iter()
            .map(|e| {
                let image = self.base.join(&e.image);
                match self.task {
                    Task::Classification => {
                        let name = e.label.as_deref().ok_or_else(|| {
                            Error::InvalidArgument(format!(
                                "manifest 条目 {} 缺少 label",
                                image.display()
                            ))
                        })?;
                        let id = labels.ok_or(Error::NoLabels)?.class_to_idx(name)?;
                        Ok(Sample::classification(image, id))
                    }
                    Task::Segmentation => match &e.mask {
                        Some(m) => Ok(Sample::segmentation(image, self.base.join(m))),
                        None => Err(Error::MissingMask { image }),
                    },
                }
            })
            .collect()
    }
}
