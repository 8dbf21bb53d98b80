//! 数据集目录: 把 (根目录, 划分) 解析成确定顺序的样本列表.

use super::{scan, Dataset, Sample};
use crate::consts::{DEFAULT_IMAGE_DIR, DEFAULT_MASK_DIR, DEFAULT_MASK_SUFFIX};
use crate::{Error, LabelIndex, Result, Split};
use once_cell::sync::OnceCell;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[cfg(feature = "serde")]
use super::manifest::Manifest;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 任务类型.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum Task {
    /// 图像分类: 样本携带类别 id.
    Classification,

    /// 语义分割: 样本携带掩膜路径.
    Segmentation,
}

/// 数据集在磁盘上的组织方式.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Layout {
    /// `root/<split>/<class>/<image>`. 类别由子目录名给出.
    ClassFolders,

    /// `root/<split>/**/<stem>.<ext>`, 掩膜为同目录下的 `<stem><suffix>.<ext>`.
    /// 会递归扫描子目录 (如 LGG 数据集的病人目录).
    MaskSuffix {
        /// 掩膜文件名后缀, 不能为空.
        suffix: String,
    },

    /// `root/<split>/<images>/<stem>.*`, 掩膜为 `root/<split>/<masks>/<stem>.*`.
    SeparateDirs {
        /// 图像子目录名.
        images: String,
        /// 掩膜子目录名.
        masks: String,
    },
}

impl Layout {
    /// LGG 数据集布局: 掩膜后缀为 `_mask`.
    #[inline]
    pub fn lgg() -> Self {
        Self::MaskSuffix {
            suffix: DEFAULT_MASK_SUFFIX.to_string(),
        }
    }

    /// `images/` 与 `masks/` 分目录的布局.
    #[inline]
    pub fn separate_dirs() -> Self {
        Self::SeparateDirs {
            images: DEFAULT_IMAGE_DIR.to_string(),
            masks: DEFAULT_MASK_DIR.to_string(),
        }
    }

    /// 该布局对应的任务类型.
    #[inline]
    pub fn task(&self) -> Task {
        match self {
            Self::ClassFolders => Task::Classification,
            Self::MaskSuffix { .. } | Self::SeparateDirs { .. } => Task::Segmentation,
        }
    }
}

#[derive(Debug)]
enum Source {
    Dir(Layout),
    #[cfg(feature = "serde")]
    Manifest(Manifest),
}

/// 数据集目录.
///
/// 同样的参数总会枚举出同样顺序 (按图像路径字典序) 的样本.
/// 标签索引在第一次需要时构造一次, 之后所有 [`Dataset`] 共享它.
#[derive(Debug)]
pub struct DatasetCatalog {
    root: PathBuf,
    source: Source,
    labels: OnceCell<Arc<LabelIndex>>,
}

impl DatasetCatalog {
    /// 以 `layout` 打开 `root` 目录下的数据集.
    ///
    /// `root` 不是目录时返回 `Error::Io` (`NotFound`).
    pub fn open<P: AsRef<Path>>(root: P, layout: Layout) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(Error::io(
                root,
                io::Error::new(io::ErrorKind::NotFound, "数据集根目录不存在"),
            ));
        }
        if let Layout::MaskSuffix { suffix } = &layout {
            if suffix.is_empty() {
                return Err(Error::InvalidArgument("掩膜后缀不能为空".to_string()));
            }
        }
        log::debug!("opened catalog {} ({layout:?})", root.display());
        Ok(Self {
            root,
            source: Source::Dir(layout),
            labels: OnceCell::new(),
        })
    }

    /// 从 JSON manifest 打开数据集. 相对路径以 manifest 所在目录为基准.
    #[cfg(feature = "serde")]
    pub fn from_manifest<P: AsRef<Path>>(path: P) -> Result<Self> {
        let manifest = Manifest::open(path.as_ref())?;
        Ok(Self {
            root: manifest.base().to_path_buf(),
            source: Source::Manifest(manifest),
            labels: OnceCell::new(),
        })
    }

    /// 数据集根目录.
    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 任务类型.
    pub fn task(&self) -> Task {
        match &self.source {
            Source::Dir(layout) => layout.task(),
            #[cfg(feature = "serde")]
            Source::Manifest(m) => m.task(),
        }
    }

    /// `split` 在存储中是否存在?
    pub fn has_split(&self, split: Split) -> bool {
        match &self.source {
            Source::Dir(_) => self.split_dir(split).is_some(),
            #[cfg(feature = "serde")]
            Source::Manifest(m) => m.has_split(split),
        }
    }

    /// 存储中存在的划分, 顺序同 [`Split::ALL`].
    pub fn available_splits(&self) -> Vec<Split> {
        Split::ALL
            .into_iter()
            .filter(|s| self.has_split(*s))
            .collect()
    }

    /// 按图像路径字典序返回 `split` 的所有样本.
    ///
    /// # 错误
    ///
    /// 1. 划分不存在时返回 `Error::MissingSplit`;
    /// 2. 划分存在但没有样本时返回 `Error::EmptySplit`;
    /// 3. 分割数据集中图像缺少掩膜时返回 `Error::MissingMask`.
    pub fn samples(&self, split: Split) -> Result<Vec<Sample>> {
        let mut samples = match &self.source {
            Source::Dir(layout) => {
                let dir = self.split_dir(split).ok_or_else(|| self.missing(split))?;
                match layout {
                    Layout::ClassFolders => self.class_folder_samples(&dir)?,
                    Layout::MaskSuffix { suffix } => mask_suffix_samples(&dir, suffix)?,
                    Layout::SeparateDirs { images, masks } => {
                        let images = dir.join(images);
                        if !images.is_dir() {
                            return Err(self.missing(split));
                        }
                        separate_dir_samples(&images, &dir.join(masks))?
                    }
                }
            }
            #[cfg(feature = "serde")]
            Source::Manifest(m) => {
                let labels = match m.task() {
                    Task::Classification => Some(self.label_index()?),
                    Task::Segmentation => None,
                };
                m.samples(split, labels.as_deref())?
            }
        };

        if samples.is_empty() {
            return Err(Error::EmptySplit {
                split,
                root: self.root.clone(),
            });
        }
        samples.sort_by(|a, b| a.image.cmp(&b.image));
        log::debug!(
            "split `{split}`: {} samples under {}",
            samples.len(),
            self.root.display()
        );
        Ok(samples)
    }

    /// 获取 (必要时构造) 共享的标签索引.
    ///
    /// 类别集合为所有存在的划分下类别目录名的并集, 因此各划分的 id 一致.
    /// 分割数据集返回 `Error::NoLabels`.
    pub fn label_index(&self) -> Result<Arc<LabelIndex>> {
        self.labels
            .get_or_try_init(|| self.build_label_index().map(Arc::new))
            .cloned()
    }

    /// 构造 `split` 的数据集.
    pub fn dataset(&self, split: Split) -> Result<Dataset> {
        let samples = self.samples(split)?;
        let labels = match self.task() {
            Task::Classification => Some(self.label_index()?),
            Task::Segmentation => None,
        };
        Ok(Dataset::from_samples(split, samples, labels))
    }

    fn build_label_index(&self) -> Result<LabelIndex> {
        let idx = match &self.source {
            Source::Dir(Layout::ClassFolders) => LabelIndex::from_class_dirs(
                Split::ALL.into_iter().filter_map(|s| self.split_dir(s)),
            )?,
            Source::Dir(_) => return Err(Error::NoLabels),
            #[cfg(feature = "serde")]
            Source::Manifest(m) => match m.task() {
                Task::Classification => LabelIndex::from_names(m.class_names()),
                Task::Segmentation => return Err(Error::NoLabels),
            },
        };
        log::debug!("label index: {:?}", idx.names());
        Ok(idx)
    }

    /// 第一个存在的划分目录 (规范名优先, 其次别名).
    fn split_dir(&self, split: Split) -> Option<PathBuf> {
        split
            .dir_names()
            .iter()
            .map(|name| self.root.join(name))
            .find(|p| p.is_dir())
    }

    #[inline]
    fn missing(&self, split: Split) -> Error {
        Error::MissingSplit {
            split,
            root: self.root.clone(),
        }
    }

    fn class_folder_samples(&self, dir: &Path) -> Result<Vec<Sample>> {
        let labels = self.label_index()?;
        let mut ans = Vec::new();
        for (name, class_dir) in scan::subdirs(dir)? {
            let id = labels.class_to_idx(&name)?;
            ans.extend(
                scan::images(&class_dir, false)?
                    .into_iter()
                    .map(|p| Sample::classification(p, id)),
            );
        }
        Ok(ans)
    }
}

#[inline]
fn is_mask(path: &Path, suffix: &str) -> bool {
    scan::stem(path).is_some_and(|s| s.ends_with(suffix))
}

/// `a/b/x.tif` -> `a/b/x{suffix}.tif`.
fn mask_path_for(image: &Path, suffix: &str) -> Option<PathBuf> {
    let stem = scan::stem(image)?;
    let ext = image.extension()?.to_str()?;
    Some(image.with_file_name(format!("{stem}{suffix}.{ext}")))
}

fn mask_suffix_samples(dir: &Path, suffix: &str) -> Result<Vec<Sample>> {
    let files = scan::images(dir, true)?;
    let masks: HashSet<&Path> = files
        .iter()
        .filter(|p| is_mask(p, suffix))
        .map(PathBuf::as_path)
        .collect();

    let mut ans = Vec::new();
    for image in files.iter().filter(|p| !is_mask(p, suffix)) {
        match mask_path_for(image, suffix) {
            Some(mask) if masks.contains(mask.as_path()) => {
                ans.push(Sample::segmentation(image, mask));
            }
            _ => {
                return Err(Error::MissingMask {
                    image: image.clone(),
                })
            }
        }
    }

    let orphans = masks.len() - ans.len();
    if orphans > 0 {
        log::warn!("{orphans} masks under {} have no image", dir.display());
    }
    Ok(ans)
}

fn separate_dir_samples(images: &Path, masks: &Path) -> Result<Vec<Sample>> {
    let images = scan::images(images, false)?;
    if !masks.is_dir() {
        // 整个掩膜目录缺失: 第一张图像即缺少掩膜.
        return match images.into_iter().next() {
            Some(image) => Err(Error::MissingMask { image }),
            None => Ok(Vec::new()),
        };
    }

    let by_stem: HashMap<String, PathBuf> = scan::images(masks, false)?
        .into_iter()
        .filter_map(|p| Some((scan::stem(&p)?.to_string(), p)))
        .collect();

    images
        .into_iter()
        .map(|image| {
            match scan::stem(&image).and_then(|s| by_stem.get(s)) {
                Some(mask) => Ok(Sample::segmentation(image.clone(), mask.clone())),
                None => Err(Error::MissingMask { image }),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(p: &Path) {
        fs::create_dir_all(p.parent().unwrap()).unwrap();
        fs::write(p, b"").unwrap();
    }

    /// train: benign x6, malignant x4; test: benign x1; 没有 validation.
    fn classification_root() -> tempfile::TempDir {
        let root = tempfile::tempdir().unwrap();
        for i in 0..6 {
            touch(&root.path().join(format!("train/benign/b{i}.png")));
        }
        for i in 0..4 {
            touch(&root.path().join(format!("train/malignant/m{i}.jpg")));
        }
        touch(&root.path().join("test/benign/t0.png"));
        root
    }

    #[test]
    fn test_classification_catalog() {
        let root = classification_root();
        let cat = DatasetCatalog::open(root.path(), Layout::ClassFolders).unwrap();
        assert_eq!(cat.task(), Task::Classification);
        assert_eq!(cat.available_splits(), vec![Split::Train, Split::Test]);

        let ds = cat.dataset(Split::Train).unwrap();
        assert_eq!(ds.len(), 10);
        let labels = ds.label_index().unwrap();
        assert_eq!(labels.names(), ["benign", "malignant"]);
        assert_eq!(ds.iter().filter(|s| s.label() == Some(0)).count(), 6);
        assert_eq!(ds.iter().filter(|s| s.label() == Some(1)).count(), 4);

        // 测试集里只有 benign, 但 id 与训练集一致.
        let test = cat.dataset(Split::Test).unwrap();
        assert_eq!(test[0].label(), Some(0));
        assert!(Arc::ptr_eq(
            &ds.shared_label_index().unwrap(),
            &test.shared_label_index().unwrap()
        ));
    }

    #[test]
    fn test_samples_are_deterministic_and_sorted() {
        let root = classification_root();
        let cat = DatasetCatalog::open(root.path(), Layout::ClassFolders).unwrap();
        let a = cat.samples(Split::Train).unwrap();
        let b = cat.samples(Split::Train).unwrap();
        assert_eq!(a, b);
        assert!(a.windows(2).all(|w| w[0].image < w[1].image));

        let again = DatasetCatalog::open(root.path(), Layout::ClassFolders).unwrap();
        assert_eq!(again.samples(Split::Train).unwrap(), a);
    }

    #[test]
    fn test_missing_and_empty_split() {
        let root = classification_root();
        fs::create_dir_all(root.path().join("val")).unwrap();
        let cat = DatasetCatalog::open(root.path(), Layout::ClassFolders).unwrap();
        assert!(cat.has_split(Split::Validation));
        assert!(matches!(
            cat.dataset(Split::Validation),
            Err(Error::EmptySplit {
                split: Split::Validation,
                ..
            })
        ));

        let root2 = classification_root();
        let cat2 = DatasetCatalog::open(root2.path(), Layout::ClassFolders).unwrap();
        assert!(matches!(
            cat2.dataset(Split::Validation),
            Err(Error::MissingSplit {
                split: Split::Validation,
                ..
            })
        ));
    }

    #[test]
    fn test_missing_root() {
        let root = tempfile::tempdir().unwrap();
        let err = DatasetCatalog::open(root.path().join("nope"), Layout::ClassFolders).unwrap_err();
        assert!(matches!(err, Error::Io { ref source, .. } if source.kind() == io::ErrorKind::NotFound));
    }

    #[test]
    fn test_lgg_layout_pairs_masks_recursively() {
        let root = tempfile::tempdir().unwrap();
        for patient in ["TCGA_CS_4941", "TCGA_DU_5849"] {
            for i in 1..=5 {
                touch(&root.path().join(format!("train/{patient}/{patient}_{i}.tif")));
                touch(&root.path().join(format!("train/{patient}/{patient}_{i}_mask.tif")));
            }
        }
        let cat = DatasetCatalog::open(root.path(), Layout::lgg()).unwrap();
        assert_eq!(cat.task(), Task::Segmentation);

        let ds = cat.dataset(Split::Train).unwrap();
        assert_eq!(ds.len(), 10);
        assert!(ds.label_index().is_none());
        for s in &ds {
            let mask = s.mask().unwrap();
            let stem = scan::stem(&s.image).unwrap();
            assert_eq!(scan::stem(mask).unwrap(), format!("{stem}_mask"));
            assert_eq!(mask.parent(), s.image.parent());
        }

        assert!(matches!(cat.label_index(), Err(Error::NoLabels)));
        assert!(matches!(
            cat.dataset(Split::Validation),
            Err(Error::MissingSplit { .. })
        ));
    }

    #[test]
    fn test_lgg_layout_missing_mask() {
        let root = tempfile::tempdir().unwrap();
        touch(&root.path().join("train/p/p_1.tif"));
        touch(&root.path().join("train/p/p_1_mask.tif"));
        touch(&root.path().join("train/p/p_2.tif"));
        let cat = DatasetCatalog::open(root.path(), Layout::lgg()).unwrap();
        let err = cat.samples(Split::Train).unwrap_err();
        assert!(matches!(err, Error::MissingMask { ref image } if image.ends_with("p_2.tif")));
    }

    #[test]
    fn test_separate_dirs_layout() {
        let root = tempfile::tempdir().unwrap();
        for i in 0..3 {
            touch(&root.path().join(format!("test/images/case{i}.jpg")));
            touch(&root.path().join(format!("test/masks/case{i}.png")));
        }
        let cat = DatasetCatalog::open(root.path(), Layout::separate_dirs()).unwrap();
        let ds = cat.dataset(Split::Test).unwrap();
        assert_eq!(ds.len(), 3);
        assert!(ds[2].mask().unwrap().ends_with("masks/case2.png"));

        touch(&root.path().join("test/images/case9.jpg"));
        assert!(matches!(
            cat.samples(Split::Test),
            Err(Error::MissingMask { .. })
        ));
    }

    #[test]
    fn test_separate_dirs_without_mask_dir() {
        let root = tempfile::tempdir().unwrap();
        touch(&root.path().join("train/images/a.png"));
        touch(&root.path().join("train/images/b.png"));
        let cat = DatasetCatalog::open(root.path(), Layout::separate_dirs()).unwrap();
        let err = cat.samples(Split::Train).unwrap_err();
        assert!(matches!(err, Error::MissingMask { ref image } if image.ends_with("images/a.png")));

        // 图像目录为空时仍然是空划分.
        fs::create_dir_all(root.path().join("test/images")).unwrap();
        assert!(matches!(
            cat.samples(Split::Test),
            Err(Error::EmptySplit { .. })
        ));
    }

    #[test]
    fn test_lgg_layout_tolerates_orphan_masks() {
        let root = tempfile::tempdir().unwrap();
        for i in 1..=3 {
            touch(&root.path().join(format!("train/p/p_{i}.tif")));
            touch(&root.path().join(format!("train/p/p_{i}_mask.tif")));
        }
        touch(&root.path().join("train/p/p_7_mask.tif"));
        let cat = DatasetCatalog::open(root.path(), Layout::lgg()).unwrap();
        let samples = cat.samples(Split::Train).unwrap();
        assert_eq!(samples.len(), 3);
        assert!(samples.iter().all(|s| !s.image.ends_with("p_7_mask.tif")));
    }

    #[test]
    fn test_empty_mask_suffix_rejected() {
        let root = tempfile::tempdir().unwrap();
        let layout = Layout::MaskSuffix {
            suffix: String::new(),
        };
        assert!(matches!(
            DatasetCatalog::open(root.path(), layout),
            Err(Error::InvalidArgument(_))
        ));
    }
}
