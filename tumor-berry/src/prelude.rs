//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::Idx2d;

pub use crate::{Error, Result};

pub use crate::dataset::home_dataset_dir_with;
pub use crate::{Dataset, DatasetCatalog, Layout, Sample, Subset, Target, Task};
pub use crate::{LabelIndex, Split};

pub use crate::transform::{
    CenterCrop, Compose, DualTransform, Grayscale, HorizontalFlip, MaskMode, Normalize, Pair,
    RandomCrop, Resize, ToTensor, TransformSpec, VerticalFlip,
};

pub use crate::loader::{Loaded, SampleLoader};

pub use crate::consts::ElemType;
pub use crate::kfold::{Fold, KFold, RunningMean};
pub use crate::report::{split_report, Distribution, LabelCounts, SplitTable};
pub use crate::vis::ImgWriteVis;
