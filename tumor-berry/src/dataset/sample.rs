use std::path::{Path, PathBuf};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 样本的监督信号.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Target {
    /// 分类: 类别 id, 见 [`crate::LabelIndex`].
    Label(usize),

    /// 分割: 掩膜文件路径.
    Mask(PathBuf),
}

/// 一个样本: 图像路径与其标签或掩膜. 枚举后不可变.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sample {
    /// 图像文件路径.
    pub image: PathBuf,

    /// 标签或掩膜.
    pub target: Target,
}

impl Sample {
    /// 构造分类样本.
    #[inline]
    pub fn classification(image: impl Into<PathBuf>, label: usize) -> Self {
        Self {
            image: image.into(),
            target: Target::Label(label),
        }
    }

    /// 构造分割样本.
    #[inline]
    pub fn segmentation(image: impl Into<PathBuf>, mask: impl Into<PathBuf>) -> Self {
        Self {
            image: image.into(),
            target: Target::Mask(mask.into()),
        }
    }

    /// 分类样本的类别 id.
    #[inline]
    pub fn label(&self) -> Option<usize> {
        match self.target {
            Target::Label(l) => Some(l),
            Target::Mask(_) => None,
        }
    }

    /// 分割样本的掩膜路径.
    #[inline]
    pub fn mask(&self) -> Option<&Path> {
        match &self.target {
            Target::Mask(m) => Some(m.as_path()),
            Target::Label(_) => None,
        }
    }
}
