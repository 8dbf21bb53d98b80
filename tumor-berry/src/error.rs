//! 运行时错误.

use crate::label::LabelKey;
use crate::split::Split;
use crate::Idx2d;
use std::path::PathBuf;
use thiserror::Error;

/// 本 crate 统一使用的 `Result`.
pub type Result<T> = std::result::Result<T, Error>;

/// 目录枚举、标签查询、成对变换和样本加载的错误.
#[derive(Debug, Error)]
pub enum Error {
    /// 存储中不存在请求的数据划分.
    #[error("数据划分 `{split}` 在 {} 下不存在", .root.display())]
    MissingSplit {
        /// 请求的划分.
        split: Split,
        /// 数据集根目录 (或 manifest 所在目录).
        root: PathBuf,
    },

    /// 数据划分存在, 但不包含任何样本.
    #[error("数据划分 `{split}` 在 {} 下没有任何样本", .root.display())]
    EmptySplit {
        /// 请求的划分.
        split: Split,
        /// 数据集根目录 (或 manifest 所在目录).
        root: PathBuf,
    },

    /// 查询了未注册的类别名或类别 id.
    #[error("未知标签 {0}")]
    UnknownLabel(LabelKey),

    /// 当前数据集不提供类别标签 (例如分割数据集).
    #[error("该数据集不提供类别标签")]
    NoLabels,

    /// 在保持尺寸的变换之前, 图像和掩膜尺寸不一致.
    #[error("图像尺寸 {image:?} 与掩膜尺寸 {mask:?} 不一致")]
    DimensionMismatch {
        /// 图像 (高, 宽).
        image: Idx2d,
        /// 掩膜 (高, 宽).
        mask: Idx2d,
    },

    /// 样本文件缺失、无法读取或已损坏.
    #[error("无法加载样本 {}: {source}", .path.display())]
    SampleLoad {
        /// 出错的文件.
        path: PathBuf,
        /// 底层解码 / I/O 错误.
        #[source]
        source: image::ImageError,
    },

    /// 分割样本的图像找不到对应掩膜.
    #[error("图像 {} 缺少对应的掩膜", .image.display())]
    MissingMask {
        /// 图像路径.
        image: PathBuf,
    },

    /// 变换参数非法, 或变换作用在了错误阶段的数据上.
    #[error("非法变换: {0}")]
    InvalidTransform(String),

    /// 其它非法参数.
    #[error("非法参数: {0}")]
    InvalidArgument(String),

    /// 枚举目录时的底层 I/O 错误.
    #[error("I/O 错误 ({}): {source}", .path.display())]
    Io {
        /// 出错的路径.
        path: PathBuf,
        /// 底层错误.
        #[source]
        source: std::io::Error,
    },

    /// manifest 文件解析失败.
    #[cfg(feature = "serde")]
    #[error("manifest 解析错误 ({}): {source}", .path.display())]
    Manifest {
        /// manifest 路径.
        path: PathBuf,
        /// 底层错误.
        #[source]
        source: serde_json::Error,
    },

    /// 变换流水线配置解析失败.
    #[cfg(feature = "serde")]
    #[error("流水线配置解析错误 ({}): {source}", .path.display())]
    Pipeline {
        /// 配置文件路径.
        path: PathBuf,
        /// 底层错误.
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    /// 将 `std::io::Error` 与出错路径绑定.
    #[inline]
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
