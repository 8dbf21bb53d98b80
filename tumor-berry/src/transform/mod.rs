//! 图像-掩膜成对变换.
//!
//! 所有变换都作用在 [`Pair`] 上, 而不是分别作用于图像和掩膜:
//! 随机变换在一次调用中只抽取一次随机状态, 并把同一结果同时施加到两者,
//! 从而保证两者空间上始终对齐.
//!
//! 数据在流水线中有两个阶段:
//!
//! 1. [`Pair::Pixels`]: 解码后的图像与 8 位掩膜. 所有几何变换只接受这一阶段;
//! 2. [`Pair::Tensor`]: [`ToTensor`] 之后的 `f32` 数组. [`Normalize`] 只接受这一阶段.
//!
//! 在错误阶段调用变换会得到 `Error::InvalidTransform`.

use crate::{Error, Idx2d, Result};
use image::{DynamicImage, GrayImage};
use ndarray::{Array2, Array3};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::fmt;
#[cfg(feature = "serde")]
use std::path::Path;

mod geometric;
mod spec;
mod value;

pub use geometric::{CenterCrop, HorizontalFlip, RandomCrop, Resize, VerticalFlip};
pub use spec::TransformSpec;
pub use value::{Grayscale, MaskMode, Normalize, ToTensor};

/// 流经变换流水线的图像 (以及可选的掩膜).
#[derive(Clone, Debug)]
pub enum Pair {
    /// 像素阶段.
    Pixels {
        /// 图像.
        image: DynamicImage,
        /// 分割掩膜. 分类样本为 `None`.
        mask: Option<GrayImage>,
    },

    /// 张量阶段.
    Tensor {
        /// 图像, 形状为 `(通道, 高, 宽)`.
        image: Array3<f32>,
        /// 掩膜, 形状为 `(高, 宽)`.
        mask: Option<Array2<f32>>,
    },
}

impl Pair {
    /// 像素阶段的图像-掩膜对.
    #[inline]
    pub fn new(image: DynamicImage, mask: Option<GrayImage>) -> Self {
        Self::Pixels { image, mask }
    }

    /// 只有图像, 没有掩膜.
    #[inline]
    pub fn image_only(image: DynamicImage) -> Self {
        Self::Pixels { image, mask: None }
    }

    /// 是否已经处于张量阶段?
    #[inline]
    pub fn is_tensor(&self) -> bool {
        matches!(self, Self::Tensor { .. })
    }

    /// 是否携带掩膜?
    #[inline]
    pub fn has_mask(&self) -> bool {
        match self {
            Self::Pixels { mask, .. } => mask.is_some(),
            Self::Tensor { mask, .. } => mask.is_some(),
        }
    }

    /// 图像的空间尺寸 (高, 宽).
    pub fn image_dims(&self) -> Idx2d {
        match self {
            Self::Pixels { image, .. } => (image.height() as usize, image.width() as usize),
            Self::Tensor { image, .. } => {
                let (_, h, w) = image.dim();
                (h, w)
            }
        }
    }

    /// 掩膜的空间尺寸 (高, 宽).
    pub fn mask_dims(&self) -> Option<Idx2d> {
        match self {
            Self::Pixels { mask, .. } => mask
                .as_ref()
                .map(|m| (m.height() as usize, m.width() as usize)),
            Self::Tensor { mask, .. } => mask.as_ref().map(|m| m.dim()),
        }
    }

    /// 图像和掩膜的空间尺寸一致时返回 `Ok`. 没有掩膜时总是 `Ok`.
    pub fn check_aligned(&self) -> Result<()> {
        let image = self.image_dims();
        match self.mask_dims() {
            Some(mask) if mask != image => Err(Error::DimensionMismatch { image, mask }),
            _ => Ok(()),
        }
    }

    /// 拆出像素阶段的数据. 张量阶段返回 `Error::InvalidTransform`, 其中带上 `op` 名.
    pub fn into_pixels(self, op: &str) -> Result<(DynamicImage, Option<GrayImage>)> {
        match self {
            Self::Pixels { image, mask } => Ok((image, mask)),
            Self::Tensor { .. } => Err(Error::InvalidTransform(format!(
                "`{op}` 只能作用于像素阶段, 但输入已经是张量"
            ))),
        }
    }

    /// 拆出张量阶段的数据. 像素阶段返回 `Error::InvalidTransform`, 其中带上 `op` 名.
    pub fn into_tensor(self, op: &str) -> Result<(Array3<f32>, Option<Array2<f32>>)> {
        match self {
            Self::Tensor { image, mask } => Ok((image, mask)),
            Self::Pixels { .. } => Err(Error::InvalidTransform(format!(
                "`{op}` 只能作用于张量阶段, 请先使用 `to_tensor`"
            ))),
        }
    }
}

/// 同时作用于图像和掩膜的变换.
///
/// 随机变换在每次 `apply` 中从 `rng` 抽取一次随机状态,
/// 同一状态同时决定图像和掩膜的处理.
pub trait DualTransform: Send + Sync + fmt::Debug {
    /// 对 `pair` 施加变换.
    fn apply(&self, pair: Pair, rng: &mut dyn RngCore) -> Result<Pair>;

    /// 施加变换前是否要求图像与掩膜尺寸一致? 默认 `true`.
    #[inline]
    fn requires_aligned(&self) -> bool {
        true
    }

    /// 变换名, 用于日志与错误信息.
    fn name(&self) -> &'static str;
}

/// 按顺序组合的变换流水线. 空流水线是恒等变换.
#[derive(Debug, Default)]
pub struct Compose {
    steps: Vec<Box<dyn DualTransform>>,
}

impl Compose {
    /// 空流水线.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// 在末尾追加一个变换.
    #[inline]
    pub fn push<T: DualTransform + 'static>(mut self, step: T) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// 在末尾追加一个已装箱的变换.
    #[inline]
    pub fn push_boxed(mut self, step: Box<dyn DualTransform>) -> Self {
        self.steps.push(step);
        self
    }

    /// 拼接: 先执行 `self` 的所有步骤, 再执行 `other` 的所有步骤.
    #[inline]
    pub fn then(mut self, other: Compose) -> Self {
        self.steps.extend(other.steps);
        self
    }

    /// 步骤个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// 是否为空 (恒等变换)?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// 形如 `resize -> horizontal_flip -> to_tensor` 的描述.
    pub fn describe(&self) -> String {
        if self.steps.is_empty() {
            return "identity".to_string();
        }
        self.steps
            .iter()
            .map(|s| s.name())
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    /// 以 `seed` 初始化随机数发生器后执行流水线. 相同输入与种子总得到相同结果.
    #[inline]
    pub fn apply_seeded(&self, pair: Pair, seed: u64) -> Result<Pair> {
        let mut rng = StdRng::seed_from_u64(seed);
        self.apply(pair, &mut rng)
    }

    /// 读取 JSON 数组形式的 [`TransformSpec`] 配置文件并构造流水线.
    #[cfg(feature = "serde")]
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let specs: Vec<TransformSpec> =
            serde_json::from_str(&text).map_err(|source| Error::Pipeline {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_specs(&specs)
    }

    /// 由配置构造流水线.
    pub fn from_specs(specs: &[TransformSpec]) -> Result<Self> {
        specs
            .iter()
            .try_fold(Self::new(), |acc, s| Ok(acc.push_boxed(s.build()?)))
    }
}

impl DualTransform for Compose {
    fn apply(&self, mut pair: Pair, rng: &mut dyn RngCore) -> Result<Pair> {
        for step in &self.steps {
            if step.requires_aligned() {
                pair.check_aligned()?;
            }
            pair = step.apply(pair, rng)?;
        }
        Ok(pair)
    }

    /// 各步骤自行检查.
    #[inline]
    fn requires_aligned(&self) -> bool {
        false
    }

    #[inline]
    fn name(&self) -> &'static str {
        "compose"
    }
}
