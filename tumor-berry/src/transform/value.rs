//! 像素值变换. 不改变空间结构.

use super::{DualTransform, Pair};
use crate::consts::{gray, IMAGENET_MEAN, IMAGENET_STD};
use crate::{Error, Result};
use image::{DynamicImage, GenericImageView, GrayImage};
use ndarray::{Array2, Array3, Axis};
use rand::RngCore;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 转为灰度图. 只作用于图像, 保留原位深.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Grayscale;

impl DualTransform for Grayscale {
    fn apply(&self, pair: Pair, _rng: &mut dyn RngCore) -> Result<Pair> {
        let (image, mask) = pair.into_pixels(self.name())?;
        Ok(Pair::new(image.grayscale(), mask))
    }

    #[inline]
    fn name(&self) -> &'static str {
        "grayscale"
    }
}

/// 掩膜转为张量时的取值方式.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum MaskMode {
    /// 背景为 0, 其余 (病灶) 为 1.
    #[default]
    Binary,

    /// 保留原始像素值, 用于多类别掩膜.
    Index,
}

/// 像素阶段 -> 张量阶段.
///
/// 图像按位深缩放到 `[0, 1]`, 排列为 `(通道, 高, 宽)`: 彩色图为 3 通道 (丢弃 alpha),
/// 灰度图为 1 通道.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ToTensor {
    mask: MaskMode,
}

impl ToTensor {
    /// 以 `mask` 方式转换掩膜.
    #[inline]
    pub fn new(mask: MaskMode) -> Self {
        Self { mask }
    }
}

fn image_to_chw(image: &DynamicImage) -> Array3<f32> {
    const SCALE: f32 = u16::MAX as f32;
    let (w, h) = image.dimensions();
    let (h, w) = (h as usize, w as usize);
    if image.color().has_color() {
        let rgb = image.to_rgb16();
        Array3::from_shape_fn((3, h, w), |(c, y, x)| {
            rgb.get_pixel(x as u32, y as u32)[c] as f32 / SCALE
        })
    } else {
        let luma = image.to_luma16();
        Array3::from_shape_fn((1, h, w), |(_, y, x)| {
            luma.get_pixel(x as u32, y as u32)[0] as f32 / SCALE
        })
    }
}

fn mask_to_array(mask: &GrayImage, mode: MaskMode) -> Array2<f32> {
    let (w, h) = mask.dimensions();
    Array2::from_shape_fn((h as usize, w as usize), |(y, x)| {
        let p = mask.get_pixel(x as u32, y as u32)[0];
        match mode {
            MaskMode::Binary => u8::from(gray::is_lesion(p)) as f32,
            MaskMode::Index => p as f32,
        }
    })
}

impl DualTransform for ToTensor {
    fn apply(&self, pair: Pair, _rng: &mut dyn RngCore) -> Result<Pair> {
        let (image, mask) = pair.into_pixels(self.name())?;
        Ok(Pair::Tensor {
            image: image_to_chw(&image),
            mask: mask.map(|m| mask_to_array(&m, self.mask)),
        })
    }

    #[inline]
    fn name(&self) -> &'static str {
        "to_tensor"
    }
}

/// 逐通道标准化 `(x - mean) / std`. 只作用于张量阶段的图像.
#[derive(Clone, Debug, PartialEq)]
pub struct Normalize {
    mean: Vec<f32>,
    std: Vec<f32>,
}

impl Normalize {
    /// `mean` 与 `std` 长度须相同且非空, `std` 中不能有 0 或非有限值.
    pub fn new(mean: Vec<f32>, std: Vec<f32>) -> Result<Self> {
        if mean.is_empty() || mean.len() != std.len() {
            return Err(Error::InvalidTransform(format!(
                "`normalize` 的 mean ({}) 与 std ({}) 长度必须相同且非空",
                mean.len(),
                std.len()
            )));
        }
        if let Some(bad) = std.iter().find(|s| **s == 0.0 || !s.is_finite()) {
            return Err(Error::InvalidTransform(format!(
                "`normalize` 的 std 不能为 {bad}"
            )));
        }
        Ok(Self { mean, std })
    }

    /// ImageNet RGB 统计量.
    #[inline]
    pub fn imagenet() -> Self {
        Self {
            mean: IMAGENET_MEAN.to_vec(),
            std: IMAGENET_STD.to_vec(),
        }
    }
}

impl DualTransform for Normalize {
    fn apply(&self, pair: Pair, _rng: &mut dyn RngCore) -> Result<Pair> {
        let (mut image, mask) = pair.into_tensor(self.name())?;
        let channels = image.len_of(Axis(0));
        if channels != self.mean.len() {
            return Err(Error::InvalidTransform(format!(
                "`normalize` 给出 {} 个通道的统计量, 但图像有 {channels} 个通道",
                self.mean.len()
            )));
        }
        for ((mut plane, m), s) in image
            .axis_iter_mut(Axis(0))
            .zip(&self.mean)
            .zip(&self.std)
        {
            plane.mapv_inplace(|v| (v - m) / s);
        }
        Ok(Pair::Tensor { image, mask })
    }

    #[inline]
    fn name(&self) -> &'static str {
        "normalize"
    }
}
