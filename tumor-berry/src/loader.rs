//! 样本加载: 读取图像 (与掩膜), 经过变换流水线后交给下游.
//!
//! 加载器本身不跳过任何样本: 文件缺失、无法读取或损坏都会以
//! `Error::SampleLoad` 的形式返回给调用者.

use crate::transform::{Compose, DualTransform, Pair};
use crate::{Dataset, Error, Result, Sample};
use image::error::{ParameterError, ParameterErrorKind};
use image::{DynamicImage, GrayImage, ImageBuffer, ImageError, Luma};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::iter::FusedIterator;
use std::ops::Range;
use std::path::Path;

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IntoParallelIterator, ParallelIterator};
    }
}

/// 解码 `path` 处的图像.
pub fn read_image(path: &Path) -> Result<DynamicImage> {
    image::open(path).map_err(|source| Error::SampleLoad {
        path: path.to_path_buf(),
        source,
    })
}

/// 解码 `path` 处的掩膜, 统一转为 8 位单通道.
///
/// 16 位灰度掩膜按原值收窄而不做缩放, 类别值大于 255 时返回 `Error::SampleLoad`.
/// 其余格式按亮度转换.
pub fn read_mask(path: &Path) -> Result<GrayImage> {
    match read_image(path)? {
        DynamicImage::ImageLuma8(mask) => Ok(mask),
        wide @ (DynamicImage::ImageLuma16(_) | DynamicImage::ImageLumaA16(_)) => {
            narrow_mask(path, wide.to_luma16())
        }
        other => Ok(other.into_luma8()),
    }
}

fn narrow_mask(path: &Path, wide: ImageBuffer<Luma<u16>, Vec<u16>>) -> Result<GrayImage> {
    let (w, h) = wide.dimensions();
    let raw = wide
        .into_raw()
        .into_iter()
        .map(u8::try_from)
        .collect::<std::result::Result<Vec<u8>, _>>()
        .map_err(|_| mask_error(path, "16 位掩膜中存在大于 255 的类别值"))?;
    GrayImage::from_raw(w, h, raw).ok_or_else(|| mask_error(path, "掩膜像素数与尺寸不符"))
}

fn mask_error(path: &Path, msg: &str) -> Error {
    Error::SampleLoad {
        path: path.to_path_buf(),
        source: ImageError::Parameter(ParameterError::from_kind(ParameterErrorKind::Generic(
            msg.to_string(),
        ))),
    }
}

/// 一个加载完成的样本.
#[derive(Clone, Debug)]
pub struct Loaded {
    /// 变换后的图像与掩膜.
    pub pair: Pair,

    /// 分类样本的类别 id.
    pub label: Option<usize>,
}

/// 样本加载器.
///
/// 设置种子后, 第 `i` 个样本使用 `StdRng::seed_from_u64(seed ^ i)`,
/// 因此同一样本的随机变换与加载顺序、线程数无关. 未设置种子时使用线程随机数.
#[derive(Debug, Default)]
pub struct SampleLoader {
    pipeline: Compose,
    seed: Option<u64>,
}

impl SampleLoader {
    /// 以 `pipeline` 构造加载器.
    #[inline]
    pub fn new(pipeline: Compose) -> Self {
        Self {
            pipeline,
            seed: None,
        }
    }

    /// 设置随机种子.
    #[inline]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// 变换流水线.
    #[inline]
    pub fn pipeline(&self) -> &Compose {
        &self.pipeline
    }

    /// 随机种子.
    #[inline]
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// 加载单个样本. 设置了种子时等价于索引 0 的样本.
    #[inline]
    pub fn load(&self, sample: &Sample) -> Result<Loaded> {
        self.load_indexed(sample, 0)
    }

    /// 加载 `dataset` 的第 `index` 个样本. 越界时返回 `Error::InvalidArgument`.
    pub fn load_at(&self, dataset: &Dataset, index: usize) -> Result<Loaded> {
        let sample = dataset.get(index).ok_or_else(|| {
            Error::InvalidArgument(format!(
                "样本索引 {index} 越界 (数据集大小 {})",
                dataset.len()
            ))
        })?;
        self.load_indexed(sample, index as u64)
    }

    /// 按顺序逐个加载 `dataset` 中的样本.
    #[inline]
    pub fn iter<'a>(&'a self, dataset: &'a Dataset) -> LoaderIter<'a> {
        LoaderIter {
            loader: self,
            dataset,
            range: 0..dataset.len(),
        }
    }

    fn load_indexed(&self, sample: &Sample, index: u64) -> Result<Loaded> {
        match self.seed {
            Some(seed) => self.load_with(sample, &mut StdRng::seed_from_u64(seed ^ index)),
            None => self.load_with(sample, &mut rand::rng()),
        }
    }

    fn load_with(&self, sample: &Sample, rng: &mut dyn RngCore) -> Result<Loaded> {
        let image = read_image(&sample.image)?;
        let mask = sample.mask().map(read_mask).transpose()?;
        let pair = self.pipeline.apply(Pair::new(image, mask), rng)?;
        Ok(Loaded {
            pair,
            label: sample.label(),
        })
    }
}

/// 并发操作部分
#[cfg(feature = "rayon")]
impl SampleLoader {
    /// 借助 `rayon` 并行加载 `dataset` 中的所有样本, 结果按索引排列.
    pub fn par_load(&self, dataset: &Dataset) -> Vec<Result<Loaded>> {
        (0..dataset.len())
            .into_par_iter()
            .map(|i| self.load_indexed(&dataset[i], i as u64))
            .collect()
    }
}

/// [`SampleLoader::iter`] 返回的迭代器, 产出 `(索引, 加载结果)`.
#[derive(Debug)]
pub struct LoaderIter<'a> {
    loader: &'a SampleLoader,
    dataset: &'a Dataset,
    range: Range<usize>,
}

impl Iterator for LoaderIter<'_> {
    type Item = (usize, Result<Loaded>);

    fn next(&mut self) -> Option<Self::Item> {
        let i = self.range.next()?;
        Some((i, self.loader.load_indexed(&self.dataset[i], i as u64)))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.range.size_hint()
    }
}

impl ExactSizeIterator for LoaderIter<'_> {}

impl FusedIterator for LoaderIter<'_> {}
