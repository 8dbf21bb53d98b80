//! 图像-掩膜对的可视化存储.

use crate::consts::{gray, LESION_TINT};
use crate::transform::Pair;
use image::{imageops, ImageResult, Rgb, RgbImage};
use ndarray::{Array2, Array3, Axis};
use std::path::Path;

/// 表明一个可以通过 **可视化友好** 模式持久化存储的图像对象.
///
/// 对于 [`Pair`], 图像与叠加了掩膜的图像会左右并排保存; 病灶像素以
/// [`LESION_TINT`] 着色. 没有掩膜时只保存图像本身.
pub trait ImgWriteVis {
    /// 按照一定的可视化规则将图片保存到 `path` 路径.
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()>;
}

impl ImgWriteVis for Pair {
    #[inline]
    fn save<P: AsRef<Path>>(&self, path: P) -> ImageResult<()> {
        render(self).save(path)
    }
}

/// 把张量逐图像 min-max 拉伸到 `[0, 255]`. 单通道复制为灰度, 多于 3 通道只取前 3 个.
fn tensor_to_rgb(image: &Array3<f32>) -> RgbImage {
    let (c, h, w) = image.dim();
    let (lo, hi) = image
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let span = if hi > lo { hi - lo } else { 1.0 };
    let scale = |v: f32| (((v - lo) / span) * 255.0).round().clamp(0.0, 255.0) as u8;
    RgbImage::from_fn(w as u32, h as u32, |x, y| {
        let at = |ch: usize| scale(image[[ch.min(c - 1), y as usize, x as usize]]);
        if c >= 3 {
            Rgb([at(0), at(1), at(2)])
        } else {
            Rgb([at(0); 3])
        }
    })
}

/// 掩膜中每个像素是否为病灶, 以 `(高, 宽)` 排列.
fn lesion_map(pair: &Pair) -> Option<Array2<bool>> {
    match pair {
        Pair::Pixels { mask, .. } => mask.as_ref().map(|m| {
            let (w, h) = m.dimensions();
            Array2::from_shape_fn((h as usize, w as usize), |(y, x)| {
                gray::is_lesion(m.get_pixel(x as u32, y as u32)[0])
            })
        }),
        Pair::Tensor { mask, .. } => mask.as_ref().map(|m| m.mapv(|v| v != 0.0)),
    }
}

/// 渲染为 RGB 图像.
pub fn render(pair: &Pair) -> RgbImage {
    let base = match pair {
        Pair::Pixels { image, .. } => image.to_rgb8(),
        Pair::Tensor { image, .. } if image.len_of(Axis(0)) > 0 => tensor_to_rgb(image),
        Pair::Tensor { .. } => RgbImage::new(0, 0),
    };
    let Some(lesion) = lesion_map(pair) else {
        return base;
    };

    let (w, h) = base.dimensions();
    let mut overlay = base.clone();
    for ((y, x), _) in lesion.indexed_iter().filter(|(_, l)| **l) {
        // 尺寸不一致时只叠加重合部分.
        if let Some(p) = overlay.get_pixel_mut_checked(x as u32, y as u32) {
            for (c, t) in p.0.iter_mut().zip(LESION_TINT) {
                *c = ((*c as u16 + t as u16) / 2) as u8;
            }
        }
    }

    let mut canvas = RgbImage::new(w * 2, h);
    imageops::replace(&mut canvas, &base, 0, 0);
    imageops::replace(&mut canvas, &overlay, w as i64, 0);
    canvas
}

/// 把多个样本排成 `columns` 列的网格. 每格大小取所有渲染结果的最大值.
pub fn render_grid(pairs: &[Pair], columns: usize) -> RgbImage {
    let columns = columns.max(1);
    let tiles: Vec<RgbImage> = pairs.iter().map(render).collect();
    let tile_w = tiles.iter().map(RgbImage::width).max().unwrap_or(0);
    let tile_h = tiles.iter().map(RgbImage::height).max().unwrap_or(0);
    let rows = pairs.len().div_ceil(columns);

    let mut canvas = RgbImage::new(tile_w * columns as u32, tile_h * rows as u32);
    for (i, tile) in tiles.iter().enumerate() {
        let (row, col) = (i / columns, i % columns);
        imageops::replace(
            &mut canvas,
            tile,
            (col as u32 * tile_w) as i64,
            (row as u32 * tile_h) as i64,
        );
    }
    canvas
}

/// 以网格形式保存一批样本.
#[inline]
pub fn save_grid<P: AsRef<Path>>(pairs: &[Pair], columns: usize, path: P) -> ImageResult<()> {
    render_grid(pairs, columns).save(path)
}
