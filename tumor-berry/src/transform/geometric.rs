//! 几何变换. 只接受像素阶段, 对图像和掩膜施加完全相同的几何操作.

use super::{DualTransform, Pair};
use crate::{Error, Result};
use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, GrayImage};
use rand::{Rng, RngCore};

fn check_size(op: &str, height: u32, width: u32) -> Result<()> {
    if height == 0 || width == 0 {
        return Err(Error::InvalidTransform(format!(
            "`{op}` 的目标尺寸必须为正, 但得到 {height}x{width}"
        )));
    }
    Ok(())
}

fn check_probability(op: &str, p: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&p) {
        return Err(Error::InvalidTransform(format!(
            "`{op}` 的概率必须位于 [0, 1], 但得到 {p}"
        )));
    }
    Ok(())
}

/// 在 (`top`, `left`) 处裁剪出 `height` x `width`.
fn crop(
    image: &DynamicImage,
    mask: Option<&GrayImage>,
    (top, left): (u32, u32),
    (height, width): (u32, u32),
) -> Pair {
    let image = image.crop_imm(left, top, width, height);
    let mask = mask.map(|m| imageops::crop_imm(m, left, top, width, height).to_image());
    Pair::new(image, mask)
}

/// 裁剪尺寸不能超过输入.
fn check_crop(op: &str, image: &DynamicImage, height: u32, width: u32) -> Result<(u32, u32)> {
    let (w, h) = image.dimensions();
    if height > h || width > w {
        return Err(Error::InvalidTransform(format!(
            "`{op}` 的尺寸 {height}x{width} 超过了输入尺寸 {h}x{w}"
        )));
    }
    Ok((h - height, w - width))
}

/// 缩放到固定尺寸. 图像使用三角 (双线性) 滤波, 掩膜使用最近邻以保持标签值.
///
/// 缩放后两者尺寸必然一致, 因此不要求输入对齐.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Resize {
    height: u32,
    width: u32,
}

impl Resize {
    /// 目标尺寸 (高, 宽), 均须为正.
    pub fn new(height: u32, width: u32) -> Result<Self> {
        check_size("resize", height, width)?;
        Ok(Self { height, width })
    }
}

impl DualTransform for Resize {
    fn apply(&self, pair: Pair, _rng: &mut dyn RngCore) -> Result<Pair> {
        let (image, mask) = pair.into_pixels(self.name())?;
        let image = image.resize_exact(self.width, self.height, FilterType::Triangle);
        let mask = mask.map(|m| imageops::resize(&m, self.width, self.height, FilterType::Nearest));
        Ok(Pair::new(image, mask))
    }

    #[inline]
    fn requires_aligned(&self) -> bool {
        false
    }

    #[inline]
    fn name(&self) -> &'static str {
        "resize"
    }
}

/// 中心裁剪.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct CenterCrop {
    height: u32,
    width: u32,
}

impl CenterCrop {
    /// 裁剪尺寸 (高, 宽), 均须为正.
    pub fn new(height: u32, width: u32) -> Result<Self> {
        check_size("center_crop", height, width)?;
        Ok(Self { height, width })
    }
}

impl DualTransform for CenterCrop {
    fn apply(&self, pair: Pair, _rng: &mut dyn RngCore) -> Result<Pair> {
        let (image, mask) = pair.into_pixels(self.name())?;
        let (dh, dw) = check_crop(self.name(), &image, self.height, self.width)?;
        Ok(crop(
            &image,
            mask.as_ref(),
            (dh / 2, dw / 2),
            (self.height, self.width),
        ))
    }

    #[inline]
    fn name(&self) -> &'static str {
        "center_crop"
    }
}

/// 随机位置裁剪. 每次调用抽取一次左上角位置, 图像和掩膜共用.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RandomCrop {
    height: u32,
    width: u32,
}

impl RandomCrop {
    /// 裁剪尺寸 (高, 宽), 均须为正.
    pub fn new(height: u32, width: u32) -> Result<Self> {
        check_size("random_crop", height, width)?;
        Ok(Self { height, width })
    }
}

impl DualTransform for RandomCrop {
    fn apply(&self, pair: Pair, rng: &mut dyn RngCore) -> Result<Pair> {
        let (image, mask) = pair.into_pixels(self.name())?;
        let (dh, dw) = check_crop(self.name(), &image, self.height, self.width)?;
        let top = rng.random_range(0..=dh);
        let left = rng.random_range(0..=dw);
        Ok(crop(
            &image,
            mask.as_ref(),
            (top, left),
            (self.height, self.width),
        ))
    }

    #[inline]
    fn name(&self) -> &'static str {
        "random_crop"
    }
}

macro_rules! impl_flip {
    ($(#[$doc: meta])* $flip: ident, $name: literal, $img_flip: ident, $mask_flip: path) => {
        $(#[$doc])*
        #[derive(Copy, Clone, Debug, PartialEq)]
        pub struct $flip {
            p: f64,
        }

        impl $flip {
            /// 以概率 `p` 翻转. `p` 须位于 `[0, 1]`.
            pub fn new(p: f64) -> Result<Self> {
                check_probability($name, p)?;
                Ok(Self { p })
            }
        }

        impl Default for $flip {
            /// `p = 0.5`.
            #[inline]
            fn default() -> Self {
                Self { p: 0.5 }
            }
        }

        impl DualTransform for $flip {
            fn apply(&self, pair: Pair, rng: &mut dyn RngCore) -> Result<Pair> {
                let (image, mask) = pair.into_pixels(self.name())?;
                // 每次调用恰好抽取一次.
                if rng.random_bool(self.p) {
                    Ok(Pair::new(image.$img_flip(), mask.map(|m| $mask_flip(&m))))
                } else {
                    Ok(Pair::new(image, mask))
                }
            }

            #[inline]
            fn name(&self) -> &'static str {
                $name
            }
        }
    };
}

impl_flip!(
    /// 随机水平翻转.
    HorizontalFlip,
    "horizontal_flip",
    fliph,
    imageops::flip_horizontal
);

impl_flip!(
    /// 随机垂直翻转.
    VerticalFlip,
    "vertical_flip",
    flipv,
    imageops::flip_vertical
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::tests::sample_pair;
    use crate::transform::Compose;
    use image::{Luma, RgbImage};

    fn dims(pair: &Pair) -> ((usize, usize), Option<(usize, usize)>) {
        (pair.image_dims(), pair.mask_dims())
    }

    #[test]
    fn test_resize_keeps_mask_binary() {
        let out = Compose::new()
            .push(Resize::new(37, 53).unwrap())
            .apply_seeded(sample_pair(100, 80), 0)
            .unwrap();
        assert_eq!(dims(&out), ((37, 53), Some((37, 53))));
        let (_, mask) = out.into_pixels("test").unwrap();
        assert!(mask.unwrap().pixels().all(|p| p[0] == 0 || p[0] == 255));
    }

    #[test]
    fn test_center_crop_takes_middle() {
        let image = DynamicImage::ImageLuma8(GrayImage::from_fn(5, 5, |x, y| Luma([(y * 5 + x) as u8])));
        let out = Compose::new()
            .push(CenterCrop::new(3, 3).unwrap())
            .apply_seeded(Pair::image_only(image), 0)
            .unwrap();
        let (image, mask) = out.into_pixels("test").unwrap();
        assert!(mask.is_none());
        let image = image.to_luma8();
        assert_eq!(image.get_pixel(0, 0)[0], 6);
        assert_eq!(image.get_pixel(2, 2)[0], 18);
    }

    #[test]
    fn test_crop_larger_than_input() {
        for step in [
            Box::new(CenterCrop::new(20, 5).unwrap()) as Box<dyn DualTransform>,
            Box::new(RandomCrop::new(5, 20).unwrap()),
        ] {
            let err = Compose::new()
                .push_boxed(step)
                .apply_seeded(sample_pair(10, 10), 0)
                .unwrap_err();
            assert!(matches!(err, Error::InvalidTransform(_)));
        }
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(matches!(Resize::new(0, 10), Err(Error::InvalidTransform(_))));
        assert!(matches!(CenterCrop::new(10, 0), Err(Error::InvalidTransform(_))));
        assert!(matches!(HorizontalFlip::new(1.5), Err(Error::InvalidTransform(_))));
        assert!(matches!(VerticalFlip::new(-0.1), Err(Error::InvalidTransform(_))));
        assert!(matches!(VerticalFlip::new(f64::NAN), Err(Error::InvalidTransform(_))));
    }

    #[test]
    fn test_flip_probability_extremes() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_fn(3, 1, |x, _| image::Rgb([x as u8; 3])));
        let mask = GrayImage::from_fn(3, 1, |x, _| Luma([if x == 0 { 255 } else { 0 }]));
        let pair = Pair::new(image, Some(mask));

        let always = Compose::new().push(HorizontalFlip::new(1.0).unwrap());
        let never = Compose::new().push(HorizontalFlip::new(0.0).unwrap());

        let (img, m) = always.apply_seeded(pair.clone(), 3).unwrap().into_pixels("test").unwrap();
        assert_eq!(img.to_rgb8().get_pixel(0, 0)[0], 2);
        assert_eq!(m.unwrap().get_pixel(2, 0)[0], 255);

        let (img, m) = never.apply_seeded(pair, 3).unwrap().into_pixels("test").unwrap();
        assert_eq!(img.to_rgb8().get_pixel(0, 0)[0], 0);
        assert_eq!(m.unwrap().get_pixel(0, 0)[0], 255);
    }

    #[test]
    fn test_random_crop_is_seed_deterministic() {
        let pipeline = Compose::new().push(RandomCrop::new(7, 9).unwrap());
        let a = pipeline.apply_seeded(sample_pair(30, 30), 42).unwrap();
        let b = pipeline.apply_seeded(sample_pair(30, 30), 42).unwrap();
        let (a, _) = a.into_pixels("test").unwrap();
        let (b, _) = b.into_pixels("test").unwrap();
        assert_eq!(a.dimensions(), (9, 7));
        assert_eq!(a.into_bytes(), b.into_bytes());
    }
}
