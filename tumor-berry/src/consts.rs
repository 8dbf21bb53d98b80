//! 通用常量.

/// 单通道掩膜像素.
pub mod gray {
    /// 掩膜中背景的像素值.
    pub const BACKGROUND: u8 = 0;

    /// 像素是否是背景?
    #[inline]
    pub const fn is_background(p: u8) -> bool {
        matches!(p, BACKGROUND)
    }

    /// 像素是否属于病灶? 任何非背景值都视为病灶.
    #[inline]
    pub const fn is_lesion(p: u8) -> bool {
        !is_background(p)
    }
}

/// 支持读取的图像扩展名 (小写).
pub const SUPPORTED_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "tif", "tiff", "bmp"];

/// LGG 数据集中掩膜文件名的默认后缀, 如 `TCGA_CS_4941_19960909_1_mask.tif`.
pub const DEFAULT_MASK_SUFFIX: &str = "_mask";

/// 图像/掩膜分目录布局下的默认图像子目录名.
pub const DEFAULT_IMAGE_DIR: &str = "images";

/// 图像/掩膜分目录布局下的默认掩膜子目录名.
pub const DEFAULT_MASK_DIR: &str = "masks";

/// ImageNet RGB 均值.
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// ImageNet RGB 标准差.
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// 可视化时病灶区域的着色 (RGB).
pub const LESION_TINT: [u8; 3] = [255, 48, 48];

/// 掩膜内容类型.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ElemType {
    /// 全部为 `gray::BACKGROUND`.
    Background,

    /// 至少存在一个病灶像素.
    Foreground,
}

impl ElemType {
    /// 根据掩膜像素判断类型.
    pub fn of_mask<'a, I: IntoIterator<Item = &'a u8>>(pixels: I) -> Self {
        if pixels.into_iter().copied().any(gray::is_lesion) {
            Self::Foreground
        } else {
            Self::Background
        }
    }

    /// 是否为前景.
    #[inline]
    pub fn is_foreground(&self) -> bool {
        matches!(self, Self::Foreground)
    }

    /// 是否为背景.
    #[inline]
    pub fn is_background(&self) -> bool {
        !self.is_foreground()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elem_type_of_mask() {
        assert_eq!(ElemType::of_mask(&[0u8, 0, 0]), ElemType::Background);
        assert_eq!(ElemType::of_mask(&[0u8, 255, 0]), ElemType::Foreground);
        assert_eq!(ElemType::of_mask(&[1u8]), ElemType::Foreground);
        assert!(ElemType::of_mask(&[] as &[u8]).is_background());
    }
}
