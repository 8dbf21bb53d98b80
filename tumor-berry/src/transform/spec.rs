//! 可序列化的变换描述, 用于从配置构造流水线.

use super::{
    CenterCrop, DualTransform, Grayscale, HorizontalFlip, MaskMode, Normalize, RandomCrop,
    Resize, ToTensor, VerticalFlip,
};
use crate::Result;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "serde")]
const fn half() -> f64 {
    0.5
}

/// 单个变换的描述. JSON 形式如 `{ "op": "resize", "height": 320, "width": 320 }`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(tag = "op", rename_all = "snake_case")
)]
#[allow(missing_docs)] // 字段含义见对应的变换类型.
pub enum TransformSpec {
    /// 见 [`Resize`].
    Resize { height: u32, width: u32 },
    /// 见 [`CenterCrop`].
    CenterCrop { height: u32, width: u32 },
    /// 见 [`RandomCrop`].
    RandomCrop { height: u32, width: u32 },
    /// 见 [`HorizontalFlip`], `p` 缺省为 0.5.
    HorizontalFlip {
        #[cfg_attr(feature = "serde", serde(default = "half"))]
        p: f64,
    },
    /// 见 [`VerticalFlip`], `p` 缺省为 0.5.
    VerticalFlip {
        #[cfg_attr(feature = "serde", serde(default = "half"))]
        p: f64,
    },
    /// 见 [`Grayscale`].
    Grayscale,
    /// 见 [`ToTensor`], `mask` 缺省为 `binary`.
    ToTensor {
        #[cfg_attr(feature = "serde", serde(default))]
        mask: MaskMode,
    },
    /// 见 [`Normalize`].
    Normalize {
        mean: Vec<f32>,
        std: Vec<f32>,
    },
}

impl TransformSpec {
    /// 构造对应的变换. 参数非法时返回 `Error::InvalidTransform`.
    pub fn build(&self) -> Result<Box<dyn DualTransform>> {
        Ok(match self {
            Self::Resize { height, width } => Box::new(Resize::new(*height, *width)?),
            Self::CenterCrop { height, width } => Box::new(CenterCrop::new(*height, *width)?),
            Self::RandomCrop { height, width } => Box::new(RandomCrop::new(*height, *width)?),
            Self::HorizontalFlip { p } => Box::new(HorizontalFlip::new(*p)?),
            Self::VerticalFlip { p } => Box::new(VerticalFlip::new(*p)?),
            Self::Grayscale => Box::new(Grayscale),
            Self::ToTensor { mask } => Box::new(ToTensor::new(*mask)),
            Self::Normalize { mean, std } => Box::new(Normalize::new(mean.clone(), std.clone())?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::Compose;
    use crate::Error;

    #[test]
    fn test_from_specs() {
        let specs = [
            TransformSpec::Resize {
                height: 64,
                width: 64,
            },
            TransformSpec::HorizontalFlip { p: 0.5 },
            TransformSpec::ToTensor {
                mask: MaskMode::Binary,
            },
        ];
        let pipeline = Compose::from_specs(&specs).unwrap();
        assert_eq!(pipeline.len(), 3);
        assert_eq!(pipeline.describe(), "resize -> horizontal_flip -> to_tensor");

        assert!(matches!(
            Compose::from_specs(&[TransformSpec::RandomCrop { height: 0, width: 3 }]),
            Err(Error::InvalidTransform(_))
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_specs_from_json() {
        let json = r#"[
            { "op": "resize", "height": 320, "width": 320 },
            { "op": "vertical_flip" },
            { "op": "grayscale" },
            { "op": "to_tensor", "mask": "index" },
            { "op": "normalize", "mean": [0.5], "std": [0.5] }
        ]"#;
        let specs: Vec<TransformSpec> = serde_json::from_str(json).unwrap();
        assert_eq!(specs[1], TransformSpec::VerticalFlip { p: 0.5 });
        assert_eq!(
            specs[3],
            TransformSpec::ToTensor {
                mask: MaskMode::Index
            }
        );

        let pipeline = Compose::from_specs(&specs).unwrap();
        assert_eq!(
            pipeline.describe(),
            "resize -> vertical_flip -> grayscale -> to_tensor -> normalize"
        );

        let out = pipeline
            .apply_seeded(crate::transform::tests::sample_pair(50, 40), 1)
            .unwrap();
        assert_eq!(out.image_dims(), (320, 320));
        assert_eq!(out.mask_dims(), Some((320, 320)));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_pipeline_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("pipeline.json");
        std::fs::write(&good, r#"[{"op": "center_crop", "height": 4, "width": 4}]"#).unwrap();
        let pipeline = Compose::from_json_file(&good).unwrap();
        assert_eq!(pipeline.describe(), "center_crop");

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, r#"[{"op": "rotate"}]"#).unwrap();
        assert!(matches!(
            Compose::from_json_file(&bad),
            Err(Error::Pipeline { .. })
        ));
        assert!(matches!(
            Compose::from_json_file(dir.path().join("none.json")),
            Err(Error::Io { .. })
        ));
    }
}
