//! 数据集划分.

use crate::Error;
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 数据集的一个划分. 取值集合固定.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum Split {
    /// 训练集.
    Train,

    /// 验证集.
    #[cfg_attr(feature = "serde", serde(alias = "val"))]
    Validation,

    /// 测试集.
    Test,
}

impl Split {
    /// 所有划分, 按固定顺序排列.
    pub const ALL: [Split; 3] = [Split::Train, Split::Validation, Split::Test];

    /// 除 `excluded` 以外的所有划分, 顺序同 [`Split::ALL`].
    #[inline]
    pub fn except(excluded: Split) -> impl Iterator<Item = Split> {
        Self::ALL.into_iter().filter(move |s| *s != excluded)
    }

    /// 规范名称.
    #[inline]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Validation => "validation",
            Self::Test => "test",
        }
    }

    /// 磁盘上可接受的目录名. 第一个为规范名称, 其余为别名.
    #[inline]
    pub const fn dir_names(&self) -> &'static [&'static str] {
        match self {
            Self::Train => &["train"],
            Self::Validation => &["validation", "val"],
            Self::Test => &["test"],
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Split {
    type Err = Error;

    /// 大小写不敏感, 接受所有别名.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|sp| sp.dir_names().contains(&lower.as_str()))
            .ok_or_else(|| Error::InvalidArgument(format!("无法识别的数据划分 `{s}`")))
    }
}
