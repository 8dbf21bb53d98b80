//! 类别名与整数 id 的双向映射.

use crate::dataset::scan;
use crate::{Error, Result};
use itertools::Itertools;
use std::fmt;
use std::path::Path;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 标签查询键. 仅用于错误报告.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LabelKey {
    /// 按类别名查询.
    Name(String),

    /// 按类别 id 查询.
    Id(usize),
}

impl fmt::Display for LabelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(n) => write!(f, "`{n}`"),
            Self::Id(i) => write!(f, "#{i}"),
        }
    }
}

/// 类别名与 id 之间的双射.
///
/// id 按类别名的字典序从 0 开始连续分配, 因此相同的类别集合总会得到相同的映射.
/// 构造后只读.
///
/// 内部只保存有序去重的类别名数组: 数组下标即 id, 名称查询通过二分完成.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(from = "Vec<String>", into = "Vec<String>")
)]
pub struct LabelIndex {
    names: Vec<String>,
}

impl LabelIndex {
    /// 从任意类别名集合构造. 重复的名字只保留一个.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names = names.into_iter().map(Into::into).sorted().dedup().collect();
        Self { names }
    }

    /// 以 `dirs` 下所有 (非隐藏) 子目录名的并集作为类别集合.
    ///
    /// 这是唯一一处 "从目录结构推断类别" 的逻辑. 不存在的目录会返回 `Err`.
    pub fn from_class_dirs<I, P>(dirs: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut names = Vec::new();
        for dir in dirs {
            names.extend(scan::subdirs(dir.as_ref())?.into_iter().map(|(n, _)| n));
        }
        Ok(Self::from_names(names))
    }

    /// 类别名 -> id.
    pub fn class_to_idx(&self, name: &str) -> Result<usize> {
        self.names
            .binary_search_by(|n| n.as_str().cmp(name))
            .map_err(|_| Error::UnknownLabel(LabelKey::Name(name.to_string())))
    }

    /// id -> 类别名.
    pub fn idx_to_class(&self, id: usize) -> Result<&str> {
        self.names
            .get(id)
            .map(String::as_str)
            .ok_or(Error::UnknownLabel(LabelKey::Id(id)))
    }

    /// 是否注册了类别名 `name`?
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.class_to_idx(name).is_ok()
    }

    /// 类别个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// 是否没有任何类别.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// 按 id 顺序排列的类别名.
    #[inline]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// 按 id 升序迭代 `(id, 类别名)`.
    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (usize, &str)> {
        self.names.iter().map(String::as_str).enumerate()
    }
}

impl From<Vec<String>> for LabelIndex {
    #[inline]
    fn from(value: Vec<String>) -> Self {
        Self::from_names(value)
    }
}

impl From<LabelIndex> for Vec<String> {
    #[inline]
    fn from(value: LabelIndex) -> Self {
        value.names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_ids_follow_sorted_names() {
        let idx = LabelIndex::from_names(["pituitary", "glioma", "notumor", "meningioma", "glioma"]);
        assert_eq!(idx.len(), 4);
        assert_eq!(idx.names(), ["glioma", "meningioma", "notumor", "pituitary"]);
        assert_eq!(idx.class_to_idx("glioma").unwrap(), 0);
        assert_eq!(idx.class_to_idx("pituitary").unwrap(), 3);
    }

    #[test]
    fn test_round_trip_bijection() {
        let idx = LabelIndex::from_names(["malignant", "benign", "normal"]);
        for (id, name) in idx.iter() {
            assert_eq!(idx.class_to_idx(name).unwrap(), id);
            assert_eq!(idx.idx_to_class(idx.class_to_idx(name).unwrap()).unwrap(), name);
        }
    }

    #[test]
    fn test_unknown_label() {
        let idx = LabelIndex::from_names(["benign", "malignant"]);
        assert!(matches!(
            idx.class_to_idx("normal"),
            Err(Error::UnknownLabel(LabelKey::Name(ref n))) if n == "normal"
        ));
        assert!(matches!(
            idx.idx_to_class(2),
            Err(Error::UnknownLabel(LabelKey::Id(2)))
        ));
        assert!(!idx.contains("Benign"));
    }

    #[test]
    fn test_from_class_dirs_unions_splits() {
        let root = tempfile::tempdir().unwrap();
        for (split, class) in [("train", "benign"), ("train", "malignant"), ("test", "normal")] {
            fs::create_dir_all(root.path().join(split).join(class)).unwrap();
        }
        fs::create_dir_all(root.path().join("train").join(".ipynb_checkpoints")).unwrap();
        fs::write(root.path().join("train").join("README.txt"), b"x").unwrap();

        let idx = LabelIndex::from_class_dirs([root.path().join("train"), root.path().join("test")])
            .unwrap();
        assert_eq!(idx.names(), ["benign", "malignant", "normal"]);

        assert!(LabelIndex::from_class_dirs([root.path().join("missing")]).is_err());
    }

    #[test]
    fn test_empty_index() {
        let idx = LabelIndex::default();
        assert!(idx.is_empty());
        assert!(idx.idx_to_class(0).is_err());
    }
}
