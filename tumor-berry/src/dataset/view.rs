use super::Sample;
use crate::{Error, LabelIndex, Result, Split};
use std::ops::Index;
use std::sync::Arc;

/// 某个划分下的有序样本集合.
///
/// 样本顺序在构造时确定, 之后不可变. 分类数据集会共享同一份 [`LabelIndex`].
#[derive(Clone, Debug)]
pub struct Dataset {
    split: Split,
    samples: Vec<Sample>,
    labels: Option<Arc<LabelIndex>>,
}

impl Dataset {
    /// 直接由样本构造. 调用者负责保证顺序的确定性.
    #[inline]
    pub fn from_samples(split: Split, samples: Vec<Sample>, labels: Option<Arc<LabelIndex>>) -> Self {
        Self {
            split,
            samples,
            labels,
        }
    }

    /// 所属划分.
    #[inline]
    pub fn split(&self) -> Split {
        self.split
    }

    /// 样本个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// 是否没有样本.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// 第 `index` 个样本. 越界时返回 `None`.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&Sample> {
        self.samples.get(index)
    }

    /// 所有样本.
    #[inline]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// 按顺序迭代样本.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    /// 分类数据集的标签索引. 分割数据集返回 `None`.
    #[inline]
    pub fn label_index(&self) -> Option<&LabelIndex> {
        self.labels.as_deref()
    }

    /// 共享的标签索引句柄.
    #[inline]
    pub fn shared_label_index(&self) -> Option<Arc<LabelIndex>> {
        self.labels.clone()
    }

    /// 以 `indices` 选取一个子集视图. 任一索引越界时返回 `Err`.
    pub fn subset(&self, indices: Vec<usize>) -> Result<Subset<'_>> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.len()) {
            return Err(Error::InvalidArgument(format!(
                "子集索引 {bad} 越界 (数据集大小 {})",
                self.len()
            )));
        }
        Ok(Subset {
            dataset: self,
            indices,
        })
    }
}

impl Index<usize> for Dataset {
    type Output = Sample;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.samples[index]
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Sample;
    type IntoIter = std::slice::Iter<'a, Sample>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

/// 借用的数据集子集. 保存原数据集中的索引.
#[derive(Clone, Debug)]
pub struct Subset<'a> {
    dataset: &'a Dataset,
    indices: Vec<usize>,
}

impl<'a> Subset<'a> {
    /// 原数据集.
    #[inline]
    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    /// 子集在原数据集中的索引.
    #[inline]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// 子集大小.
    #[inline]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// 子集是否为空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// 子集中第 `index` 个样本.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&'a Sample> {
        let ds = self.dataset;
        self.indices.get(index).map(|&i| &ds[i])
    }

    /// 迭代 `(原数据集索引, 样本)`.
    #[inline]
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (usize, &'a Sample)> + '_ {
        let ds = self.dataset;
        self.indices.iter().map(move |&i| (i, &ds[i]))
    }
}
