//! K 折交叉验证划分.

use crate::{Dataset, Error, Result, Subset};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// K 折划分器.
///
/// `0..n` 先 (可选地) 以 `seed` 打乱, 再顺序切成 `n_splits` 段, 每段依次作为验证集.
/// 前 `n % n_splits` 段比其余段多一个元素.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct KFold {
    /// 折数, 至少为 2.
    pub n_splits: usize,

    /// 切分前是否打乱.
    pub shuffle: bool,

    /// 打乱时使用的随机种子.
    pub seed: u64,
}

impl Default for KFold {
    /// 5 折, 不打乱.
    fn default() -> Self {
        Self {
            n_splits: 5,
            shuffle: false,
            seed: 0,
        }
    }
}

/// 一折: 训练索引与验证索引.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Fold {
    /// 训练集索引, 升序.
    pub train: Vec<usize>,

    /// 验证集索引.
    pub val: Vec<usize>,
}

impl Fold {
    /// 在 `dataset` 上构造 (训练, 验证) 子集.
    pub fn subsets<'a>(&self, dataset: &'a Dataset) -> Result<(Subset<'a>, Subset<'a>)> {
        Ok((
            dataset.subset(self.train.clone())?,
            dataset.subset(self.val.clone())?,
        ))
    }
}

impl KFold {
    /// `n_splits` 折, 以 `seed` 打乱.
    #[inline]
    pub fn shuffled(n_splits: usize, seed: u64) -> Self {
        Self {
            n_splits,
            shuffle: true,
            seed,
        }
    }

    /// 划分 `0..n`.
    ///
    /// 所有验证集互不相交且覆盖 `0..n`; 每折中训练集与验证集互补.
    /// `n_splits < 2` 或 `n_splits > n` 时返回 `Error::InvalidArgument`.
    pub fn split(&self, n: usize) -> Result<Vec<Fold>> {
        if self.n_splits < 2 {
            return Err(Error::InvalidArgument(format!(
                "折数至少为 2, 但得到 {}",
                self.n_splits
            )));
        }
        if self.n_splits > n {
            return Err(Error::InvalidArgument(format!(
                "折数 {} 超过了样本数 {n}",
                self.n_splits
            )));
        }

        let mut order: Vec<usize> = (0..n).collect();
        if self.shuffle {
            order.shuffle(&mut StdRng::seed_from_u64(self.seed));
        }

        let (base, extra) = (n / self.n_splits, n % self.n_splits);
        let mut start = 0;
        let mut folds = Vec::with_capacity(self.n_splits);
        for k in 0..self.n_splits {
            let len = base + usize::from(k < extra);
            let val = order[start..start + len].to_vec();
            let mut in_val = vec![false; n];
            val.iter().for_each(|&i| in_val[i] = true);
            let train = (0..n).filter(|&i| !in_val[i]).collect();
            folds.push(Fold { train, val });
            start += len;
        }
        Ok(folds)
    }

    /// 在 `dataset` 上划分.
    #[inline]
    pub fn split_dataset(&self, dataset: &Dataset) -> Result<Vec<Fold>> {
        self.split(dataset.len())
    }
}

/// 增量平均值: `avg += (x - avg) / (k + 1)`. 用于汇总各折的指标.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct RunningMean {
    count: usize,
    mean: f64,
}

impl RunningMean {
    /// 加入一个观测值.
    #[inline]
    pub fn push(&mut self, x: f64) {
        self.count += 1;
        self.mean += (x - self.mean) / self.count as f64;
    }

    /// 当前均值. 没有观测值时为 `None`.
    #[inline]
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then_some(self.mean)
    }

    /// 观测值个数.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }
}

impl Extend<f64> for RunningMean {
    fn extend<T: IntoIterator<Item = f64>>(&mut self, iter: T) {
        iter.into_iter().for_each(|x| self.push(x));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LabelIndex, Sample, Split};
    use std::sync::Arc;

    fn check_partition(folds: &[Fold], n: usize) {
        let mut seen = vec![0usize; n];
        for f in folds {
            assert_eq!(f.train.len() + f.val.len(), n);
            assert!(f.train.windows(2).all(|w| w[0] < w[1]));
            for &i in &f.val {
                seen[i] += 1;
                assert!(!f.train.contains(&i));
            }
        }
        assert!(seen.iter().all(|&c| c == 1));

        let sizes: Vec<usize> = folds.iter().map(|f| f.val.len()).collect();
        let (min, max) = (sizes.iter().min().unwrap(), sizes.iter().max().unwrap());
        assert!(max - min <= 1);
        // 大的折在前.
        assert!(sizes.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_folds_partition_indices() {
        for (n, k) in [(10, 5), (11, 3), (7, 7), (100, 10), (13, 2)] {
            let plain = KFold {
                n_splits: k,
                ..Default::default()
            }
            .split(n)
            .unwrap();
            assert_eq!(plain.len(), k);
            check_partition(&plain, n);

            let shuffled = KFold::shuffled(k, 42).split(n).unwrap();
            check_partition(&shuffled, n);
        }
    }

    #[test]
    fn test_unshuffled_folds_are_contiguous() {
        let folds = KFold {
            n_splits: 3,
            ..Default::default()
        }
        .split(7)
        .unwrap();
        assert_eq!(folds[0].val, vec![0, 1, 2]);
        assert_eq!(folds[1].val, vec![3, 4]);
        assert_eq!(folds[2].val, vec![5, 6]);
        assert_eq!(folds[2].train, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_shuffle_is_seeded() {
        let a = KFold::shuffled(4, 7).split(40).unwrap();
        let b = KFold::shuffled(4, 7).split(40).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_fold_count() {
        assert!(matches!(
            KFold::shuffled(1, 0).split(10),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            KFold::shuffled(11, 0).split(10),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_fold_subsets() {
        let samples = (0..6)
            .map(|i| Sample::classification(format!("{i}.png"), i % 2))
            .collect();
        let labels = Arc::new(LabelIndex::from_names(["a", "b"]));
        let ds = Dataset::from_samples(Split::Train, samples, Some(labels));

        for fold in KFold::shuffled(3, 1).split_dataset(&ds).unwrap() {
            let (train, val) = fold.subsets(&ds).unwrap();
            assert_eq!(train.len(), 4);
            assert_eq!(val.len(), 2);
            assert_eq!(val.indices(), fold.val.as_slice());
        }
    }

    #[test]
    fn test_running_mean() {
        let mut m = RunningMean::default();
        assert_eq!(m.mean(), None);
        m.extend([0.5, 0.7, 0.9]);
        assert_eq!(m.count(), 3);
        assert!((m.mean().unwrap() - 0.7).abs() < 1e-12);
    }
}
