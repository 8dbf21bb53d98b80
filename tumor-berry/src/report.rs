//! 标签分布统计.
//!
//! 计数按类别 id 顺序排列; 归一化分布以百分比表示, 显示为 `xx.xx%`.

use crate::consts::ElemType;
use crate::loader::{Loaded, SampleLoader};
use crate::transform::Pair;
use crate::{Dataset, DatasetCatalog, Error, LabelKey, Result, Split};
use itertools::Itertools;
use std::fmt;

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IntoParallelIterator, ParallelIterator};
    }
}

/// 没有病灶的掩膜.
pub const EMPTY_MASK: &str = "empty";

/// 含有病灶的掩膜.
pub const LESION_MASK: &str = "lesion";

/// 各类别的样本数.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LabelCounts {
    names: Vec<String>,
    counts: Vec<usize>,
}

impl LabelCounts {
    /// 直接构造. `names` 与 `counts` 长度须相同.
    pub fn new(names: Vec<String>, counts: Vec<usize>) -> Result<Self> {
        if names.len() != counts.len() {
            return Err(Error::InvalidArgument(format!(
                "类别数 {} 与计数个数 {} 不一致",
                names.len(),
                counts.len()
            )));
        }
        Ok(Self { names, counts })
    }

    /// 统计分类数据集中各类别的样本数. 索引中有但没有样本的类别计为 0.
    pub fn from_dataset(dataset: &Dataset) -> Result<Self> {
        let labels = dataset.label_index().ok_or(Error::NoLabels)?;
        let mut counts = vec![0usize; labels.len()];
        for sample in dataset {
            let id = sample.label().ok_or(Error::NoLabels)?;
            *counts
                .get_mut(id)
                .ok_or(Error::UnknownLabel(LabelKey::Id(id)))? += 1;
        }
        Ok(Self {
            names: labels.names().to_vec(),
            counts,
        })
    }

    /// 类别名.
    #[inline]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// 计数, 与 [`LabelCounts::names`] 一一对应.
    #[inline]
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// 样本总数.
    #[inline]
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// 类别 `name` 的样本数.
    pub fn get(&self, name: &str) -> Option<usize> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.counts[i])
    }

    /// 迭代 `(类别名, 计数)`.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.counts.iter().copied())
    }

    /// 归一化分布. 总数为 0 时所有类别都为 0%.
    pub fn distribution(&self) -> Distribution {
        let total = self.total();
        let percents = self
            .counts
            .iter()
            .map(|&c| percent(c, total))
            .collect();
        Distribution {
            names: self.names.clone(),
            percents,
        }
    }
}

impl fmt::Display for LabelCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = name_width(&self.names);
        for (name, count) in self.iter() {
            writeln!(f, "{name:<width$}  {count}")?;
        }
        Ok(())
    }
}

#[inline]
fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 * 100.0 / total as f64
    }
}

fn name_width<S: AsRef<str>>(names: &[S]) -> usize {
    names
        .iter()
        .map(|n| n.as_ref().chars().count())
        .max()
        .unwrap_or(0)
}

/// 各类别所占百分比.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Distribution {
    names: Vec<String>,
    percents: Vec<f64>,
}

impl Distribution {
    /// 类别 `name` 所占百分比.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.percents[i])
    }

    /// 迭代 `(类别名, 百分比)`.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.percents.iter().copied())
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = name_width(&self.names);
        for (name, p) in self.iter() {
            writeln!(f, "{name:<width$}  {p:.2}%")?;
        }
        Ok(())
    }
}

/// 多个划分的计数表: 行为类别, 列为划分.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SplitTable {
    splits: Vec<Split>,
    classes: Vec<String>,
    /// `cells[class][split]`.
    cells: Vec<Vec<usize>>,
}

impl SplitTable {
    /// 由各划分的计数构造. 类别为所有计数中类别的并集, 按首次出现的顺序排列.
    pub fn from_counts<I: IntoIterator<Item = (Split, LabelCounts)>>(columns: I) -> Self {
        let columns = columns.into_iter().collect_vec();
        let classes = columns
            .iter()
            .flat_map(|(_, c)| c.names().iter().cloned())
            .unique()
            .collect_vec();
        let cells = classes
            .iter()
            .map(|class| {
                columns
                    .iter()
                    .map(|(_, c)| c.get(class).unwrap_or(0))
                    .collect()
            })
            .collect();
        Self {
            splits: columns.into_iter().map(|(s, _)| s).collect(),
            classes,
            cells,
        }
    }

    /// 列.
    #[inline]
    pub fn splits(&self) -> &[Split] {
        &self.splits
    }

    /// 行.
    #[inline]
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// 类别 `class` 在划分 `split` 中的样本数.
    pub fn get(&self, class: &str, split: Split) -> Option<usize> {
        let row = self.classes.iter().position(|c| c == class)?;
        let col = self.splits.iter().position(|s| *s == split)?;
        Some(self.cells[row][col])
    }

    /// 划分 `split` 的样本总数.
    pub fn column_total(&self, split: Split) -> Option<usize> {
        let col = self.splits.iter().position(|s| *s == split)?;
        Some(self.cells.iter().map(|row| row[col]).sum())
    }

    /// 计数表.
    pub fn counts(&self) -> String {
        self.count_table().to_string()
    }

    /// 按列归一化的百分比表.
    pub fn normalized(&self) -> String {
        let totals = (0..self.splits.len())
            .map(|col| self.cells.iter().map(|row| row[col]).sum::<usize>())
            .collect_vec();
        self.render(|row, col| format!("{:.2}%", percent(self.cells[row][col], totals[col])))
            .to_string()
    }

    #[inline]
    fn count_table(&self) -> Rendered<'_> {
        self.render(|row, col| self.cells[row][col].to_string())
    }

    fn render<F: Fn(usize, usize) -> String>(&self, cell: F) -> Rendered<'_> {
        let body = (0..self.classes.len())
            .map(|row| (0..self.splits.len()).map(|col| cell(row, col)).collect_vec())
            .collect_vec();

        let first = name_width(&self.classes).max(CORNER.len());
        let widths = self
            .splits
            .iter()
            .enumerate()
            .map(|(col, s)| {
                body.iter()
                    .map(|r| r[col].len())
                    .chain(std::iter::once(s.name().len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect_vec();

        Rendered {
            table: self,
            body,
            first,
            widths,
        }
    }
}

impl fmt::Display for SplitTable {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.count_table(), f)
    }
}

/// 表头左上角.
const CORNER: &str = "class";

/// 单元格已格式化, 列宽已确定的文本表.
struct Rendered<'a> {
    table: &'a SplitTable,
    body: Vec<Vec<String>>,
    first: usize,
    widths: Vec<usize>,
}

impl fmt::Display for Rendered<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let first = self.first;
        write!(f, "{CORNER:<first$}")?;
        for (s, w) in self.table.splits.iter().zip(self.widths.iter().copied()) {
            write!(f, "  {:>w$}", s.name())?;
        }
        writeln!(f)?;
        for (class, row) in self.table.classes.iter().zip(&self.body) {
            write!(f, "{class:<first$}")?;
            for (v, w) in row.iter().zip(self.widths.iter().copied()) {
                write!(f, "  {v:>w$}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// 统计 `catalog` 中各 `splits` 的类别计数.
///
/// 任一划分不存在时直接返回 `Error::MissingSplit`, 不会以 0 计数代替.
pub fn split_report<I>(catalog: &DatasetCatalog, splits: I) -> Result<SplitTable>
where
    I: IntoIterator<Item = Split>,
{
    let columns = splits
        .into_iter()
        .map(|split| {
            let dataset = catalog.dataset(split)?;
            Ok((split, LabelCounts::from_dataset(&dataset)?))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(SplitTable::from_counts(columns))
}

/// 变换后的掩膜中是否有病灶像素?
fn mask_type(dataset: &Dataset, index: usize, loaded: Loaded) -> Result<ElemType> {
    let fg = match loaded.pair {
        Pair::Pixels { mask: Some(m), .. } => ElemType::of_mask(m.as_raw()),
        Pair::Tensor { mask: Some(m), .. } => {
            if m.iter().any(|v| *v != 0.0) {
                ElemType::Foreground
            } else {
                ElemType::Background
            }
        }
        _ => {
            return Err(Error::MissingMask {
                image: dataset[index].image.clone(),
            })
        }
    };
    Ok(fg)
}

/// 统计分割数据集中掩膜为空 (`"empty"`) 与含病灶 (`"lesion"`) 的样本数.
///
/// 掩膜经过 `loader` 的流水线后再判断, 因此裁剪等操作会影响结果.
pub fn mask_presence(dataset: &Dataset, loader: &SampleLoader) -> Result<LabelCounts> {
    #[cfg(feature = "rayon")]
    let types = (0..dataset.len())
        .into_par_iter()
        .map(|i| mask_type(dataset, i, loader.load_at(dataset, i)?))
        .collect::<Result<Vec<_>>>()?;
    #[cfg(not(feature = "rayon"))]
    let types = loader
        .iter(dataset)
        .map(|(i, r)| mask_type(dataset, i, r?))
        .collect::<Result<Vec<_>>>()?;

    let lesion = types.iter().filter(|t| t.is_foreground()).count();
    Ok(LabelCounts {
        names: vec![EMPTY_MASK.to_string(), LESION_MASK.to_string()],
        counts: vec![types.len() - lesion, lesion],
    })
}
