#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 提供脑肿瘤分类数据集和 LGG 分割数据集的目录枚举、标签索引、
//! 样本加载以及图像-掩膜成对变换.
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. 所有错误都会返回给直接调用者, 库内部不做任何 "跳过" 或重试.
//!   是否跳过损坏样本由上层批处理逻辑决定.
//! 2. `LabelIndex` 与 `Dataset` 构造完成后只读, 可以放心地跨线程共享.
//!
//! # 开发计划
//!
//! ### 数据划分与目录枚举 ✅
//!
//! 支持三种磁盘布局: 按类别分目录 (分类), 同目录 `_mask` 后缀 (LGG 分割),
//! 图像/掩膜分目录 (框分割). 另支持 JSON manifest.
//!
//! 实现位于 `tumor-berry/src/dataset`.
//!
//! ### 类别名与 id 的双向映射 ✅
//!
//! id 按类别名字典序分配, 保证可复现.
//!
//! 实现位于 `tumor-berry/src/label.rs`.
//!
//! ### 图像-掩膜成对变换 ✅
//!
//! 几何变换对图像和掩膜同步施加; 随机变换每次调用只抽取一次随机数.
//!
//! 实现位于 `tumor-berry/src/transform`.
//!
//! ### 样本加载器 ✅
//!
//! 迭代器风格的加载方式, 以及基于 `rayon` 的并行加载.
//!
//! 实现位于 `tumor-berry/src/loader.rs`.
//!
//! ### 标签分布统计与可视化 ✅
//!
//! 实现位于 `tumor-berry/src/report.rs` 和 `tumor-berry/src/vis.rs`.
//!
//! ### K 折交叉验证划分 ✅
//!
//! 实现位于 `tumor-berry/src/kfold.rs`.

/// 二维索引或形状, 按 `(高, 宽)` 排列.
pub type Idx2d = (usize, usize);

pub mod consts;
pub mod dataset;
mod error;
pub mod kfold;
pub mod label;
pub mod loader;
pub mod prelude;
pub mod report;
pub mod split;
pub mod transform;
pub mod vis;

pub use dataset::{Dataset, DatasetCatalog, Layout, Sample, Subset, Target, Task};
pub use error::{Error, Result};
pub use label::{LabelIndex, LabelKey};
pub use loader::{Loaded, SampleLoader};
pub use split::Split;
pub use transform::{Compose, DualTransform, Pair, TransformSpec};
