//! 数据集操作.

use std::path::{Path, PathBuf};

mod catalog;
#[cfg(feature = "serde")]
pub mod manifest;
mod sample;
pub(crate) mod scan;
mod view;

pub use catalog::{DatasetCatalog, Layout, Task};
pub use sample::{Sample, Target};
pub use view::{Dataset, Subset};

/// 获取 `{用户主目录}/dataset` 目录.
pub fn home_dataset_dir() -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("dataset");
    Some(ans)
}

/// 获取 `{用户主目录}/dataset` 目录下给定继续项组成的全路径.
pub fn home_dataset_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = home_dataset_dir()?;
    ans.extend(it);
    Some(ans)
}
