//! 检查工具依赖的通用组件.

use std::io::{self, Write};
use tumor_berry::transform::{Compose, Resize};

pub mod loader;

const SEP: &str = "--------------------------------------------------------";

/// 预览图中每个样本缩放到的边长.
pub const PREVIEW_SIZE: u32 = 256;

/// 简单分隔线.
#[inline]
pub fn sep_to<W: Write>(mut w: W) -> io::Result<()> {
    writeln!(&mut w, "{SEP}")
}

/// 获得可并行核心数.
pub fn cpus() -> usize {
    std::thread::available_parallelism().map_or_else(|_| num_cpus::get(), usize::from)
}

/// 预览用的默认流水线: 缩放到 `PREVIEW_SIZE` x `PREVIEW_SIZE`.
#[inline]
pub fn preview_pipeline() -> tumor_berry::Result<Compose> {
    Ok(Compose::new().push(Resize::new(PREVIEW_SIZE, PREVIEW_SIZE)?))
}
