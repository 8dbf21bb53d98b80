//! 目录扫描. 所有与磁盘布局相关的细节都集中在这里.

use crate::consts::SUPPORTED_EXTENSIONS;
use crate::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// 文件名是否以 `.` 开头 (如 `.DS_Store`, `.ipynb_checkpoints`)?
#[inline]
pub(crate) fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

/// 扩展名是否为支持的图像格式 (大小写不敏感)?
#[inline]
pub(crate) fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|s| s.eq_ignore_ascii_case(e))
        })
}

/// 读取 `dir` 下的直接子项 (跳过隐藏项), 按路径字典序排序.
fn read_dir_sorted(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
        let path = entry.map_err(|e| Error::io(dir, e))?.path();
        if !is_hidden(&path) {
            entries.push(path);
        }
    }
    entries.sort();
    Ok(entries)
}

/// `dir` 的所有非隐藏子目录, 以 `(目录名, 路径)` 形式按名字排序返回.
///
/// 目录名不是合法 UTF-8 时跳过并记录警告.
pub(crate) fn subdirs(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut ans = Vec::new();
    for path in read_dir_sorted(dir)?.into_iter().filter(|p| p.is_dir()) {
        match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => ans.push((name.to_string(), path.clone())),
            None => log::warn!("skipping non UTF-8 directory {}", path.display()),
        }
    }
    Ok(ans)
}

/// `dir` 下所有支持格式的图像文件, 按路径排序.
/// `recursive` 为 `true` 时会深入所有非隐藏子目录.
pub(crate) fn images(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    let mut ans = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(d) = pending.pop() {
        for path in read_dir_sorted(&d)? {
            if path.is_dir() {
                if recursive {
                    pending.push(path);
                }
            } else if is_supported_image(&path) {
                ans.push(path);
            } else {
                log::debug!("ignoring unsupported file {}", path.display());
            }
        }
    }
    ans.sort();
    Ok(ans)
}

/// 去掉扩展名的文件名. 非 UTF-8 时返回 `None`.
#[inline]
pub(crate) fn stem(path: &Path) -> Option<&str> {
    path.file_stem().and_then(|s| s.to_str())
}
