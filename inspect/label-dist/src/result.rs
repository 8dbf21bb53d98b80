//! 检查结果.

use std::error::Error as StdError;
use std::io::{self, Write};
use std::path::PathBuf;
use tumor_berry::report::SplitTable;
use tumor_berry::Result;

/// 预览图的输出路径, 或失败原因.
pub type PreviewResult = std::result::Result<PathBuf, Box<dyn StdError + Send + Sync>>;

/// 将 `table` 的计数与归一化分布写进 `w` 中.
fn describe_into<W: Write>(name: &str, table: &Result<SplitTable>, w: &mut W) -> io::Result<()> {
    match table {
        Ok(t) => {
            writeln!(w, "Dataset `{name}`:")?;
            writeln!(w, "{}", t.counts())?;
            writeln!(w, "Normalized:")?;
            write!(w, "{}", t.normalized())
        }
        Err(e) => {
            log::error!("dataset `{name}`: {e}");
            writeln!(w, "Dataset `{name}` is unavailable: {e}")
        }
    }
}

/// 所有数据集的检查结果.
pub struct InspectResult {
    sections: Vec<(&'static str, Result<SplitTable>)>,
    preview: PreviewResult,
}

impl InspectResult {
    pub fn new<I>(sections: I, preview: PreviewResult) -> Self
    where
        I: IntoIterator<Item = (&'static str, Result<SplitTable>)>,
    {
        Self {
            sections: sections.into_iter().collect(),
            preview,
        }
    }

    /// 输出运行结果.
    pub fn analyze(&self) -> io::Result<()> {
        let stdout = io::stdout();
        let mut w = stdout.lock();
        utils::sep_to(&mut w)?;

        for (name, table) in self.sections.iter() {
            describe_into(name, table, &mut w)?;
            utils::sep_to(&mut w)?;
        }

        match &self.preview {
            Ok(p) => writeln!(w, "Preview written to {}", p.display())?,
            Err(e) => {
                log::warn!("preview failed: {e}");
                writeln!(w, "No preview: {e}")?;
            }
        }
        utils::sep_to(&mut w)
    }
}
