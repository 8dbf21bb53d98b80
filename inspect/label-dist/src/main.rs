//! 统计各数据集各划分的标签分布, 并输出一张图像-掩膜预览图.
//!
//! 数据集路径见 `utils::loader`; 日志级别由 `$TUMOR_LOG` 控制 (缺省为 `info`).

mod result;
mod runner;

use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::env;

fn log_level() -> LevelFilter {
    env::var("TUMOR_LOG")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(LevelFilter::Info)
}

fn main() {
    SimpleLogger::new()
        .with_level(log_level())
        .init()
        .expect("Logger init error");

    runner::run().analyze().expect("Writing report error");
}
