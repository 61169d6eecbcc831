//! 各 QCT 命令行工具共享的小组件.

use std::path::PathBuf;
use std::time::Instant;

const SEP: &str = "--------------------------------------------------------";

/// 简单分隔线.
#[inline]
pub fn sep() {
    println!("{SEP}");
}

/// 初始化命令行日志, 级别 `info`.
pub fn init_logs() {
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .init()
        .unwrap();
}

/// 受试者文件所在目录: `$QCT_DATA_DIR`, 未设置时取当前目录.
///
/// 历史脚本都在受试者目录内原地运行, 默认值保留该习惯.
pub fn data_dir() -> PathBuf {
    std::env::var_os("QCT_DATA_DIR").map_or_else(|| PathBuf::from("."), PathBuf::from)
}

/// 运行计时器, 结束时打印 `Elapsed time: {}s` 行.
#[derive(Debug)]
pub struct Stopwatch(Instant);

impl Stopwatch {
    /// 从现在开始计时.
    pub fn start() -> Self {
        Self(Instant::now())
    }

    /// 打印从计时开始到现在的耗时 (秒).
    pub fn report(&self) {
        println!("Elapsed time: {}s", self.0.elapsed().as_secs_f64());
    }
}
