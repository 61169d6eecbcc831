//! 归一化位移量 S* 命令行入口.

use anyhow::Result;
use clap::Parser;

use qct_berry::ops::s_norm;
use qct_berry::CasePaths;

/// 位移场模长经肺体积变化立方根归一后的肺叶矩统计.
#[derive(Debug, Parser)]
#[command(name = "get_s_norm")]
struct Cli {
    /// 受试者编号.
    subj: String,
    /// 固定相 (吸气) 编号.
    i1: String,
    /// 浮动相 (呼气) 编号.
    i2: String,
}

fn main() -> Result<()> {
    utils::init_logs();
    let watch = utils::Stopwatch::start();
    let cli = Cli::parse();

    let case = CasePaths::new(utils::data_dir(), cli.subj, cli.i1, cli.i2);
    let out = s_norm::run(&case)?;

    utils::sep();
    println!("stats: {}", out.stats.display());
    println!("image: {}", out.image.display());
    watch.report();
    Ok(())
}
