//! 气量变化相对分布 (RRAVC) 命令行入口.

use anyhow::Result;
use clap::Parser;

use qct_berry::ops::rravc;
use qct_berry::CasePaths;

/// 由配准气量差与固定相气量算 RRAVC 连续场及其肺叶矩统计.
#[derive(Debug, Parser)]
#[command(name = "get_rravc")]
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
    let out = rravc::run(&case)?;

    utils::sep();
    println!("stats: {}", out.stats.display());
    println!("image: {}", out.image.display());
    watch.report();
    Ok(())
}
