//! 呼气相气体潴留 (AirT) 命令行入口.

use anyhow::Result;
use clap::Parser;

use qct_berry::ops::airt::{self, AirtConfig};
use qct_berry::CasePaths;

/// 逐肺叶统计呼气相 HU 低于阈值的气体潴留占比.
#[derive(Debug, Parser)]
#[command(name = "get_airt")]
struct Cli {
    /// 受试者编号.
    subj: String,
    /// 固定相 (吸气) 编号.
    i1: String,
    /// 浮动相 (呼气) 编号.
    i2: String,
    /// 气体潴留阈值 (HU), 缺省 -856.
    #[arg(allow_negative_numbers = true)]
    threshold: Option<i32>,
}

fn main() -> Result<()> {
    utils::init_logs();
    let watch = utils::Stopwatch::start();
    let cli = Cli::parse();

    let case = CasePaths::new(utils::data_dir(), cli.subj, cli.i1, cli.i2);
    let mut cfg = AirtConfig::default();
    if let Some(threshold) = cli.threshold {
        cfg.threshold = threshold;
    }
    let out = airt::run(&case, cfg)?;

    utils::sep();
    println!("stats: {}", out.stats.display());
    println!("image: {}", out.image.display());
    watch.report();
    Ok(())
}
