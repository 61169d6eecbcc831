//! 肺气肿 / fSAD 两级分类命令行入口.

use anyhow::Result;
use clap::Parser;

use qct_berry::ops::emph_fsad::{self, EmphFsadConfig};
use qct_berry::CasePaths;

/// 吸气相肺气肿与配准呼气相 fSAD 的两级互斥分类统计.
#[derive(Debug, Parser)]
#[command(name = "get_emph_fsad")]
struct Cli {
    /// 受试者编号.
    subj: String,
    /// 固定相 (吸气) 编号.
    i1: String,
    /// 浮动相 (呼气) 编号.
    i2: String,
    /// 肺气肿阈值 (HU), 缺省 -950. 必须与 fSAD 阈值成对给出.
    #[arg(requires = "fsad", allow_negative_numbers = true)]
    emph: Option<i32>,
    /// fSAD 阈值 (HU), 缺省 -856.
    #[arg(allow_negative_numbers = true)]
    fsad: Option<i32>,
}

fn main() -> Result<()> {
    utils::init_logs();
    let watch = utils::Stopwatch::start();
    let cli = Cli::parse();

    let case = CasePaths::new(utils::data_dir(), cli.subj, cli.i1, cli.i2);
    let mut cfg = EmphFsadConfig::default();
    if let (Some(emph), Some(fsad)) = (cli.emph, cli.fsad) {
        cfg.emph = emph;
        cfg.fsad = fsad;
    }
    let out = emph_fsad::run(&case, cfg)?;

    utils::sep();
    println!("stats: {}", out.stats.display());
    println!("image: {}", out.image.display());
    watch.report();
    Ok(())
}
