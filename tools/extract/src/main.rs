//! QCT 变量聚合命令行入口.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use qct_berry::extract::{self, ExtractConfig};

/// 把项目内所有受试者的 QCT 产物聚合成受试者宽表 CSV.
#[derive(Debug, Parser)]
#[command(name = "extract_qct")]
struct Cli {
    /// 项目目录, 内含 `{proj}_{subj}` 受试者目录.
    proj_dir: PathBuf,
    /// 人口学 CSV. 允许不存在, 相关列将置 na.
    demo_csv: PathBuf,
    /// 项目编号.
    proj: String,
    /// 固定相编号.
    #[arg(long, default_value = "IN0")]
    img0: String,
    /// 浮动相编号.
    #[arg(long, default_value = "EX0")]
    img1: String,
    /// 随访期标签, 拼进时间型变量名.
    #[arg(long, default_value = "T0")]
    fu: String,
    /// 壁厚/水力直径预测回归改用韩国系数.
    #[arg(long)]
    kor: bool,
}

fn main() -> Result<()> {
    utils::init_logs();
    let watch = utils::Stopwatch::start();
    let cli = Cli::parse();

    let mut cfg = ExtractConfig::new(&cli.proj_dir, &cli.demo_csv, cli.proj);
    cfg.img0 = cli.img0;
    cfg.img1 = cli.img1;
    cfg.fu = cli.fu;
    cfg.kor = cli.kor;

    let out = extract::run(&cfg)?;

    utils::sep();
    println!("subjects extracted: {}", out.per_subject.len());
    if let Some(combined) = &out.combined {
        println!("combined: {}", combined.display());
    }
    watch.report();
    Ok(())
}
