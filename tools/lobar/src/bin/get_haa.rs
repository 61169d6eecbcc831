//! 高衰减区 (HAA) 命令行入口.

use anyhow::Result;
use clap::Parser;

use qct_berry::consts::hu;
use qct_berry::ops::haa::{self, HaaConfig};
use qct_berry::CasePaths;

/// 逐肺叶统计吸气相 HU 落在闭区间内的高衰减区占比.
#[derive(Debug, Parser)]
#[command(name = "get_haa")]
struct Cli {
    /// 受试者编号.
    subj: String,
    /// 固定相 (吸气) 编号.
    i1: String,
    /// 浮动相 (呼气) 编号.
    i2: String,
    /// 区间下限 (HU), 缺省 -700.
    #[arg(allow_negative_numbers = true)]
    lower: Option<i32>,
    /// 区间上限 (HU), 缺省 0. 只给下限时用开放上限 1000.
    #[arg(allow_negative_numbers = true)]
    upper: Option<i32>,
}

fn main() -> Result<()> {
    utils::init_logs();
    let watch = utils::Stopwatch::start();
    let cli = Cli::parse();

    let cfg = match (cli.lower, cli.upper) {
        (None, _) => HaaConfig::default(),
        (Some(lower), upper) => HaaConfig {
            lower,
            upper: upper.unwrap_or(hu::HAA_UPPER_OPEN),
        },
    };
    println!(
        "Lower Threshold: {}  | Upper Threshold: {}",
        cfg.lower, cfg.upper
    );

    let case = CasePaths::new(utils::data_dir(), cli.subj, cli.i1, cli.i2);
    let out = haa::run(&case, cfg)?;

    utils::sep();
    println!("stats: {}", out.stats.display());
    println!("image: {}", out.image.display());
    watch.report();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_args() {
        use clap::CommandFactory;
        Cli::command().debug_assert();

        let cli = Cli::parse_from(["get_haa", "S", "IN0", "EX0", "-650"]);
        assert_eq!(cli.lower, Some(-650));
        assert_eq!(cli.upper, None);

        let cli = Cli::parse_from(["get_haa", "S", "IN0", "EX0", "-650", "50"]);
        assert_eq!(cli.upper, Some(50));
    }
}
