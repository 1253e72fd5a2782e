//! 封装层计算器
//!
//! 打印 WAN 封装链上每层的 PDU 大小，以及一条流在五个 LAN 参考层上的包长与带宽

use std::process::ExitCode;

use clap::Parser;
use wanperf_rs::layer::{LayerChain, LayerKind};
use wanperf_rs::model::{FlowRateModel, LanLayer};

#[derive(Debug, Parser)]
#[command(name = "layer_calc", about = "封装层计算：在任一层给出 PDU 大小，换算到整条链")]
struct Args {
    /// WAN 封装层，由内向外，逗号分隔（省略开头的 UDP 时自动补上）
    #[arg(long, value_delimiter = ',', default_value = "ip,eth-l2,eth-l1")]
    wan: Vec<LayerKind>,
    /// 指定 PDU 大小的层下标（0 = UDP）
    #[arg(long, default_value_t = 0)]
    index: usize,
    /// 该层的 PDU 大小（字节）
    #[arg(long, default_value_t = 1000)]
    size: u32,
    /// LAN 侧带宽（bit/s）
    #[arg(long, default_value_t = 1_000_000)]
    bandwidth: u64,
    /// 带宽所在的 LAN 参考层
    #[arg(long, default_value_t = LanLayer::EthernetL2)]
    bandwidth_layer: LanLayer,
}

fn run(args: &Args) -> wanperf_rs::Result<()> {
    let mut kinds = args.wan.clone();
    if kinds.first() != Some(&LayerKind::Udp) {
        kinds.insert(0, LayerKind::Udp);
    }
    let mut chain = LayerChain::from_kinds(&kinds)?;
    chain.set_pdu_size_at(args.index, args.size)?;

    for (index, layer) in chain.layers().iter().enumerate() {
        println!(
            "layer {index} {:<20} pdu={} sdu={}",
            layer.kind().short_name(),
            layer.pdu_size(),
            layer.sdu_size()
        );
    }

    // LAN 表以 UDP PDU 为准
    let mut model = FlowRateModel::new();
    model.set_bandwidth(args.bandwidth, args.bandwidth_layer);
    model.set_pdu_size(chain.layers()[0].pdu_size(), LanLayer::Udp);
    for layer in LanLayer::ALL {
        println!(
            "lan {:<8} pdu={} bandwidth={}",
            layer.short_name(),
            model.pdu_size_at(layer),
            model.bandwidth_at(layer)
        );
    }
    println!("pps={:.3}", model.pps());
    Ok(())
}

fn main() -> ExitCode {
    // 初始化 tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
