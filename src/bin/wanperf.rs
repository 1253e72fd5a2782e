//! UDP 流量发生器
//!
//! 按给定的包长与带宽向回显端发送一组 UDP 流，每秒打印各流以及 WAN 各层的统计

use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use tracing::{error, info};
use wanperf_rs::Error;
use wanperf_rs::engine::{DEFAULT_PORT, ReturnFilter, STATS_INTERVAL};
use wanperf_rs::flow::FlowSet;
use wanperf_rs::layer::{LayerChain, LayerKind};
use wanperf_rs::model::{BandwidthUnit, LanLayer};
use wanperf_rs::project::ProjectFile;

#[derive(Debug, Parser)]
#[command(name = "wanperf", about = "UDP 流量发生器：按层指定包长与带宽，统计丢包与吞吐")]
struct Args {
    /// 从工程文件加载（忽略其余流参数）
    #[arg(long)]
    project: Option<PathBuf>,
    /// 把最终参数保存为工程文件
    #[arg(long)]
    save: Option<PathBuf>,
    #[arg(long, default_value_t = Ipv4Addr::LOCALHOST)]
    destination: Ipv4Addr,
    /// 第一条流的目的端口，后续流依次加一
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,
    #[arg(long, default_value_t = 1)]
    flows: usize,
    /// 每条流的带宽，单位见 --unit
    #[arg(long, default_value_t = 1.0)]
    bandwidth: f64,
    #[arg(long, default_value_t = BandwidthUnit::Mbps)]
    unit: BandwidthUnit,
    #[arg(long, default_value_t = LanLayer::EthernetL2)]
    bandwidth_layer: LanLayer,
    /// 包长（字节），参考层见 --size-layer
    #[arg(long, default_value_t = 500)]
    size: u32,
    #[arg(long, default_value_t = LanLayer::EthernetL2)]
    size_layer: LanLayer,
    #[arg(long, default_value_t = 0)]
    dscp: u8,
    /// 承诺间隔 Tc（毫秒）
    #[arg(long, default_value_t = 100)]
    tc_ms: u32,
    /// 过滤不合理的回程报文（时延、长度、序号）
    #[arg(long, default_value_t = false)]
    filter: bool,
    /// WAN 封装层，由内向外，逗号分隔
    #[arg(long, value_delimiter = ',')]
    wan: Vec<LayerKind>,
    /// 发送时长（秒），0 表示只打印配置
    #[arg(long, default_value_t = 5)]
    duration_s: u64,
}

fn build_from_args(args: &Args) -> wanperf_rs::Result<FlowSet> {
    let mut set = FlowSet::new();
    set.set_destination(args.destination)?;
    set.set_bandwidth_unit(args.unit);
    set.set_bandwidth_layer(args.bandwidth_layer)?;
    set.set_pdu_size_layer(args.size_layer);

    let bits = args.unit.from_unit(args.bandwidth).max(0.0).round() as u64;
    let port_range = || Error::PortRange {
        first: args.port,
        flows: args.flows,
    };
    for n in 0..args.flows {
        let port = u16::try_from(n)
            .ok()
            .and_then(|offset| args.port.checked_add(offset))
            .filter(|&port| port != 0)
            .ok_or_else(port_range)?;
        let id = set.add_flow()?;
        if let Some(flow) = set.flow_mut(id) {
            flow.set_name(format!("flow {}", n + 1));
            flow.set_port(port)?;
            flow.set_dscp(args.dscp)?;
            flow.set_commit_interval(Duration::from_millis(u64::from(args.tc_ms)))?;
            flow.set_pdu_size(args.size, args.size_layer)?;
            flow.set_bandwidth(bits, args.bandwidth_layer)?;
        }
    }

    if !args.wan.is_empty() {
        let mut kinds = args.wan.clone();
        if kinds.first() != Some(&LayerKind::Udp) {
            kinds.insert(0, LayerKind::Udp);
        }
        *set.wan_chain_mut() = LayerChain::from_kinds(&kinds)?;
    }
    Ok(set)
}

fn print_config(set: &FlowSet) {
    let unit = set.bandwidth_unit();
    for flow in set.flows() {
        let model = flow.model();
        println!(
            "config {} port={} dscp={} size={}@{} bandwidth={:.3}{}@{} pps={:.3}",
            flow.name(),
            flow.port(),
            flow.dscp(),
            model.pdu_size_at(set.pdu_size_layer()),
            set.pdu_size_layer(),
            unit.to_unit(model.bandwidth_at(set.bandwidth_layer()) as f64),
            unit.label(),
            set.bandwidth_layer(),
            model.pps()
        );
    }
    println!(
        "config total bandwidth={:.3}{}@{}",
        unit.to_unit(set.total_specified_bandwidth(set.bandwidth_layer()) as f64),
        unit.label(),
        set.bandwidth_layer()
    );
    let wan: Vec<String> = set
        .wan_chain()
        .kinds()
        .iter()
        .map(|k| k.short_name().to_string())
        .collect();
    println!("config wan={}", wan.join(" / "));
}

fn print_stats(set: &FlowSet) -> wanperf_rs::Result<()> {
    let unit = set.bandwidth_unit();
    let layer = set.bandwidth_layer();
    for flow in set.flows() {
        let stats = flow.stats(layer);
        let snapshot = flow.stats_snapshot();
        println!(
            "stats {} sent={:.3} received={:.3} {}@{} lost={} not_sent={}",
            flow.name(),
            unit.to_unit(stats.sent_bps),
            unit.to_unit(stats.received_bps),
            unit.label(),
            layer,
            stats.lost,
            snapshot.not_sent_packets
        );
    }
    for total in set.wan_totals()? {
        println!(
            "wan {} pdu={} sent={:.3} received={:.3} {}",
            total.kind.short_name(),
            total.pdu_size,
            unit.to_unit(total.sent_bps),
            unit.to_unit(total.received_bps),
            unit.label()
        );
    }
    Ok(())
}

/// 有流的引擎失败退出时报告全部失败的流，并返回第一个错误
fn check_failed(set: &FlowSet) -> wanperf_rs::Result<()> {
    let failed = set.failed_flows();
    for (id, reason) in &failed {
        let name = set.flow(*id).map(|f| f.name()).unwrap_or_default();
        error!(flow = %id, name, %reason, "❌ 流已停止");
    }
    match failed.into_iter().next() {
        Some((flow, reason)) => Err(Error::EngineFailed { flow, reason }),
        None => Ok(()),
    }
}

fn run(args: &Args) -> wanperf_rs::Result<()> {
    let mut set = match &args.project {
        Some(path) => {
            let mut set = FlowSet::new();
            set.apply_project(&ProjectFile::load(path)?)?;
            set
        }
        None => build_from_args(args)?,
    };
    if args.filter {
        let filter = ReturnFilter {
            enabled: true,
            ..ReturnFilter::default()
        };
        let ids: Vec<_> = set.flows().iter().map(|f| f.id()).collect();
        for id in ids {
            if let Some(flow) = set.flow_mut(id) {
                flow.set_return_filter(filter)?;
            }
        }
    }

    if let Some(path) = &args.save {
        set.to_project().save(path)?;
    }
    print_config(&set);

    if args.duration_s == 0 || set.is_empty() {
        return Ok(());
    }

    set.start()?;
    let deadline = Instant::now() + Duration::from_secs(args.duration_s);
    while Instant::now() < deadline {
        thread::sleep(STATS_INTERVAL);
        if set.poll_stats() {
            print_stats(&set)?;
        }
        if let Err(e) = check_failed(&set) {
            set.stop();
            return Err(e);
        }
    }
    set.stop();
    set.poll_stats();
    info!("✅ 发送结束");
    Ok(())
}

fn main() -> ExitCode {
    // 初始化 tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
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
