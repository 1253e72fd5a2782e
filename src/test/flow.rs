use std::sync::atomic::Ordering;
use std::time::Duration;

use super::support::counting_opener;
use crate::Error;
use crate::engine::{EngineReport, EngineStatus};
use crate::flow::{DEFAULT_BANDWIDTH, Flow, FlowId};
use crate::model::LanLayer;

fn report(sent: u64, received: u64, lost: u64, secs: u64) -> EngineReport {
    EngineReport {
        lost,
        sent,
        received,
        not_sent: 0,
        interval: Duration::from_secs(secs),
    }
}

#[test]
fn new_flow_pushes_rate_and_length_to_the_engine() {
    let flow = Flow::new(FlowId(1));
    assert_eq!(flow.model().specified_bandwidth(), DEFAULT_BANDWIDTH);
    assert_eq!(flow.model().udp_size(), 500);

    let config = flow.engine_config();
    // 10 kbit/s ÷ (500 B × 8) = 2.5 pps
    assert!((config.rate_per_ms - 0.0025).abs() < 1e-12);
    assert_eq!(config.datagram_length, 492);
    assert_eq!(flow.status(), EngineStatus::Stopped);
    assert!(!flow.is_running());
}

#[test]
fn size_and_bandwidth_can_be_given_at_any_layer() {
    let mut flow = Flow::new(FlowId(1));
    flow.set_pdu_size(1518, LanLayer::EthernetL2).expect("size");
    flow.set_bandwidth(8_000_000, LanLayer::EthernetL1).expect("bandwidth");

    assert_eq!(flow.model().udp_size(), 1480);
    let config = flow.engine_config();
    assert_eq!(config.datagram_length, 1472);
    // 8 Mbit/s ÷ (1538 B × 8)
    assert!((config.rate_per_ms - 1_000_000.0 / 1538.0 / 1000.0).abs() < 1e-12);
}

#[test]
fn dscp_sets_the_upper_six_tos_bits() {
    let mut flow = Flow::new(FlowId(1));
    flow.set_dscp(46).expect("EF");
    assert_eq!(flow.dscp(), 46);
    assert_eq!(flow.tos(), 184);
    assert_eq!(flow.engine_config().tos, 184);

    assert!(matches!(flow.set_dscp(64), Err(Error::Dscp(64))));
    assert_eq!(flow.dscp(), 46);
}

#[test]
fn commit_interval_and_port_are_forwarded() {
    let mut flow = Flow::new(FlowId(1));
    flow.set_commit_interval(Duration::from_millis(20)).expect("tc");
    flow.set_port(5001).expect("port");
    assert_eq!(flow.commit_interval(), Duration::from_millis(20));
    assert_eq!(flow.port(), 5001);

    assert!(flow.set_commit_interval(Duration::from_secs(2)).is_err());
    assert_eq!(flow.commit_interval(), Duration::from_millis(20));
}

#[test]
fn reports_become_rates() {
    let mut flow = Flow::new(FlowId(1));
    flow.apply_report(&report(100, 90, 10, 1));
    let stats = flow.stats_snapshot();
    assert_eq!(stats.sent_pps, 100.0);
    assert_eq!(stats.received_pps, 90.0);
    assert_eq!(stats.lost, 10);

    flow.apply_report(&report(300, 250, 12, 2));
    let stats = flow.stats_snapshot();
    assert_eq!(stats.sent_pps, 100.0);
    assert_eq!(stats.received_pps, 80.0);
    assert_eq!(stats.sent_packets, 300);

    // UDP 500 B：100 pps = 400 kbit/s，L1 上 558 B
    let udp = flow.stats(LanLayer::Udp);
    assert_eq!(udp.sent_bps, 400_000.0);
    assert_eq!(udp.received_bps, 320_000.0);
    assert_eq!(udp.lost, 12);
    assert_eq!(flow.stats(LanLayer::EthernetL1).sent_bps, 446_400.0);
}

#[test]
fn final_report_resets_the_snapshot() {
    let mut flow = Flow::new(FlowId(1));
    flow.apply_report(&report(100, 90, 10, 1));
    flow.apply_report(&EngineReport::default());
    assert_eq!(flow.stats_snapshot(), Default::default());

    // 重启后计数从零开始
    flow.apply_report(&report(50, 50, 0, 1));
    assert_eq!(flow.stats_snapshot().sent_pps, 50.0);
}

#[test]
fn flow_ids_print_and_parse() {
    assert_eq!(FlowId(7).to_string(), "flow-7");
    assert_eq!("flow-7".parse::<FlowId>().expect("id"), FlowId(7));
    assert_eq!("7".parse::<FlowId>().expect("id"), FlowId(7));
    assert!("flow-x".parse::<FlowId>().is_err());
}

#[test]
fn resizing_a_running_flow_restarts_its_engine_once() {
    let (opener, opened) = counting_opener();
    let mut flow = Flow::new(FlowId(1));
    flow.set_socket_opener(opener).expect("opener");
    flow.start().expect("start");

    flow.set_pdu_size(1000, LanLayer::Udp).expect("size");
    assert!(flow.is_running());
    flow.stop();

    assert_eq!(opened.load(Ordering::SeqCst), 2);
    let config = flow.engine_config();
    assert_eq!(config.datagram_length, 992);
    // 10 kbit/s ÷ (1000 B × 8) = 1.25 pps
    assert!((config.rate_per_ms - 0.00125).abs() < 1e-12);
}
