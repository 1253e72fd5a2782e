use crate::model::{BandwidthUnit, FlowRateModel, LanLayer, MAX_UDP_SIZE, MIN_UDP_SIZE};

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * b.abs().max(1.0)
}

#[test]
fn default_model() {
    let model = FlowRateModel::default();
    assert_eq!(model.udp_size(), 1000);
    assert_eq!(model.specified_bandwidth(), 100);
    assert_eq!(model.bandwidth_layer(), LanLayer::EthernetL2);
    assert!(approx(model.pps(), 100.0 / (1038.0 * 8.0)));
}

#[test]
fn pdu_sizes_at_every_lan_layer() {
    let model = FlowRateModel::new();
    assert_eq!(model.pdu_size_at(LanLayer::EthernetL1), 1058);
    assert_eq!(model.pdu_size_at(LanLayer::EthernetL2), 1038);
    assert_eq!(model.pdu_size_at(LanLayer::EthernetL2NoCrc), 1034);
    assert_eq!(model.pdu_size_at(LanLayer::Ip), 1020);
    assert_eq!(model.pdu_size_at(LanLayer::Udp), 1000);
}

#[test]
fn pdu_size_is_clamped_to_udp_limits() {
    let mut model = FlowRateModel::new();
    model.set_pdu_size(64, LanLayer::EthernetL2);
    assert_eq!(model.udp_size(), MIN_UDP_SIZE);
    assert_eq!(MIN_UDP_SIZE, 26);

    model.set_pdu_size(10, LanLayer::EthernetL1);
    assert_eq!(model.udp_size(), MIN_UDP_SIZE);

    model.set_pdu_size(1518, LanLayer::EthernetL2);
    assert_eq!(model.udp_size(), MAX_UDP_SIZE);

    model.set_pdu_size(9000, LanLayer::Ip);
    assert_eq!(model.udp_size(), 1480);
}

#[test]
fn bandwidth_converts_between_layers() {
    let mut model = FlowRateModel::new();
    model.set_bandwidth(1_000_000, LanLayer::EthernetL2);
    assert!(approx(model.pps(), 1_000_000.0 / 8304.0));
    assert_eq!(model.bandwidth_at(LanLayer::EthernetL2), 1_000_000);
    assert_eq!(model.bandwidth_at(LanLayer::EthernetL1), 1_019_268);
    assert_eq!(model.bandwidth_at(LanLayer::Udp), 963_391);

    // 改包长时带宽保持不变，pps 随之变化
    model.set_pdu_size(500, LanLayer::Udp);
    assert_eq!(model.bandwidth_at(LanLayer::EthernetL2), 1_000_000);
    assert!(approx(model.pps(), 1_000_000.0 / (538.0 * 8.0)));
}

#[test]
fn measured_pps_converts_to_bandwidth() {
    let mut model = FlowRateModel::new();
    model.set_pdu_size(500, LanLayer::Udp);
    assert!(approx(model.pps_to_bandwidth(100.0, LanLayer::Udp), 400_000.0));
    assert!(approx(model.pps_to_bandwidth(100.0, LanLayer::EthernetL1), 446_400.0));
    assert_eq!(model.pps_to_bandwidth(0.0, LanLayer::Ip), 0.0);
}

#[test]
fn lan_layer_names_parse() {
    for layer in LanLayer::ALL {
        assert_eq!(layer.to_string().parse::<LanLayer>().expect("short name"), layer);
    }
    assert_eq!("l3".parse::<LanLayer>().expect("alias"), LanLayer::Ip);
    assert!("l7".parse::<LanLayer>().is_err());
}

#[test]
fn bandwidth_unit_scales() {
    assert_eq!(BandwidthUnit::default(), BandwidthUnit::Mbps);
    assert_eq!(BandwidthUnit::Kbps.from_unit(1.5), 1500.0);
    assert_eq!(BandwidthUnit::Mbps.to_unit(2_500_000.0), 2.5);
    assert_eq!(BandwidthUnit::Bps.to_unit(42.0), 42.0);
    assert_eq!("kbps".parse::<BandwidthUnit>().expect("unit"), BandwidthUnit::Kbps);
    assert_eq!(BandwidthUnit::Mbps.to_string(), "mbps");
}

#[test]
fn ip_sized_flow_at_100_kbps() {
    let mut model = FlowRateModel::new();
    model.set_pdu_size(1000, LanLayer::Ip);
    model.set_bandwidth(100_000, LanLayer::Ip);
    assert_eq!(model.udp_size(), 980);
    assert_eq!(model.pdu_size_at(LanLayer::Udp), 980);
    assert_eq!(model.pdu_size_at(LanLayer::EthernetL2), 1018);
    assert!(approx(model.pps(), 12.5));
}

#[test]
fn lan_overheads_compose_for_every_udp_size() {
    let mut model = FlowRateModel::new();
    for udp in MIN_UDP_SIZE..=MAX_UDP_SIZE {
        model.set_pdu_size(udp, LanLayer::Udp);
        assert_eq!(model.udp_size(), udp);
        assert_eq!(model.pdu_size_at(LanLayer::Ip), udp + 20);
        assert_eq!(model.pdu_size_at(LanLayer::EthernetL2NoCrc), udp + 34);
        assert_eq!(model.pdu_size_at(LanLayer::EthernetL2), udp + 38);
        assert_eq!(model.pdu_size_at(LanLayer::EthernetL1), udp + 58);

        // 在任一层给出同一个包的大小，结果一致
        for layer in LanLayer::ALL {
            let mut other = FlowRateModel::new();
            other.set_pdu_size(model.pdu_size_at(layer), layer);
            assert_eq!(other.udp_size(), udp, "{layer}");
        }
    }
}

#[test]
fn bandwidth_round_trips_at_every_layer() {
    let mut model = FlowRateModel::new();
    for udp in (MIN_UDP_SIZE..=MAX_UDP_SIZE).step_by(37) {
        model.set_pdu_size(udp, LanLayer::Udp);
        for layer in LanLayer::ALL {
            for bandwidth in [1_000, 64_000, 2_000_000, 1_000_000_000] {
                model.set_bandwidth(bandwidth, layer);
                assert_eq!(model.bandwidth_at(layer), bandwidth, "{layer} udp={udp}");
                let bits = f64::from(model.pdu_size_at(layer)) * 8.0;
                assert!(approx(model.pps() * bits, bandwidth as f64));
                assert!(approx(model.pps_to_bandwidth(model.pps(), layer), bandwidth as f64));
            }
        }
    }
}
