use crate::Error;
use crate::layer::{LayerChain, LayerKind};

fn lan_chain() -> LayerChain {
    LayerChain::from_kinds(&[
        LayerKind::Udp,
        LayerKind::Ip,
        LayerKind::EthernetL2,
        LayerKind::EthernetL1,
    ])
    .expect("valid chain")
}

/// 每层的 SDU 都等于内层的 PDU
fn assert_consistent(chain: &LayerChain) {
    for pair in chain.layers().windows(2) {
        assert_eq!(
            pair[1].sdu_size(),
            pair[0].pdu_size(),
            "{} / {}",
            pair[0].kind(),
            pair[1].kind()
        );
    }
    for layer in chain.layers() {
        assert!(layer.pdu_size() >= layer.kind().min_pdu());
        assert!(layer.pdu_size() <= layer.kind().max_pdu());
    }
}

#[test]
fn udp_size_propagates_outward_and_is_clamped_by_ip_mtu() {
    let mut chain = lan_chain();
    let sizes = chain.set_pdu_size_at(0, 1500).expect("index 0");
    assert_eq!(sizes, vec![1480, 1500, 1518, 1538]);
    assert_consistent(&chain);
}

#[test]
fn outermost_size_propagates_inward() {
    let mut chain = lan_chain();
    let sizes = chain.set_pdu_size_at(3, 1538).expect("index 3");
    assert_eq!(sizes, vec![1480, 1500, 1518, 1538]);

    let sizes = chain.set_pdu_size_at(2, 1000).expect("index 2");
    assert_eq!(sizes, vec![962, 982, 1000, 1020]);
    assert_consistent(&chain);
}

#[test]
fn minimum_ethernet_frame_pads_inner_layers() {
    let mut chain = lan_chain();
    let sizes = chain.set_pdu_size_at(0, 24).expect("index 0");
    assert_eq!(sizes, vec![26, 46, 64, 84]);
    assert_consistent(&chain);
}

#[test]
fn set_pdu_size_is_a_fixed_point() {
    let mut chain = lan_chain();
    for size in [0, 24, 100, 999, 1480, 5000] {
        let first = chain.set_pdu_size_at(0, size).expect("index 0");
        let again = chain.set_pdu_size_at(0, first[0]).expect("index 0");
        assert_eq!(first, again, "requested {size}");
    }
}

#[test]
fn append_rejects_layers_outside_the_sub_layer_table() {
    let mut chain = LayerChain::udp();
    let err = chain.append(LayerKind::Gre).expect_err("GRE cannot carry UDP directly");
    assert!(matches!(
        err,
        Error::InvalidChain {
            inner: LayerKind::Udp,
            outer: LayerKind::Gre
        }
    ));
    assert_eq!(chain.kinds(), vec![LayerKind::Udp]);

    chain.append(LayerKind::Ip).expect("IP carries UDP");
    chain.append(LayerKind::Gre).expect("GRE carries IP");
    chain.append(LayerKind::Ip).expect("IP carries GRE");
    assert_eq!(chain.len(), 4);
    assert_consistent(&chain);
}

#[test]
fn chain_must_start_with_udp() {
    let mut chain = LayerChain::new();
    assert!(chain.is_empty());
    let err = chain.append(LayerKind::Ip).expect_err("IP first");
    assert!(matches!(err, Error::ChainMustStartWithUdp(LayerKind::Ip)));
    assert!(chain.is_empty());
}

#[test]
fn replace_all_is_atomic() {
    let mut chain = lan_chain();
    let before = chain.clone();
    let err = chain
        .replace_all(&[LayerKind::Udp, LayerKind::Ip, LayerKind::EthernetL1])
        .expect_err("L1 cannot carry IP");
    assert!(matches!(err, Error::InvalidChain { .. }));
    assert_eq!(chain, before);

    chain
        .replace_all(&[LayerKind::Udp, LayerKind::Ip, LayerKind::EthernetL2NoCrc])
        .expect("valid");
    assert_eq!(
        chain.kinds(),
        vec![LayerKind::Udp, LayerKind::Ip, LayerKind::EthernetL2NoCrc]
    );
    assert_consistent(&chain);
}

#[test]
fn empty_replacement_keeps_the_chain() {
    let mut chain = lan_chain();
    let before = chain.clone();
    assert!(matches!(chain.replace_all(&[]), Err(Error::EmptyChain)));
    assert_eq!(chain, before);
    assert!(matches!(LayerChain::from_kinds(&[]), Err(Error::EmptyChain)));
}

#[test]
fn remove_outermost_keeps_udp() {
    let mut chain = lan_chain();
    chain.remove_outermost();
    assert_eq!(chain.outermost().map(|l| l.kind()), Some(LayerKind::EthernetL2));
    for _ in 0..5 {
        chain.remove_outermost();
    }
    assert_eq!(chain.kinds(), vec![LayerKind::Udp]);
}

#[test]
fn bad_index_is_reported() {
    let mut chain = lan_chain();
    let err = chain.set_pdu_size_at(4, 100).expect_err("out of range");
    assert!(matches!(err, Error::LayerIndex { index: 4, len: 4 }));
    let err = chain.set_show_stats(9, false).expect_err("out of range");
    assert!(matches!(err, Error::LayerIndex { index: 9, len: 4 }));

    chain.set_show_stats(0, false).expect("index 0");
    assert!(!chain.layers()[0].show_stats);
    assert!(chain.layers()[1].show_stats);
}

#[test]
fn layer_names_parse_back() {
    for kind in LayerKind::ALL {
        assert_eq!(LayerKind::from_short_name(kind.short_name()), Some(kind));
        assert_eq!(kind.to_string().parse::<LayerKind>().expect("short name"), kind);
    }
    assert_eq!("esp".parse::<LayerKind>().expect("alias"), LayerKind::EspAes256ShaTunnel);
    assert_eq!("ETH-L1".parse::<LayerKind>().expect("alias"), LayerKind::EthernetL1);
    assert!(matches!(
        "token-ring".parse::<LayerKind>(),
        Err(Error::UnknownLayer(_))
    ));
    assert_eq!(LayerKind::from_short_name("eth l1"), None);
}

#[test]
fn sub_layer_table() {
    assert_eq!(LayerKind::Udp.possible_sub_layers(), &[LayerKind::Ip]);
    assert!(LayerKind::EthernetL1.possible_sub_layers().is_empty());
    assert!(LayerKind::Ip.accepts_sub_layer(LayerKind::EspAes256ShaTunnel));
    assert!(LayerKind::EthernetL2NoCrc.accepts_sub_layer(LayerKind::EthernetCrc));
    assert!(LayerKind::EthernetCrc.accepts_sub_layer(LayerKind::EthernetL1));
    assert!(!LayerKind::Gre.accepts_sub_layer(LayerKind::EthernetL2));
}
