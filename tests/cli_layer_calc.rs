use std::process::Command;

fn layer_lines(stdout: &str) -> Vec<&str> {
    stdout.lines().filter(|l| l.starts_with("layer ")).collect()
}

#[test]
fn layer_calc_prints_every_wan_layer() {
    let output = Command::new(env!("CARGO_BIN_EXE_layer_calc"))
        .args(["--wan", "ip,eth-l2,eth-l1", "--size", "1000"])
        .output()
        .expect("run layer_calc");
    assert!(output.status.success(), "{output:?}");

    let stdout = String::from_utf8_lossy(&output.stdout);
    let layers = layer_lines(&stdout);
    assert_eq!(layers.len(), 4, "{stdout}");
    assert!(layers[0].contains("UDP") && layers[0].contains("pdu=1000 sdu=992"));
    assert!(layers[1].contains("IP") && layers[1].contains("pdu=1020"));
    assert!(layers[2].contains("Eth L2") && layers[2].contains("pdu=1038"));
    assert!(layers[3].contains("Eth L1") && layers[3].contains("pdu=1058"));

    let lan: Vec<&str> = stdout.lines().filter(|l| l.starts_with("lan ")).collect();
    assert_eq!(lan.len(), 5, "{stdout}");
    assert!(lan[0].contains("L1") && lan[0].contains("pdu=1058"));
    assert!(lan[1].contains("L2") && lan[1].contains("bandwidth=1000000"));
}

#[test]
fn layer_calc_sizes_from_an_outer_layer() {
    let output = Command::new(env!("CARGO_BIN_EXE_layer_calc"))
        .args([
            "--wan",
            "ip,esp,ip,eth-l2",
            "--index",
            "4",
            "--size",
            "1518",
        ])
        .output()
        .expect("run layer_calc");
    assert!(output.status.success(), "{output:?}");

    let stdout = String::from_utf8_lossy(&output.stdout);
    let layers = layer_lines(&stdout);
    assert_eq!(layers.len(), 5, "{stdout}");
    assert!(layers[0].contains("pdu=1418"), "{stdout}");
    assert!(layers[2].contains("ESP") && layers[2].contains("pdu=1476"));
    assert!(layers[4].contains("pdu=1514"), "{stdout}");
}

#[test]
fn layer_calc_rejects_invalid_chains() {
    let output = Command::new(env!("CARGO_BIN_EXE_layer_calc"))
        .args(["--wan", "gre"])
        .output()
        .expect("run layer_calc");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("cannot directly encapsulate"));

    let output = Command::new(env!("CARGO_BIN_EXE_layer_calc"))
        .args(["--wan", "token-ring"])
        .output()
        .expect("run layer_calc");
    assert!(!output.status.success());
}
