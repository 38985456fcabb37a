//! Saving, diffing and re-applying VLAN layouts.

mod common;

use pretty_assertions::assert_eq;

use common::{Fabric, Lab};
use switchscope::ConfigurationSnapshot;
use switchscope::switch::{DeviceMove, PortMove, SnapshotDevices};

/// Move ports behind the model's back, as someone at the console would.
fn rearrange(lab: &Lab) {
    let mut fabric = lab.fabric();
    for ports in fabric.vlans.values_mut() {
        ports.retain(|p| p != "1/1/3" && p != "1/1/5");
    }
    fabric.vlans["20"].push("1/1/3".to_string());
    fabric.vlans["1"].push("1/1/5".to_string());
}

#[tokio::test(start_paused = true)]
async fn test_save_and_reload() {
    let lab = Lab::new();
    let switch = lab.switch().await;
    let dir = tempfile::tempdir().unwrap();

    let path = switch.save_configuration(dir.path().join("configs"), None).unwrap();

    let name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("sw1_") && name.ends_with(".json"), "{name}");
    let saved = ConfigurationSnapshot::load(&path).unwrap();
    assert_eq!(saved, switch.snapshot());
    assert_eq!(saved.vlan("10").unwrap().ports, vec!["1/1/3", "1/1/4"]);
    match &saved.vlan("10").unwrap().devices {
        SnapshotDevices::Detailed(devices) => {
            assert_eq!(devices["cam-02"].ethernet_address.to_string(), "00:40:d0:12:00:04")
        }
        other => panic!("unexpected device list {other:?}"),
    }
    assert!(switch.diff(&saved).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_diff_after_console_changes() {
    let lab = Lab::new();
    let mut switch = lab.switch().await;
    let saved = switch.snapshot();

    rearrange(&lab);
    switch.update().await.unwrap();
    let diff = switch.diff(&saved);

    assert_eq!(
        diff.ports.into_iter().collect::<Vec<_>>(),
        vec![
            (
                "1/1/3".to_string(),
                PortMove {
                    past: "10".to_string(),
                    current: Some("20".to_string())
                }
            ),
            (
                "1/1/5".to_string(),
                PortMove {
                    past: "20".to_string(),
                    current: Some("1".to_string())
                }
            ),
        ]
    );
    assert_eq!(
        diff.devices["cam-01"],
        DeviceMove {
            past: "10".to_string(),
            current: Some("20".to_string())
        }
    );
    assert_eq!(
        diff.devices["ctl-01"],
        DeviceMove {
            past: "20".to_string(),
            current: Some("1".to_string())
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_diff_device_gone() {
    let lab = Lab::new();
    let mut switch = lab.switch().await;
    let saved = switch.snapshot();

    lab.fabric().macs.shift_remove("0040.d012.0004");
    switch.update().await.unwrap();
    let diff = switch.diff(&saved);

    assert!(diff.ports.is_empty());
    assert_eq!(diff.devices["cam-02"].current, None);
}

#[tokio::test(start_paused = true)]
async fn test_apply_restores_layout() {
    let lab = Lab::new();
    let mut switch = lab.switch().await;
    let dir = tempfile::tempdir().unwrap();
    let path = switch.save_configuration(dir.path(), Some("before.json")).unwrap();

    rearrange(&lab);
    switch.update().await.unwrap();
    let report = switch.apply_file(&path).await.unwrap();

    assert!(report.is_complete());
    assert_eq!(report.moves.len(), 2);
    assert!(report.moves.values().all(|m| m.is_success()));
    assert_eq!(lab.fabric().vlan_of("1/1/3"), Some("10"));
    assert_eq!(lab.fabric().vlan_of("1/1/5"), Some("20"));
    assert!(switch.diff_file(&path).unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_apply_reports_ports_that_stay() {
    let mut fabric = Fabric::lab();
    fabric.stuck.push("1/1/5".to_string());
    let lab = Lab::with_fabric(fabric);
    let mut switch = lab.switch().await;
    let saved = switch.snapshot();

    {
        let mut fabric = lab.fabric();
        fabric.vlans["20"].retain(|p| p != "1/1/5");
        fabric.vlans["1"].push("1/1/5".to_string());
    }
    switch.update().await.unwrap();
    let report = switch.apply(&saved).await.unwrap();

    assert!(!report.is_complete());
    assert_eq!(
        report.unmatched.keys().collect::<Vec<_>>(),
        vec!["1/1/5"]
    );
}

#[test]
fn test_missing_snapshot_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(ConfigurationSnapshot::load(dir.path().join("nope.json")).is_err());
}
