// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn device(name: &str, id: &str) -> DeviceInfo {
    DeviceInfo {
        name: name.to_owned(),
        id: id.to_owned(),
        device_type: "jd".to_owned(),
        status: "ONLINE".to_owned(),
    }
}

#[test]
fn select_device_prefers_name_match() {
    let devices = vec![device("laptop", "1"), device("nas", "2")];
    let selected = select_device(&devices, Some("nas")).unwrap();
    assert_eq!(selected.id, "2");
}

#[test]
fn select_device_name_match_is_case_insensitive() {
    let devices = vec![device("laptop", "1"), device("NAS", "2")];
    let selected = select_device(&devices, Some("nas")).unwrap();
    assert_eq!(selected.id, "2");
}

#[test]
fn select_device_falls_back_to_first() {
    let devices = vec![device("laptop", "1"), device("nas", "2")];
    assert_eq!(select_device(&devices, Some("missing")).unwrap().id, "1");
    assert_eq!(select_device(&devices, None).unwrap().id, "1");
}

#[test]
fn select_device_empty_list() {
    assert!(select_device(&[], Some("nas")).is_none());
    assert!(select_device(&[], None).is_none());
}

#[test]
fn device_info_parses_vendor_shape() {
    let parsed: DeviceInfo = serde_json::from_str(
        r#"{"name": "jd-box", "id": "abc", "type": "jd", "status": "ONLINE"}"#,
    )
    .unwrap();
    assert_eq!(parsed.name, "jd-box");
    assert_eq!(parsed.device_type, "jd");
}

#[test]
fn device_info_defaults_missing_fields() {
    let parsed: DeviceInfo = serde_json::from_str(r#"{"id": "abc"}"#).unwrap();
    assert_eq!(parsed.name, "Unknown");
    assert_eq!(parsed.status, "OFFLINE");
}

#[test]
fn download_item_parses_camel_case() {
    let parsed: DownloadItem = serde_json::from_str(
        r#"{
            "name": "file.bin",
            "status": "Downloading",
            "bytesTotal": 1000,
            "bytesLoaded": 250,
            "speed": 512,
            "eta": 12,
            "enabled": true,
            "finished": false,
            "uuid": 42,
            "url": "https://example.com/file.bin"
        }"#,
    )
    .unwrap();
    assert_eq!(parsed.bytes_total, 1000);
    assert_eq!(parsed.bytes_loaded, 250);
    assert_eq!(parsed.uuid, 42);
}

#[test]
fn download_item_defaults_sparse_entries() {
    // The vendor omits fields per-link depending on the query flags.
    let parsed: DownloadItem = serde_json::from_str(r#"{"uuid": 7}"#).unwrap();
    assert_eq!(parsed.name, "Unknown");
    assert_eq!(parsed.status, "Unknown");
    assert!(parsed.enabled);
    assert_eq!(parsed.bytes_total, 0);
}

#[test]
fn grabber_item_parses_package_uuid() {
    let parsed: LinkGrabberItem = serde_json::from_str(
        r#"{"name": "file.bin", "uuid": 1, "packageUUID": 99, "bytesTotal": 10}"#,
    )
    .unwrap();
    assert_eq!(parsed.package_uuid, 99);
}
