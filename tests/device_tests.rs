use serde_json::json;

use apk_controller::device::adb::Adb;
use apk_controller::device::uiautomator::{
    UiAutomatorDevice, attributes_from_info, first_residual_match, residual_matches, selector_for,
    with_instance,
};
use apk_controller::graph::screen_model::ElementSignature;

mod common;
use crate::common::element;

// ============================================================================
// Selector encoding
// ============================================================================

#[test]
fn selector_sets_mask_bits_for_each_field() {
    let signature = ElementSignature::text("Next").with("@resource-id", "org.torproject.android:id/next");
    let selector = selector_for(&signature);

    assert_eq!(selector["text"], "Next");
    assert_eq!(selector["resourceId"], "org.torproject.android:id/next");
    assert_eq!(selector["mask"], 0x01 | 0x20_0000);
    assert_eq!(selector["childOrSibling"], json!([]));
    assert_eq!(selector["childOrSiblingSelector"], json!([]));
}

#[test]
fn selector_types_boolean_and_numeric_fields() {
    let signature = ElementSignature::new()
        .with("checked", "True")
        .with("index", "2")
        .with("@class", "android.widget.Switch");
    let selector = selector_for(&signature);

    assert_eq!(selector["checked"], true);
    assert_eq!(selector["index"], 2);
    assert_eq!(selector["className"], "android.widget.Switch");
    assert_eq!(selector["mask"], 0x0800 | 0x80_0000 | 0x10);
}

#[test]
fn selector_drops_unsupported_attributes() {
    let signature = ElementSignature::text("OK").with("bounds", "[0,0][10,10]");
    let selector = selector_for(&signature);

    assert!(selector.get("bounds").is_none());
    assert_eq!(selector["mask"], 0x01);
}

// ============================================================================
// objInfo decoding
// ============================================================================

#[test]
fn object_info_uses_selector_names() {
    let info = json!({
        "text": "Connect",
        "contentDescription": "connect button",
        "resourceName": "org.torproject.android:id/connect",
        "className": "android.widget.Button",
        "enabled": true,
        "childCount": 0,
        "bounds": { "left": 0, "top": 0, "right": 10, "bottom": 10 }
    });
    let attributes = attributes_from_info(&info);

    assert_eq!(attributes.get("description").map(String::as_str), Some("connect button"));
    assert_eq!(
        attributes.get("resourceId").map(String::as_str),
        Some("org.torproject.android:id/connect")
    );
    assert_eq!(attributes.get("enabled").map(String::as_str), Some("true"));
    assert_eq!(attributes.get("childCount").map(String::as_str), Some("0"));
    assert!(!attributes.contains_key("bounds"));
    assert!(!attributes.contains_key("contentDescription"));
}

#[test]
fn object_info_that_is_not_an_object_is_empty() {
    assert!(attributes_from_info(&json!(null)).is_empty());
}

#[test]
fn residual_attributes_are_checked_against_object_info() {
    let signature = ElementSignature::text("OK").with("visibleBounds", "[0,0][10,10]");

    let same = element(&[("text", "whatever"), ("visibleBounds", "[0,0][10,10]")]);
    let other = element(&[("text", "OK"), ("visibleBounds", "[5,5][10,10]")]);

    assert!(residual_matches(&signature, &same), "selector fields are left to the server");
    assert!(!residual_matches(&signature, &other));
    assert!(residual_matches(&ElementSignature::text("OK"), &element(&[])));
}

// ============================================================================
// Endpoints and adb
// ============================================================================

#[test]
fn endpoint_points_at_forwarded_server() {
    let device = UiAutomatorDevice::new("127.0.0.1", 9008, None);
    assert_eq!(device.endpoint(), "http://127.0.0.1:9008/jsonrpc/0");
}

#[test]
fn adb_launch_uses_monkey_on_launcher_category() {
    let adb = Adb::new(None);
    assert_eq!(
        adb.launch_args("org.torproject.android"),
        vec![
            "shell",
            "monkey",
            "-p",
            "org.torproject.android",
            "-c",
            "android.intent.category.LAUNCHER",
            "1"
        ]
    );
}

#[test]
fn adb_targets_serial_when_given() {
    let adb = Adb::new(Some("emulator-5554"));
    assert_eq!(adb.shell_args(&["input", "keyevent", "4"])[..3], ["-s", "emulator-5554", "shell"]);
}

// ============================================================================
// Attributes the selector cannot carry
// ============================================================================

#[test]
fn non_numeric_index_is_left_to_the_residual_check() {
    let signature = ElementSignature::text("OK").with("index", "first");
    let selector = selector_for(&signature);

    assert!(selector.get("index").is_none());
    assert_eq!(selector["mask"], 0x01);
    assert!(!residual_matches(&signature, &element(&[("text", "OK"), ("index", "0")])));
    assert!(residual_matches(&signature, &element(&[("index", "first")])));
}

#[test]
fn instance_narrows_a_selector() {
    let selector = selector_for(&ElementSignature::text("OK"));
    let narrowed = with_instance(&selector, 2);

    assert_eq!(narrowed["instance"], 2);
    assert_eq!(narrowed["mask"], 0x01 | 0x0100_0000);
    assert_eq!(narrowed["text"], "OK");
    assert!(selector.get("instance").is_none());
}

#[test]
fn later_instance_can_satisfy_residual_attributes() {
    let signature = ElementSignature::text("Connect").with("visibleBounds", "[0,100][50,150]");
    let infos = [
        json!({ "text": "Connect", "visibleBounds": "[0,0][50,50]" }),
        json!({ "text": "Connect", "visibleBounds": "[0,100][50,150]" }),
        json!({ "text": "Connect", "visibleBounds": "[0,200][50,250]" }),
    ];
    let mut asked = Vec::new();

    let found = first_residual_match(&signature, infos.len() as u64, |instance| {
        asked.push(instance);
        Ok(infos[instance as usize].clone())
    })
    .unwrap();

    assert_eq!(
        found.and_then(|attributes| attributes.get("visibleBounds").cloned()),
        Some("[0,100][50,150]".to_string())
    );
    assert_eq!(asked, vec![0, 1]);
}

#[test]
fn no_instance_satisfying_residual_attributes_is_absent() {
    let signature = ElementSignature::text("Connect").with("visibleBounds", "[9,9][9,9]");
    let found = first_residual_match(&signature, 2, |_| Ok(json!({ "text": "Connect", "visibleBounds": "[0,0][1,1]" })))
        .unwrap();
    assert!(found.is_none());
    assert!(first_residual_match(&signature, 0, |_| unreachable!()).unwrap().is_none());
}
