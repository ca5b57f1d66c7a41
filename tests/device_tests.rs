use scenario_explorer::device::driver::{DeviceDriver, DeviceKey, Direction, Point};
use scenario_explorer::device::error::DeviceError;
use scenario_explorer::device::session::{BridgeCommand, DeviceRequest, DeviceResponse, DeviceSession};

// =========================================================================
// Wire format
// =========================================================================

#[test]
fn requests_are_tagged_by_command() {
    let json = serde_json::to_value(DeviceRequest::SwipeElement {
        xpath: "//list".into(),
        direction: Direction::Left,
    })
    .unwrap();
    assert_eq!(json["cmd"], "swipe_element");
    assert_eq!(json["xpath"], "//list");
    assert_eq!(json["direction"], "left");

    let json = serde_json::to_value(DeviceRequest::WindowSize).unwrap();
    assert_eq!(json, serde_json::json!({"cmd": "window_size"}));

    let json = serde_json::to_value(DeviceRequest::Press {
        key: DeviceKey::VolumeDown.as_str().into(),
    })
    .unwrap();
    assert_eq!(json["key"], "volume_down");
}

#[test]
fn responses_tolerate_missing_fields() {
    let response: DeviceResponse = serde_json::from_str(r#"{"ok": true}"#).unwrap();
    assert!(response.ok);
    assert!(response.hierarchy.is_none());
    assert!(response.count.is_none());

    let response: DeviceResponse =
        serde_json::from_str(r#"{"ok": false, "error": "boom", "kind": "invalid_locator"}"#)
            .unwrap();
    assert_eq!(response.kind.as_deref(), Some("invalid_locator"));
}

#[test]
fn direction_and_key_names() {
    assert_eq!("Up".parse::<Direction>().unwrap(), Direction::Up);
    assert!("north".parse::<Direction>().is_err());
    assert_eq!("recent".parse::<DeviceKey>().unwrap(), DeviceKey::Recent);
    assert!("Recent".parse::<DeviceKey>().is_err());
    assert_eq!(Point::new(3, 4).to_string(), "(3, 4)");
}

// =========================================================================
// Live session against a scripted bridge
// =========================================================================

#[cfg(unix)]
const FAKE_BRIDGE: &str = r#"
echo '{"ok":true,"ready":true}'
while read -r line; do
  case "$line" in
    *invalid*) echo '{"ok":false,"error":"bad expression","kind":"invalid_locator"}' ;;
    *missing*) echo '{"ok":false,"error":"not found","kind":"locator_not_found"}' ;;
    *'"cmd":"quit"'*) echo '{"ok":true}'; exit 0 ;;
    *dump_hierarchy*) echo '{"ok":true,"hierarchy":"<hierarchy rotation=\"0\"/>"}' ;;
    *count_matches*) echo '{"ok":true,"count":2}' ;;
    *window_size*) echo '{"ok":true,"width":1080,"height":2400}' ;;
    *) echo '{"ok":true}' ;;
  esac
done
"#;

#[cfg(unix)]
fn fake_bridge(script: &str) -> BridgeCommand {
    BridgeCommand {
        program: "sh".into(),
        args: vec!["-c".into(), script.into()],
        serial: None,
    }
}

#[cfg(unix)]
#[test]
fn session_round_trips_commands() {
    let mut session = DeviceSession::launch(&fake_bridge(FAKE_BRIDGE)).unwrap();

    assert_eq!(
        session.dump_hierarchy().unwrap(),
        r#"<hierarchy rotation="0"/>"#
    );
    assert_eq!(session.count_matches("//node").unwrap(), 2);
    assert_eq!(session.window_size().unwrap(), (1080, 2400));
    session.click("//node").unwrap();
    session.press(DeviceKey::Home).unwrap();

    session.stop().unwrap();
    session.stop().unwrap();
}

#[cfg(unix)]
#[test]
fn session_maps_bridge_error_kinds() {
    let mut session = DeviceSession::launch(&fake_bridge(FAKE_BRIDGE)).unwrap();

    match session.count_matches("//invalid[").unwrap_err() {
        DeviceError::InvalidLocator { locator, reason } => {
            assert_eq!(locator, "//invalid[");
            assert_eq!(reason, "bad expression");
        }
        other => panic!("expected InvalidLocator, got {:?}", other),
    }

    match session.click("//missing").unwrap_err() {
        DeviceError::LocatorNotFound(locator) => assert_eq!(locator, "//missing"),
        other => panic!("expected LocatorNotFound, got {:?}", other),
    }
}

#[cfg(unix)]
#[test]
fn bridge_that_never_gets_ready_fails_launch() {
    let err = DeviceSession::launch(&fake_bridge(r#"echo '{"ok":false,"error":"no device"}'"#))
        .err()
        .unwrap();
    assert!(matches!(err, DeviceError::Protocol { ref error, .. } if error == "no device"));
}

#[test]
fn missing_bridge_program_is_a_spawn_error() {
    let command = BridgeCommand {
        program: "definitely-not-a-real-bridge-binary".into(),
        args: Vec::new(),
        serial: None,
    };
    assert!(matches!(
        DeviceSession::launch(&command),
        Err(DeviceError::Spawn { .. })
    ));
}
