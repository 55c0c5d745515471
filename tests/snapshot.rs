mod common;

use axis_uart::{config_schema, Bridge, Config, StreamBeat};
use common::init_logger;

#[test]
fn restore_mid_frame() {
    init_logger();
    let config = Config {
        bus_width: 2,
        ..Config::default()
    };

    let mut bridge = Bridge::new(config.clone()).unwrap();
    for _ in 0..20 {
        bridge.tick_uart();
        bridge.tick_bus();
    }
    bridge.set_s_axis(Some(StreamBeat::new([0x12, 0x34]))).unwrap();
    bridge.tick_uart();
    assert!(bridge.tick_bus().accepted);
    bridge.set_s_axis(None).unwrap();
    for _ in 0..100 {
        bridge.tick_uart();
        bridge.tick_bus();
    }

    let state = bridge.save_state().unwrap();
    let mut restored = Bridge::new(config).unwrap();
    restored.load_state(&state).unwrap();

    for _ in 0..1000 {
        assert_eq!(bridge.tx(), restored.tx());
        assert_eq!(bridge.s_axis_tready(), restored.s_axis_tready());
        bridge.tick_uart();
        restored.tick_uart();
        bridge.tick_bus();
        restored.tick_bus();
    }
    assert_eq!(bridge.stats(), restored.stats());
    assert_eq!(restored.stats().frames_sent, 2);
}

#[test]
fn schema_lists_every_field() {
    let schema = serde_json::to_value(config_schema()).unwrap();
    let props = schema["properties"].as_object().unwrap();
    for field in [
        "bus_width",
        "data_bits",
        "stop_bits",
        "parity",
        "baud_clock_speed",
        "baud_rate",
        "reset_hold_cycles",
        "fifo_depth",
    ] {
        assert!(props.contains_key(field), "{field} missing");
    }
}

#[test]
fn config_round_trips_through_json() {
    let config = Config {
        bus_width: 4,
        stop_bits: 2,
        ..Config::default()
    };
    let json = serde_json::to_string(&config).unwrap();
    let back: Config = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);
    Bridge::new(back).unwrap();
}
