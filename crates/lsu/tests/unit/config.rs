//! Configuration tests: JSON deserialization and default layering.

use lsu_core::config::Config;

#[test]
fn full_config_round_trip() {
    let config: Config = serde_json::from_str(
        r#"{
            "proc": {
                "name": "big-core",
                "extra": { "load_queue_size": 72, "store_queue_size": 56 }
            },
            "lsu": { "lq_size": 0, "sq_size": 8, "assume_no_alias": true },
            "timing": { "load_latency": 5, "store_latency": 2 }
        }"#,
    )
    .unwrap();

    assert_eq!(config.proc.name, "big-core");
    let extra = config.proc.extra.unwrap();
    assert_eq!(extra.load_queue_size, 72);
    assert_eq!(extra.store_queue_size, 56);
    assert_eq!(config.lsu.sq_size, 8);
    assert!(config.lsu.assume_no_alias);
    assert_eq!(config.timing.load_latency, 5);
}

#[test]
fn missing_extra_info_deserializes_to_none() {
    let config: Config =
        serde_json::from_str(r#"{ "proc": { "name": "bare", "extra": null } }"#).unwrap();
    assert!(config.proc.extra.is_none());
}

#[test]
fn empty_object_is_all_defaults() {
    let config: Config = serde_json::from_str("{}").unwrap();
    assert_eq!(config.proc.name, "generic");
    assert_eq!(config.lsu.lq_size, 0);
    assert_eq!(config.timing.store_latency, 1);
}
