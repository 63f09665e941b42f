use super::*;
use crate::config::parser::parse_config;

#[test]
fn test_defaults() {
    let config = parse_config("").unwrap();
    assert_eq!(config.min_size, Size::from((1, 1)));
    assert_eq!(config.max_parent_depth, 64);
    assert!(config.popup_dismiss_passthrough);
    assert!(config.activate_on_map);
    assert_eq!(config.seat_names(), vec!["seat0".to_string()]);
    assert!(config.outputs.is_empty());
}

#[test]
fn test_parse_full_config() {
    let config_str = r#"
# shell policy
set $width 1920
min_size 64 48
max_parent_depth 8
popup_dismiss_passthrough no
activate_on_map off
seat seat0
seat tablet
output DP-1 resolution 1920x1080 position 0,0
output HDMI-A-1 resolution 1280x1024 position $width,0 scale 1.5
"#;
    let config = parse_config(config_str).unwrap();
    assert_eq!(config.min_size, Size::from((64, 48)));
    assert_eq!(config.max_parent_depth, 8);
    assert!(!config.popup_dismiss_passthrough);
    assert!(!config.activate_on_map);
    assert_eq!(config.seat_names(), vec!["seat0".to_string(), "tablet".to_string()]);
    assert_eq!(config.outputs.len(), 2);
    assert_eq!(config.outputs[1].position, (1920, 0));
    assert_eq!(config.outputs[1].scale, 1.5);
}

#[test]
fn test_bad_lines_are_skipped() {
    let config_str = "min_size 0 0\nfrobnicate 3\npopup_dismiss_passthrough maybe\noutput X position 1,1";
    let config = parse_config(config_str).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_expand_variables_prefers_longest_name() {
    let mut config = Config::default();
    config.variables.insert("gap".into(), "1".into());
    config.variables.insert("gaps".into(), "2".into());
    assert_eq!(config.expand_variables("$gaps $gap"), "2 1");
}
