use super::*;
use tracing::warn;

/// Parse a sway-style config file
///
/// Lines that fail to parse are skipped with a warning; only a config that
/// is invalid as a whole is an error.
pub fn parse_config(content: &str) -> TetherResult<Config> {
    let mut config = Config::default();

    for (line_num, line) in content.lines().enumerate() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Err(e) = parse_line(&mut config, line) {
            warn!("Failed to parse config line {}: '{}': {}", line_num + 1, line, e);
        }
    }

    config.validate()?;
    Ok(config)
}

fn parse_line(config: &mut Config, line: &str) -> Result<(), Box<dyn std::error::Error>> {
    let line = if line.starts_with("set ") {
        line.to_string()
    } else {
        config.expand_variables(line)
    };
    let parts: Vec<&str> = line.split_whitespace().collect();
    let first_part = parts.first().ok_or("Empty command line")?;

    match *first_part {
        "set" => parse_set(config, &parts[1..])?,
        "min_size" => parse_min_size(config, &parts[1..])?,
        "max_parent_depth" => {
            let depth = parts.get(1).ok_or("max_parent_depth requires a value")?;
            config.max_parent_depth = depth
                .parse()
                .map_err(|_| format!("Invalid depth: {depth}"))?;
        }
        "popup_dismiss_passthrough" => {
            config.popup_dismiss_passthrough = parse_bool(parts.get(1).copied())?;
        }
        "activate_on_map" => {
            config.activate_on_map = parse_bool(parts.get(1).copied())?;
        }
        "seat" => {
            let name = parts.get(1).ok_or("seat requires a name")?;
            if !config.seats.iter().any(|s| s == name) {
                config.seats.push(name.to_string());
            }
        }
        "output" => parse_output(config, &parts[1..])?,
        other => {
            warn!("Ignoring unknown config command '{other}'");
        }
    }

    Ok(())
}

fn parse_set(config: &mut Config, parts: &[&str]) -> Result<(), Box<dyn std::error::Error>> {
    if parts.len() < 2 {
        return Err("set requires variable name and value".into());
    }

    let var_name = parts.first().ok_or("Missing variable name")?;
    let value = parts[1..].join(" ");

    // Remove leading $ from variable name if present
    let var_name = var_name.strip_prefix('$').unwrap_or(var_name);

    // Expand any variables in the value
    let expanded_value = config.expand_variables(&value);
    config
        .variables
        .insert(var_name.to_string(), expanded_value);

    Ok(())
}

/// Compatible with i3/sway: yes/no, true/false, on/off, enabled/disabled, 1/0
fn parse_bool(value: Option<&str>) -> Result<bool, Box<dyn std::error::Error>> {
    let value = value.ok_or("Missing boolean value")?;
    match value.to_lowercase().as_str() {
        "yes" | "true" | "on" | "enabled" | "1" => Ok(true),
        "no" | "false" | "off" | "disabled" | "0" => Ok(false),
        _ => Err(format!("Invalid boolean: {value}").into()),
    }
}

fn parse_min_size(config: &mut Config, parts: &[&str]) -> Result<(), Box<dyn std::error::Error>> {
    // Format: min_size <w> <h>
    let w_str = parts.first().ok_or("min_size requires width and height")?;
    let h_str = parts.get(1).ok_or("min_size requires width and height")?;
    let w: i32 = w_str.parse().map_err(|_| format!("Invalid width: {w_str}"))?;
    let h: i32 = h_str.parse().map_err(|_| format!("Invalid height: {h_str}"))?;
    if w < 1 || h < 1 {
        return Err(format!("min_size must be at least 1x1, got {w}x{h}").into());
    }
    config.min_size = Size::from((w, h));
    Ok(())
}

fn parse_output(config: &mut Config, parts: &[&str]) -> Result<(), Box<dyn std::error::Error>> {
    // Format: output <name> resolution <WxH> [position <x,y>] [scale <value>]
    // Note: parts[0] is the output name since we're called with &parts[1..]
    let output_name = parts.first().ok_or("Missing output name")?.to_string();
    let mut resolution = None;
    let mut position = (0, 0);
    let mut scale = 1.0;

    let mut i = 1; // Start at 1 since parts[0] is the output name
    while i < parts.len() {
        match parts[i] {
            "scale" if i + 1 < parts.len() => {
                let value: f64 = parts[i + 1]
                    .parse()
                    .map_err(|_| format!("Invalid scale value: {}", parts[i + 1]))?;
                if !(0.5..=4.0).contains(&value) {
                    return Err("Scale must be between 0.5 and 4.0".into());
                }
                scale = value;
                i += 2;
            }
            "resolution" if i + 1 < parts.len() => {
                let res_parts: Vec<&str> = parts[i + 1].split('x').collect();
                if res_parts.len() != 2 {
                    return Err(format!("Invalid resolution format: {}", parts[i + 1]).into());
                }
                let width: i32 = res_parts[0]
                    .parse()
                    .map_err(|_| format!("Invalid width: {}", res_parts[0]))?;
                let height: i32 = res_parts[1]
                    .parse()
                    .map_err(|_| format!("Invalid height: {}", res_parts[1]))?;
                if width < 1 || height < 1 {
                    return Err(format!("Invalid resolution: {width}x{height}").into());
                }
                resolution = Some((width, height));
                i += 2;
            }
            "position" if i + 1 < parts.len() => {
                let pos_parts: Vec<&str> = parts[i + 1].split(',').collect();
                if pos_parts.len() != 2 {
                    return Err(format!("Invalid position format: {}", parts[i + 1]).into());
                }
                let x: i32 = pos_parts[0]
                    .parse()
                    .map_err(|_| format!("Invalid x position: {}", pos_parts[0]))?;
                let y: i32 = pos_parts[1]
                    .parse()
                    .map_err(|_| format!("Invalid y position: {}", pos_parts[1]))?;
                position = (x, y);
                i += 2;
            }
            other => {
                return Err(format!("Unknown output option: {other}").into());
            }
        }
    }

    let resolution = resolution.ok_or("output requires a resolution")?;
    config.outputs.retain(|o| o.name != output_name);
    config.outputs.push(OutputConfig {
        name: output_name,
        resolution,
        position,
        scale,
    });
    Ok(())
}
