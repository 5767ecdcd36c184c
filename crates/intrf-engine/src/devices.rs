use anyhow::Result;
use cpal::traits::{DeviceTrait, HostTrait};
use log::warn;

#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub name: String,
    pub is_default_input: bool,
    pub is_default_output: bool,
    /// Channels of the default input config, if the device can capture.
    pub input_channels: Option<u16>,
    /// Channels of the default output config, if the device can play.
    pub output_channels: Option<u16>,
    pub sample_rate: Option<u32>,
}

pub fn list_devices() -> Result<Vec<DeviceInfo>> {
    let host = cpal::default_host();

    let default_in = host.default_input_device().and_then(|d| d.name().ok());
    let default_out = host.default_output_device().and_then(|d| d.name().ok());

    let devices = match host.devices() {
        Ok(devices) => devices,
        Err(err) => {
            warn!("cannot enumerate audio devices: {err}");
            return Ok(Vec::new());
        }
    };

    let mut out = Vec::new();
    for dev in devices {
        let name = dev.name().unwrap_or_else(|_| "<unknown>".to_string());
        let input = dev.default_input_config().ok();
        let output = dev.default_output_config().ok();
        let sample_rate = output
            .as_ref()
            .or(input.as_ref())
            .map(|c| c.sample_rate().0);
        out.push(DeviceInfo {
            is_default_input: default_in.as_deref() == Some(name.as_str()),
            is_default_output: default_out.as_deref() == Some(name.as_str()),
            input_channels: input.map(|c| c.channels()),
            output_channels: output.map(|c| c.channels()),
            sample_rate,
            name,
        });
    }
    Ok(out)
}

/// Pretty-print for CLI
pub fn print_devices() -> Result<()> {
    let list = list_devices()?;
    if list.is_empty() {
        println!("(no devices found)");
        return Ok(());
    }
    for (i, d) in list.iter().enumerate() {
        let mut marks = String::new();
        if d.is_default_input {
            marks.push_str("*I");
        }
        if d.is_default_output {
            if !marks.is_empty() {
                marks.push(' ');
            }
            marks.push_str("*O");
        }
        let io = format!(
            "in {} / out {}",
            d.input_channels.map_or("-".to_string(), |c| c.to_string()),
            d.output_channels.map_or("-".to_string(), |c| c.to_string()),
        );
        let sr = d.sample_rate.map_or(String::new(), |sr| format!(" @ {sr} Hz"));
        println!("{:>2}  {:<8} {}  ({io}{sr})", i, marks, d.name);
    }
    Ok(())
}
