//! Audio device listing.

use clap::Args;
use modsynth_io::list_devices;

#[derive(Args)]
pub struct DevicesArgs {}

pub fn run(_args: DevicesArgs) -> anyhow::Result<()> {
    let devices = list_devices()?;

    if devices.is_empty() {
        println!("No audio output devices found.");
        return Ok(());
    }

    println!("Output Devices");
    println!("==============\n");
    for device in &devices {
        let marker = if device.is_default { " (default)" } else { "" };
        println!(
            "  [{}] {} ({} Hz, {} ch){}",
            device.index, device.name, device.default_sample_rate, device.channels, marker
        );
    }
    println!();
    println!("Tip: Use device index or partial name with --device:");
    println!("  modsynth play patch.toml --device 0");

    Ok(())
}
