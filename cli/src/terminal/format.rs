use colored::*;
use tadisc_common::device::Device;
use tadisc_common::network::mac;

use crate::terminal::colors;

/// Key/value rows describing one accessory, attributes in reported order.
pub fn device_to_details(device: &Device) -> Vec<(String, ColoredString)> {
    let mut details: Vec<(String, ColoredString)> = vec![(
        "IPv4".to_string(),
        device.address.to_string().color(colors::IPV4_ADDR),
    )];

    for (key, value) in device.attributes.iter() {
        let value: ColoredString = match key {
            "MAC" => value.color(colors::MAC_ADDR),
            _ => value.normal(),
        };
        details.push((key.to_string(), value));
    }

    if let Some(vendor) = device.mac().and_then(mac::get_vendor) {
        details.push(("Vendor".to_string(), vendor.normal()));
    }

    details
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
