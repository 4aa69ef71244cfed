use anyhow::{Context, Result};
use magtek_usb::DeviceFamily;
use std::fs::File;
use std::path::Path;

pub fn read_family(path: &Path) -> Result<DeviceFamily> {
    let reader = File::open(path).context(format!(
        "Could not open device family file for reading at {}",
        path.to_string_lossy()
    ))?;

    let family: DeviceFamily = serde_json::from_reader(reader).context(format!(
        "Could not parse device family file at {}",
        path.to_string_lossy()
    ))?;

    family.validate().context(format!(
        "Device family {} in {} cannot be used",
        family.name,
        path.to_string_lossy()
    ))?;
    Ok(family)
}
