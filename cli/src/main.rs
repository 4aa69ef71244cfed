use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{debug, error, info, warn};
use magtek_types::{DeviceInfo, ReportFormat};
use magtek_usb::device::{find_devices, LibUsbTransport};
use magtek_usb::{DeviceFamily, MagTek, UsbLocation};
use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};
use std::fs;
use sysinfo::System;

use crate::cli::{Cli, ConfigArgs, Mode, ReportArgs, ResetArgs};
use crate::report::Report;
use crate::settings::read_family;

mod cli;
mod report;
mod settings;

type Reader = MagTek<LibUsbTransport>;

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    CombinedLogger::init(vec![TermLogger::new(
        args.log_level.into(),
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )])
    .context("Could not configure the logger")?;

    let family = args.family.as_deref().map(read_family).transpose()?;

    let mut locations = find_devices();
    if let Some((bus, address)) = args.device {
        locations.retain(|l| l.bus_number() == bus && l.address() == address);
    }
    if locations.is_empty() {
        bail!("No MagTek readers found");
    }
    debug!("Found {} reader(s)", locations.len());

    let mut failed = 0;
    let mut output = String::new();
    let mut header_written = false;
    for location in &locations {
        let result = match &args.mode {
            Mode::Report(report) => run_report(*location, family.as_ref(), report, !header_written)
                .map(|rendered| {
                    output.push_str(&rendered);
                    header_written = true;
                }),
            Mode::Config(config) => run_config(*location, family.as_ref(), config),
            Mode::Reset(reset) => run_reset(*location, family.as_ref(), reset),
        };

        if let Err(e) = result {
            error!("Reader at {}: {:#}", location, e);
            failed += 1;
        }
    }

    if let Mode::Report(report) = &args.mode {
        match &report.file {
            Some(path) => fs::write(path, &output)
                .context(format!("Unable to write report to {}", path.to_string_lossy()))?,
            None => print!("{}", output),
        }
    }

    if failed > 0 {
        bail!("{} of {} reader(s) failed", failed, locations.len());
    }
    Ok(())
}

fn connect(location: UsbLocation, family: Option<&DeviceFamily>) -> Result<Reader> {
    let transport = LibUsbTransport::open(location).context("Unable to open reader")?;
    let reader = match family {
        Some(family) => MagTek::new(transport, family.clone()),
        None => MagTek::detect(transport),
    };
    reader.context("Unable to read device descriptors")
}

fn open(location: UsbLocation, family: Option<&DeviceFamily>) -> Result<Reader> {
    let mut reader = connect(location, family)?;
    let size = reader
        .negotiate()
        .context("Unable to negotiate a command buffer size")?;
    info!("Reader at {} uses a {} byte buffer", location, size);
    Ok(reader)
}

fn run_report(
    location: UsbLocation,
    family: Option<&DeviceFamily>,
    args: &ReportArgs,
    with_header: bool,
) -> Result<String> {
    let mut reader = connect(location, family)?;

    // Descriptor fields are still worth reporting when the command channel is unusable.
    if let Err(e) = reader.negotiate() {
        warn!("Reader at {}: {}", location, e);
    }

    let host_name = System::host_name().unwrap_or_default();
    let (info, errors) = reader.device_info(&host_name);
    for e in errors {
        warn!("Reader at {}: {}", location, e);
    }

    render_report(&info, args, with_header)
}

// A CSV report carries one header, ahead of the first reader that reported.
fn render_report(info: &DeviceInfo, args: &ReportArgs, with_header: bool) -> Result<String> {
    let raw = args.raw || (args.format == ReportFormat::Csv && !with_header);
    Report {
        info,
        fields: &args.include,
        raw,
        minimal: args.minimal,
    }
    .render(args.format)
}

fn run_config(location: UsbLocation, family: Option<&DeviceFamily>, args: &ConfigArgs) -> Result<()> {
    let mut reader = open(location, family)?;

    if args.if_empty {
        let current = reader
            .get_serial_number()
            .context("Unable to read the device serial number")?;
        if !current.is_empty() {
            info!("Reader at {} already has serial number {}, skipping", location, current);
            return Ok(());
        }
    }

    if args.erase {
        reader
            .erase_serial_number()
            .context("Unable to erase the device serial number")?;
    } else if let Some(serial) = &args.set {
        reader
            .set_serial_number(serial)
            .context("Unable to set the device serial number")?;
    } else if let Some(length) = args.copy {
        reader
            .copy_factory_serial_number(length)
            .context("Unable to copy the factory serial number")?;
    }

    let serial = reader
        .get_serial_number()
        .context("Unable to read back the device serial number")?;
    info!("Reader at {} now has serial number {:?}", location, serial);
    Ok(())
}

fn run_reset(location: UsbLocation, family: Option<&DeviceFamily>, args: &ResetArgs) -> Result<()> {
    if args.usb {
        let mut transport = LibUsbTransport::open(location).context("Unable to open reader")?;
        transport.usb_reset().context("Unable to reset the USB port")?;
    } else {
        let reader = open(location, family)?;
        reader.reset().context("Unable to reset the device")?;
    }

    info!("Reader at {} has been reset", location);
    Ok(())
}
