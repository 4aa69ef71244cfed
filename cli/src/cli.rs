use clap::{Args, Parser, Subcommand, ValueEnum};
use magtek_types::{ReportField, ReportFormat};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(about, version, author)]
pub struct Cli {
    /// Minimum log level to print out
    #[clap(long, value_enum, default_value = "warn")]
    pub log_level: LevelFilter,

    /// Only operate on the reader at this bus:address (for example 001:029)
    #[clap(long, value_parser = parse_location)]
    pub device: Option<(u8, u8)>,

    /// JSON file describing the reader's device family, detected from the product id if absent
    #[clap(long)]
    pub family: Option<PathBuf>,

    #[clap(subcommand)]
    pub mode: Mode,
}

#[derive(Subcommand, Debug)]
pub enum Mode {
    /// Report on attached readers
    Report(ReportArgs),

    /// Configure the reader's serial number
    Config(ConfigArgs),

    /// Reset attached readers
    Reset(ResetArgs),
}

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Fields to include in the report
    #[clap(long, value_enum, value_delimiter = ',', default_values_t = default_fields())]
    pub include: Vec<ReportField>,

    /// Output format of the report
    #[clap(long, value_enum, default_value = "csv")]
    pub format: ReportFormat,

    /// Write output without headings
    #[clap(long)]
    pub raw: bool,

    /// Only include the identifying fields in JSON and XML output
    #[clap(long)]
    pub minimal: bool,

    /// Write output to a file rather than stdout
    #[clap(long)]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
#[clap(group(clap::ArgGroup::new("action").required(true).args(["erase", "set", "copy"])))]
pub struct ConfigArgs {
    /// Erase the device serial number
    #[clap(long)]
    pub erase: bool,

    /// Set the device serial number
    #[clap(long, value_name = "SERIAL")]
    pub set: Option<String>,

    /// Copy the first N characters of the factory serial number to the device serial number
    #[clap(long, value_name = "N")]
    pub copy: Option<usize>,

    /// Only change the serial number if it's currently empty
    #[clap(long)]
    pub if_empty: bool,
}

#[derive(Args, Debug)]
#[clap(group(clap::ArgGroup::new("kind").required(true).args(["usb", "dev"])))]
pub struct ResetArgs {
    /// Perform a USB port reset
    #[clap(long)]
    pub usb: bool,

    /// Perform a vendor device reset
    #[clap(long)]
    pub dev: bool,
}

fn default_fields() -> Vec<ReportField> {
    vec![
        ReportField::HostName,
        ReportField::VendorId,
        ReportField::ProductId,
        ReportField::SoftwareId,
        ReportField::DeviceSerial,
    ]
}

fn parse_location(value: &str) -> Result<(u8, u8), String> {
    let (bus, address) = value
        .split_once(':')
        .ok_or_else(|| String::from("expected bus:address"))?;
    let bus = bus.parse().map_err(|e| format!("invalid bus number: {}", e))?;
    let address = address
        .parse()
        .map_err(|e| format!("invalid address: {}", e))?;
    Ok((bus, address))
}

#[repr(usize)]
#[derive(ValueEnum, Copy, Clone, Eq, PartialEq, Debug)]
pub enum LevelFilter {
    /// A level lower than all log levels.
    Off,
    /// Corresponds to the `Error` log level.
    Error,
    /// Corresponds to the `Warn` log level.
    Warn,
    /// Corresponds to the `Info` log level.
    Info,
    /// Corresponds to the `Debug` log level.
    Debug,
    /// Corresponds to the `Trace` log level.
    Trace,
}

impl From<LevelFilter> for log::LevelFilter {
    fn from(level: LevelFilter) -> Self {
        match level {
            LevelFilter::Off => log::LevelFilter::Off,
            LevelFilter::Error => log::LevelFilter::Error,
            LevelFilter::Warn => log::LevelFilter::Warn,
            LevelFilter::Info => log::LevelFilter::Info,
            LevelFilter::Debug => log::LevelFilter::Debug,
            LevelFilter::Trace => log::LevelFilter::Trace,
        }
    }
}
