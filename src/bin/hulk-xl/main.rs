use clap::{App, AppSettings, Arg};
use hulk_xl::config::XlConfig;
use hulk_xl::errors::{AsError, XlError};

mod commands;

use commands::*;

#[tokio::main]
async fn main() {
    let res = run().await;
    hulk_xl::logger::shutdown();
    if let Err(err) = res {
        eprintln!("hulk-xl: {:#}", err);
        // EX_TEMPFAIL: the same command may succeed once disks recover.
        let retryable = err.as_error::<XlError>().map_or(false, XlError::is_retryable);
        std::process::exit(if retryable { 75 } else { 1 });
    }
}

async fn run() -> anyhow::Result<()> {
    let disks_arg = || {
        Arg::new("disk")
            .value_name("DISK")
            .help("Disk paths of the erasure set, in slot order")
            .required(true)
            .takes_value(true)
            .multiple_values(true)
    };

    let matches = App::new("hulk-xl")
        .about("Format and inspect the disks of an erasure-coded volume")
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .help_template(
            "\
            {before-help}{bin} - {about}\n\
            {version}\n\n\
            {usage-heading}\n    {usage}\n\
            \n\
            {all-args}{after-help}\
        ",
        )
        .after_help(
            "ENVIRONMENT:\n    \
             HULK_STORAGE_CLASS_STANDARD    parity of the set, e.g. \"EC:4\" (default: half of the disks)\n    \
             HULK_DRIVE_PROBE_TIMEOUT       upper bound for a single disk call (default: 10s)\n    \
             HULK_LOG_LEVEL                 trace|debug|info|warning|error|critical (default: info)",
        )
        .subcommand(
            App::new("format")
                .about("Write fresh format metadata to every disk")
                .arg(disks_arg()),
        )
        .subcommand(
            App::new("info")
                .about("Build the erasure set and print its slots and capacity")
                .arg(disks_arg())
                .arg(
                    Arg::new("ignore")
                        .long("ignore")
                        .value_name("DISK")
                        .help("Keep a disk out of routing, may be repeated")
                        .takes_value(true)
                        .multiple_occurrences(true),
                ),
        )
        .get_matches();

    hulk_xl::logger::init()?;
    let config = XlConfig::from_env()?;

    match matches.subcommand() {
        Some(("format", m)) => handle_format(m, &config).await,
        Some(("info", m)) => handle_info(m, &config).await,
        _ => Ok(()),
    }
}
