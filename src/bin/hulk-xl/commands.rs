use clap::ArgMatches;
use hulk_xl::config::XlConfig;
use hulk_xl::erasure::{format_disks, new_xl_objects, storage_info, SlotState};
use log::info;
use serde::Serialize;

fn values(m: &ArgMatches, name: &str) -> Vec<String> {
    m.values_of(name)
        .map(|values| values.map(str::to_owned).collect())
        .unwrap_or_default()
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Serialize)]
struct FormatOutput<'a> {
    volume_id: &'a str,
    disks: &'a [String],
}

pub async fn handle_format(m: &ArgMatches, config: &XlConfig) -> anyhow::Result<()> {
    let disks = values(m, "disk");
    let format = format_disks(&disks, config).await?;
    info!(
        "volume {} spans {} disks",
        format.volume_id(),
        format.members().len()
    );
    print_json(&FormatOutput {
        volume_id: format.volume_id(),
        disks: format.members(),
    })
}

#[derive(Serialize)]
struct InfoOutput<'a> {
    volume_id: &'a str,
    quorum: hulk_xl::erasure::Quorum,
    tolerated_write_faults: usize,
    has_read_quorum: bool,
    has_write_quorum: bool,
    total: String,
    free: String,
    storage: hulk_xl::erasure::StorageInfo,
}

pub async fn handle_info(m: &ArgMatches, config: &XlConfig) -> anyhow::Result<()> {
    let disks = values(m, "disk");
    let ignored = values(m, "ignore");
    let set = new_xl_objects(&disks, &ignored, config).await?;

    let storage = storage_info(&set).await;
    if !storage.is_usable() {
        anyhow::bail!("no disk of volume {} responded", set.volume_id());
    }
    for disk in storage.disks.iter().filter(|d| d.state == SlotState::Offline) {
        info!(
            "disk {} ({}) is offline: {}",
            disk.index,
            disk.endpoint,
            disk.error.as_deref().unwrap_or("unknown reason")
        );
    }
    print_json(&InfoOutput {
        volume_id: set.volume_id(),
        quorum: set.quorum(),
        tolerated_write_faults: set.quorum().tolerated_write_faults(),
        has_read_quorum: set.has_read_quorum(),
        has_write_quorum: set.has_write_quorum(),
        total: hulk_xl::utils::human_bytes(storage.total),
        free: hulk_xl::utils::human_bytes(storage.free),
        storage,
    })
}
