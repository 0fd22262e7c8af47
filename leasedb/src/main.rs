use std::{collections::BTreeMap, fmt::Write as _};

use anyhow::{Context, Result, bail};
use range::{LeaseTable, PluginState, Record};
use tracing::{debug, info};

mod config;

use config::{
    cli::{self, Command, Format, Parser},
    trace,
};

fn main() -> Result<()> {
    // parses from cli or environment var
    let config = cli::Config::parse();
    let trace_config = trace::Config::parse(&config.leasedb_log, config.log_format)?;
    debug!(?config, ?trace_config);

    // registering creates the file, only `append` should do that
    if !matches!(config.command, Command::Append { .. }) && !config.path.exists() {
        bail!("no lease file at {}", config.path.display());
    }

    let state = PluginState::new();
    state
        .register_backing_db(&config.path)
        .with_context(|| format!("failed to open lease database {}", config.path.display()))?;

    match config.command {
        Command::Dump { format } => {
            let leases = load(&state)?;
            match format {
                Format::Table => print!("{}", render_table(&leases)),
                Format::Json => println!("{}", serde_json::to_string_pretty(&sorted(&leases))?),
            }
        }
        Command::Check => {
            let leases = load(&state)?;
            println!(
                "{} ok, {} leases",
                config.path.display(),
                leases.len()
            );
        }
        Command::Append {
            hw,
            ip,
            expires,
            hostname,
        } => {
            let record = Record::new(ip, expires, hostname)?;
            state
                .save_ip_address(hw, &record)
                .context("failed to append lease")?;
            info!(%hw, ip = %record.address, "lease appended");
        }
    }

    Ok(())
}

fn load(state: &PluginState) -> Result<LeaseTable> {
    state
        .load_records()
        .context("failed to replay lease database")
}

fn sorted(leases: &LeaseTable) -> BTreeMap<&str, &Record> {
    leases.iter().map(|(hw, r)| (hw.as_str(), r)).collect()
}

fn render_table(leases: &LeaseTable) -> String {
    let mut out = format!(
        "{:<17}  {:<15}  {:>12}  {}\n",
        "HWADDR", "ADDRESS", "EXPIRES", "HOSTNAME"
    );
    for (hw, record) in sorted(leases) {
        // writing to a String can't fail
        let _ = writeln!(
            out,
            "{:<17}  {:<15}  {:>12}  {}",
            hw,
            record.address.to_string(),
            record.expires,
            record.hostname
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use range::MacAddr;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn table_is_sorted_by_hwaddr() {
        let dir = tempdir().unwrap();
        let state = PluginState::new();
        state
            .register_backing_db(dir.path().join("leases.txt"))
            .unwrap();
        for (last, host) in [(2u8, "b"), (1, "a"), (2, "b2")] {
            let record = Record::new(Ipv4Addr::new(10, 0, 0, last), 60, host).unwrap();
            state
                .save_ip_address(MacAddr::new(2, 0, 0, 0, 0, last), &record)
                .unwrap();
        }

        let table = render_table(&load(&state).unwrap());
        let lines = table.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("HWADDR"));
        assert!(lines[1].starts_with("02:00:00:00:00:01"));
        assert!(lines[2].starts_with("02:00:00:00:00:02"));
        assert!(lines[2].ends_with("b2"));
    }

    #[test]
    fn json_dump_shape() {
        let mut leases = LeaseTable::new();
        leases.insert(
            "02:00:00:00:00:01".to_owned(),
            Record::new(Ipv4Addr::new(10, 0, 0, 1), 60, "a").unwrap(),
        );
        let json = serde_json::to_value(sorted(&leases)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "02:00:00:00:00:01": { "address": "10.0.0.1", "expires": 60, "hostname": "a" }
            })
        );
    }
}
