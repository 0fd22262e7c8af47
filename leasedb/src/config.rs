//! leasedb configs

pub mod cli {
    //! Parse from either cli or env var

    /// default leases file path
    pub const DEFAULT_LEASE_PATH: &str = "/var/lib/dora/leases.txt";
    /// default log level. Can use this argument or LEASEDB_LOG env var
    pub const DEFAULT_LEASEDB_LOG: &str = "info";

    use std::{net::IpAddr, path::PathBuf};

    pub use clap::Parser;
    use clap::{Subcommand, ValueEnum};
    use range::MacAddr;

    use super::trace::LogFormat;

    #[derive(Parser, Debug, Clone, PartialEq, Eq)]
    #[command(author, name = "leasedb", bin_name = "leasedb", version, about, long_about = None)]
    /// inspect or append to a range plugin lease file
    pub struct Config {
        /// path to the lease file
        #[arg(short, long, env = "LEASEDB_PATH", default_value = DEFAULT_LEASE_PATH)]
        pub path: PathBuf,
        /// set the log level. All valid RUST_LOG arguments are accepted
        #[arg(long, env = "LEASEDB_LOG", default_value = DEFAULT_LEASEDB_LOG)]
        pub leasedb_log: String,
        /// log as "standard", "json" or "pretty"
        #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Standard)]
        pub log_format: LogFormat,
        #[command(subcommand)]
        pub command: Command,
    }

    #[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
    pub enum Command {
        /// replay the lease file and print the current lease for each client
        Dump {
            #[arg(short, long, value_enum, default_value_t = Format::Table)]
            format: Format,
        },
        /// replay the lease file, failing if any line is malformed
        Check,
        /// append a lease to the file
        Append {
            /// client hardware address, `:` or `-` separated
            #[arg(value_parser = range::parse_mac)]
            hw: MacAddr,
            ip: IpAddr,
            #[arg(allow_negative_numbers = true)]
            expires: i64,
            #[arg(default_value = "")]
            hostname: String,
        },
    }

    #[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Format {
        Table,
        Json,
    }
}

pub mod trace {
    //! tracing configuration
    use anyhow::Result;
    use clap::ValueEnum;
    use tracing_subscriber::{
        filter::EnvFilter,
        fmt::{
            self,
            format::{Format, PrettyFields},
        },
        prelude::__tracing_subscriber_SubscriberExt,
        util::SubscriberInitExt,
    };

    /// log formatting
    #[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub enum LogFormat {
        /// unstructured
        #[default]
        Standard,
        Json,
        Pretty,
    }

    /// Configuration for logging
    #[derive(Debug)]
    pub struct Config {
        /// formatting to apply to logs
        pub log_frmt: LogFormat,
    }

    impl Config {
        /// install the global subscriber. Logs go to stderr so they never mix
        /// with lease output on stdout
        pub fn parse(leasedb_log: &str, log_frmt: LogFormat) -> Result<Self> {
            let filter =
                EnvFilter::try_new(leasedb_log).or_else(|_| EnvFilter::try_new("info"))?;

            match log_frmt {
                LogFormat::Json => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(fmt::layer().json().with_writer(std::io::stderr))
                        .init();
                }
                LogFormat::Pretty => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(
                            fmt::layer()
                                .event_format(
                                    Format::default().pretty().with_source_location(false),
                                )
                                .fmt_fields(PrettyFields::new())
                                .with_writer(std::io::stderr),
                        )
                        .init();
                }
                LogFormat::Standard => {
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(fmt::layer().with_writer(std::io::stderr))
                        .init();
                }
            }

            Ok(Self { log_frmt })
        }
    }
}
