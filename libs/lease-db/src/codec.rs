//! Line codec for the lease file.
//!
//! Each lease is stored as a single line:
//!
//! ```text
//! <mac>,<ipv4>,<expiry>,<hostname>\n
//! ```
//!
//! There is no escaping. A hostname containing `,` will not read back
//! intact: everything after its first comma is dropped on decode. A
//! hostname with `\n` or `\r` in it is rejected before anything is written.
use std::net::{IpAddr, Ipv4Addr};

use pnet::datalink::MacAddr;
use serde::Serialize;

use crate::error::{Field, LeaseDbError};

/// field separator within a lease line
pub const DELIMITER: char = ',';

/// `aa:bb:cc:dd:ee:ff`
const MAC_TEXT_LEN: usize = 17;

/// order fields appear in on a line
const FIELD_ORDER: [Field; 4] = [
    Field::HardwareAddress,
    Field::Address,
    Field::Expiry,
    Field::Hostname,
];

/// A single lease fact
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub address: Ipv4Addr,
    /// opaque to the lease db, the allocator decides what it counts
    pub expires: i64,
    pub hostname: String,
}

impl Record {
    /// Create a record, rejecting any address without a 4 byte form.
    /// IPv4-mapped v6 addresses are stored as plain IPv4.
    pub fn new(
        address: impl Into<IpAddr>,
        expires: i64,
        hostname: impl Into<String>,
    ) -> Result<Self, LeaseDbError> {
        let address = address.into();
        let address = to_ipv4(address)
            .ok_or_else(|| LeaseDbError::malformed(Field::Address, address.to_string()))?;
        let hostname = hostname.into();
        check_hostname(&hostname)?;
        Ok(Self {
            address,
            expires,
            hostname,
        })
    }
}

/// A hostname must fit on one line. `,` is let through unescaped.
pub fn check_hostname(hostname: &str) -> Result<(), LeaseDbError> {
    if hostname.contains(['\n', '\r']) {
        return Err(LeaseDbError::malformed(Field::Hostname, hostname));
    }
    Ok(())
}

fn to_ipv4(ip: IpAddr) -> Option<Ipv4Addr> {
    match ip {
        IpAddr::V4(ip) => Some(ip),
        IpAddr::V6(ip) => ip.to_ipv4_mapped(),
    }
}

/// Parse a hardware address, accepting six two-digit hex octets separated
/// uniformly by either `:` or `-`
pub fn parse_mac(s: &str) -> Result<MacAddr, LeaseDbError> {
    let malformed = || LeaseDbError::malformed(Field::HardwareAddress, s);
    let bytes = s.as_bytes();
    if bytes.len() != MAC_TEXT_LEN {
        return Err(malformed());
    }
    let sep = bytes[2];
    if sep != b':' && sep != b'-' {
        return Err(malformed());
    }
    let well_formed = bytes.iter().enumerate().all(|(i, b)| {
        if i % 3 == 2 {
            *b == sep
        } else {
            b.is_ascii_hexdigit()
        }
    });
    if !well_formed {
        return Err(malformed());
    }
    s.replace('-', ":").parse::<MacAddr>().map_err(|_| malformed())
}

/// Encode a lease as a line, including the trailing `\n`
pub fn encode(hw: MacAddr, record: &Record) -> String {
    // MacAddr displays as lowercase colon separated hex
    format!(
        "{hw},{},{},{}\n",
        record.address, record.expires, record.hostname
    )
}

/// Decode a single line (without its terminator)
pub fn decode(line: &str) -> Result<(MacAddr, Record), LeaseDbError> {
    let fields = line.split(DELIMITER).collect::<Vec<_>>();
    let [mac, ip, expiry, hostname, ..] = fields.as_slice() else {
        return Err(LeaseDbError::malformed(FIELD_ORDER[fields.len()], line));
    };
    let expires = expiry
        .parse::<i64>()
        .map_err(|_| LeaseDbError::malformed(Field::Expiry, *expiry))?;
    let hw = parse_mac(mac)?;
    let address = ip
        .parse::<IpAddr>()
        .ok()
        .and_then(to_ipv4)
        .ok_or_else(|| LeaseDbError::malformed(Field::Address, *ip))?;

    Ok((
        hw,
        Record {
            address,
            expires,
            hostname: hostname.to_string(),
        },
    ))
}

#[cfg(test)]
mod tests {
    use std::net::{Ipv4Addr, Ipv6Addr};

    use super::*;

    fn mac() -> MacAddr {
        MacAddr::new(0x00, 0x1b, 0x2c, 0x3d, 0x4e, 0x5f)
    }

    fn assert_malformed(res: Result<(MacAddr, Record), LeaseDbError>, want: Field, want_raw: &str) {
        match res {
            Err(LeaseDbError::MalformedRecord { field, raw }) => {
                assert_eq!(field, want);
                assert_eq!(raw, want_raw);
            }
            other => panic!("expected malformed {want}, got {other:?}"),
        }
    }

    #[test]
    fn encode_line_format() {
        let record = Record::new(Ipv4Addr::new(10, 0, 0, 12), 1700000000, "printer").unwrap();
        assert_eq!(
            encode(mac(), &record),
            "00:1b:2c:3d:4e:5f,10.0.0.12,1700000000,printer\n"
        );
    }

    #[test]
    fn decode_what_was_encoded() {
        let record = Record::new(Ipv4Addr::new(192, 168, 1, 100), -42, "").unwrap();
        let line = encode(mac(), &record);
        let (hw, decoded) = decode(line.trim_end_matches('\n')).unwrap();
        assert_eq!(hw, mac());
        assert_eq!(decoded, record);
    }

    #[test]
    fn decode_canonicalizes_mac() {
        let (hw, _) = decode("00-1B-2C-3D-4E-5F,10.0.0.1,5,host").unwrap();
        assert_eq!(hw, mac());
        assert_eq!(hw.to_string(), "00:1b:2c:3d:4e:5f");
    }

    #[test]
    fn decode_ipv4_mapped_address() {
        let (_, record) = decode("00:1b:2c:3d:4e:5f,::ffff:10.1.2.3,5,host").unwrap();
        assert_eq!(record.address, Ipv4Addr::new(10, 1, 2, 3));
    }

    #[test]
    fn decode_rejects_bad_expiry() {
        assert_malformed(
            decode("00:1b:2c:3d:4e:5f,10.0.0.1,soon,host"),
            Field::Expiry,
            "soon",
        );
    }

    #[test]
    fn decode_rejects_bad_mac() {
        for bad in [
            "00:1b:2c:3d:4e",
            "00:1b:2c:3d:4e:5g",
            "00:1b-2c:3d:4e:5f",
            "0:1b:2c:3d:4e:5f0",
            "001b.2c3d.4e5f...",
        ] {
            assert_malformed(
                decode(&format!("{bad},10.0.0.1,5,host")),
                Field::HardwareAddress,
                bad,
            );
        }
    }

    #[test]
    fn decode_rejects_ipv6() {
        assert_malformed(
            decode("00:1b:2c:3d:4e:5f,2001:db8::1,5,host"),
            Field::Address,
            "2001:db8::1",
        );
        assert_malformed(
            decode("00:1b:2c:3d:4e:5f,not-an-ip,5,host"),
            Field::Address,
            "not-an-ip",
        );
    }

    #[test]
    fn decode_rejects_missing_fields() {
        assert_malformed(
            decode("00:1b:2c:3d:4e:5f,10.0.0.1,5"),
            Field::Hostname,
            "00:1b:2c:3d:4e:5f,10.0.0.1,5",
        );
        assert_malformed(decode(""), Field::Address, "");
    }

    #[test]
    fn hostname_with_delimiter_is_garbled() {
        let record = Record::new(Ipv4Addr::new(10, 0, 0, 1), 5, "web,01").unwrap();
        let line = encode(mac(), &record);
        let (_, decoded) = decode(line.trim_end_matches('\n')).unwrap();
        assert_eq!(decoded.hostname, "web");
        assert_ne!(decoded, record);
    }

    #[test]
    fn record_rejects_line_breaks_in_hostname() {
        for bad in ["evil\nhost", "host\r", "a\r\nb"] {
            match Record::new(Ipv4Addr::new(10, 0, 0, 1), 5, bad) {
                Err(LeaseDbError::MalformedRecord { field, raw }) => {
                    assert_eq!(field, Field::Hostname);
                    assert_eq!(raw, bad);
                }
                other => panic!("expected malformed hostname, got {other:?}"),
            }
        }
        assert!(check_hostname("web,01").is_ok());
    }

    #[test]
    fn record_rejects_v6_address() {
        let err = Record::new(Ipv6Addr::LOCALHOST, 5, "host").unwrap_err();
        assert!(matches!(
            err,
            LeaseDbError::MalformedRecord {
                field: Field::Address,
                ..
            }
        ));
        let mapped = Record::new(Ipv4Addr::new(10, 0, 0, 9).to_ipv6_mapped(), 5, "host").unwrap();
        assert_eq!(mapped.address, Ipv4Addr::new(10, 0, 0, 9));
    }
}
