//! Named string formats checked by [`CheckKind::Format`](crate::CheckKind::Format).

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveTime};
use regex::Regex;

static PATTERNS: LazyLock<FormatPatterns> = LazyLock::new(FormatPatterns::new);

struct FormatPatterns {
    email: Regex,
    url: Regex,
    uuid: Regex,
    base64: Regex,
    hostname: Regex,
    e164: Regex,
    cuid: Regex,
}

impl FormatPatterns {
    fn new() -> Self {
        Self {
            email: Regex::new(
                r"^[A-Za-z0-9_'+\-]+(?:\.[A-Za-z0-9_'+\-]+)*@(?:[A-Za-z0-9][A-Za-z0-9\-]*\.)+[A-Za-z]{2,}$",
            )
            .expect("static regex must compile"),
            url: Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://[^\s/?#]+[^\s]*$")
                .expect("static regex must compile"),
            uuid: Regex::new(
                r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$",
            )
            .expect("static regex must compile"),
            base64: Regex::new(
                r"^(?:[0-9A-Za-z+/]{4})*(?:[0-9A-Za-z+/]{2}==|[0-9A-Za-z+/]{3}=)?$",
            )
            .expect("static regex must compile"),
            hostname: Regex::new(
                r"^(?:[A-Za-z0-9](?:[A-Za-z0-9\-]{0,61}[A-Za-z0-9])?\.)*[A-Za-z0-9](?:[A-Za-z0-9\-]{0,61}[A-Za-z0-9])?$",
            )
            .expect("static regex must compile"),
            e164: Regex::new(r"^\+[1-9][0-9]{6,14}$").expect("static regex must compile"),
            cuid: Regex::new(r"^[cC][^\s\-]{8,}$").expect("static regex must compile"),
        }
    }
}

/// Well-known string formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringFormat {
    Email,
    Url,
    Uuid,
    Ipv4,
    Ipv6,
    Cidr,
    Base64,
    Hostname,
    IsoDate,
    IsoTime,
    IsoDatetime,
    E164,
    Cuid,
}

impl StringFormat {
    /// Name reported in the `format` property of `invalid_format` issues.
    pub fn name(self) -> &'static str {
        match self {
            StringFormat::Email => "email",
            StringFormat::Url => "url",
            StringFormat::Uuid => "uuid",
            StringFormat::Ipv4 => "ipv4",
            StringFormat::Ipv6 => "ipv6",
            StringFormat::Cidr => "cidr",
            StringFormat::Base64 => "base64",
            StringFormat::Hostname => "hostname",
            StringFormat::IsoDate => "date",
            StringFormat::IsoTime => "time",
            StringFormat::IsoDatetime => "datetime",
            StringFormat::E164 => "e164",
            StringFormat::Cuid => "cuid",
        }
    }

    pub fn matches(self, s: &str) -> bool {
        let patterns = &*PATTERNS;
        match self {
            StringFormat::Email => patterns.email.is_match(s),
            StringFormat::Url => patterns.url.is_match(s),
            StringFormat::Uuid => patterns.uuid.is_match(s),
            StringFormat::Ipv4 => s.parse::<Ipv4Addr>().is_ok(),
            StringFormat::Ipv6 => s.parse::<Ipv6Addr>().is_ok(),
            StringFormat::Cidr => is_cidr(s),
            StringFormat::Base64 => !s.is_empty() && patterns.base64.is_match(s),
            StringFormat::Hostname => s.len() <= 253 && patterns.hostname.is_match(s),
            StringFormat::IsoDate => NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok(),
            StringFormat::IsoTime => {
                NaiveTime::parse_from_str(s, "%H:%M:%S%.f").is_ok()
                    || NaiveTime::parse_from_str(s, "%H:%M").is_ok()
            }
            StringFormat::IsoDatetime => DateTime::parse_from_rfc3339(s).is_ok(),
            StringFormat::E164 => patterns.e164.is_match(s),
            StringFormat::Cuid => patterns.cuid.is_match(s),
        }
    }
}

impl fmt::Display for StringFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn is_cidr(s: &str) -> bool {
    let Some((addr, prefix)) = s.split_once('/') else {
        return false;
    };
    let Ok(prefix) = prefix.parse::<u8>() else {
        return false;
    };
    if addr.parse::<Ipv4Addr>().is_ok() {
        prefix <= 32
    } else if addr.parse::<Ipv6Addr>().is_ok() {
        prefix <= 128
    } else {
        false
    }
}
