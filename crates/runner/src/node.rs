//! Node number derived from the host name
//!
//! Lets replicated pods/hosts generate distinct default sensor ids
//! (`<node>-<ccd>`) without per-host configuration.

use tracing::debug;

/// Node number of a host name
///
/// - trailing `-<digits>` → decimal (`xfer-12` → 12)
/// - trailing `-<5 alphanumerics>` → base 36 (pod hash suffixes)
/// - otherwise the first run of digits → decimal
/// - otherwise 0
pub fn node_number(hostname: &str) -> u64 {
    if let Some((_, suffix)) = hostname.rsplit_once('-') {
        if !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(n) = suffix.parse() {
                return n;
            }
        }
        if suffix.len() == 5 && suffix.bytes().all(|b| b.is_ascii_alphanumeric()) {
            if let Ok(n) = u64::from_str_radix(suffix, 36) {
                return n;
            }
        }
    }

    let digits: String = hostname
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}

/// Node number of the local host (0 when the name is unavailable)
pub fn local_node_number() -> u64 {
    let name = local_hostname().unwrap_or_default();
    let node = node_number(&name);
    debug!(hostname = %name, node, "Resolved node number");
    node
}

fn local_hostname() -> Option<String> {
    std::env::var("HOSTNAME")
        .ok()
        .or_else(|| std::fs::read_to_string("/proc/sys/kernel/hostname").ok())
        .or_else(|| std::fs::read_to_string("/etc/hostname").ok())
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
}
