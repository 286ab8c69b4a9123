// ── Interface counter sampling ──
//
// The only host lookup the daemon needs: the cumulative rx/tx byte counters
// of one interface. On Linux they come from /proc/net/dev.

use std::path::PathBuf;

use tracing::trace;

use crate::error::CoreError;
use crate::model::Sample;

/// Reads raw byte counters for a named interface.
pub trait Sampler: Send + Sync {
    fn counters(&self, interface: &str) -> Result<Sample, CoreError>;
}

/// `/proc/net/dev` reader.
#[derive(Debug, Clone)]
pub struct ProcNetDev {
    path: PathBuf,
}

impl ProcNetDev {
    pub const DEFAULT_PATH: &'static str = "/proc/net/dev";

    /// Read from a different file with the same layout (containers, tests).
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for ProcNetDev {
    fn default() -> Self {
        Self::with_path(Self::DEFAULT_PATH)
    }
}

impl Sampler for ProcNetDev {
    fn counters(&self, interface: &str) -> Result<Sample, CoreError> {
        let content =
            std::fs::read_to_string(&self.path).map_err(|source| CoreError::StatsUnavailable {
                path: self.path.display().to_string(),
                source,
            })?;
        let sample = parse_proc_net_dev(&content, interface)?;
        trace!(interface, rx = sample.received, tx = sample.transmitted, "sampled counters");
        Ok(sample)
    }
}

/// Extract the counters for `interface` from `/proc/net/dev` content.
///
/// Layout after the two header lines:
///
/// ```text
///   eth0: 1234 12 0 0 0 0 0 0  5678 34 0 0 0 0 0 0
/// ```
///
/// Receive bytes is the first field after the colon, transmit bytes the
/// ninth. Large counters can abut the colon (`eth0:123...`), so the name is
/// split on `:` rather than on whitespace. Names must match exactly.
pub fn parse_proc_net_dev(content: &str, interface: &str) -> Result<Sample, CoreError> {
    for line in content.lines() {
        let Some((name, fields)) = line.split_once(':') else {
            continue;
        };
        if name.trim() != interface {
            continue;
        }

        let fields: Vec<&str> = fields.split_whitespace().collect();
        let field = |idx: usize, label: &str| -> Result<u64, CoreError> {
            let raw = fields.get(idx).ok_or_else(|| CoreError::MalformedCounters {
                interface: interface.to_owned(),
                reason: format!("missing {label} field"),
            })?;
            raw.parse().map_err(|e| CoreError::MalformedCounters {
                interface: interface.to_owned(),
                reason: format!("{label} field {raw:?}: {e}"),
            })
        };

        return Ok(Sample {
            received: field(0, "receive bytes")?,
            transmitted: field(8, "transmit bytes")?,
        });
    }

    Err(CoreError::InterfaceNotFound {
        interface: interface.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::io::Write;

    use super::{ProcNetDev, Sampler, parse_proc_net_dev};
    use crate::error::CoreError;
    use crate::model::Sample;

    const PROC_NET_DEV: &str = "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo: 2776770   11307    0    0    0     0          0         0  2776770   11307    0    0    0     0       0          0
 veth0:      10       1    0    0    0     0          0         0       20       2    0    0    0     0       0          0
  eth0: 987654321  123456    0    0    0     0          0         0 123456789   65432    0    0    0     0       0          0
wlan0:18446744073709551615 1 0 0 0 0 0 0 42 1 0 0 0 0 0 0
";

    #[test]
    fn parses_named_interface() {
        assert_eq!(
            parse_proc_net_dev(PROC_NET_DEV, "eth0").unwrap(),
            Sample {
                received: 987_654_321,
                transmitted: 123_456_789,
            }
        );
    }

    #[test]
    fn name_match_is_exact() {
        // "eth0" is a suffix of "veth0" but must not match it, and vice versa.
        let veth = parse_proc_net_dev(PROC_NET_DEV, "veth0").unwrap();
        assert_eq!(veth.received, 10);
        assert!(matches!(
            parse_proc_net_dev(PROC_NET_DEV, "th0"),
            Err(CoreError::InterfaceNotFound { .. })
        ));
    }

    #[test]
    fn counter_abutting_colon() {
        let wlan = parse_proc_net_dev(PROC_NET_DEV, "wlan0").unwrap();
        assert_eq!(wlan.received, u64::MAX);
        assert_eq!(wlan.transmitted, 42);
    }

    #[test]
    fn missing_interface() {
        let err = parse_proc_net_dev(PROC_NET_DEV, "eth9").unwrap_err();
        assert!(matches!(
            err,
            CoreError::InterfaceNotFound { ref interface } if interface == "eth9"
        ));
    }

    #[test]
    fn truncated_line_is_malformed() {
        let err = parse_proc_net_dev("  eth0: 1 2 3\n", "eth0").unwrap_err();
        assert!(matches!(err, CoreError::MalformedCounters { .. }), "got {err:?}");
    }

    #[test]
    fn non_numeric_field_is_malformed() {
        let line = "  eth0: abc 0 0 0 0 0 0 0 1 0 0 0 0 0 0 0\n";
        let err = parse_proc_net_dev(line, "eth0").unwrap_err();
        assert!(err.to_string().contains("receive bytes"), "got {err}");
    }

    #[test]
    fn reads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(PROC_NET_DEV.as_bytes()).unwrap();

        let sample = ProcNetDev::with_path(file.path()).counters("lo").unwrap();
        assert_eq!(sample.received, 2_776_770);
    }

    #[test]
    fn unreadable_source() {
        let err = ProcNetDev::with_path("/nonexistent/netquota/net_dev")
            .counters("eth0")
            .unwrap_err();
        assert!(matches!(err, CoreError::StatsUnavailable { .. }));
        assert!(err.is_fatal_at_startup());
    }
}
