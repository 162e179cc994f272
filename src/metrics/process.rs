//! Standard `process_*` metrics computed at scrape time.

use std::sync::Arc;

use super::desc::{Desc, MetricKind, Opts};
use super::error::Result;
use super::registry::Collector;
use super::snapshot::{LabelSet, MetricFamily, Sample, SeriesValue};

/// Reports process start time, memory, thread and descriptor usage read from
/// `/proc` on Linux. Values that cannot be read are omitted from the scrape.
pub struct ProcessCollector {
    start_time_seconds: Option<f64>,
    start_time: Arc<Desc>,
    resident_memory: Arc<Desc>,
    virtual_memory: Arc<Desc>,
    threads: Arc<Desc>,
    open_fds: Arc<Desc>,
}

impl ProcessCollector {
    pub fn new() -> Result<Self> {
        let gauge = |name: &str, help: &str| -> Result<Arc<Desc>> {
            Ok(Arc::new(Desc::new(&Opts::new(name, help), MetricKind::Gauge, &[])?))
        };

        Ok(ProcessCollector {
            start_time_seconds: proc_stats::start_time_seconds(),
            start_time: gauge(
                "process_start_time_seconds",
                "Start time of the process since unix epoch in seconds.",
            )?,
            resident_memory: gauge(
                "process_resident_memory_bytes",
                "Resident memory size in bytes.",
            )?,
            virtual_memory: gauge(
                "process_virtual_memory_bytes",
                "Virtual memory size in bytes.",
            )?,
            threads: gauge("process_threads", "Number of OS threads in the process.")?,
            open_fds: gauge("process_open_fds", "Number of open file descriptors.")?,
        })
    }
}

fn family(desc: &Arc<Desc>, value: Option<f64>) -> MetricFamily {
    MetricFamily {
        desc: desc.clone(),
        samples: value
            .map(|v| Sample {
                labels: LabelSet::default(),
                value: SeriesValue::Gauge(v),
            })
            .into_iter()
            .collect(),
    }
}

impl Collector for ProcessCollector {
    fn descs(&self) -> Vec<Arc<Desc>> {
        vec![
            self.start_time.clone(),
            self.resident_memory.clone(),
            self.virtual_memory.clone(),
            self.threads.clone(),
            self.open_fds.clone(),
        ]
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let status = proc_stats::read_status();
        vec![
            family(&self.start_time, self.start_time_seconds),
            family(&self.resident_memory, status.as_ref().and_then(|s| s.resident_bytes)),
            family(&self.virtual_memory, status.as_ref().and_then(|s| s.virtual_bytes)),
            family(&self.threads, status.as_ref().and_then(|s| s.threads)),
            family(&self.open_fds, proc_stats::open_fds()),
        ]
    }
}

#[derive(Debug, Default, PartialEq)]
struct ProcStatus {
    resident_bytes: Option<f64>,
    virtual_bytes: Option<f64>,
    threads: Option<f64>,
}

/// Parses the fields we report out of `/proc/<pid>/status`.
fn parse_status(text: &str) -> ProcStatus {
    let kib = |rest: &str| -> Option<f64> {
        let amount = rest.split_whitespace().next()?.parse::<f64>().ok()?;
        Some(amount * 1024.0)
    };

    let mut status = ProcStatus::default();
    for line in text.lines() {
        let Some((key, rest)) = line.split_once(':') else {
            continue;
        };
        match key {
            "VmRSS" => status.resident_bytes = kib(rest),
            "VmSize" => status.virtual_bytes = kib(rest),
            "Threads" => status.threads = rest.trim().parse().ok(),
            _ => {}
        }
    }
    status
}

/// Kernel clock ticks per second as exposed in `/proc`; fixed at 100 on Linux
/// for user space regardless of the kernel's internal timer frequency.
const USER_HZ: f64 = 100.0;

/// Start time in seconds since the epoch, from `/proc/<pid>/stat` and the boot
/// time (`btime`) in `/proc/stat`.
fn parse_start_time(pid_stat: &str, system_stat: &str) -> Option<f64> {
    // The command name may contain spaces and parentheses; fields resume after the last ')'.
    let (_, rest) = pid_stat.rsplit_once(')')?;
    // `rest` starts at field 3 (state); starttime is field 22.
    let start_ticks = rest.split_whitespace().nth(19)?.parse::<f64>().ok()?;

    let boot_time = system_stat
        .lines()
        .find_map(|line| line.strip_prefix("btime "))?
        .trim()
        .parse::<f64>()
        .ok()?;

    Some(boot_time + start_ticks / USER_HZ)
}

#[cfg(target_os = "linux")]
mod proc_stats {
    use super::{parse_start_time, parse_status, ProcStatus};

    pub(super) fn start_time_seconds() -> Option<f64> {
        let pid_stat = std::fs::read_to_string("/proc/self/stat").ok()?;
        let system_stat = std::fs::read_to_string("/proc/stat").ok()?;
        parse_start_time(&pid_stat, &system_stat)
    }

    pub(super) fn read_status() -> Option<ProcStatus> {
        std::fs::read_to_string("/proc/self/status")
            .ok()
            .map(|text| parse_status(&text))
    }

    pub(super) fn open_fds() -> Option<f64> {
        let entries = std::fs::read_dir("/proc/self/fd").ok()?;
        Some(entries.count() as f64)
    }
}

#[cfg(not(target_os = "linux"))]
mod proc_stats {
    use super::ProcStatus;

    pub(super) fn start_time_seconds() -> Option<f64> {
        None
    }

    pub(super) fn read_status() -> Option<ProcStatus> {
        None
    }

    pub(super) fn open_fds() -> Option<f64> {
        None
    }
}
