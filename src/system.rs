//! Host status sampling for the `/status` command.

use std::path::Path;

use sysinfo::{Disks, MINIMUM_CPU_UPDATE_INTERVAL, System};

/// Point-in-time view of the machine the bot runs on.
#[derive(Debug, Clone, PartialEq)]
pub struct HostStatus {
    pub hostname: String,
    pub uptime_secs: u64,

    /// Average usage over all cores, 0-100.
    pub cpu_percent: f32,

    pub memory_used: u64,
    pub memory_total: u64,

    /// Usage of the root filesystem (or the first disk when there is no `/`).
    pub disk_used: u64,
    pub disk_total: u64,

    /// 1, 5 and 15 minute load averages. Zero on platforms without them.
    pub load: [f64; 3],
}

impl HostStatus {
    /// Samples the host.
    ///
    /// Blocks for [`MINIMUM_CPU_UPDATE_INTERVAL`] so CPU usage can be measured;
    /// call it from a blocking task.
    #[must_use]
    pub fn collect() -> Self {
        let mut sys = System::new();
        sys.refresh_memory();
        sys.refresh_cpu_usage();
        std::thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL);
        sys.refresh_cpu_usage();

        let disks = Disks::new_with_refreshed_list();
        let root = disks
            .list()
            .iter()
            .find(|disk| disk.mount_point() == Path::new("/"))
            .or_else(|| disks.list().first());
        let (disk_used, disk_total) = root.map_or((0, 0), |disk| {
            let total = disk.total_space();
            (total.saturating_sub(disk.available_space()), total)
        });

        let load = System::load_average();

        Self {
            hostname: System::host_name().unwrap_or_else(|| "unknown".to_owned()),
            uptime_secs: System::uptime(),
            cpu_percent: sys.global_cpu_usage(),
            memory_used: sys.used_memory(),
            memory_total: sys.total_memory(),
            disk_used,
            disk_total,
            load: [load.one, load.five, load.fifteen],
        }
    }

    /// Renders the status as a chat message.
    pub fn render(&self) -> String {
        format!(
            "System status - {}\n\n\
             Host uptime: {}\n\
             CPU: {:.1}% used\n\
             Memory: {}\n\
             Disk: {}\n\
             Load: {:.2}, {:.2}, {:.2}",
            self.hostname,
            format_duration(self.uptime_secs),
            self.cpu_percent,
            usage(self.memory_used, self.memory_total),
            usage(self.disk_used, self.disk_total),
            self.load[0],
            self.load[1],
            self.load[2],
        )
    }
}

fn usage(used: u64, total: u64) -> String {
    if total == 0 {
        return "n/a".to_owned();
    }
    #[allow(clippy::cast_precision_loss)]
    let percent = used as f64 / total as f64 * 100.0;
    format!(
        "{percent:.1}% used ({} of {})",
        format_bytes(used),
        format_bytes(total)
    )
}

/// Formats a byte count with binary units.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

    let mut unit = 0;
    #[allow(clippy::cast_precision_loss)]
    let mut value = bytes as f64;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

/// Formats a duration in seconds to a human-readable string.
pub fn format_duration(secs: u64) -> String {
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else if secs < 86_400 {
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        if mins == 0 {
            format!("{hours}h")
        } else {
            format!("{hours}h {mins}m")
        }
    } else {
        let days = secs / 86_400;
        let hours = (secs % 86_400) / 3600;
        format!("{days}d {hours}h")
    }
}
