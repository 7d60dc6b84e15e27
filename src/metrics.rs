//! point-in-time readings of the local machine.

use {
    std::{cmp::Ordering, time::Duration},
    sysinfo::{Components, Disks, Networks, ProcessesToUpdate, System},
};

/// a source of operating system metrics.
///
/// every method is synchronous and expected to return quickly.
pub trait MetricsSource {
    /// takes a new reading of the fast-changing metrics.
    fn refresh(&mut self);

    /// returns the vitals as of the last refresh.
    fn vitals(&self) -> Vitals;

    /// returns the cumulative network counters as of the last refresh.
    fn network_totals(&self) -> NetworkTotals;

    /// reads the process table, returning the `count` busiest processes, busiest first.
    fn top_processes(&mut self, count: usize) -> Vec<ProcessLoad>;
}

/// system vitals.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Vitals {
    /// cpu load, in `[0, 1]`.
    pub cpu: f64,
    /// memory usage, in `[0, 1]`.
    pub memory: f64,
    /// storage usage across all disks, in `[0, 1]`.
    pub storage: f64,
    /// cpu temperature in degrees celsius, if a sensor is available.
    pub temperature: Option<f64>,
    pub battery: String,
    /// processes seen in the last read of the process table.
    pub processes: usize,
    /// threads seen in the last read of the process table.
    pub threads: usize,
    pub os: String,
    pub uptime: String,
    pub fans: String,
}

/// bytes moved across every non-loopback interface since boot.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct NetworkTotals {
    pub received: u64,
    pub transmitted: u64,
}

/// a process and its share of the machine's cpu.
#[derive(Clone, Debug, PartialEq)]
pub struct ProcessLoad {
    pub name: String,
    /// cpu usage as a fraction of total machine capacity, in `[0, 1]`.
    pub cpu: f64,
}

/// metrics backed by [`sysinfo`].
pub struct SysinfoMetrics {
    system: System,
    disks: Disks,
    components: Components,
    networks: Networks,
    /// counts from the last read of the process table.
    processes: usize,
    threads: usize,
    /// readings that do not come from sysinfo, refreshed alongside it.
    battery: String,
    fans: String,
    os: String,
}

// === impl SysinfoMetrics ===

impl SysinfoMetrics {
    /// takes a first reading of every metric.
    ///
    /// cpu usage is a difference between two readings, so the cpu and process tables are
    /// read once here and the caller is held for sysinfo's minimum update interval.
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu_usage();
        system.refresh_memory();
        system.refresh_processes(ProcessesToUpdate::All, true);
        std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);

        Self {
            system,
            disks: Disks::new_with_refreshed_list(),
            components: Components::new_with_refreshed_list(),
            networks: Networks::new_with_refreshed_list(),
            processes: 0,
            threads: 0,
            battery: sysfs::battery(),
            fans: sysfs::fans(),
            os: System::long_os_version().unwrap_or_else(|| "Unknown".to_owned()),
        }
    }

    /// the hottest cpu sensor, falling back to the hottest sensor of any kind.
    fn temperature(&self) -> Option<f64> {
        const CPU_LABELS: [&str; 5] = ["cpu", "package", "core", "tctl", "tdie"];

        let hottest = |cpu_only: bool| {
            self.components
                .list()
                .iter()
                .filter(|component| {
                    let label = component.label().to_lowercase();
                    !cpu_only || CPU_LABELS.iter().any(|l| label.contains(l))
                })
                .filter_map(|component| component.temperature())
                .filter(|t| t.is_finite())
                .map(f64::from)
                .max_by(f64::total_cmp)
        };

        hottest(true).or_else(|| hottest(false))
    }

    fn storage(&self) -> f64 {
        let (used, total) = self
            .disks
            .list()
            .iter()
            .fold((0_u128, 0_u128), |(used, total), disk| {
                let size = u128::from(disk.total_space());
                let available = u128::from(disk.available_space());
                (used + size.saturating_sub(available), total + size)
            });

        fraction(used as f64, total as f64)
    }
}

impl Default for SysinfoMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsSource for SysinfoMetrics {
    fn refresh(&mut self) {
        let Self {
            system,
            disks,
            components,
            networks,
            battery,
            fans,
            ..
        } = self;

        system.refresh_cpu_usage();
        system.refresh_memory();
        disks.refresh(true);
        components.refresh(true);
        networks.refresh(true);
        *battery = sysfs::battery();
        *fans = sysfs::fans();
    }

    fn vitals(&self) -> Vitals {
        let system = &self.system;

        Vitals {
            cpu: (f64::from(system.global_cpu_usage()) / 100.0).clamp(0.0, 1.0),
            memory: fraction(system.used_memory() as f64, system.total_memory() as f64),
            storage: self.storage(),
            temperature: self.temperature(),
            battery: self.battery.clone(),
            processes: self.processes,
            threads: self.threads,
            os: self.os.clone(),
            uptime: format_uptime(Duration::from_secs(System::uptime())),
            fans: self.fans.clone(),
        }
    }

    fn network_totals(&self) -> NetworkTotals {
        self.networks
            .iter()
            .filter(|(name, _)| name.as_str() != "lo")
            .fold(NetworkTotals::default(), |totals, (_, data)| NetworkTotals {
                received: totals.received.saturating_add(data.total_received()),
                transmitted: totals.transmitted.saturating_add(data.total_transmitted()),
            })
    }

    fn top_processes(&mut self, count: usize) -> Vec<ProcessLoad> {
        let Self {
            system,
            processes,
            threads,
            ..
        } = self;

        system.refresh_processes(ProcessesToUpdate::All, true);

        let cpus = system.cpus().len().max(1) as f64;
        let mut loads = Vec::new();
        let (mut process_count, mut thread_count) = (0, 0);

        for process in system.processes().values() {
            if process.thread_kind().is_some() {
                continue;
            }

            process_count += 1;
            thread_count += process.tasks().map_or(1, |tasks| tasks.len().max(1));
            loads.push(ProcessLoad {
                name: process.name().to_string_lossy().into_owned(),
                cpu: (f64::from(process.cpu_usage()) / 100.0 / cpus).clamp(0.0, 1.0),
            });
        }

        *processes = process_count;
        *threads = thread_count;

        rank(loads, count)
    }
}

/// orders processes busiest first, ties broken by name, and keeps the first `count`.
pub fn rank(mut loads: Vec<ProcessLoad>, count: usize) -> Vec<ProcessLoad> {
    loads.sort_by(|a, b| match b.cpu.total_cmp(&a.cpu) {
        Ordering::Equal => a.name.cmp(&b.name),
        other => other,
    });
    loads.truncate(count);
    loads
}

/// formats an uptime, e.g. `3d 04h 12m`.
pub fn format_uptime(uptime: Duration) -> String {
    let minutes = uptime.as_secs() / 60;
    let (days, hours, minutes) = (minutes / (24 * 60), (minutes / 60) % 24, minutes % 60);

    format!("{days}d {hours:02}h {minutes:02}m")
}

fn fraction(part: f64, whole: f64) -> f64 {
    if whole <= 0.0 {
        return 0.0;
    }

    (part / whole).clamp(0.0, 1.0)
}

/// readings taken directly from `/sys`.
mod sysfs {
    const UNAVAILABLE: &str = "N/A";

    /// the charge and state of the first battery, e.g. `87% (Discharging)`.
    #[cfg(target_os = "linux")]
    pub fn battery() -> String {
        use std::fs;

        let Ok(supplies) = fs::read_dir("/sys/class/power_supply") else {
            return UNAVAILABLE.to_owned();
        };

        let mut batteries = supplies
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                fs::read_to_string(path.join("type")).is_ok_and(|kind| kind.trim() == "Battery")
            })
            .collect::<Vec<_>>();
        batteries.sort();

        let Some(battery) = batteries.first() else {
            return UNAVAILABLE.to_owned();
        };

        let read = |name: &str| fs::read_to_string(battery.join(name)).ok();
        match (read("capacity"), read("status")) {
            (Some(capacity), Some(status)) => {
                format!("{}% ({})", capacity.trim(), status.trim())
            }
            (Some(capacity), None) => format!("{}%", capacity.trim()),
            _ => UNAVAILABLE.to_owned(),
        }
    }

    /// the speed of every fan, e.g. `1200 RPM, 900 RPM`.
    #[cfg(target_os = "linux")]
    pub fn fans() -> String {
        use std::fs;

        let Ok(monitors) = fs::read_dir("/sys/class/hwmon") else {
            return UNAVAILABLE.to_owned();
        };

        let mut inputs = monitors
            .filter_map(Result::ok)
            .filter_map(|monitor| fs::read_dir(monitor.path()).ok())
            .flatten()
            .filter_map(Result::ok)
            .filter(|entry| {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                name.starts_with("fan") && name.ends_with("_input")
            })
            .map(|entry| entry.path())
            .collect::<Vec<_>>();
        inputs.sort();

        let speeds = inputs
            .iter()
            .filter_map(|path| fs::read_to_string(path).ok())
            .filter_map(|rpm| rpm.trim().parse::<u32>().ok())
            .map(|rpm| format!("{rpm} RPM"))
            .collect::<Vec<_>>();

        if speeds.is_empty() {
            UNAVAILABLE.to_owned()
        } else {
            speeds.join(", ")
        }
    }

    #[cfg(not(target_os = "linux"))]
    pub fn battery() -> String {
        UNAVAILABLE.to_owned()
    }

    #[cfg(not(target_os = "linux"))]
    pub fn fans() -> String {
        UNAVAILABLE.to_owned()
    }
}

/// a mock metrics source.
///
/// network counters advance by `step` on every refresh.
#[derive(Default)]
#[allow(dead_code, reason = "this is a testing utility.")]
pub struct MockMetrics {
    pub vitals: Vitals,
    pub totals: NetworkTotals,
    pub step: NetworkTotals,
    pub processes: Vec<ProcessLoad>,
    /// the number of times the process table has been read.
    pub process_reads: usize,
    /// the number of refreshes taken.
    pub refreshes: usize,
}

impl MetricsSource for MockMetrics {
    fn refresh(&mut self) {
        let Self {
            totals,
            step,
            refreshes,
            ..
        } = self;

        totals.received += step.received;
        totals.transmitted += step.transmitted;
        *refreshes += 1;
    }

    fn vitals(&self) -> Vitals {
        self.vitals.clone()
    }

    fn network_totals(&self) -> NetworkTotals {
        self.totals
    }

    fn top_processes(&mut self, count: usize) -> Vec<ProcessLoad> {
        self.process_reads += 1;
        rank(self.processes.clone(), count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(name: &str, cpu: f64) -> ProcessLoad {
        ProcessLoad {
            name: name.to_owned(),
            cpu,
        }
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn process_table_is_primed() {
        let metrics = SysinfoMetrics::new();
        let me = sysinfo::Pid::from_u32(std::process::id());
        assert!(metrics.system.process(me).is_some());
    }

    #[test]
    fn rank_busiest_first() {
        let ranked = rank(
            vec![
                load("idle", 0.0),
                load("cargo", 0.5),
                load("rustc", 0.9),
                load("shell", 0.1),
            ],
            3,
        );
        let names = ranked.iter().map(|p| p.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["rustc", "cargo", "shell"]);
    }

    #[test]
    fn rank_breaks_ties_by_name() {
        let ranked = rank(vec![load("b", 0.2), load("a", 0.2), load("c", 0.3)], 3);
        let names = ranked.iter().map(|p| p.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["c", "a", "b"]);
    }

    #[test]
    fn rank_fewer_than_count() {
        assert_eq!(rank(vec![load("only", 0.1)], 3).len(), 1);
        assert!(rank(Vec::new(), 3).is_empty());
    }

    #[test]
    fn uptime() {
        assert_eq!(format_uptime(Duration::from_secs(59)), "0d 00h 00m");
        assert_eq!(
            format_uptime(Duration::from_secs(3 * 86_400 + 4 * 3_600 + 12 * 60 + 30)),
            "3d 04h 12m"
        );
    }

    #[test]
    fn fractions() {
        assert_eq!(fraction(1.0, 4.0), 0.25);
        assert_eq!(fraction(5.0, 0.0), 0.0);
        assert_eq!(fraction(5.0, 4.0), 1.0);
    }

    #[test]
    fn mock_counters_advance() {
        let mut metrics = MockMetrics {
            step: NetworkTotals {
                received: 100,
                transmitted: 10,
            },
            ..MockMetrics::default()
        };
        metrics.refresh();
        metrics.refresh();
        assert_eq!(
            metrics.network_totals(),
            NetworkTotals {
                received: 200,
                transmitted: 20
            }
        );
    }
}
