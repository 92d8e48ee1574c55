pub mod report;

use srcembed_stream::{Sink, Source};
use std::io;
use std::time::Instant;

// ─── Statistics ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Stats {
    pub min: u64,
    pub max: u64,
    pub mean: f64,
    pub stddev: f64,
    pub p50: u64,
    pub p90: u64,
    pub p99: u64,
    pub p999: u64,
    pub count: usize,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct BenchResult {
    pub name: String,
    pub unit: String,
    pub stats: Stats,
}

pub fn compute_stats(samples: &mut [u64]) -> Stats {
    assert!(!samples.is_empty(), "cannot compute stats on empty samples");
    samples.sort_unstable();

    let count = samples.len();
    let sum: u64 = samples.iter().sum();
    let mean = sum as f64 / count as f64;
    let variance = samples
        .iter()
        .map(|&x| {
            let diff = x as f64 - mean;
            diff * diff
        })
        .sum::<f64>()
        / count as f64;

    Stats {
        min: samples[0],
        max: samples[count - 1],
        mean,
        stddev: variance.sqrt(),
        p50: percentile_sorted(samples, 50.0),
        p90: percentile_sorted(samples, 90.0),
        p99: percentile_sorted(samples, 99.0),
        p999: percentile_sorted(samples, 99.9),
        count,
    }
}

fn percentile_sorted(sorted: &[u64], pct: f64) -> u64 {
    let len = sorted.len();
    if len == 1 {
        return sorted[0];
    }
    let rank = (pct / 100.0 * len as f64).ceil() as usize;
    let idx = rank.saturating_sub(1).min(len - 1);
    sorted[idx]
}

// ─── Measurement Harness ────────────────────────────────────────────────────

/// Times `runs` executions of `f` after `warmup` untimed ones. Samples are
/// nanoseconds per run.
pub fn measure_runs<F: FnMut()>(name: &str, runs: usize, warmup: usize, mut f: F) -> BenchResult {
    for _ in 0..warmup {
        f();
    }

    let mut samples = Vec::with_capacity(runs);
    for _ in 0..runs {
        let start = Instant::now();
        f();
        samples.push((start.elapsed().as_nanos() as u64).max(1));
    }

    BenchResult {
        name: name.to_string(),
        unit: "ns/run".to_string(),
        stats: compute_stats(&mut samples),
    }
}

/// Throughput in MiB/s for `bytes` moved in `ns` nanoseconds.
pub fn mib_per_sec(bytes: u64, ns: u64) -> f64 {
    if ns == 0 {
        return 0.0;
    }
    bytes as f64 / (1024.0 * 1024.0) / (ns as f64 / 1e9)
}

// ─── Host Info ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, serde::Serialize)]
pub struct HostInfo {
    pub cpu_brand: String,
    pub ncpu: u64,
    pub page_bytes: u64,
    pub huge_page_bytes: Option<u64>,
}

pub fn host_info() -> HostInfo {
    let ncpu = std::thread::available_parallelism()
        .map(|n| n.get() as u64)
        .unwrap_or(0);
    let page = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    HostInfo {
        cpu_brand: cpu_brand().unwrap_or_else(|| "unknown".into()),
        ncpu,
        page_bytes: page.max(0) as u64,
        huge_page_bytes: srcembed_sys::huge_page_size()
            .ok()
            .flatten()
            .map(|n| n as u64),
    }
}

fn cpu_brand() -> Option<String> {
    let text = std::fs::read_to_string("/proc/cpuinfo").ok()?;
    text.lines()
        .find(|l| l.starts_with("model name"))
        .and_then(|l| l.split_once(':'))
        .map(|(_, v)| v.trim().to_string())
}

// ─── Resource Usage ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, serde::Serialize)]
pub struct ResourceSnapshot {
    pub max_rss_bytes: i64,
    pub vol_ctx_switches: i64,
    pub invol_ctx_switches: i64,
    pub user_time_us: i64,
    pub sys_time_us: i64,
}

/// `who` is `RUSAGE_SELF` for the process or `RUSAGE_THREAD` for the caller.
pub fn capture_rusage(who: libc::c_int) -> ResourceSnapshot {
    let mut usage: libc::rusage = unsafe { std::mem::zeroed() };
    unsafe { libc::getrusage(who, &mut usage) };
    #[cfg(target_os = "linux")]
    let max_rss_bytes = usage.ru_maxrss * 1024;
    #[cfg(not(target_os = "linux"))]
    let max_rss_bytes = usage.ru_maxrss;
    ResourceSnapshot {
        max_rss_bytes,
        vol_ctx_switches: usage.ru_nvcsw,
        invol_ctx_switches: usage.ru_nivcsw,
        user_time_us: usage.ru_utime.tv_sec * 1_000_000 + usage.ru_utime.tv_usec as i64,
        sys_time_us: usage.ru_stime.tv_sec * 1_000_000 + usage.ru_stime.tv_usec as i64,
    }
}

// ─── Endpoints ──────────────────────────────────────────────────────────────

pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 + 7) as u8).collect()
}

/// Source replaying `block` until `total` bytes were served.
pub struct Replay {
    block: Vec<u8>,
    remaining: u64,
    pos: usize,
}

impl Replay {
    pub fn new(block: Vec<u8>, total: u64) -> Self {
        assert!(!block.is_empty());
        Self {
            block,
            remaining: total,
            pos: 0,
        }
    }
}

impl Source for Replay {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let avail = (self.block.len() - self.pos).min(buf.len());
        let n = (avail as u64).min(self.remaining) as usize;
        buf[..n].copy_from_slice(&self.block[self.pos..self.pos + n]);
        self.pos = (self.pos + n) % self.block.len();
        self.remaining -= n as u64;
        Ok(n)
    }
}

/// Sink that drops everything.
#[derive(Default)]
pub struct Discard;

impl Sink for Discard {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(std::hint::black_box(buf).len())
    }
}

// ─── Formatting ─────────────────────────────────────────────────────────────

pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;
    const GB: u64 = 1024 * 1024 * 1024;
    if bytes >= GB {
        format!("{:.1} GiB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MiB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KiB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

pub fn print_table_header() {
    println!(
        "  {:<34} {:>10} {:>10} {:>10} {:>10} {:>10}  unit",
        "Benchmark", "min", "p50", "p90", "p99", "max",
    );
    println!("  {}", "─".repeat(96));
}

pub fn print_result_row(r: &BenchResult) {
    println!(
        "  {:<34} {:>10} {:>10} {:>10} {:>10} {:>10}  {}",
        r.name, r.stats.min, r.stats.p50, r.stats.p90, r.stats.p99, r.stats.max, r.unit,
    );
}

pub fn section_header(title: &str) {
    println!("\n{}", "─".repeat(90));
    println!("  {title}");
    println!("{}\n", "─".repeat(90));
}
