use std::hint::black_box;

use srcembed_format::{Dialect, emit_slice};
use srcembed_perf::report::{print_stage_table, stage_results};
use srcembed_perf::*;
use srcembed_perf_recorder::PerfStage;
use srcembed_stream::{InputStream, OutputStream, StreamConfig, WaitPolicy};

const PIPE_BYTES: u64 = 16 * 1024 * 1024;
const HALF_SIZES: [usize; 4] = [4 * 1024, 64 * 1024, 256 * 1024, 1024 * 1024];
const POLICIES: [(&str, WaitPolicy); 2] = [("spin", WaitPolicy::Spin), ("block", WaitPolicy::Block)];

#[cfg(target_os = "linux")]
const RUSAGE_CALLER: libc::c_int = libc::RUSAGE_THREAD;
#[cfg(not(target_os = "linux"))]
const RUSAGE_CALLER: libc::c_int = libc::RUSAGE_SELF;

/// Throughput row kept for the JSON summary.
#[derive(serde::Serialize)]
struct PipeRow {
    policy: &'static str,
    half_capacity: usize,
    p50_ns: u64,
    mib_per_sec: f64,
}

fn main() {
    let rusage_start = capture_rusage(libc::RUSAGE_SELF);
    let host = host_info();

    let mut results: Vec<BenchResult> = Vec::new();
    let mut pipe_rows: Vec<PipeRow> = Vec::new();

    print_banner(&host);
    section_pipe(&mut results, &mut pipe_rows);
    section_handoff_waits(&mut results);
    section_format(&mut results);

    let rusage_end = capture_rusage(libc::RUSAGE_SELF);
    section_resources(&rusage_start, &rusage_end);

    save_results(&host, &results, &pipe_rows, &rusage_start, &rusage_end);
}

/// Moves `PIPE_BYTES` from a replaying source to a discarding sink through
/// both streams, the way the binary copies stdin to stdout.
fn pipe(config: StreamConfig) -> (InputStream, OutputStream) {
    let mut input =
        InputStream::initialize(Replay::new(pattern(4096), PIPE_BYTES), config).expect("input");
    let mut output = OutputStream::initialize(Discard, config).expect("output");
    let mut buf = vec![0u8; 16 * 1024];
    loop {
        let n = input.read(&mut buf).expect("read");
        if n == 0 {
            break;
        }
        output.write(&buf[..n]).expect("write");
    }
    output.flush().expect("flush");
    (input, output)
}

fn print_banner(host: &HostInfo) {
    let bar = "\u{2550}".repeat(90);
    println!("\n{bar}");
    println!("  SRCEMBED STREAM PERFORMANCE REPORT");
    println!("  double-buffered pipe throughput, handoff waits, formatter");
    println!("{bar}\n");

    println!("  CPU:        {}  ({} cores)", host.cpu_brand, host.ncpu);
    println!("  Page:       {}", format_bytes(host.page_bytes));
    match host.huge_page_bytes {
        Some(n) => println!("  Huge page:  {}", format_bytes(n)),
        None => println!("  Huge page:  n/a"),
    }
    println!("  Pipe size:  {}", format_bytes(PIPE_BYTES));
}

fn section_pipe(results: &mut Vec<BenchResult>, rows: &mut Vec<PipeRow>) {
    section_header("PIPE THROUGHPUT  (source -> InputStream -> OutputStream -> sink)");
    print_table_header();

    for half in HALF_SIZES {
        for (label, wait) in POLICIES {
            let config = StreamConfig::new(half).with_wait(wait);
            let name = format!("pipe/{label}/{}", format_bytes(half as u64));
            let r = measure_runs(&name, 10, 2, || {
                let (input, output) = pipe(config);
                input.dispose();
                output.dispose().expect("dispose");
            });
            print_result_row(&r);
            rows.push(PipeRow {
                policy: label,
                half_capacity: half,
                p50_ns: r.stats.p50,
                mib_per_sec: mib_per_sec(PIPE_BYTES, r.stats.p50),
            });
            results.push(r);
        }
    }

    println!();
    for row in rows.iter() {
        println!(
            "  {:<6} {:>10}  {:>10.1} MiB/s",
            row.policy,
            format_bytes(row.half_capacity as u64),
            row.mib_per_sec
        );
    }
}

fn section_handoff_waits(results: &mut Vec<BenchResult>) {
    for (label, wait) in POLICIES {
        section_header(&format!("HANDOFF WAITS  ({label}, 64 KiB halves)"));
        let thread_start = capture_rusage(RUSAGE_CALLER);
        let (input, output) = pipe(StreamConfig::new(64 * 1024).with_wait(wait));
        let thread_end = capture_rusage(RUSAGE_CALLER);

        print_stage_table(
            input.recorder(),
            &[PerfStage::PrimingFill, PerfStage::InputHandoffWait],
        );
        println!();
        print_stage_table(
            output.recorder(),
            &[PerfStage::OutputHandoffWait, PerfStage::OutputFlush],
        );
        println!(
            "\n  caller thread ctx switches: {} voluntary, {} involuntary",
            thread_end.vol_ctx_switches - thread_start.vol_ctx_switches,
            thread_end.invol_ctx_switches - thread_start.invol_ctx_switches,
        );

        results.extend(stage_results(&format!("{label}/input"), input.recorder()));
        results.extend(stage_results(&format!("{label}/output"), output.recorder()));
        input.dispose();
        output.dispose().expect("dispose");
    }
}

fn section_format(results: &mut Vec<BenchResult>) {
    section_header("FORMATTER");
    print_table_header();

    let data = pattern(4 * 1024 * 1024);
    let mut out = Vec::with_capacity(5 * data.len() + 64);
    let r = measure_runs("format/decimal_table", 20, 3, || {
        out.clear();
        emit_slice(black_box(&data), &mut out, "data", Dialect::C).expect("format");
    });
    print_result_row(&r);
    println!(
        "\n  {:.1} MiB/s of input",
        mib_per_sec(data.len() as u64, r.stats.p50)
    );
    results.push(r);
}

fn section_resources(start: &ResourceSnapshot, end: &ResourceSnapshot) {
    section_header("RESOURCE USAGE");

    println!(
        "  Peak RSS:                    {}",
        format_bytes(end.max_rss_bytes as u64)
    );
    println!(
        "  Voluntary ctx switches:      {}",
        end.vol_ctx_switches.saturating_sub(start.vol_ctx_switches)
    );
    println!(
        "  Involuntary ctx switches:    {}",
        end.invol_ctx_switches.saturating_sub(start.invol_ctx_switches)
    );
    println!(
        "  User CPU time:               {:.3}s",
        end.user_time_us.saturating_sub(start.user_time_us) as f64 / 1e6
    );
    println!(
        "  System CPU time:             {:.3}s",
        end.sys_time_us.saturating_sub(start.sys_time_us) as f64 / 1e6
    );
}

fn save_results(
    host: &HostInfo,
    results: &[BenchResult],
    pipe_rows: &[PipeRow],
    rusage_start: &ResourceSnapshot,
    rusage_end: &ResourceSnapshot,
) {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let results_dir = concat!(env!("CARGO_MANIFEST_DIR"), "/results");
    let _ = std::fs::create_dir_all(results_dir);
    let json_path = format!("{results_dir}/{timestamp}_report.json");

    let output = serde_json::json!({
        "report_type": "stream",
        "timestamp": timestamp,
        "host": host,
        "pipe": pipe_rows,
        "benchmarks": results,
        "resources": {
            "start": rusage_start,
            "end": rusage_end,
        },
    });

    let bar = "\u{2550}".repeat(90);
    let written = serde_json::to_string_pretty(&output)
        .map_err(std::io::Error::other)
        .and_then(|text| std::fs::write(&json_path, text));
    match written {
        Ok(()) => {
            println!("\n{bar}");
            println!("  Results saved to: {json_path}");
            println!("{bar}\n");
        }
        Err(e) => eprintln!("\n  [failed to save results: {e}]\n"),
    }
}
