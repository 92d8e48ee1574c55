use crate::{BenchResult, compute_stats};
use srcembed_perf_recorder::{ALL_STAGES, PerfRecorder, PerfStage};

/// Convert recorder stage samples into BenchResults, skipping empty stages.
pub fn stage_results(prefix: &str, recorder: &PerfRecorder) -> Vec<BenchResult> {
    let mut out = Vec::new();
    for stage in ALL_STAGES {
        let mut samples: Vec<u64> = recorder.samples(stage).to_vec();
        if samples.is_empty() {
            continue;
        }
        out.push(BenchResult {
            name: format!("{prefix}/{}", stage.name()),
            unit: "ns".to_string(),
            stats: compute_stats(&mut samples),
        });
    }
    out
}

pub fn print_stage_table(recorder: &PerfRecorder, stages: &[PerfStage]) {
    println!(
        "  {:<22} {:>9} {:>9} {:>9} {:>9} {:>9}",
        "Stage", "p50", "p90", "p99", "max", "count"
    );
    println!("  {}", "\u{2500}".repeat(74));

    for &stage in stages {
        let samples = recorder.samples(stage);
        if samples.is_empty() {
            println!("  {:<22} {:>9}", stage.name(), "-");
            continue;
        }
        let stats = compute_stats(&mut samples.to_vec());
        println!(
            "  {:<22} {:>9} {:>9} {:>9} {:>9} {:>9}",
            stage.name(),
            stats.p50,
            stats.p90,
            stats.p99,
            stats.max,
            stats.count,
        );
    }
}
