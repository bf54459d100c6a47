//! Benchmark diagnostic. Never affects correctness or
//! output; exists so callers (and the test suite) can observe throughput
//! without reaching for a separate `criterion` harness for this one entry
//! point. Discards the first iteration to avoid charging cold-cache warm-up
//! to the reported numbers.

use std::time::{Duration, Instant};

use crate::capability::CpuCapabilities;
use crate::modes::ProcessingMode;

#[derive(Debug, Clone, Copy)]
pub struct BenchmarkResult {
    pub iterations: usize,
    pub mean: Duration,
    pub min: Duration,
    pub max: Duration,
    pub throughput_mib_per_sec: f64,
    pub output_len: usize,
}

/// Runs `mode` over `input` `iterations` times (plus one discarded warm-up
/// pass) and reports timing statistics.
pub fn benchmark(input: &[u8], iterations: usize, mode: ProcessingMode, caps: CpuCapabilities) -> BenchmarkResult {
    let iterations = iterations.max(1);
    let topology = crate::topology::NumaTopology::synthetic();

    let run_once = |input: &[u8]| -> Vec<u8> {
        match mode {
            ProcessingMode::Eco => {
                let mut sink = crate::sink::VecSink::default();
                let _ = crate::modes::eco::run(input, &mut sink, caps, crate::modes::eco::DEFAULT_WINDOW);
                sink.0
            }
            ProcessingMode::Sport => crate::modes::sport::run(input, caps),
            ProcessingMode::Turbo => crate::modes::turbo::run(input, caps, &topology, num_cpus::get()).unwrap_or_default(),
        }
    };

    let warm_up_output = run_once(input);
    let _ = warm_up_output;

    let mut durations = Vec::with_capacity(iterations);
    let mut last_output_len = 0;
    for _ in 0..iterations {
        let start = Instant::now();
        let output = run_once(input);
        let elapsed = start.elapsed();
        last_output_len = output.len();
        durations.push(elapsed);
    }

    let total: Duration = durations.iter().sum();
    let mean = total / iterations as u32;
    let min = durations.iter().copied().min().unwrap_or_default();
    let max = durations.iter().copied().max().unwrap_or_default();

    let throughput_mib_per_sec = if mean.as_secs_f64() > 0.0 {
        (input.len() as f64 / (1024.0 * 1024.0)) / mean.as_secs_f64()
    } else {
        0.0
    };

    BenchmarkResult {
        iterations,
        mean,
        min,
        max,
        throughput_mib_per_sec,
        output_len: last_output_len,
    }
}
