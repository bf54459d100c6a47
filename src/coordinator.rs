//! TURBO mode: parallel chunking coordinator.
//!
//! ┌──────────┐   ┌────────────┐   ┌────────────┐   ┌────────────┐
//! │  Input   │ → │ Prefix scan│ → │ Work-steal │ → │  Stitch    │
//! │ (bytes)  │   │ (carry-in) │   │  workers   │   │  in order  │
//! └──────────┘   └────────────┘   └────────────┘   └────────────┘
//!
//! Chunks split on byte offsets only, never on token boundaries (workers
//! parse independently once they know their carry-in string/escape
//! state). Scheduling uses one `crossbeam_deque` injector plus one
//! worker/stealer pair per thread: each worker owns a local deque and
//! steals from the back of another worker's when its own runs dry. Rayon
//! supplies the OS thread pool and per-thread NUMA pinning; it is not asked
//! to do the chunk-level scheduling itself, since its default steal order
//! is LIFO and doesn't prefer the largest remaining victim the way the
//! scheduling below does.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_deque::{Injector, Steal, Stealer, Worker};

use crate::capability::CpuCapabilities;
use crate::error::Error;
use crate::minify_core;
use crate::scanner::{ESCAPE_BYTE, QUOTE_BYTE, StringCarry};
use crate::stats::EngineStats;
use crate::topology::NumaTopology;

/// BOM is tolerated and stripped from the head only, matching ECO/SPORT —
/// required so all three modes agree byte-for-byte on input invariant 1
/// (spec §8) when the input happens to carry one.
fn strip_bom(bytes: &[u8]) -> &[u8] {
    const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];
    if bytes.starts_with(&UTF8_BOM) {
        &bytes[3..]
    } else {
        bytes
    }
}

pub const MIN_CHUNK: usize = 64 * 1024;
pub const MAX_CHUNK: usize = 4 * 1024 * 1024;
const TARGET_CHUNKS_PER_WORKER: usize = 4;
const CANCEL_CHECK_INTERVAL: usize = 64 * 1024;

#[derive(Debug, Clone, Copy)]
pub struct ChunkRange {
    pub offset: usize,
    pub len: usize,
    pub carry_in: StringCarry,
}

/// Picks a chunk size between [`MIN_CHUNK`] and [`MAX_CHUNK`], targeting
/// at least [`TARGET_CHUNKS_PER_WORKER`] chunks per worker.
pub fn choose_chunk_size(input_len: usize, worker_count: usize) -> usize {
    let workers = worker_count.max(1);
    let target_chunks = workers * TARGET_CHUNKS_PER_WORKER;
    let ideal = input_len / target_chunks.max(1);
    ideal.clamp(MIN_CHUNK, MAX_CHUNK)
}

/// Below this size TURBO falls through to SPORT rather than paying thread
/// and chunking overhead for no benefit.
pub fn should_parallelize(input_len: usize) -> bool {
    input_len >= MIN_CHUNK * 2
}

/// Cheap left-to-right pass computing the string/escape carry-in for
/// every chunk boundary. Processes only the escape/quote bytes — it does
/// not run the full structural scan.
fn prefix_scan(bytes: &[u8], boundaries: &[usize]) -> Vec<StringCarry> {
    let mut carries = Vec::with_capacity(boundaries.len());
    let mut state = StringCarry::default();
    let mut next_boundary = 0;
    carries.push(state);

    for (i, &b) in bytes.iter().enumerate() {
        if next_boundary < boundaries.len() && i == boundaries[next_boundary] {
            carries.push(state);
            next_boundary += 1;
        }
        if state.escape_pending {
            state.escape_pending = false;
            continue;
        }
        if b == ESCAPE_BYTE {
            state.escape_pending = true;
            continue;
        }
        if b == QUOTE_BYTE {
            state.in_string = !state.in_string;
        }
    }
    while carries.len() <= boundaries.len() {
        carries.push(state);
    }
    carries
}

fn plan_chunks(bytes: &[u8], chunk_size: usize) -> Vec<ChunkRange> {
    let len = bytes.len();
    if len == 0 {
        return Vec::new();
    }
    let mut offsets = Vec::new();
    let mut offset = 0;
    while offset < len {
        offsets.push(offset);
        offset += chunk_size;
    }
    let carries = prefix_scan(bytes, &offsets[1..]);

    offsets
        .iter()
        .enumerate()
        .map(|(i, &offset)| {
            let end = (offset + chunk_size).min(len);
            ChunkRange {
                offset,
                len: end - offset,
                carry_in: carries[i],
            }
        })
        .collect()
}

/// A victim-aware work-stealing pool of chunk indices. Each thread gets
/// its own `Worker`; the shared `Injector` is where the coordinator
/// pushes the initial, round-robin-assigned work.
struct Schedule {
    injector: Injector<usize>,
    stealers: Vec<Stealer<usize>>,
}

fn pop_with_steal(local: &Worker<usize>, schedule: &Schedule, self_idx: usize) -> Option<usize> {
    if let Some(task) = local.pop() {
        return Some(task);
    }
    loop {
        match schedule.injector.steal_batch_and_pop(local) {
            Steal::Success(task) => return Some(task),
            Steal::Retry => continue,
            Steal::Empty => break,
        }
    }
    // "Work-guided": prefer the victim whose remaining deque is largest;
    // fall back to round-robin order if sizes are unavailable/tied.
    loop {
        let mut best: Option<(usize, usize)> = None;
        for (idx, stealer) in schedule.stealers.iter().enumerate() {
            if idx == self_idx {
                continue;
            }
            let len = stealer.len();
            if len == 0 {
                continue;
            }
            if best.map(|(_, best_len)| len > best_len).unwrap_or(true) {
                best = Some((idx, len));
            }
        }
        let Some((victim, _)) = best else {
            return None;
        };
        match schedule.stealers[victim].steal() {
            Steal::Success(task) => return Some(task),
            Steal::Retry => continue,
            Steal::Empty => return None,
        }
    }
}

pub struct TurboOutcome {
    pub bytes: Vec<u8>,
}

/// Runs the TURBO minifier: chunk, dispatch across a work-stealing pool
/// pinned to NUMA domains when available, and stitch outputs back
/// together in input order. Falls through to SPORT for small inputs.
pub fn run(
    bytes: &[u8],
    caps: CpuCapabilities,
    topology: &NumaTopology,
    worker_count: usize,
    stats: &EngineStats,
    deadline: Option<Duration>,
) -> Result<TurboOutcome, Error> {
    let bytes = strip_bom(bytes);
    if !should_parallelize(bytes.len()) {
        return Ok(TurboOutcome {
            bytes: crate::modes::sport::run(bytes, caps),
        });
    }

    let worker_count = worker_count.max(1);
    let chunk_size = choose_chunk_size(bytes.len(), worker_count);
    let chunks = plan_chunks(bytes, chunk_size);
    let n = chunks.len();

    let injector = Injector::new();
    let workers: Vec<Worker<usize>> = (0..worker_count).map(|_| Worker::new_fifo()).collect();
    let stealers: Vec<Stealer<usize>> = workers.iter().map(Worker::stealer).collect();
    for (i, _) in chunks.iter().enumerate() {
        injector.push(i);
    }
    let schedule = Arc::new(Schedule { injector, stealers });

    let outputs: Vec<std::sync::Mutex<Vec<u8>>> = (0..n).map(|_| std::sync::Mutex::new(Vec::new())).collect();
    let outputs = Arc::new(outputs);
    let cancelled = Arc::new(AtomicBool::new(false));
    let first_error: Arc<std::sync::Mutex<Option<Error>>> = Arc::new(std::sync::Mutex::new(None));
    let processed = Arc::new(AtomicUsize::new(0));

    let _watchdog = deadline.map(|d| spawn_watchdog(d, Arc::clone(&cancelled)));

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(worker_count)
        .build()
        .map_err(|e| Error::Resource(e.to_string()))?;

    pool.scope(|scope| {
        for (idx, local) in workers.into_iter().enumerate() {
            let schedule = Arc::clone(&schedule);
            let outputs = Arc::clone(&outputs);
            let cancelled = Arc::clone(&cancelled);
            let first_error = Arc::clone(&first_error);
            let processed = Arc::clone(&processed);
            let chunks = &chunks;
            let domain = topology.domain_for_worker(idx);
            let pin_to = domain.cpu_ids.first().copied();

            scope.spawn(move |_| {
                if let Some(cpu) = pin_to {
                    let _ = core_affinity::set_for_current(core_affinity::CoreId { id: cpu });
                }
                loop {
                    if cancelled.load(Ordering::Relaxed) {
                        break;
                    }
                    let Some(chunk_idx) = pop_with_steal(&local, &schedule, idx) else {
                        break;
                    };
                    let chunk = chunks[chunk_idx];
                    match process_chunk(bytes, chunk, caps) {
                        Ok(out) => {
                            *outputs[chunk_idx].lock().unwrap() = out;
                            processed.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(e) => {
                            cancelled.store(true, Ordering::Relaxed);
                            let mut slot = first_error.lock().unwrap();
                            if slot.is_none() {
                                *slot = Some(e);
                            }
                            break;
                        }
                    }
                }
            });
        }
    });

    if let Some(err) = first_error.lock().unwrap().take() {
        return Err(err);
    }
    if cancelled.load(Ordering::Relaxed) && processed.load(Ordering::Relaxed) < n {
        return Err(Error::Resource("turbo run cancelled before completion".into()));
    }

    let mut stitched = Vec::with_capacity(bytes.len());
    for out in outputs.iter() {
        stitched.extend_from_slice(&out.lock().unwrap());
    }
    stats.add_bytes(bytes.len() as u64, stitched.len() as u64);

    Ok(TurboOutcome { bytes: stitched })
}

fn process_chunk(bytes: &[u8], chunk: ChunkRange, caps: CpuCapabilities) -> Result<Vec<u8>, Error> {
    let span = &bytes[chunk.offset..chunk.offset + chunk.len];
    let mut out = Vec::with_capacity(chunk.len);
    let mut carry = chunk.carry_in;
    let mut pos = 0;
    while pos < span.len() {
        let end = (pos + CANCEL_CHECK_INTERVAL).min(span.len());
        carry = minify_core::strip_into(&span[pos..end], carry, caps, &mut out);
        pos = end;
    }
    Ok(out)
}

fn spawn_watchdog(deadline: Duration, cancelled: Arc<AtomicBool>) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        let started = Instant::now();
        while started.elapsed() < deadline {
            if cancelled.load(Ordering::Relaxed) {
                return;
            }
            std::thread::sleep(Duration::from_millis(5).min(deadline));
        }
        cancelled.store(true, Ordering::Relaxed);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::CpuCapabilities;
    use crate::topology::NumaTopology;

    fn make_input(objects: usize) -> Vec<u8> {
        let mut s = String::from("[");
        for i in 0..objects {
            if i > 0 {
                s.push(',');
            }
            s.push_str(&format!(r#"{{ "id" : {i}, "name" : "item {i}" }}"#));
        }
        s.push(']');
        s.into_bytes()
    }

    #[test]
    fn chunk_size_is_clamped_and_scales_with_workers() {
        assert_eq!(choose_chunk_size(10, 4), MIN_CHUNK);
        assert_eq!(choose_chunk_size(1_000_000_000, 4), MAX_CHUNK);
    }

    #[test]
    fn small_input_is_not_parallelized() {
        assert!(!should_parallelize(100));
        assert!(should_parallelize(MIN_CHUNK * 3));
    }

    #[test]
    fn turbo_output_matches_sport_for_varied_worker_counts() {
        let input = make_input(20_000);
        let caps = CpuCapabilities::scalar();
        let topo = NumaTopology::synthetic();
        let stats = EngineStats::default();
        let expected = crate::modes::sport::run(&input, caps);

        for workers in [1, 2, 4, 8] {
            let out = run(&input, caps, &topo, workers, &stats, None).unwrap();
            assert_eq!(out.bytes, expected, "mismatch at {workers} workers");
        }
    }

    #[test]
    fn prefix_scan_tracks_string_state_across_boundaries() {
        let input = br#"{"a": "xxxxxxxxxx", "b": 2}"#;
        let boundaries = vec![5, 15];
        let carries = prefix_scan(input, &boundaries);
        assert_eq!(carries.len(), boundaries.len() + 1);
        assert!(carries[2].in_string);
    }

    #[test]
    fn strips_leading_bom_on_large_input_like_sport_does() {
        let mut input = vec![0xEF, 0xBB, 0xBF];
        input.extend_from_slice(&make_input(20_000));
        let caps = CpuCapabilities::scalar();
        let topo = NumaTopology::synthetic();
        let stats = EngineStats::default();
        let expected = crate::modes::sport::run(&input, caps);
        let out = run(&input, caps, &topo, 4, &stats, None).unwrap();
        assert_eq!(out.bytes, expected);
    }
}
