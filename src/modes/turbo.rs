//! TURBO mode: thin entry point over [`crate::coordinator`].

use crate::capability::CpuCapabilities;
use crate::coordinator;
use crate::error::Error;
use crate::stats::EngineStats;
use crate::topology::NumaTopology;

pub fn run(bytes: &[u8], caps: CpuCapabilities, topology: &NumaTopology, worker_count: usize) -> Result<Vec<u8>, Error> {
    let stats = EngineStats::default();
    coordinator::run(bytes, caps, topology, worker_count, &stats, None).map(|outcome| outcome.bytes)
}
