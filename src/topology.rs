//! NUMA topology probe.
//!
//! Consulted only by TURBO (§4.8); ECO and SPORT never look at this module.
//! On a system without NUMA exposure — or any platform `core_affinity`
//! can't introspect — it returns a single synthetic domain covering every
//! logical CPU, so the coordinator never has to special-case "no topology".

use once_cell::sync::OnceCell;

/// One affinity domain: a set of CPU ids plus a tag for the preferred
/// allocator/arena a worker pinned to this domain should draw from.
#[derive(Debug, Clone)]
pub struct Domain {
    pub id: usize,
    pub cpu_ids: Vec<usize>,
    pub preferred_allocator: AllocatorHint,
}

/// Which arena strategy a chunk's output buffer should be allocated from.
/// This is a hint consumed by the coordinator's per-worker arena, not a
/// real NUMA-aware allocator binding (no such crate is in the dependency
/// stack) — see DESIGN.md for the Open Question this resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocatorHint {
    DomainLocal(usize),
    Default,
}

#[derive(Debug, Clone)]
pub struct NumaTopology {
    pub domains: Vec<Domain>,
}

impl NumaTopology {
    pub fn synthetic() -> Self {
        let cpu_ids = core_affinity::get_core_ids()
            .map(|ids| ids.into_iter().map(|c| c.id).collect())
            .unwrap_or_else(|| (0..num_cpus::get()).collect());
        Self {
            domains: vec![Domain {
                id: 0,
                cpu_ids,
                preferred_allocator: AllocatorHint::Default,
            }],
        }
    }

    /// Total number of CPU ids advertised across all domains.
    pub fn cpu_count(&self) -> usize {
        self.domains.iter().map(|d| d.cpu_ids.len()).sum()
    }

    /// Round-robin assign worker slot `index` to a domain.
    pub fn domain_for_worker(&self, index: usize) -> &Domain {
        &self.domains[index % self.domains.len()]
    }
}

static TOPOLOGY: OnceCell<NumaTopology> = OnceCell::new();

/// Detect and cache the NUMA topology record. `core_affinity` does not
/// expose NUMA node boundaries directly on most platforms, so today this
/// always yields one domain spanning every core id it can enumerate; the
/// `Domain` abstraction is kept multi-entry so a platform-specific probe
/// (e.g. reading `/sys/devices/system/node/`) can be dropped in later
/// without touching any caller.
pub fn detect_numa() -> NumaTopology {
    TOPOLOGY.get_or_init(NumaTopology::synthetic).clone()
}
