//! Static permission dependency graph
//!
//! Each flag lists only its direct prerequisites; the transitive prerequisite
//! closure, the reverse (dependent) closure, and the hierarchy level of every
//! flag are computed once at construction. Construction rejects cycles, so
//! every built graph is a DAG.

use std::sync::OnceLock;

use crate::error::{PermError, Result};
use crate::flags::{PermissionFlag, ALL_FLAGS, FLAG_COUNT};
use crate::set::PermissionSet;

/// Direct prerequisite edges for the scanning workflow:
/// Projects -> Scans -> Findings -> Reports.
const WORKFLOW_EDGES: [(PermissionFlag, &[PermissionFlag]); FLAG_COUNT] = {
    use PermissionFlag::*;
    [
        (ViewProjects, &[]),
        (CreateProject, &[ViewProjects]),
        (UpdateProject, &[CreateProject]),
        (DeleteProject, &[CreateProject]),
        (ViewScans, &[ViewProjects]),
        (CreateScan, &[ViewScans]),
        (UpdateScan, &[CreateScan]),
        (DeleteScan, &[CreateScan]),
        (ViewFindings, &[ViewScans]),
        (ValidateFinding, &[ViewFindings]),
        (DeleteFinding, &[ValidateFinding]),
        (ViewReports, &[ValidateFinding]),
        (CreateReport, &[ViewReports]),
        (UpdateReport, &[CreateReport]),
        (DeleteReport, &[CreateReport]),
    ]
};

/// Prerequisite relationships between permission flags, with precomputed
/// closures for cascade resolution
pub struct DependencyGraph {
    /// Direct prerequisites per flag
    direct: [u64; FLAG_COUNT],
    /// Transitive prerequisite closure per flag
    prereqs: [u64; FLAG_COUNT],
    /// Transitive dependent closure per flag (reverse index)
    dependents: [u64; FLAG_COUNT],
    /// Longest prerequisite chain per flag
    levels: [u8; FLAG_COUNT],
}

impl DependencyGraph {
    /// Build a graph from direct prerequisite edges.
    ///
    /// Fails on self-references and cycles.
    pub fn new(edges: &[(PermissionFlag, &[PermissionFlag])]) -> Result<Self> {
        let mut direct = [0u64; FLAG_COUNT];
        for (flag, prereqs) in edges {
            for p in *prereqs {
                if p == flag {
                    return Err(PermError(format!("{} cannot require itself", flag)));
                }
                direct[flag.index()] |= p.bit();
            }
        }

        // Prerequisite closure by depth-first reachability, rejecting cycles.
        let mut prereqs = [0u64; FLAG_COUNT];
        let mut state = [VisitState::Unvisited; FLAG_COUNT];
        for flag in ALL_FLAGS {
            close(flag, &direct, &mut prereqs, &mut state)?;
        }

        // Reverse index: d is a dependent of p iff p is in d's closure.
        let mut dependents = [0u64; FLAG_COUNT];
        for flag in ALL_FLAGS {
            for p in ALL_FLAGS {
                if prereqs[flag.index()] & p.bit() != 0 {
                    dependents[p.index()] |= flag.bit();
                }
            }
        }

        // Hierarchy level = longest prerequisite chain. Safe to recurse: the
        // closure pass above proved the graph acyclic.
        let mut levels = [0u8; FLAG_COUNT];
        let mut done = [false; FLAG_COUNT];
        for flag in ALL_FLAGS {
            level_of(flag, &direct, &mut levels, &mut done);
        }

        Ok(DependencyGraph { direct, prereqs, dependents, levels })
    }

    /// The built-in scanning workflow graph, constructed once per process
    pub fn workflow() -> &'static DependencyGraph {
        static GRAPH: OnceLock<DependencyGraph> = OnceLock::new();
        GRAPH.get_or_init(|| {
            DependencyGraph::new(&WORKFLOW_EDGES).expect("workflow edges form a DAG")
        })
    }

    /// Direct prerequisites of a flag, workflow order
    pub fn direct_prerequisites(&self, flag: PermissionFlag) -> Vec<PermissionFlag> {
        PermissionSet::from_mask(self.direct[flag.index()]).allowed()
    }

    /// All prerequisites of a flag (transitive), workflow order
    pub fn prerequisites(&self, flag: PermissionFlag) -> Vec<PermissionFlag> {
        PermissionSet::from_mask(self.prereqs[flag.index()]).allowed()
    }

    /// All flags that depend on this flag (transitive), workflow order
    pub fn dependents(&self, flag: PermissionFlag) -> Vec<PermissionFlag> {
        PermissionSet::from_mask(self.dependents[flag.index()]).allowed()
    }

    /// Transitive prerequisite closure as a mask
    #[inline]
    pub(crate) fn prerequisite_mask(&self, flag: PermissionFlag) -> u64 {
        self.prereqs[flag.index()]
    }

    /// Transitive dependent closure as a mask
    #[inline]
    pub(crate) fn dependent_mask(&self, flag: PermissionFlag) -> u64 {
        self.dependents[flag.index()]
    }

    /// Whether the flag has no prerequisites
    #[inline]
    pub fn is_root(&self, flag: PermissionFlag) -> bool {
        self.direct[flag.index()] == 0
    }

    /// Hierarchy level: length of the longest prerequisite chain
    #[inline]
    pub fn level(&self, flag: PermissionFlag) -> usize {
        self.levels[flag.index()] as usize
    }

    /// Whether every enabled flag has all of its prerequisites enabled
    pub fn satisfies(&self, set: PermissionSet) -> bool {
        self.check(set).is_ok()
    }

    /// Validate a set against the prerequisite invariant, naming the first
    /// violation found
    pub fn check(&self, set: PermissionSet) -> Result<()> {
        for flag in ALL_FLAGS {
            if !set.allows(flag) {
                continue;
            }
            let missing = self.prereqs[flag.index()] & !set.mask();
            if missing != 0 {
                let unmet = PermissionSet::from_mask(missing).allowed();
                return Err(PermError(format!(
                    "{} enabled without prerequisite {}",
                    flag,
                    unmet[0]
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum VisitState {
    Unvisited,
    InProgress,
    Done,
}

fn close(
    flag: PermissionFlag,
    direct: &[u64; FLAG_COUNT],
    prereqs: &mut [u64; FLAG_COUNT],
    state: &mut [VisitState; FLAG_COUNT],
) -> Result<()> {
    match state[flag.index()] {
        VisitState::Done => return Ok(()),
        VisitState::InProgress => {
            return Err(PermError(format!("dependency cycle through {}", flag)))
        }
        VisitState::Unvisited => {}
    }
    state[flag.index()] = VisitState::InProgress;

    let mut acc = direct[flag.index()];
    for p in ALL_FLAGS {
        if direct[flag.index()] & p.bit() != 0 {
            close(p, direct, prereqs, state)?;
            acc |= prereqs[p.index()];
        }
    }

    prereqs[flag.index()] = acc;
    state[flag.index()] = VisitState::Done;
    Ok(())
}

fn level_of(
    flag: PermissionFlag,
    direct: &[u64; FLAG_COUNT],
    levels: &mut [u8; FLAG_COUNT],
    done: &mut [bool; FLAG_COUNT],
) -> u8 {
    if done[flag.index()] {
        return levels[flag.index()];
    }
    let mut level = 0u8;
    for p in ALL_FLAGS {
        if direct[flag.index()] & p.bit() != 0 {
            level = level.max(level_of(p, direct, levels, done) + 1);
        }
    }
    levels[flag.index()] = level;
    done[flag.index()] = true;
    level
}
