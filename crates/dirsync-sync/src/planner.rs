//! Action planning
//!
//! The planner turns two tree listings into the list of actions that makes the
//! destination match the source. Every destination path appears in at most one
//! action, which is what lets the executor run a phase fully concurrently.

use crate::action::{ExecutionPhase, SyncAction};
use crate::comparator::FileComparator;
use crate::scanner::TreeListing;
use dirsync_types::{ActionKind, FileSnapshot, RelativePath, Result, SyncEndpoint};
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, info};

/// Ordered list of actions for one pass
///
/// Actions are stored in planning order: directory creation, moves, file
/// deletion, link removal, new copies, updates, directory deletion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    actions: Vec<SyncAction>,
}

impl SyncPlan {
    /// Build a plan from actions in execution order
    pub fn from_actions(actions: Vec<SyncAction>) -> Self {
        Self { actions }
    }

    /// All actions in planning order
    pub fn actions(&self) -> &[SyncAction] {
        &self.actions
    }

    /// Actions belonging to one execution phase
    pub fn phase(&self, phase: ExecutionPhase) -> impl Iterator<Item = &SyncAction> {
        self.actions
            .iter()
            .filter(move |action| action.phase() == phase)
    }

    /// Number of actions of one kind
    pub fn count(&self, kind: ActionKind) -> usize {
        self.actions
            .iter()
            .filter(|action| action.kind() == kind)
            .count()
    }

    /// Total number of actions
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether the trees are already in sync
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Consume the plan
    pub fn into_actions(self) -> Vec<SyncAction> {
        self.actions
    }
}

impl fmt::Display for SyncPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} actions ({} create-dir, {} move, {} delete, {} copy, {} delete-dir)",
            self.len(),
            self.count(ActionKind::CreateDirectory),
            self.count(ActionKind::MoveFile),
            self.count(ActionKind::DeleteFile),
            self.count(ActionKind::CopyFile),
            self.count(ActionKind::DeleteDirectory)
        )
    }
}

/// Computes the actions that bring a destination tree in line with its source
#[derive(Debug, Clone, Copy)]
pub struct SyncPlanner {
    comparator: FileComparator,
    detect_moves: bool,
}

impl SyncPlanner {
    /// Create a planner
    pub fn new(comparator: FileComparator, detect_moves: bool) -> Self {
        Self {
            comparator,
            detect_moves,
        }
    }

    /// Plan one pass
    ///
    /// Comparison runs sequentially. A file that vanishes before it can be
    /// hashed aborts planning with [`dirsync_types::Error::FileNotFound`].
    pub async fn plan(
        &self,
        endpoint: &SyncEndpoint,
        source: &TreeListing,
        destination: &TreeListing,
    ) -> Result<SyncPlan> {
        let src_root = endpoint.source();
        let dst_root = endpoint.destination();
        let mut actions = Vec::new();

        for path in source.directories.difference(&destination.directories) {
            actions.push(SyncAction::CreateDirectory {
                root: dst_root.to_path_buf(),
                path: path.clone(),
            });
        }

        let missing: BTreeSet<&RelativePath> =
            source.files.difference(&destination.files).collect();
        let extra: BTreeSet<&RelativePath> =
            destination.files.difference(&source.files).collect();

        let moves = if self.detect_moves {
            self.find_moves(endpoint, &extra, &missing).await?
        } else {
            Vec::new()
        };
        let moved_from: BTreeSet<&RelativePath> = moves.iter().map(|(from, _)| *from).collect();
        let moved_to: BTreeSet<&RelativePath> = moves.iter().map(|(_, to)| *to).collect();

        for (from, to) in &moves {
            actions.push(SyncAction::MoveFile {
                root: dst_root.to_path_buf(),
                path: (*to).clone(),
                old_path: (*from).clone(),
            });
        }

        for path in extra.iter().filter(|path| !moved_from.contains(*path)) {
            actions.push(SyncAction::DeleteFile {
                root: dst_root.to_path_buf(),
                path: (*path).clone(),
            });
        }

        // Links are never followed, so a destination link that the source does
        // not shadow is stale. A shadowed one is replaced when its path is written.
        for path in destination.links.iter().filter(|path| {
            !source.files.contains(*path) && !source.directories.contains(*path)
        }) {
            actions.push(SyncAction::DeleteFile {
                root: dst_root.to_path_buf(),
                path: path.clone(),
            });
        }

        for path in missing.iter().filter(|path| !moved_to.contains(*path)) {
            actions.push(SyncAction::CopyFile {
                root: dst_root.to_path_buf(),
                path: (*path).clone(),
                source_root: src_root.to_path_buf(),
            });
        }

        for path in source.files.intersection(&destination.files) {
            let differ = self
                .comparator
                .files_differ(path.resolve(src_root), path.resolve(dst_root))
                .await?;
            if differ {
                debug!("Changed: {}", path);
                actions.push(SyncAction::CopyFile {
                    root: dst_root.to_path_buf(),
                    path: path.clone(),
                    source_root: src_root.to_path_buf(),
                });
            }
        }

        // Removing the topmost stale directory takes its stale children with it
        let stale_dirs: BTreeSet<&RelativePath> = destination
            .directories
            .difference(&source.directories)
            .collect();
        for path in &stale_dirs {
            if has_ancestor_in(path, &stale_dirs) {
                continue;
            }
            actions.push(SyncAction::DeleteDirectory {
                root: dst_root.to_path_buf(),
                path: (*path).clone(),
            });
        }

        let plan = SyncPlan::from_actions(actions);
        info!("Planned {}", plan);
        Ok(plan)
    }

    /// Pair destination extras with source files they are a renamed copy of
    ///
    /// Extras are visited in ascending order and take the smallest unclaimed
    /// candidate that passes both comparison tiers.
    async fn find_moves<'a>(
        &self,
        endpoint: &SyncEndpoint,
        extra: &BTreeSet<&'a RelativePath>,
        missing: &BTreeSet<&'a RelativePath>,
    ) -> Result<Vec<(&'a RelativePath, &'a RelativePath)>> {
        let mut moves = Vec::new();
        if extra.is_empty() || missing.is_empty() {
            return Ok(moves);
        }

        let mut candidates: Vec<(&'a RelativePath, Option<FileSnapshot>)> = Vec::new();
        for path in missing {
            let snapshot = self
                .comparator
                .snapshot(path.resolve(endpoint.source()))
                .await;
            candidates.push((*path, snapshot));
        }
        let mut claimed = vec![false; candidates.len()];

        for from in extra {
            let from_path = from.resolve(endpoint.destination());
            let Some(from_snapshot) = self.comparator.snapshot(&from_path).await else {
                continue;
            };

            for (index, (to, to_snapshot)) in candidates.iter().enumerate() {
                if claimed[index] || *to_snapshot != Some(from_snapshot) {
                    continue;
                }
                let to_path = to.resolve(endpoint.source());
                if self.comparator.deep_equal(&from_path, &to_path).await? {
                    debug!("Detected move: {} -> {}", from, to);
                    claimed[index] = true;
                    moves.push((*from, *to));
                    break;
                }
            }
        }

        Ok(moves)
    }
}

fn has_ancestor_in(path: &RelativePath, set: &BTreeSet<&RelativePath>) -> bool {
    let mut parent = path.parent();
    while let Some(ancestor) = parent {
        if set.contains(&ancestor) {
            return true;
        }
        parent = ancestor.parent();
    }
    false
}
