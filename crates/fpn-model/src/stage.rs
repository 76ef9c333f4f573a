//! Stage accumulation.
//!
//! `STAGE` records open analysis stages; `MADD`/`MDEL`/`LADD`/`BADD` mutate
//! the open stage's active sets and append to its command log. Any of the
//! four commands may continue on following bare-separator lines.
//!
//! Every logged command carries a file-order sequence number, so logs of
//! several stages can be merged back into file order even when a stage is
//! re-opened later in the file.
//!
//! The cross-line cursor (open stage, pending command) is an explicit
//! [`ParserState`] value passed into every call, so the accumulator can be
//! driven line by line without a parser around it.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use fpn_inp::{CommandKind, GroupCommandRecord, Id, StageRecord};

use crate::collection::Ordered;

/// Cumulative active group ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActiveGroups {
    pub materials: BTreeSet<Id>,
    pub loads: BTreeSet<Id>,
    pub boundaries: BTreeSet<Id>,
}

impl ActiveGroups {
    pub fn apply(&mut self, kind: CommandKind, ids: &[Id]) {
        match kind {
            CommandKind::AddMaterials => self.materials.extend(ids.iter().copied()),
            CommandKind::DeleteMaterials => {
                for id in ids {
                    self.materials.remove(id);
                }
            }
            CommandKind::AddLoads => self.loads.extend(ids.iter().copied()),
            CommandKind::AddBoundaries => self.boundaries.extend(ids.iter().copied()),
        }
    }

    /// Left fold of `commands`, in the order given, over empty sets.
    pub fn replay<'a>(commands: impl IntoIterator<Item = &'a GroupCommand>) -> Self {
        commands.into_iter().fold(Self::default(), |mut acc, cmd| {
            acc.apply(cmd.kind, &cmd.ids);
            acc
        })
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty() && self.loads.is_empty() && self.boundaries.is_empty()
    }
}

/// One log entry: a command line or one of its continuation lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupCommand {
    /// Position among all logged commands of the file.
    pub sequence: u64,
    pub kind: CommandKind,
    /// Stage id written on the command line.
    pub target_stage: Id,
    pub ids: Vec<Id>,
    pub continuation: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisStage {
    pub id: Id,
    pub stage_type: i32,
    pub name: String,
    pub active: ActiveGroups,
    pub commands: Vec<GroupCommand>,
}

impl AnalysisStage {
    pub fn new(record: StageRecord) -> Self {
        Self {
            id: record.id,
            stage_type: record.stage_type,
            name: record
                .name
                .unwrap_or_else(|| format!("Stage_{}", record.id)),
            active: ActiveGroups::default(),
            commands: Vec::new(),
        }
    }

    fn log(&mut self, command: GroupCommand) {
        self.active.apply(command.kind, &command.ids);
        self.commands.push(command);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingCommand {
    pub kind: CommandKind,
    pub target_stage: Id,
}

/// Cursor carried from one line to the next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserState {
    current_stage: Option<Id>,
    pending: Option<PendingCommand>,
}

impl ParserState {
    pub fn current_stage(&self) -> Option<Id> {
        self.current_stage
    }

    pub fn pending(&self) -> Option<PendingCommand> {
        self.pending
    }

    pub fn continuation_open(&self) -> bool {
        self.pending.is_some()
    }

    /// Called for every keyword line before its own effect.
    pub fn close_pending(&mut self) {
        self.pending = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Applied,
    /// No stage was open.
    Dropped,
}

#[derive(Debug, Default)]
pub struct StageAccumulator {
    stages: Ordered<AnalysisStage>,
    logged: u64,
}

impl StageAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open (or re-open) a stage and make it current.
    pub fn open_stage(&mut self, state: &mut ParserState, record: StageRecord) {
        let id = record.id;
        if self.stages.contains(id) {
            debug!(stage = id, "stage re-opened");
        }
        self.stages.get_or_insert_with(id, || AnalysisStage::new(record));
        state.current_stage = Some(id);
        state.pending = None;
    }

    /// Apply a group command to the current stage and open its continuation.
    ///
    /// The command is routed to the open stage even when its embedded stage
    /// id differs; the log entry keeps the embedded id.
    pub fn apply_command(
        &mut self,
        state: &mut ParserState,
        record: GroupCommandRecord,
    ) -> CommandOutcome {
        state.pending = None;
        let Some(stage) = state.current_stage.and_then(|id| self.stages.get_mut(id)) else {
            debug!(
                command = %record.kind.keyword(),
                target = record.stage,
                "group command before any STAGE, dropped"
            );
            return CommandOutcome::Dropped;
        };

        if record.stage != stage.id {
            debug!(
                command = %record.kind.keyword(),
                embedded = record.stage,
                current = stage.id,
                "group command stage id differs from open stage"
            );
        }
        if let Some(declared) = record.declared_count
            && declared as usize != record.ids.len()
        {
            debug!(
                command = %record.kind.keyword(),
                declared,
                inline = record.ids.len(),
                "group count covers continuation lines"
            );
        }

        let sequence = self.logged;
        self.logged += 1;
        stage.log(GroupCommand {
            sequence,
            kind: record.kind,
            target_stage: record.stage,
            ids: record.ids,
            continuation: false,
        });
        state.pending = Some(PendingCommand {
            kind: record.kind,
            target_stage: record.stage,
        });
        CommandOutcome::Applied
    }

    /// Extend the pending command with the ids of a continuation line.
    ///
    /// Returns `false` when no command is pending.
    pub fn extend_pending(&mut self, state: &ParserState, ids: Vec<Id>) -> bool {
        let (Some(pending), Some(current)) = (state.pending, state.current_stage) else {
            return false;
        };
        let Some(stage) = self.stages.get_mut(current) else {
            return false;
        };
        stage.log(GroupCommand {
            sequence: self.logged,
            kind: pending.kind,
            target_stage: pending.target_stage,
            ids,
            continuation: true,
        });
        self.logged += 1;
        true
    }

    pub fn stage(&self, id: Id) -> Option<&AnalysisStage> {
        self.stages.get(id)
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn into_stages(self) -> Ordered<AnalysisStage> {
        self.stages
    }
}
