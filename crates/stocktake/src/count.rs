use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{
    Aggregate, AggregateRoot, CountDetailId, DomainError, DomainResult, Entity, SparePartId,
    StockCountId, UserId, ensure_max_len,
};

pub const COUNT_NO_MAX: usize = 20;
pub const REMARKS_MAX: usize = 500;
pub const LINE_REMARKS_MAX: usize = 200;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CountStatus {
    InProgress,
    Completed,
}

impl CountStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CountStatus::InProgress => "IN_PROGRESS",
            CountStatus::Completed => "COMPLETED",
        }
    }
}

impl core::fmt::Display for CountStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CountState {
    InProgress,
    Completed {
        completed_by: UserId,
        completed_at: DateTime<Utc>,
    },
}

impl CountState {
    pub fn status(&self) -> CountStatus {
        match self {
            CountState::InProgress => CountStatus::InProgress,
            CountState::Completed { .. } => CountStatus::Completed,
        }
    }
}

/// One counted part.
///
/// The system quantity is the registry quantity when the count was opened
/// and cannot be changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockCountDetail {
    id: CountDetailId,
    part_id: SparePartId,
    system_quantity: i64,
    counted_quantity: i64,
    remarks: String,
}

impl StockCountDetail {
    pub fn id_typed(&self) -> CountDetailId {
        self.id
    }

    pub fn part_id(&self) -> SparePartId {
        self.part_id
    }

    pub fn system_quantity(&self) -> i64 {
        self.system_quantity
    }

    pub fn counted_quantity(&self) -> i64 {
        self.counted_quantity
    }

    pub fn remarks(&self) -> &str {
        &self.remarks
    }

    /// `counted - system`.
    pub fn difference(&self) -> i64 {
        self.counted_quantity - self.system_quantity
    }
}

impl Entity for StockCountDetail {
    type Id = CountDetailId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Snapshot line resolved by the caller when opening a count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountLineDraft {
    pub detail_id: CountDetailId,
    pub part_id: SparePartId,
    pub system_quantity: i64,
}

/// Set a part to its counted quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correction {
    pub detail_id: CountDetailId,
    pub part_id: SparePartId,
    pub system_quantity: i64,
    pub counted_quantity: i64,
}

/// Aggregate root: StockCount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockCount {
    id: StockCountId,
    count_no: String,
    counted_at: DateTime<Utc>,
    counter: Option<UserId>,
    remarks: String,
    details: Vec<StockCountDetail>,
    state: CountState,
    version: u64,
    created: bool,
}

impl StockCount {
    pub fn empty(id: StockCountId) -> Self {
        Self {
            id,
            count_no: String::new(),
            counted_at: DateTime::<Utc>::default(),
            counter: None,
            remarks: String::new(),
            details: Vec::new(),
            state: CountState::InProgress,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> StockCountId {
        self.id
    }

    pub fn count_no(&self) -> &str {
        &self.count_no
    }

    /// Count date (when the count was opened).
    pub fn counted_at(&self) -> DateTime<Utc> {
        self.counted_at
    }

    pub fn counter(&self) -> Option<UserId> {
        self.counter
    }

    pub fn remarks(&self) -> &str {
        &self.remarks
    }

    pub fn details(&self) -> &[StockCountDetail] {
        &self.details
    }

    pub fn detail(&self, id: CountDetailId) -> Option<&StockCountDetail> {
        stockroom_core::entity::find_by_id(&self.details, &id)
    }

    pub fn state(&self) -> &CountState {
        &self.state
    }

    pub fn status(&self) -> CountStatus {
        self.state.status()
    }

    pub fn is_opened(&self) -> bool {
        self.created
    }

    pub fn system_total(&self) -> i64 {
        self.details.iter().map(|d| d.system_quantity).sum()
    }

    pub fn counted_total(&self) -> i64 {
        self.details.iter().map(|d| d.counted_quantity).sum()
    }

    pub fn part_ids(&self) -> impl Iterator<Item = SparePartId> + '_ {
        self.details.iter().map(|d| d.part_id)
    }
}

impl AggregateRoot for StockCount {
    type Id = StockCountId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: OpenCount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenCount {
    pub count_id: StockCountId,
    pub count_no: String,
    pub counter: UserId,
    pub remarks: String,
    pub lines: Vec<CountLineDraft>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RecordCount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordCount {
    pub count_id: StockCountId,
    pub detail_id: CountDetailId,
    pub counted_quantity: i64,
    /// `None` keeps the current line remarks.
    pub remarks: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CompleteCount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteCount {
    pub count_id: StockCountId,
    pub actor: UserId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CountCommand {
    Open(OpenCount),
    Record(RecordCount),
    Complete(CompleteCount),
}

/// Event: CountOpened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountOpened {
    pub count_id: StockCountId,
    pub count_no: String,
    pub counter: UserId,
    pub remarks: String,
    pub lines: Vec<CountLineDraft>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: QuantityCounted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityCounted {
    pub count_id: StockCountId,
    pub detail_id: CountDetailId,
    pub counted_quantity: i64,
    pub remarks: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CountCompleted. `corrections` lists only nonzero differences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountCompleted {
    pub count_id: StockCountId,
    pub completed_by: UserId,
    pub corrections: Vec<Correction>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CountEvent {
    Opened(CountOpened),
    Counted(QuantityCounted),
    Completed(CountCompleted),
}

impl Aggregate for StockCount {
    type Command = CountCommand;
    type Event = CountEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            CountEvent::Opened(e) => {
                self.id = e.count_id;
                self.count_no = e.count_no.clone();
                self.counted_at = e.occurred_at;
                self.counter = Some(e.counter);
                self.remarks = e.remarks.clone();
                self.details = e
                    .lines
                    .iter()
                    .map(|l| StockCountDetail {
                        id: l.detail_id,
                        part_id: l.part_id,
                        system_quantity: l.system_quantity,
                        counted_quantity: 0,
                        remarks: String::new(),
                    })
                    .collect();
                self.state = CountState::InProgress;
                self.created = true;
            }
            CountEvent::Counted(e) => {
                if let Some(detail) = self.details.iter_mut().find(|d| d.id == e.detail_id) {
                    detail.counted_quantity = e.counted_quantity;
                    if let Some(remarks) = &e.remarks {
                        detail.remarks = remarks.clone();
                    }
                }
            }
            CountEvent::Completed(e) => {
                self.state = CountState::Completed {
                    completed_by: e.completed_by,
                    completed_at: e.occurred_at,
                };
            }
        }

        // +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            CountCommand::Open(cmd) => self.handle_open(cmd),
            CountCommand::Record(cmd) => self.handle_record(cmd),
            CountCommand::Complete(cmd) => self.handle_complete(cmd),
        }
    }
}

impl StockCount {
    fn ensure_in_progress(&self, count_id: StockCountId, action: &str) -> DomainResult<()> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        if self.id != count_id {
            return Err(DomainError::invalid_id("count id mismatch"));
        }
        if self.status() != CountStatus::InProgress {
            return Err(DomainError::invalid_state(format!(
                "cannot {action}: count {} is {}",
                self.count_no,
                self.status()
            )));
        }
        Ok(())
    }

    fn handle_open(&self, cmd: &OpenCount) -> DomainResult<Vec<CountEvent>> {
        if self.created {
            return Err(DomainError::conflict("count already exists"));
        }
        if cmd.count_no.trim().is_empty() {
            return Err(DomainError::validation("count number is required"));
        }
        ensure_max_len("count number", &cmd.count_no, COUNT_NO_MAX)?;
        ensure_max_len("remarks", &cmd.remarks, REMARKS_MAX)?;
        if cmd.lines.is_empty() {
            return Err(DomainError::validation(
                "a count needs at least one existing part",
            ));
        }

        let mut parts = HashSet::with_capacity(cmd.lines.len());
        let mut details = HashSet::with_capacity(cmd.lines.len());
        for line in &cmd.lines {
            if !parts.insert(line.part_id) || !details.insert(line.detail_id) {
                return Err(DomainError::validation(format!(
                    "part {} is listed more than once",
                    line.part_id
                )));
            }
        }

        Ok(vec![CountEvent::Opened(CountOpened {
            count_id: cmd.count_id,
            count_no: cmd.count_no.trim().to_string(),
            counter: cmd.counter,
            remarks: cmd.remarks.clone(),
            lines: cmd.lines.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_record(&self, cmd: &RecordCount) -> DomainResult<Vec<CountEvent>> {
        self.ensure_in_progress(cmd.count_id, "record quantities")?;
        if self.detail(cmd.detail_id).is_none() {
            return Err(DomainError::not_found());
        }
        if cmd.counted_quantity < 0 {
            return Err(DomainError::validation("counted quantity cannot be negative"));
        }
        if let Some(remarks) = &cmd.remarks {
            ensure_max_len("line remarks", remarks, LINE_REMARKS_MAX)?;
        }

        Ok(vec![CountEvent::Counted(QuantityCounted {
            count_id: cmd.count_id,
            detail_id: cmd.detail_id,
            counted_quantity: cmd.counted_quantity,
            remarks: cmd.remarks.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_complete(&self, cmd: &CompleteCount) -> DomainResult<Vec<CountEvent>> {
        self.ensure_in_progress(cmd.count_id, "complete")?;

        let corrections = self
            .details
            .iter()
            .filter(|d| d.difference() != 0)
            .map(|d| Correction {
                detail_id: d.id,
                part_id: d.part_id,
                system_quantity: d.system_quantity,
                counted_quantity: d.counted_quantity,
            })
            .collect();

        Ok(vec![CountEvent::Completed(CountCompleted {
            count_id: cmd.count_id,
            completed_by: cmd.actor,
            corrections,
            occurred_at: cmd.occurred_at,
        })])
    }
}

/// Count listing criteria. Results are returned newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountFilter {
    pub status: Option<CountStatus>,
    /// Inclusive lower bound on the count date.
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on the count date.
    pub until: Option<DateTime<Utc>>,
}

impl CountFilter {
    pub fn with_status(status: CountStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn matches(&self, count: &StockCount) -> bool {
        self.status.is_none_or(|s| count.status() == s)
            && self.from.is_none_or(|from| count.counted_at >= from)
            && self.until.is_none_or(|until| count.counted_at < until)
    }
}

/// Newest count first, then by id descending.
pub fn newest_first(a: &StockCount, b: &StockCount) -> Ordering {
    b.counted_at
        .cmp(&a.counted_at)
        .then_with(|| b.id.cmp(&a.id))
}
