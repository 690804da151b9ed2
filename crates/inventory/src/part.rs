use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{
    Aggregate, AggregateRoot, DomainError, DomainResult, SparePartId, UserId, ensure_max_len,
};

use crate::transaction::{StockMovement, TransactionType};

pub const PLANT_MAX: usize = 20;
pub const POSITION_MAX: usize = 50;
pub const SUB_POSITION_MAX: usize = 20;
pub const CATEGORY_MAX: usize = 50;
pub const DESCRIPTION_MAX: usize = 200;
pub const SPECIFICATION_MAX: usize = 100;
pub const REMARKS_MAX: usize = 200;
pub const REASON_MAX: usize = 200;
pub const REFERENCE_MAX: usize = 50;

/// Descriptive attributes of a part (everything except its quantity).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartDetails {
    pub plant: String,
    pub position: String,
    pub sub_position: String,
    pub category: String,
    pub description: String,
    pub specification: String,
    pub remarks: String,
}

impl PartDetails {
    pub fn validate(&self) -> DomainResult<()> {
        ensure_max_len("plant", &self.plant, PLANT_MAX)?;
        ensure_max_len("position", &self.position, POSITION_MAX)?;
        ensure_max_len("sub-position", &self.sub_position, SUB_POSITION_MAX)?;
        ensure_max_len("category", &self.category, CATEGORY_MAX)?;
        ensure_max_len("description", &self.description, DESCRIPTION_MAX)?;
        ensure_max_len("specification", &self.specification, SPECIFICATION_MAX)?;
        ensure_max_len("remarks", &self.remarks, REMARKS_MAX)?;
        Ok(())
    }
}

/// Aggregate root: SparePart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparePart {
    id: SparePartId,
    details: PartDetails,
    quantity: i64,
    last_updated: DateTime<Utc>,
    version: u64,
    created: bool,
    retired: bool,
}

impl SparePart {
    /// Create an empty, not-yet-registered aggregate for an assigned id.
    pub fn empty(id: SparePartId) -> Self {
        Self {
            id,
            details: PartDetails::default(),
            quantity: 0,
            last_updated: DateTime::<Utc>::default(),
            version: 0,
            created: false,
            retired: false,
        }
    }

    pub fn id_typed(&self) -> SparePartId {
        self.id
    }

    pub fn details(&self) -> &PartDetails {
        &self.details
    }

    pub fn plant(&self) -> &str {
        &self.details.plant
    }

    pub fn position(&self) -> &str {
        &self.details.position
    }

    pub fn sub_position(&self) -> &str {
        &self.details.sub_position
    }

    pub fn category(&self) -> &str {
        &self.details.category
    }

    pub fn description(&self) -> &str {
        &self.details.description
    }

    pub fn specification(&self) -> &str {
        &self.details.specification
    }

    pub fn remarks(&self) -> &str {
        &self.details.remarks
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    pub fn is_registered(&self) -> bool {
        self.created && !self.retired
    }

    pub fn is_retired(&self) -> bool {
        self.retired
    }
}

impl AggregateRoot for SparePart {
    type Id = SparePartId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: RegisterPart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterPart {
    pub part_id: SparePartId,
    pub details: PartDetails,
    pub quantity: i64,
    pub actor: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RevisePart (details and, optionally, quantity).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisePart {
    pub part_id: SparePartId,
    pub details: PartDetails,
    pub quantity: i64,
    pub actor: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AdjustQuantity (set to an absolute quantity).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustQuantity {
    pub part_id: SparePartId,
    pub new_quantity: i64,
    pub kind: TransactionType,
    pub reason: String,
    pub reference_no: Option<String>,
    pub actor: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RetirePart (remove from the registry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetirePart {
    pub part_id: SparePartId,
    pub actor: UserId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartCommand {
    Register(RegisterPart),
    Revise(RevisePart),
    Adjust(AdjustQuantity),
    Retire(RetirePart),
}

/// Event: PartRegistered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartRegistered {
    pub part_id: SparePartId,
    pub details: PartDetails,
    pub occurred_at: DateTime<Utc>,
}

/// Event: DetailsRevised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailsRevised {
    pub part_id: SparePartId,
    pub details: PartDetails,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PartRetired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartRetired {
    pub part_id: SparePartId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartEvent {
    Registered(PartRegistered),
    DetailsRevised(DetailsRevised),
    /// Every quantity change; becomes exactly one ledger row.
    QuantityChanged(StockMovement),
    Retired(PartRetired),
}

impl PartEvent {
    pub fn movement(&self) -> Option<&StockMovement> {
        match self {
            PartEvent::QuantityChanged(m) => Some(m),
            _ => None,
        }
    }
}

/// The ledger rows a batch of part events produces, in order.
pub fn movements(events: &[PartEvent]) -> Vec<StockMovement> {
    events.iter().filter_map(PartEvent::movement).cloned().collect()
}

impl Aggregate for SparePart {
    type Command = PartCommand;
    type Event = PartEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            PartEvent::Registered(e) => {
                self.id = e.part_id;
                self.details = e.details.clone();
                self.quantity = 0;
                self.last_updated = e.occurred_at;
                self.created = true;
            }
            PartEvent::DetailsRevised(e) => {
                self.details = e.details.clone();
                self.last_updated = e.occurred_at;
            }
            PartEvent::QuantityChanged(m) => {
                self.quantity = m.new_quantity;
                self.last_updated = m.occurred_at;
            }
            PartEvent::Retired(e) => {
                self.retired = true;
                self.last_updated = e.occurred_at;
            }
        }

        // +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            PartCommand::Register(cmd) => self.handle_register(cmd),
            PartCommand::Revise(cmd) => self.handle_revise(cmd),
            PartCommand::Adjust(cmd) => self.handle_adjust(cmd),
            PartCommand::Retire(cmd) => self.handle_retire(cmd),
        }
    }
}

impl SparePart {
    fn ensure_registered(&self, part_id: SparePartId) -> DomainResult<()> {
        if !self.is_registered() {
            return Err(DomainError::not_found());
        }
        if self.id != part_id {
            return Err(DomainError::invalid_id("part id mismatch"));
        }
        Ok(())
    }

    fn movement(
        &self,
        kind: TransactionType,
        new_quantity: i64,
        reason: &str,
        reference_no: Option<String>,
        actor: UserId,
        occurred_at: DateTime<Utc>,
    ) -> PartEvent {
        PartEvent::QuantityChanged(StockMovement {
            part_id: self.id,
            kind,
            previous_quantity: self.quantity,
            new_quantity,
            occurred_at,
            user_id: actor,
            reason: reason.to_string(),
            reference_no,
        })
    }

    fn handle_register(&self, cmd: &RegisterPart) -> DomainResult<Vec<PartEvent>> {
        if self.created {
            return Err(DomainError::conflict("part already exists"));
        }
        cmd.details.validate()?;
        ensure_quantity(cmd.quantity)?;

        let registered = PartRegistered {
            part_id: cmd.part_id,
            details: cmd.details.clone(),
            occurred_at: cmd.occurred_at,
        };
        let mut opened = SparePart::empty(cmd.part_id);
        opened.apply(&PartEvent::Registered(registered.clone()));

        // The opening row is written even for zero stock so every part's
        // ledger starts at registration.
        let initial = opened.movement(
            TransactionType::In,
            cmd.quantity,
            "Part registered",
            None,
            cmd.actor,
            cmd.occurred_at,
        );
        Ok(vec![PartEvent::Registered(registered), initial])
    }

    fn handle_revise(&self, cmd: &RevisePart) -> DomainResult<Vec<PartEvent>> {
        self.ensure_registered(cmd.part_id)?;
        cmd.details.validate()?;
        ensure_quantity(cmd.quantity)?;

        let mut events = vec![PartEvent::DetailsRevised(DetailsRevised {
            part_id: cmd.part_id,
            details: cmd.details.clone(),
            occurred_at: cmd.occurred_at,
        })];
        if cmd.quantity != self.quantity {
            events.push(self.movement(
                TransactionType::Adjust,
                cmd.quantity,
                "Part details revised",
                None,
                cmd.actor,
                cmd.occurred_at,
            ));
        }
        Ok(events)
    }

    fn handle_adjust(&self, cmd: &AdjustQuantity) -> DomainResult<Vec<PartEvent>> {
        self.ensure_registered(cmd.part_id)?;
        ensure_quantity(cmd.new_quantity)?;
        if cmd.reason.trim().is_empty() {
            return Err(DomainError::validation("adjustment reason is required"));
        }
        ensure_max_len("reason", &cmd.reason, REASON_MAX)?;
        if let Some(reference) = &cmd.reference_no {
            ensure_max_len("reference number", reference, REFERENCE_MAX)?;
        }
        if cmd.kind == TransactionType::In {
            return Err(DomainError::validation(
                "IN transactions are only written at registration",
            ));
        }

        if cmd.new_quantity == self.quantity {
            return Ok(Vec::new());
        }
        Ok(vec![self.movement(
            cmd.kind,
            cmd.new_quantity,
            cmd.reason.trim(),
            cmd.reference_no.clone(),
            cmd.actor,
            cmd.occurred_at,
        )])
    }

    fn handle_retire(&self, cmd: &RetirePart) -> DomainResult<Vec<PartEvent>> {
        self.ensure_registered(cmd.part_id)?;

        let mut events = Vec::with_capacity(2);
        if self.quantity != 0 {
            events.push(self.movement(
                TransactionType::Out,
                0,
                "Part deleted",
                None,
                cmd.actor,
                cmd.occurred_at,
            ));
        }
        events.push(PartEvent::Retired(PartRetired {
            part_id: cmd.part_id,
            occurred_at: cmd.occurred_at,
        }));
        Ok(events)
    }
}

fn ensure_quantity(quantity: i64) -> DomainResult<()> {
    if quantity < 0 {
        return Err(DomainError::validation("quantity cannot be negative"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::{InventoryTransaction, replay_quantity};
    use proptest::prelude::*;
    use stockroom_core::TransactionId;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    fn details(description: &str) -> PartDetails {
        PartDetails {
            plant: "P1".to_string(),
            position: "A-01".to_string(),
            sub_position: "03".to_string(),
            category: "Bearings".to_string(),
            description: description.to_string(),
            specification: "6204-2RS".to_string(),
            remarks: String::new(),
        }
    }

    fn registered(quantity: i64) -> SparePart {
        let id = SparePartId::new(1);
        let (part, _) = SparePart::empty(id)
            .execute(&PartCommand::Register(RegisterPart {
                part_id: id,
                details: details("Bearing"),
                quantity,
                actor: UserId::new(),
                occurred_at: now(),
            }))
            .unwrap();
        part
    }

    fn adjust(part: &SparePart, new_quantity: i64, reason: &str) -> PartCommand {
        PartCommand::Adjust(AdjustQuantity {
            part_id: part.id_typed(),
            new_quantity,
            kind: TransactionType::Adjust,
            reason: reason.to_string(),
            reference_no: None,
            actor: UserId::new(),
            occurred_at: now(),
        })
    }

    #[test]
    fn register_writes_opening_in_row() {
        let id = SparePartId::new(7);
        let events = SparePart::empty(id)
            .handle(&PartCommand::Register(RegisterPart {
                part_id: id,
                details: details("Bearing"),
                quantity: 100,
                actor: UserId::new(),
                occurred_at: now(),
            }))
            .unwrap();

        let rows = movements(&events);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].kind, TransactionType::In);
        assert_eq!((rows[0].previous_quantity, rows[0].new_quantity), (0, 100));
    }

    #[test]
    fn adjust_records_bracketing_quantities() {
        let part = registered(100);
        let (part, events) = part.execute(&adjust(&part, 80, "damaged")).unwrap();

        let rows = movements(&events);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].kind, TransactionType::Adjust);
        assert_eq!(rows[0].previous_quantity, 100);
        assert_eq!(rows[0].new_quantity, 80);
        assert_eq!(rows[0].delta(), -20);
        assert_eq!(rows[0].reason, "damaged");
        assert_eq!(part.quantity(), 80);
    }

    #[test]
    fn adjust_to_same_quantity_is_a_no_op() {
        let part = registered(10);
        assert!(part.handle(&adjust(&part, 10, "recount")).unwrap().is_empty());
    }

    #[test]
    fn adjust_requires_reason() {
        let part = registered(10);
        match part.handle(&adjust(&part, 5, "   ")) {
            Err(DomainError::Validation(_)) => {}
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn negative_quantity_is_rejected() {
        let part = registered(10);
        assert!(matches!(
            part.handle(&adjust(&part, -1, "x")),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn revise_without_quantity_change_writes_no_row() {
        let part = registered(10);
        let events = part
            .handle(&PartCommand::Revise(RevisePart {
                part_id: part.id_typed(),
                details: details("Deep groove bearing"),
                quantity: 10,
                actor: UserId::new(),
                occurred_at: now(),
            }))
            .unwrap();
        assert!(movements(&events).is_empty());
    }

    #[test]
    fn revise_with_quantity_change_writes_adjust_row() {
        let part = registered(10);
        let events = part
            .handle(&PartCommand::Revise(RevisePart {
                part_id: part.id_typed(),
                details: details("Bearing"),
                quantity: 12,
                actor: UserId::new(),
                occurred_at: now(),
            }))
            .unwrap();
        let rows = movements(&events);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].kind, TransactionType::Adjust);
        assert_eq!(rows[0].delta(), 2);
    }

    #[test]
    fn overlong_description_is_rejected() {
        let id = SparePartId::new(1);
        let err = SparePart::empty(id)
            .handle(&PartCommand::Register(RegisterPart {
                part_id: id,
                details: details(&"x".repeat(DESCRIPTION_MAX + 1)),
                quantity: 1,
                actor: UserId::new(),
                occurred_at: now(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("description")));
    }

    #[test]
    fn retire_zeroes_stock_with_out_row() {
        let part = registered(4);
        let (part, events) = part
            .execute(&PartCommand::Retire(RetirePart {
                part_id: part.id_typed(),
                actor: UserId::new(),
                occurred_at: now(),
            }))
            .unwrap();
        let rows = movements(&events);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].kind, TransactionType::Out);
        assert_eq!(rows[0].delta(), -4);
        assert!(part.is_retired());
    }

    #[test]
    fn retire_empty_part_writes_no_row() {
        let part = registered(0);
        let events = part
            .handle(&PartCommand::Retire(RetirePart {
                part_id: part.id_typed(),
                actor: UserId::new(),
                occurred_at: now(),
            }))
            .unwrap();
        assert!(movements(&events).is_empty());
    }

    #[test]
    fn retired_part_rejects_further_commands() {
        let part = registered(1);
        let (part, _) = part
            .execute(&PartCommand::Retire(RetirePart {
                part_id: part.id_typed(),
                actor: UserId::new(),
                occurred_at: now(),
            }))
            .unwrap();
        assert_eq!(
            part.handle(&adjust(&part, 3, "found more")),
            Err(DomainError::NotFound)
        );
    }

    #[test]
    fn version_increments_once_per_event() {
        let part = registered(5);
        assert_eq!(part.version(), 2);
        let (part, _) = part.execute(&adjust(&part, 3, "used")).unwrap();
        assert_eq!(part.version(), 3);
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

        /// Property: the ledger has one row per quantity change and its deltas
        /// sum to the current quantity.
        #[test]
        fn ledger_replays_to_current_quantity(
            initial in 0i64..500,
            targets in proptest::collection::vec(0i64..500, 0..40),
        ) {
            let mut part = registered(initial);
            let mut ledger: Vec<InventoryTransaction> = vec![InventoryTransaction::commit(
                TransactionId::new(1),
                StockMovement {
                    part_id: part.id_typed(),
                    kind: TransactionType::In,
                    previous_quantity: 0,
                    new_quantity: initial,
                    occurred_at: now(),
                    user_id: UserId::new(),
                    reason: "Part registered".to_string(),
                    reference_no: None,
                },
            )];
            let mut changes = 1usize;

            for target in targets {
                if target != part.quantity() {
                    changes += 1;
                }
                let (next, events) = part.execute(&adjust(&part, target, "cycle")).unwrap();
                for m in movements(&events) {
                    let id = TransactionId::new(ledger.len() as i64 + 1);
                    ledger.push(InventoryTransaction::commit(id, m));
                }
                part = next;
            }

            prop_assert_eq!(ledger.len(), changes);
            prop_assert_eq!(replay_quantity(&ledger), Some(part.quantity()));
        }
    }
}
