use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{HedgeError, Result};
use crate::hedge::{validate_delta, HedgeCalculator};
use crate::position::model::{HistoryEntry, NewPosition, Position, PositionStatus};

/// Field changes accepted by [`PositionStore::update`]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PositionUpdate {
    pub last_delta: Option<Decimal>,
    /// Setting the hedge records an accepted rehedge
    pub current_hedge: Option<Decimal>,
}

/// Active positions in insertion order plus the append-only close history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionStore {
    active: Vec<Position>,
    history: Vec<HistoryEntry>,
}

impl PositionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from persisted parts, rejecting anything that
    /// breaks the position invariants
    pub fn from_parts(active: Vec<Position>, history: Vec<HistoryEntry>) -> Result<Self> {
        for (idx, pos) in active.iter().enumerate() {
            pos.check_invariants()?;
            if pos.status != PositionStatus::Active {
                return Err(HedgeError::Validation(format!(
                    "{} is in the active set but marked closed",
                    pos.contract_name
                )));
            }
            if active[..idx].iter().any(|p| p.contract_name == pos.contract_name) {
                return Err(HedgeError::Validation(format!(
                    "duplicate active position {}",
                    pos.contract_name
                )));
            }
        }
        for entry in &history {
            entry.position.check_invariants()?;
            if entry.position.status != PositionStatus::Closed {
                return Err(HedgeError::Validation(format!(
                    "history entry {} is not closed",
                    entry.position.contract_name
                )));
            }
        }

        Ok(Self { active, history })
    }

    /// Validate and open a new position
    pub fn create(
        &mut self,
        params: NewPosition,
        calculator: &HedgeCalculator,
        now: DateTime<Utc>,
    ) -> Result<Position> {
        let position = Position::new(params, calculator, now)?;

        if self.active.iter().any(|p| p.contract_name == position.contract_name) {
            return Err(HedgeError::Validation(format!(
                "an active position for {} already exists",
                position.contract_name
            )));
        }

        self.active.push(position.clone());
        Ok(position)
    }

    /// Get an active position
    pub fn get(&self, id: &str) -> Result<&Position> {
        let idx = self.find_active(id)?;
        Ok(&self.active[idx])
    }

    /// Apply field changes. Everything is validated before anything is written.
    pub fn update(&mut self, id: &str, update: PositionUpdate, now: DateTime<Utc>) -> Result<&Position> {
        let idx = self.find_active(id)?;
        if let Some(delta) = update.last_delta {
            validate_delta(delta)?;
        }

        let position = &mut self.active[idx];
        if let Some(delta) = update.last_delta {
            position.last_delta = delta;
        }
        if let Some(hedge) = update.current_hedge {
            position.current_hedge = hedge;
            position.rehedge_count += 1;
        }
        position.updated_at = now;

        Ok(position)
    }

    /// Move a position into history
    pub fn close(&mut self, id: &str, at: DateTime<Utc>) -> Result<HistoryEntry> {
        let idx = self.find_active(id)?;

        let mut position = self.active.remove(idx);
        position.status = PositionStatus::Closed;
        position.updated_at = at;

        let entry = HistoryEntry {
            position,
            closed_at: at,
        };
        self.history.push(entry.clone());
        Ok(entry)
    }

    pub fn list_active(&self) -> &[Position] {
        &self.active
    }

    pub fn list_history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Net underlying hedge across all active positions
    pub fn net_hedge(&self) -> Decimal {
        self.active.iter().map(|p| p.current_hedge).sum()
    }

    fn find_active(&self, id: &str) -> Result<usize> {
        if let Some(idx) = self.active.iter().position(|p| p.contract_name == id) {
            return Ok(idx);
        }
        if self.history.iter().any(|h| h.position.contract_name == id) {
            return Err(HedgeError::InvalidState(format!("{} is already closed", id)));
        }
        Err(HedgeError::NotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hedge::OptionType;
    use crate::position::MAX_SIZE;
    use rust_decimal_macros::dec;

    fn params(strike: Decimal, option_type: OptionType) -> NewPosition {
        NewPosition {
            underlying_symbol: "BTC".to_string(),
            expiry: "29MAR".to_string(),
            option_type,
            strike,
            size: dec!(1.0),
            entry_delta: dec!(0.5),
            band: dec!(0.05),
        }
    }

    fn store_with_two() -> PositionStore {
        let calc = HedgeCalculator::default();
        let mut store = PositionStore::new();
        store.create(params(dec!(72000), OptionType::Call), &calc, Utc::now()).unwrap();
        store.create(params(dec!(60000), OptionType::Put), &calc, Utc::now()).unwrap();
        store
    }

    #[test]
    fn test_insertion_order_kept() {
        let store = store_with_two();
        let names: Vec<_> = store.list_active().iter().map(|p| p.id()).collect();
        assert_eq!(names, vec!["BTC-29MAR-72000-C", "BTC-29MAR-60000-P"]);
        assert_eq!(store.active_count(), 2);
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut store = store_with_two();
        let result = store.create(
            params(dec!(72000), OptionType::Call),
            &HedgeCalculator::default(),
            Utc::now(),
        );
        assert!(matches!(result, Err(HedgeError::Validation(_))));
        assert_eq!(store.active_count(), 2);
    }

    #[test]
    fn test_get_unknown() {
        let store = store_with_two();
        assert!(matches!(store.get("ETH-1JAN-1-C"), Err(HedgeError::NotFound(_))));
    }

    #[test]
    fn test_update_is_all_or_nothing() {
        let mut store = store_with_two();
        let before = store.clone();

        let bad = PositionUpdate {
            last_delta: Some(dec!(1.5)),
            current_hedge: Some(dec!(0.9)),
        };
        assert!(store.update("BTC-29MAR-72000-C", bad, Utc::now()).is_err());
        assert_eq!(store, before);

        let good = PositionUpdate {
            last_delta: Some(dec!(0.6)),
            current_hedge: Some(dec!(0.6)),
        };
        let pos = store.update("BTC-29MAR-72000-C", good, Utc::now()).unwrap();
        assert_eq!(pos.current_hedge, dec!(0.6));
        assert_eq!(pos.rehedge_count, 1);
    }

    #[test]
    fn test_close_moves_to_history_once() {
        let mut store = store_with_two();
        let entry = store.close("BTC-29MAR-72000-C", Utc::now()).unwrap();

        assert_eq!(entry.position.status, PositionStatus::Closed);
        assert_eq!(store.active_count(), 1);
        assert_eq!(store.list_history().len(), 1);

        let again = store.close("BTC-29MAR-72000-C", Utc::now());
        assert!(matches!(again, Err(HedgeError::InvalidState(_))));
        assert_eq!(store.list_history().len(), 1);

        assert!(matches!(store.close("nope", Utc::now()), Err(HedgeError::NotFound(_))));
    }

    #[test]
    fn test_net_hedge() {
        // call +0.5, put -0.5
        let store = store_with_two();
        assert_eq!(store.net_hedge(), Decimal::ZERO);
    }

    #[test]
    fn test_net_hedge_at_size_cap() {
        let calc = HedgeCalculator::default();
        let mut store = PositionStore::new();
        for i in 0..5 {
            let mut p = params(Decimal::from(70000 + i), OptionType::Call);
            p.size = MAX_SIZE;
            p.entry_delta = Decimal::ONE;
            store.create(p, &calc, Utc::now()).unwrap();
        }
        assert_eq!(store.net_hedge(), MAX_SIZE * Decimal::from(5));

        let mut over = params(dec!(80000), OptionType::Call);
        over.size = MAX_SIZE * dec!(2);
        assert!(matches!(store.create(over, &calc, Utc::now()), Err(HedgeError::Validation(_))));
    }

    #[test]
    fn test_from_parts_rejects_closed_in_active() {
        let mut store = store_with_two();
        let entry = store.close("BTC-29MAR-60000-P", Utc::now()).unwrap();
        let mut active = store.list_active().to_vec();
        active.push(entry.position);

        assert!(PositionStore::from_parts(active, vec![]).is_err());
    }
}
