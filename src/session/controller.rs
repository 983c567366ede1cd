use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{HedgeError, Result};
use crate::exchange::{DeltaSource, FetchError};
use crate::hedge::{evaluate_rehedge, HedgeCalculator, OptionType, RehedgeDecision, Trigger};
use crate::position::{
    HistoryEntry, NewPosition, Position, PositionStore, PositionUpdate, StoreFile,
};
use crate::utils::Config;

/// One row of the portfolio view: where each position stands at its last
/// observed delta
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionSummary {
    pub contract_name: String,
    pub option_type: OptionType,
    pub size: Decimal,
    pub band: Decimal,
    pub last_delta: Decimal,
    pub current_hedge: Decimal,
    pub target_hedge: Decimal,
    pub deviation: Decimal,
    pub trigger: Trigger,
    pub rehedge_count: u32,
}

/// Drives the position lifecycle for one session.
///
/// Owns the store for the lifetime of the session. Every mutation is built
/// on a copy of the store, persisted, and only then swapped in, so a failed
/// call leaves both memory and disk unchanged.
pub struct SessionController {
    store: PositionStore,
    file: Option<StoreFile>,
    calculator: HedgeCalculator,
    fetch_timeout: Duration,
    /// Target from the latest delta update per position, awaiting confirmation
    pending: HashMap<String, Decimal>,
}

impl SessionController {
    /// Load the store from `file`, or start empty if it does not exist
    pub fn open(file: StoreFile, calculator: HedgeCalculator, fetch_timeout: Duration) -> Result<Self> {
        let store = file.load()?;
        for pos in store.list_active() {
            if pos.convention != calculator.convention() {
                warn!(
                    id = %pos.contract_name,
                    opened_under = %pos.convention,
                    configured = %calculator.convention(),
                    "Position keeps the convention it was opened under"
                );
            }
        }
        info!(
            path = %file.path().display(),
            convention = %calculator.convention(),
            "Session opened"
        );

        Ok(Self {
            store,
            file: Some(file),
            calculator,
            fetch_timeout,
            pending: HashMap::new(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::open(
            StoreFile::in_dir(config.data_dir()),
            HedgeCalculator::new(config.hedge.convention),
            config.exchange.timeout(),
        )
    }

    /// Session without a backing file
    pub fn in_memory(calculator: HedgeCalculator, fetch_timeout: Duration) -> Self {
        Self {
            store: PositionStore::new(),
            file: None,
            calculator,
            fetch_timeout,
            pending: HashMap::new(),
        }
    }

    pub fn calculator(&self) -> &HedgeCalculator {
        &self.calculator
    }

    pub fn store(&self) -> &PositionStore {
        &self.store
    }

    pub fn position(&self, id: &str) -> Result<&Position> {
        self.store.get(id)
    }

    pub fn active_positions(&self) -> &[Position] {
        self.store.list_active()
    }

    pub fn history(&self) -> &[HistoryEntry] {
        self.store.list_history()
    }

    /// Target waiting for [`apply_rehedge`](Self::apply_rehedge), if any
    pub fn pending_target(&self, id: &str) -> Option<Decimal> {
        self.pending.get(id).copied()
    }

    /// Validate and open a position; its starting hedge is taken as executed
    pub fn create_position(&mut self, params: NewPosition) -> Result<Position> {
        let mut next = self.store.clone();
        let position = next.create(params, &self.calculator, Utc::now())?;
        self.commit(next)?;

        info!(
            id = %position.contract_name,
            starting_hedge = %position.starting_hedge,
            band = %position.band,
            "Position opened"
        );
        Ok(position)
    }

    /// Record a new delta observation and return the rehedge decision.
    ///
    /// `last_delta` is updated whatever the decision; `current_hedge` never is.
    pub fn update_delta(&mut self, id: &str, observed_delta: Decimal) -> Result<RehedgeDecision> {
        let decision = self.calculator.decide(self.store.get(id)?, observed_delta)?;

        let mut next = self.store.clone();
        next.update(
            id,
            PositionUpdate {
                last_delta: Some(observed_delta),
                current_hedge: None,
            },
            Utc::now(),
        )?;
        self.commit(next)?;
        self.pending.insert(id.to_string(), decision.target_hedge);

        info!(
            id,
            delta = %observed_delta,
            target = %decision.target_hedge,
            deviation = %decision.deviation,
            trigger = %decision.trigger,
            "Delta updated"
        );
        Ok(decision)
    }

    /// Ask `source` for the delta, bounded by the session timeout.
    ///
    /// Failure leaves the position untouched.
    pub async fn fetch_delta(&self, id: &str, source: &dyn DeltaSource) -> Result<Decimal> {
        let contract = self.store.get(id)?.contract.clone();

        match tokio::time::timeout(self.fetch_timeout, source.fetch_delta(&contract)).await {
            Ok(Ok(delta)) => {
                debug!(id, source = source.name(), %delta, "Fetched delta");
                Ok(delta)
            }
            Ok(Err(e)) => {
                warn!(id, source = source.name(), error = %e, "Delta fetch failed");
                Err(HedgeError::Unavailable(e))
            }
            Err(_) => {
                warn!(id, source = source.name(), timeout = ?self.fetch_timeout, "Delta fetch timed out");
                Err(HedgeError::Unavailable(FetchError::Timeout(self.fetch_timeout)))
            }
        }
    }

    /// Fetch a delta from `source` and run [`update_delta`](Self::update_delta) with it
    pub async fn refresh_delta(&mut self, id: &str, source: &dyn DeltaSource) -> Result<RehedgeDecision> {
        let delta = self.fetch_delta(id, source).await?;
        self.update_delta(id, delta)
    }

    /// Commit the pending target as the held hedge after the trader
    /// confirms the trade
    pub fn apply_rehedge(&mut self, id: &str) -> Result<Position> {
        self.store.get(id)?;
        let target = self.pending.get(id).copied().ok_or_else(|| {
            HedgeError::InvalidState(format!("no delta update pending for {}", id))
        })?;

        let mut next = self.store.clone();
        let position = next
            .update(
                id,
                PositionUpdate {
                    last_delta: None,
                    current_hedge: Some(target),
                },
                Utc::now(),
            )?
            .clone();
        self.commit(next)?;
        self.pending.remove(id);

        info!(
            id,
            current_hedge = %position.current_hedge,
            rehedges = position.rehedge_count,
            "Rehedge applied"
        );
        Ok(position)
    }

    /// Close a position and archive it
    pub fn close_position(&mut self, id: &str) -> Result<HistoryEntry> {
        let mut next = self.store.clone();
        let entry = next.close(id, Utc::now())?;
        self.commit(next)?;
        self.pending.remove(id);

        info!(
            id,
            final_hedge = %entry.position.current_hedge,
            rehedges = entry.position.rehedge_count,
            "Position closed"
        );
        Ok(entry)
    }

    /// Status of every active position at its last observed delta
    pub fn summaries(&self) -> Vec<PositionSummary> {
        self.store
            .list_active()
            .iter()
            .map(|pos| {
                let target = HedgeCalculator::new(pos.convention).hedge(
                    pos.last_delta,
                    pos.contract.option_type,
                    pos.size,
                );
                let decision = evaluate_rehedge(target, pos.current_hedge, pos.band);

                PositionSummary {
                    contract_name: pos.contract_name.clone(),
                    option_type: pos.contract.option_type,
                    size: pos.size,
                    band: pos.band,
                    last_delta: pos.last_delta,
                    current_hedge: pos.current_hedge,
                    target_hedge: decision.target_hedge,
                    deviation: decision.deviation,
                    trigger: decision.trigger,
                    rehedge_count: pos.rehedge_count,
                }
            })
            .collect()
    }

    /// Net underlying hedge held across active positions
    pub fn net_hedge(&self) -> Decimal {
        self.store.net_hedge()
    }

    fn commit(&mut self, next: PositionStore) -> Result<()> {
        if let Some(file) = &self.file {
            file.save(&next)?;
        }
        self.store = next;
        Ok(())
    }
}
