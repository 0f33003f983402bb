//! Account aggregate
//!
//! Replays [`AccountStateEvent`]s into balance and margin fields. Unlike
//! orders there is no lifecycle machine: every snapshot fully replaces the
//! balance fields, and the first snapshot creates the account.

use crate::aggregate::Aggregate;
use crate::error::DomainError;
use crate::events::AccountStateEvent;
use crate::identifiers::{AccountId, BrokerId};
use crate::value_objects::Currency;
use rust_decimal::Decimal;

/// An account's balance and margin state as a fold over broker snapshots
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// Account identifier
    pub id: AccountId,
    /// Brokerage holding the account
    pub broker_id: BrokerId,
    /// Broker-side account number
    pub account_number: String,
    /// Account base currency
    pub currency: Currency,
    /// Cash balance
    pub cash_balance: Decimal,
    /// Cash balance at start of day
    pub cash_start_day: Decimal,
    /// Net cash activity for the day
    pub cash_activity_day: Decimal,
    /// Margin held against maintenance requirements
    pub margin_used_maintenance: Decimal,
    /// Margin held against liquidation requirements
    pub margin_used_liquidation: Decimal,
    /// Current margin ratio
    pub margin_ratio: Decimal,
    /// Broker-reported margin call status
    pub margin_call_status: String,
    events: Vec<AccountStateEvent>,
}

impl Account {
    /// Create an account from its first state snapshot
    pub fn new(event: &AccountStateEvent) -> Self {
        Self {
            id: event.account_id.clone(),
            broker_id: event.broker_id.clone(),
            account_number: event.account_number.clone(),
            currency: event.currency.clone(),
            cash_balance: event.cash_balance,
            cash_start_day: event.cash_start_day,
            cash_activity_day: event.cash_activity_day,
            margin_used_maintenance: event.margin_used_maintenance,
            margin_used_liquidation: event.margin_used_liquidation,
            margin_ratio: event.margin_ratio,
            margin_call_status: event.margin_call_status.clone(),
            events: vec![event.clone()],
        }
    }

    /// Apply a state snapshot
    ///
    /// # Errors
    /// Returns `DomainError::DataIntegrity` if the event belongs to a
    /// different account.
    pub fn apply(&mut self, event: &AccountStateEvent) -> Result<(), DomainError> {
        if event.account_id != self.id {
            return Err(DomainError::DataIntegrity(format!(
                "Event for account {} applied to account {}",
                event.account_id, self.id
            )));
        }

        self.cash_balance = event.cash_balance;
        self.cash_start_day = event.cash_start_day;
        self.cash_activity_day = event.cash_activity_day;
        self.margin_used_maintenance = event.margin_used_maintenance;
        self.margin_used_liquidation = event.margin_used_liquidation;
        self.margin_ratio = event.margin_ratio;
        self.margin_call_status = event.margin_call_status.clone();
        self.events.push(event.clone());
        Ok(())
    }

    /// Equity not held against margin: max(0, cash - (maintenance + liquidation))
    pub fn free_equity(&self) -> Decimal {
        let margin = self.margin_used_maintenance + self.margin_used_liquidation;
        (self.cash_balance - margin).max(Decimal::ZERO)
    }
}

impl Aggregate for Account {
    type Id = AccountId;
    type Event = AccountStateEvent;

    fn id(&self) -> &AccountId {
        &self.id
    }

    fn last_event(&self) -> Option<&AccountStateEvent> {
        self.events.last()
    }

    fn event_count(&self) -> usize {
        self.events.len()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn state_event(account: &str, cash: Decimal, maintenance: Decimal, liquidation: Decimal) -> AccountStateEvent {
        AccountStateEvent {
            event_id: Uuid::new_v4(),
            account_id: AccountId::new(account).unwrap(),
            broker_id: BrokerId::new("FXCM").unwrap(),
            account_number: "123456".to_string(),
            currency: Currency::new("USD").unwrap(),
            cash_balance: cash,
            cash_start_day: cash,
            cash_activity_day: dec!(0),
            margin_used_maintenance: maintenance,
            margin_used_liquidation: liquidation,
            margin_ratio: dec!(0),
            margin_call_status: "N".to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_account_created_from_first_event() {
        let account = Account::new(&state_event("FXCM-123456", dec!(100000), dec!(0), dec!(0)));
        assert_eq!(account.id.as_str(), "FXCM-123456");
        assert_eq!(account.cash_balance, dec!(100000));
        assert_eq!(account.event_count(), 1);
    }

    #[test]
    fn test_apply_replaces_balance_fields() {
        let mut account = Account::new(&state_event("FXCM-123456", dec!(100000), dec!(0), dec!(0)));
        account.apply(&state_event("FXCM-123456", dec!(95000), dec!(1000), dec!(2000))).unwrap();
        assert_eq!(account.cash_balance, dec!(95000));
        assert_eq!(account.margin_used_maintenance, dec!(1000));
        assert_eq!(account.event_count(), 2);
    }

    #[test]
    fn test_free_equity() {
        let account = Account::new(&state_event("FXCM-123456", dec!(100000), dec!(1000), dec!(2000)));
        assert_eq!(account.free_equity(), dec!(97000));
    }

    #[test]
    fn test_free_equity_floors_at_zero() {
        let account = Account::new(&state_event("FXCM-123456", dec!(1000), dec!(900), dec!(900)));
        assert_eq!(account.free_equity(), dec!(0));
    }

    #[test]
    fn test_event_for_other_account_rejected() {
        let mut account = Account::new(&state_event("FXCM-123456", dec!(100000), dec!(0), dec!(0)));
        let err = account.apply(&state_event("FXCM-999999", dec!(1), dec!(0), dec!(0))).unwrap_err();
        assert!(matches!(err, DomainError::DataIntegrity(_)));
    }
}
