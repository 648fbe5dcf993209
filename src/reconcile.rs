//! Balance partitioning and settlement preparation.
//!
//! The server computes every member's net balance; this module only
//! splits those balances into the three buckets the caller displays and
//! validates a proposed settlement against the counterpart's outstanding
//! amount. Balances are never mutated locally after a settlement posts;
//! the refetched group is the sole source of truth.

use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

use crate::client::types::{MemberBalance, Settlement, User};

#[derive(Debug, Error, PartialEq)]
pub enum SettlementError {
    #[error("Nothing to settle with this member")]
    NothingToSettle,
    #[error("'{0}' is not a valid amount")]
    Unparseable(String),
    #[error("Amount must be greater than zero")]
    NotPositive,
    #[error("Amount exceeds outstanding balance of {bound}")]
    ExceedsBound { bound: Decimal },
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct BalancePartition {
    pub owed_to_user: Vec<MemberBalance>,
    pub user_owes: Vec<MemberBalance>,
    pub settled: Vec<MemberBalance>,
}

/// Split balances into "owes you" / "you owe" / settled, preserving input
/// order. The three buckets are disjoint and cover the input, except that
/// a self-referential entry never lands in `settled`.
pub fn partition(current_user_id: i64, balances: &[MemberBalance]) -> BalancePartition {
    let mut out = BalancePartition::default();
    for balance in balances {
        if balance.owes_you > Decimal::ZERO {
            out.owed_to_user.push(balance.clone());
        } else if balance.you_owe > Decimal::ZERO {
            out.user_owes.push(balance.clone());
        } else if balance.user.id != current_user_id {
            out.settled.push(balance.clone());
        }
    }
    out
}

/// Validate a proposed settlement against a member's current balance and
/// materialize payer/payee from the active direction. `current_user` must
/// come from a fresh identity lookup, not a cache.
pub fn prepare_settlement(
    member: &MemberBalance,
    proposed_amount: &str,
    current_user: &User,
    notes: Option<&str>,
) -> Result<Settlement, SettlementError> {
    let (payer_id, payee_id, bound) = if member.owes_you > Decimal::ZERO {
        (member.user.id, current_user.id, member.owes_you)
    } else if member.you_owe > Decimal::ZERO {
        (current_user.id, member.user.id, member.you_owe)
    } else {
        return Err(SettlementError::NothingToSettle);
    };

    let amount = Decimal::from_str(proposed_amount.trim())
        .map_err(|_| SettlementError::Unparseable(proposed_amount.to_string()))?;
    if amount <= Decimal::ZERO {
        return Err(SettlementError::NotPositive);
    }
    if amount > bound {
        return Err(SettlementError::ExceedsBound { bound });
    }

    let notes = notes
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(String::from);

    Ok(Settlement {
        payer_id,
        payee_id,
        amount,
        notes,
    })
}
