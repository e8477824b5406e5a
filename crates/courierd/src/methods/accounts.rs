//! Account balance and payment stand-ins.
//!
//! Balances are derived from a SHA-256 digest of the account identifier, so
//! repeated calls for the same account agree without any stored ledger.

use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::{Value, json};
use sha2::{Digest, Sha256};

use courier_proto::{Body, Method, unix_millis};

use super::arguments::{optional_str, require_non_empty, require_positive};
use super::{HandlerContext, MethodError, MethodHandler, MethodRegistry};
use crate::audit::AuditKind;

const CURRENCY: &str = "USD";
const BALANCE_CEILING_CENTS: u64 = 10_000_000;

pub(super) fn register(registry: &mut MethodRegistry) {
    registry
        .register_fn(Method::CheckBalance.as_str(), check_balance)
        .register(Method::MakePayment.as_str(), MakePayment::default());
}

/// SHA-256 digest of `seed`.
pub(super) fn digest(seed: &str) -> [u8; 32] {
    Sha256::digest(seed.as_bytes()).into()
}

/// Balance in cents for `account_id`, below [`BALANCE_CEILING_CENTS`].
pub(crate) fn balance_cents(account_id: &str) -> u64 {
    let digest = digest(account_id);
    let mut head = [0_u8; 8];
    head.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(head) % BALANCE_CEILING_CENTS
}

fn format_cents(cents: u64) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}

/// `CHECK_BALANCE`: reports the balance of `account_id`.
fn check_balance(_context: &HandlerContext<'_>, body: &Body) -> Result<Value, MethodError> {
    let account_id = require_non_empty(body, "account_id")?;
    let cents = balance_cents(account_id);
    Ok(json!({
        "account_id": account_id,
        "balance_cents": cents,
        "balance": format_cents(cents),
        "currency": CURRENCY,
    }))
}

/// `MAKE_PAYMENT`: records `amount_cents` against `account_id`.
///
/// Payments larger than the account's derived balance are refused with
/// [`MethodError::Failed`] and leave no audit record.
#[derive(Default)]
struct MakePayment {
    sequence: AtomicU64,
}

impl MethodHandler for MakePayment {
    fn call(&self, context: &HandlerContext<'_>, body: &Body) -> Result<Value, MethodError> {
        let account_id = require_non_empty(body, "account_id")?;
        let amount_cents = require_positive(body, "amount_cents")?;
        let reference = optional_str(body, "reference")?;
        let available = balance_cents(account_id);
        if amount_cents > available {
            return Err(MethodError::failed(format!(
                "Insufficient funds: account {account_id} holds {} {CURRENCY}",
                format_cents(available)
            )));
        }
        let processed_at = unix_millis();
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let transaction_id = format!("TXN-{processed_at}-{sequence:06}");

        context.record(
            AuditKind::Payment,
            json!({
                "transaction_id": transaction_id,
                "account_id": account_id,
                "amount_cents": amount_cents,
                "reference": reference,
            }),
        );

        Ok(json!({
            "transaction_id": transaction_id,
            "account_id": account_id,
            "amount_cents": amount_cents,
            "amount": format_cents(amount_cents),
            "currency": CURRENCY,
            "reference": reference,
            "status": "completed",
            "processed_at": processed_at,
        }))
    }
}
