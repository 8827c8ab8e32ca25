use super::CasinoService;
use crate::{
    errors::{CasinoError, CasinoResult},
    games::CoinSource,
    ledger,
    store::{
        stats, users,
        withdrawals::{self, Withdrawal, WithdrawalStatus},
    },
};
use tracing::info;
use uuid::Uuid;

impl CasinoService {
    /// Hold `amount` coins against a new pending withdrawal
    pub fn request_withdrawal(
        &self,
        telegram_id: i64,
        amount: u64,
        wallet_address: Option<String>,
    ) -> CasinoResult<Withdrawal> {
        let min_amount = self.config.withdrawals.min_amount;
        if amount < min_amount {
            return Err(CasinoError::validation(format!(
                "Minimum withdrawal is {} coins",
                min_amount
            )));
        }
        let wallet_address = wallet_address
            .map(|w| w.trim().to_string())
            .filter(|w| !w.is_empty());
        let now = self.clock.now();

        let (withdrawal, update) = self.storage.atomic(|txn| {
            let user = users::require_user(txn, telegram_id)?;
            if user.coins < amount {
                return Err(CasinoError::InsufficientFunds {
                    balance: user.coins,
                    required: amount,
                });
            }
            let delta = -ledger::to_delta(amount)?;
            let update = ledger::adjust(txn, telegram_id, delta, CoinSource::Withdrawal, false, now)?;

            let withdrawal = Withdrawal {
                id: Uuid::new_v4().to_string(),
                telegram_id,
                amount,
                wallet_address,
                status: WithdrawalStatus::Pending,
                created_at: now,
                updated_at: now,
            };
            withdrawals::store_withdrawal(txn, &withdrawal)?;
            stats::update_stats(txn, now.date_naive(), |s| s.withdrawals_requested += 1)?;
            Ok((withdrawal, update))
        })?;

        self.record_coins(CoinSource::Withdrawal, &update);
        self.record_withdrawal(&withdrawal);
        Ok(withdrawal)
    }

    pub fn list_withdrawals(&self, telegram_id: i64) -> CasinoResult<Vec<Withdrawal>> {
        withdrawals::list_for_user(&self.storage, telegram_id)
    }

    pub fn pending_withdrawals(&self) -> CasinoResult<Vec<Withdrawal>> {
        withdrawals::list_by_status(&self.storage, WithdrawalStatus::Pending)
    }

    pub fn approve_withdrawal(&self, id: &str) -> CasinoResult<Withdrawal> {
        self.transition_withdrawal(id, WithdrawalStatus::Approved)
    }

    pub fn mark_withdrawal_paid(&self, id: &str) -> CasinoResult<Withdrawal> {
        self.transition_withdrawal(id, WithdrawalStatus::Paid)
    }

    /// Reject a pending request and give the held coins back
    pub fn reject_withdrawal(&self, id: &str) -> CasinoResult<Withdrawal> {
        self.transition_withdrawal(id, WithdrawalStatus::Rejected)
    }

    fn transition_withdrawal(&self, id: &str, next: WithdrawalStatus) -> CasinoResult<Withdrawal> {
        let now = self.clock.now();
        let (withdrawal, refund) = self.storage.atomic(|txn| {
            let mut withdrawal = withdrawals::txn_load_withdrawal(txn, id)?;
            withdrawal.transition(next, now)?;
            withdrawals::store_withdrawal(txn, &withdrawal)?;

            let refund = match next {
                WithdrawalStatus::Rejected => Some(ledger::refund(
                    txn,
                    withdrawal.telegram_id,
                    withdrawal.amount,
                    CoinSource::WithdrawalRefund,
                    now,
                )?),
                WithdrawalStatus::Paid => {
                    let amount = withdrawal.amount;
                    stats::update_stats(txn, now.date_naive(), |s| s.withdrawn_amount += amount)?;
                    None
                }
                _ => None,
            };
            Ok((withdrawal, refund))
        })?;

        if let Some(update) = &refund {
            self.record_coins(CoinSource::WithdrawalRefund, update);
        }
        self.record_withdrawal(&withdrawal);
        Ok(withdrawal)
    }

    fn record_withdrawal(&self, withdrawal: &Withdrawal) {
        self.metrics
            .withdrawals
            .with_label_values(&[withdrawal.status.to_string().as_str()])
            .inc();
        info!(
            id = %withdrawal.id,
            telegram_id = withdrawal.telegram_id,
            amount = withdrawal.amount,
            status = %withdrawal.status,
            "withdrawal updated"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::test_service;

    #[test]
    fn test_request_holds_coins() {
        let t = test_service();
        t.seed_user(1, 1_500);

        let w = t
            .service
            .request_withdrawal(1, 1_200, Some(" UQabc ".to_string()))
            .unwrap();
        assert_eq!(w.status, WithdrawalStatus::Pending);
        assert_eq!(w.wallet_address.as_deref(), Some("UQabc"));
        assert_eq!(t.coins(1), 300);
        assert_eq!(t.service.list_withdrawals(1).unwrap(), vec![w]);
        assert_eq!(t.service.daily_stats(None).unwrap().withdrawals_requested, 1);
    }

    #[test]
    fn test_request_limits() {
        let t = test_service();
        t.seed_user(1, 1_500);
        assert!(matches!(
            t.service.request_withdrawal(1, 999, None),
            Err(CasinoError::Validation(_))
        ));
        assert!(matches!(
            t.service.request_withdrawal(1, 2_000, None),
            Err(CasinoError::InsufficientFunds { .. })
        ));
        assert_eq!(t.coins(1), 1_500);
    }

    #[test]
    fn test_approve_then_pay() {
        let t = test_service();
        t.seed_user(1, 1_000);
        let w = t.service.request_withdrawal(1, 1_000, None).unwrap();
        assert_eq!(t.service.pending_withdrawals().unwrap().len(), 1);

        // Paying straight from pending is not allowed.
        assert!(matches!(
            t.service.mark_withdrawal_paid(&w.id),
            Err(CasinoError::Validation(_))
        ));
        t.service.approve_withdrawal(&w.id).unwrap();
        let paid = t.service.mark_withdrawal_paid(&w.id).unwrap();
        assert_eq!(paid.status, WithdrawalStatus::Paid);
        assert_eq!(t.coins(1), 0);
        assert_eq!(t.service.daily_stats(None).unwrap().withdrawn_amount, 1_000);
        assert!(t.service.reject_withdrawal(&w.id).is_err());
    }

    #[test]
    fn test_reject_refunds() {
        let t = test_service();
        t.seed_user(1, 1_000);
        let w = t.service.request_withdrawal(1, 1_000, None).unwrap();

        let rejected = t.service.reject_withdrawal(&w.id).unwrap();
        assert_eq!(rejected.status, WithdrawalStatus::Rejected);
        assert_eq!(t.coins(1), 1_000);
        assert!(t.service.approve_withdrawal(&w.id).is_err());
        assert_eq!(t.service.get_user(1).unwrap().total_winnings, 0);
    }

    #[test]
    fn test_unknown_withdrawal() {
        let t = test_service();
        assert!(matches!(
            t.service.approve_withdrawal("missing"),
            Err(CasinoError::NotFound { .. })
        ));
    }
}
