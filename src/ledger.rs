// Ledger - authoritative in-memory transaction set + derived balance
//
// Invariants held after every public call:
//   balance == sum(amount) over present transactions
//   ids are unique; next_id > every id ever assigned in this process
//   income total and expense total each fit in a Decimal, so the balance
//   and every summary are computable without overflow

use crate::error::{Result, TrackerError};
use crate::money::parse_amount;
use crate::transaction::Transaction;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use std::collections::HashSet;

/// Aggregate income/expense totals.
/// `total_expense` stays negative; use `absolute_expense()` for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Summary {
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub net_balance: Decimal,
}

impl Summary {
    pub fn absolute_expense(&self) -> Decimal {
        self.total_expense.abs()
    }
}

/// Income and expense sums kept apart: each is monotonic in magnitude,
/// so if both fit, any subset of them (and their net) fits too.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Totals {
    pub income: Decimal,
    pub expense: Decimal,
}

impl Totals {
    /// Fold one amount in; `None` when either sum would overflow.
    pub fn push(&mut self, amount: Decimal) -> Option<()> {
        if amount.is_sign_positive() {
            self.income = self.income.checked_add(amount)?;
        } else {
            self.expense = self.expense.checked_add(amount)?;
        }
        Some(())
    }
}

pub(crate) fn checked_totals(transactions: &[Transaction]) -> Option<Totals> {
    let mut totals = Totals::default();
    for tx in transactions {
        totals.push(tx.amount)?;
    }
    Some(totals)
}

#[derive(Debug, Clone)]
pub struct Ledger {
    transactions: Vec<Transaction>,
    balance: Decimal,
    next_id: u64,
    revision: u64,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            transactions: Vec::new(),
            balance: Decimal::ZERO,
            next_id: 1,
            revision: 0,
        }
    }

    /// Parse `amount_text` and append a new transaction dated `when`.
    /// Invalid or out-of-range amounts leave the ledger untouched.
    pub fn add(&mut self, description: &str, amount_text: &str, when: NaiveDateTime) -> Result<Transaction> {
        let amount = parse_amount(amount_text)?;

        let next_id = self.next_id.checked_add(1).ok_or(TrackerError::IdsExhausted)?;
        let mut totals = checked_totals(&self.transactions).ok_or(TrackerError::Overflow)?;
        totals.push(amount).ok_or(TrackerError::Overflow)?;
        let balance = self.balance.checked_add(amount).ok_or(TrackerError::Overflow)?;

        let transaction = Transaction::new(self.next_id, description, amount, when);
        self.next_id = next_id;
        self.balance = balance;
        self.transactions.push(transaction.clone());
        self.revision += 1;

        tracing::debug!(id = transaction.id, %amount, balance = %self.balance, "transaction added");
        Ok(transaction)
    }

    /// Remove the transaction with `id` and return it.
    pub fn delete(&mut self, id: u64) -> Result<Transaction> {
        let index = self
            .transactions
            .iter()
            .position(|tx| tx.id == id)
            .ok_or(TrackerError::NotFound(id))?;

        let balance = self
            .balance
            .checked_sub(self.transactions[index].amount)
            .ok_or(TrackerError::Overflow)?;

        let removed = self.transactions.remove(index);
        self.balance = balance;
        self.revision += 1;

        tracing::debug!(id, amount = %removed.amount, balance = %self.balance, "transaction deleted");
        Ok(removed)
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    /// Income/expense totals, recomputed from current state on every call.
    pub fn summary(&self) -> Summary {
        // add/replace_all keep both totals in range, so saturation never kicks in
        let totals = self.transactions.iter().fold(Totals::default(), |mut totals, tx| {
            if tx.is_income() {
                totals.income = totals.income.saturating_add(tx.amount);
            } else if tx.is_expense() {
                totals.expense = totals.expense.saturating_add(tx.amount);
            }
            totals
        });

        Summary {
            total_income: totals.income,
            total_expense: totals.expense,
            net_balance: totals.income + totals.expense,
        }
    }

    /// Install a loaded collection in place of the current one.
    ///
    /// Rejects duplicate ids without touching current state. `next_id`
    /// never moves backwards, so ids handed out earlier in this process
    /// are not reissued.
    pub fn replace_all(&mut self, transactions: Vec<Transaction>) -> Result<()> {
        let mut seen = HashSet::with_capacity(transactions.len());
        for tx in &transactions {
            if !seen.insert(tx.id) {
                return Err(TrackerError::DuplicateId(tx.id));
            }
        }

        let max_id = transactions.iter().map(|tx| tx.id).max().unwrap_or(0);
        let after_max = max_id.checked_add(1).ok_or(TrackerError::IdsExhausted)?;
        let totals = checked_totals(&transactions).ok_or(TrackerError::Overflow)?;

        self.next_id = self.next_id.max(after_max);
        self.transactions = transactions;
        self.balance = totals.income + totals.expense;
        self.revision += 1;

        tracing::debug!(
            count = self.transactions.len(),
            next_id = self.next_id,
            balance = %self.balance,
            "ledger replaced"
        );
        Ok(())
    }

    /// Sum of amounts from scratch, independent of the running balance.
    pub fn recomputed_balance(&self) -> Decimal {
        self.transactions
            .iter()
            .fold(Decimal::ZERO, |sum, tx| sum.saturating_add(tx.amount))
    }

    /// Transactions in insertion (display) order.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn get(&self, id: u64) -> Option<&Transaction> {
        self.transactions.iter().find(|tx| tx.id == id)
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Bumped on every mutation; views re-render when it changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap().and_hms_opt(9, 30, 0).unwrap()
    }

    fn assert_balance_invariant(ledger: &Ledger) {
        assert_eq!(
            ledger.balance(),
            ledger.recomputed_balance(),
            "running balance drifted from the sum of amounts"
        );
    }

    #[test]
    fn test_salary_and_rent_balance() {
        let mut ledger = Ledger::new();
        ledger.add("Salary", "1500.00", day(1)).unwrap();
        ledger.add("Rent", "-600.00", day(2)).unwrap();

        assert_eq!(ledger.balance(), dec("900.00"));
        assert_balance_invariant(&ledger);
    }

    #[test]
    fn test_add_invalid_amount_leaves_ledger_unchanged() {
        let mut ledger = Ledger::new();
        ledger.add("Coffee", "-3.50", day(1)).unwrap();
        let revision = ledger.revision();

        let err = ledger.add("Broken", "abc", day(2)).unwrap_err();

        assert!(matches!(err, TrackerError::Parse { .. }));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.balance(), dec("-3.50"));
        assert_eq!(ledger.next_id(), 2);
        assert_eq!(ledger.revision(), revision);
    }

    #[test]
    fn test_delete_unknown_id() {
        let mut ledger = Ledger::new();
        ledger.add("A", "10", day(1)).unwrap();

        let err = ledger.delete(42).unwrap_err();

        assert!(matches!(err, TrackerError::NotFound(42)));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.balance(), dec("10"));
    }

    #[test]
    fn test_delete_first_keeps_second() {
        let mut ledger = Ledger::new();
        let first = ledger.add("First", "250", day(1)).unwrap();
        let second = ledger.add("Second", "-75.25", day(2)).unwrap();

        let removed = ledger.delete(first.id).unwrap();

        assert_eq!(removed, first);
        assert_eq!(ledger.transactions(), &[second.clone()]);
        assert_eq!(ledger.balance(), second.amount);
        assert_balance_invariant(&ledger);
    }

    #[test]
    fn test_summary_income_expense_net() {
        let mut ledger = Ledger::new();
        ledger.add("A", "100", day(1)).unwrap();
        ledger.add("B", "-40", day(2)).unwrap();

        let summary = ledger.summary();

        assert_eq!(summary.total_income, dec("100"));
        assert_eq!(summary.total_expense, dec("-40"));
        assert_eq!(summary.absolute_expense(), dec("40"));
        assert_eq!(summary.net_balance, dec("60"));
        assert_eq!(summary, ledger.summary(), "summary must be idempotent");
    }

    #[test]
    fn test_summary_ignores_zero_amounts() {
        let mut ledger = Ledger::new();
        ledger.add("Nothing", "0", day(1)).unwrap();

        assert_eq!(ledger.summary(), Summary::default());
    }

    #[test]
    fn test_ids_never_reused_after_delete() {
        let mut ledger = Ledger::new();
        let mut ever_assigned = Vec::new();

        for (i, amount) in ["5", "-2", "7.5", "-1.25", "3"].iter().enumerate() {
            let tx = ledger.add(&format!("tx{i}"), amount, day(1)).unwrap();
            ever_assigned.push(tx.id);
            assert_balance_invariant(&ledger);

            if i % 2 == 1 {
                ledger.delete(tx.id).unwrap();
                assert_balance_invariant(&ledger);
            }
        }
        let last = ledger.transactions().last().map(|tx| tx.id).unwrap();
        ledger.delete(last).unwrap();
        let again = ledger.add("again", "1", day(2)).unwrap();
        ever_assigned.push(again.id);

        let mut unique = ever_assigned.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), ever_assigned.len(), "an id was reissued");
        assert!(ever_assigned.iter().all(|id| *id < ledger.next_id()));
        assert_balance_invariant(&ledger);
    }

    #[test]
    fn test_replace_all_recomputes_state() {
        let mut ledger = Ledger::new();
        let loaded = vec![
            Transaction::new(3, "Bonus", dec("200"), day(1)),
            Transaction::new(8, "Groceries", dec("-55.10"), day(2)),
        ];

        ledger.replace_all(loaded.clone()).unwrap();

        assert_eq!(ledger.transactions(), loaded.as_slice());
        assert_eq!(ledger.balance(), dec("144.90"));
        assert_eq!(ledger.next_id(), 9);

        let tx = ledger.add("Next", "1", day(3)).unwrap();
        assert_eq!(tx.id, 9);
    }

    #[test]
    fn test_replace_all_empty_on_fresh_ledger() {
        let mut ledger = Ledger::new();
        ledger.replace_all(Vec::new()).unwrap();

        assert!(ledger.is_empty());
        assert_eq!(ledger.next_id(), 1);
        assert_eq!(ledger.balance(), Decimal::ZERO);
    }

    #[test]
    fn test_replace_all_keeps_next_id_monotonic() {
        let mut ledger = Ledger::new();
        for _ in 0..5 {
            ledger.add("x", "1", day(1)).unwrap();
        }
        assert_eq!(ledger.next_id(), 6);

        ledger
            .replace_all(vec![Transaction::new(2, "old", dec("10"), day(1))])
            .unwrap();

        assert_eq!(ledger.next_id(), 6);
        assert_eq!(ledger.balance(), dec("10"));
    }

    #[test]
    fn test_replace_all_rejects_duplicate_ids() {
        let mut ledger = Ledger::new();
        ledger.add("Keep", "12", day(1)).unwrap();

        let err = ledger
            .replace_all(vec![
                Transaction::new(4, "a", dec("1"), day(1)),
                Transaction::new(4, "b", dec("2"), day(2)),
            ])
            .unwrap_err();

        assert!(matches!(err, TrackerError::DuplicateId(4)));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.get(1).map(|tx| tx.description.as_str()), Some("Keep"));
        assert_eq!(ledger.balance(), dec("12"));
    }

    #[test]
    fn test_revision_tracks_mutations() {
        let mut ledger = Ledger::new();
        assert_eq!(ledger.revision(), 0);

        let tx = ledger.add("A", "1", day(1)).unwrap();
        assert_eq!(ledger.revision(), 1);

        let _ = ledger.summary();
        let _ = ledger.balance();
        assert_eq!(ledger.revision(), 1);

        ledger.delete(tx.id).unwrap();
        assert_eq!(ledger.revision(), 2);
    }

    #[test]
    fn test_add_overflowing_amount_is_rejected() {
        let mut ledger = Ledger::new();
        let max = Decimal::MAX.to_string();
        ledger.add("big", &max, day(1)).unwrap();
        let revision = ledger.revision();

        let err = ledger.add("big2", "1", day(2)).unwrap_err();

        assert!(matches!(err, TrackerError::Overflow));
        assert!(err.is_user_error());
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.balance(), Decimal::MAX);
        assert_eq!(ledger.next_id(), 2);
        assert_eq!(ledger.revision(), revision);
        assert_eq!(ledger.summary().total_income, Decimal::MAX);
    }

    #[test]
    fn test_add_keeps_both_totals_in_range() {
        let mut ledger = Ledger::new();
        ledger.add("huge income", &Decimal::MAX.to_string(), day(1)).unwrap();
        ledger.add("small expense", "-1", day(2)).unwrap();

        // Balance would fit, but the income total would not
        let err = ledger.add("one more", "1", day(3)).unwrap_err();
        assert!(matches!(err, TrackerError::Overflow));

        let expense = ledger.transactions()[1].id;
        ledger.delete(expense).unwrap();
        assert_eq!(ledger.balance(), Decimal::MAX);
        assert_balance_invariant(&ledger);

        let mut debts = Ledger::new();
        debts.add("huge expense", &Decimal::MIN.to_string(), day(1)).unwrap();
        assert!(matches!(debts.add("more", "-1", day(2)), Err(TrackerError::Overflow)));
        assert_eq!(debts.summary().total_expense, Decimal::MIN);
    }

    #[test]
    fn test_replace_all_rejects_overflowing_totals() {
        let mut ledger = Ledger::new();
        ledger.add("Keep", "12", day(1)).unwrap();

        let err = ledger
            .replace_all(vec![
                Transaction::new(1, "a", Decimal::MAX, day(1)),
                Transaction::new(2, "b", dec("1"), day(2)),
            ])
            .unwrap_err();

        assert!(matches!(err, TrackerError::Overflow));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.balance(), dec("12"));
    }

    #[test]
    fn test_replace_all_with_last_possible_id() {
        let mut ledger = Ledger::new();
        ledger.add("Keep", "1", day(1)).unwrap();

        let err = ledger
            .replace_all(vec![Transaction::new(u64::MAX, "last", dec("1"), day(1))])
            .unwrap_err();

        assert!(matches!(err, TrackerError::IdsExhausted));
        assert_eq!(ledger.next_id(), 2);
        assert_eq!(ledger.get(1).map(|tx| tx.description.as_str()), Some("Keep"));
    }

    #[test]
    fn test_add_when_ids_run_out() {
        let mut ledger = Ledger::new();
        ledger
            .replace_all(vec![Transaction::new(u64::MAX - 1, "almost", dec("5"), day(1))])
            .unwrap();
        assert_eq!(ledger.next_id(), u64::MAX);

        let err = ledger.add("no id left", "1", day(2)).unwrap_err();

        assert!(matches!(err, TrackerError::IdsExhausted));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.balance(), dec("5"));
        assert!(ledger.transactions().iter().all(|tx| tx.id < ledger.next_id()));
    }
}
