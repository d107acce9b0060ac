use chrono::NaiveDateTime;
use rust_decimal::Decimal;

/// One recorded financial event.
/// Plain immutable value: the Ledger is the only place mutation policy lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub id: u64,
    pub description: String,
    /// Signed: positive = income, negative = expense
    pub amount: Decimal,
    pub date: NaiveDateTime,
}

impl Transaction {
    pub fn new(id: u64, description: impl Into<String>, amount: Decimal, date: NaiveDateTime) -> Self {
        Self {
            id,
            description: description.into(),
            amount,
            date,
        }
    }

    pub fn is_income(&self) -> bool {
        self.amount.is_sign_positive() && !self.amount.is_zero()
    }

    pub fn is_expense(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }
}
