//! JSON record store
//!
//! Categories, transactions and budgets live in one JSON array per file.
//! File order is preserved, since first-seen ordering of charts and budget
//! lines follows it.

use serde::Serialize;

use crate::config::paths::SikaiPaths;
use crate::engine::{plan_upsert, BudgetChange, BudgetWrite, Snapshot};
use crate::error::{SikaiError, SikaiResult};
use crate::models::{Budget, BudgetKey, Category, MonthKey, Transaction, UserId};

use super::file_io::{read_json, write_json_atomic};

/// Result of writing one budget change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetWriteOutcome {
    pub change: BudgetChange,
    pub write: BudgetWrite,
}

/// File-backed store for one data directory
#[derive(Debug, Clone)]
pub struct JsonStore {
    paths: SikaiPaths,
}

impl JsonStore {
    /// Open the store, creating its directories if needed
    pub fn open(paths: SikaiPaths) -> SikaiResult<Self> {
        paths.ensure_directories()?;
        Ok(Self { paths })
    }

    pub fn paths(&self) -> &SikaiPaths {
        &self.paths
    }

    pub fn categories(&self) -> SikaiResult<Vec<Category>> {
        read_json(self.paths.categories_file())
    }

    pub fn transactions(&self) -> SikaiResult<Vec<Transaction>> {
        read_json(self.paths.transactions_file())
    }

    pub fn budgets(&self) -> SikaiResult<Vec<Budget>> {
        read_json(self.paths.budgets_file())
    }

    pub fn save_categories(&self, categories: &[Category]) -> SikaiResult<()> {
        write_json_atomic(self.paths.categories_file(), &categories)
    }

    pub fn save_transactions(&self, transactions: &[Transaction]) -> SikaiResult<()> {
        write_json_atomic(self.paths.transactions_file(), &transactions)
    }

    pub fn save_budgets(&self, budgets: &[Budget]) -> SikaiResult<()> {
        write_json_atomic(self.paths.budgets_file(), &budgets)
    }

    /// Distinct record owners in first-seen order
    pub fn owners(&self) -> SikaiResult<Vec<UserId>> {
        let mut owners: Vec<UserId> = Vec::new();
        let ids = self
            .categories()?
            .into_iter()
            .map(|c| c.user_id)
            .chain(self.transactions()?.into_iter().map(|t| t.user_id))
            .chain(self.budgets()?.into_iter().map(|b| b.user_id));

        for id in ids {
            if !owners.contains(&id) {
                owners.push(id);
            }
        }
        Ok(owners)
    }

    /// Resolve which user to report on: an explicit id, else the only owner
    /// present in the store
    pub fn resolve_user(&self, explicit: Option<UserId>) -> SikaiResult<UserId> {
        if let Some(user) = explicit {
            return Ok(user);
        }
        match self.owners()?.as_slice() {
            [only] => Ok(*only),
            [] => Err(SikaiError::Config(
                "No records found; nothing to report on".into(),
            )),
            many => Err(SikaiError::Config(format!(
                "Store holds records of {} users; pass --user or set user_id in the config",
                many.len()
            ))),
        }
    }

    /// Load one user's records; records of other users are left out
    pub fn load_snapshot(&self, user_id: UserId) -> SikaiResult<Snapshot> {
        let snapshot = Snapshot {
            user_id,
            categories: self
                .categories()?
                .into_iter()
                .filter(|c| c.user_id == user_id)
                .collect(),
            transactions: self
                .transactions()?
                .into_iter()
                .filter(|t| t.user_id == user_id)
                .collect(),
            budgets: self
                .budgets()?
                .into_iter()
                .filter(|b| b.user_id == user_id)
                .collect(),
        };

        tracing::debug!(
            user = %user_id.short(),
            categories = snapshot.categories.len(),
            transactions = snapshot.transactions.len(),
            budgets = snapshot.budgets.len(),
            "snapshot loaded"
        );
        Ok(snapshot)
    }

    /// Persist budget edits for `month`, updating the existing row for each
    /// key or inserting a new one
    pub fn apply_budget_changes(
        &self,
        user_id: UserId,
        month: MonthKey,
        changes: &[BudgetChange],
    ) -> SikaiResult<Vec<BudgetWriteOutcome>> {
        if changes.is_empty() {
            return Ok(Vec::new());
        }

        let mut budgets = self.budgets()?;
        let mut outcomes = Vec::with_capacity(changes.len());

        for change in changes {
            if change.amount.is_negative() {
                return Err(SikaiError::Validation(format!(
                    "Budget amount cannot be negative: {}",
                    change.amount
                )));
            }

            let key = BudgetKey {
                category_id: change.category_id,
                month,
            };
            let write = plan_upsert(&budgets, user_id, key, change.amount);
            match &write {
                BudgetWrite::Update { id, amount } => {
                    let row = budgets
                        .iter_mut()
                        .find(|b| b.id == *id)
                        .ok_or_else(|| SikaiError::Storage(format!("Budget {} vanished", id)))?;
                    row.amount = *amount;
                }
                BudgetWrite::Insert(budget) => budgets.push(budget.clone()),
            }

            tracing::debug!(key = %key, amount = %change.amount, "budget upserted");
            outcomes.push(BudgetWriteOutcome {
                change: *change,
                write,
            });
        }

        self.save_budgets(&budgets)?;
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryId, CategoryKind, Money};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn create_test_store() -> (TempDir, JsonStore) {
        let temp_dir = TempDir::new().unwrap();
        let paths = SikaiPaths::with_base_dir(temp_dir.path().to_path_buf());
        let store = JsonStore::open(paths).unwrap();
        (temp_dir, store)
    }

    fn month() -> MonthKey {
        MonthKey::new(2025, 3).unwrap()
    }

    fn change(category_id: CategoryId, cents: i64) -> BudgetChange {
        BudgetChange {
            category_id,
            amount: Money::from_cents(cents),
            previous: None,
        }
    }

    #[test]
    fn test_empty_store() {
        let (_temp_dir, store) = create_test_store();
        assert!(store.categories().unwrap().is_empty());
        assert!(store.owners().unwrap().is_empty());
        assert!(store.resolve_user(None).is_err());
    }

    #[test]
    fn test_snapshot_filters_to_one_user() {
        let (_temp_dir, store) = create_test_store();
        let alice = UserId::new();
        let bob = UserId::new();
        let food = Category::new(alice, "Food", CategoryKind::Expense);
        let rent = Category::new(bob, "Rent", CategoryKind::Expense);
        store.save_categories(&[food.clone(), rent]).unwrap();
        store
            .save_transactions(&[Transaction::new(
                alice,
                Some(food.id),
                NaiveDate::from_ymd_opt(2025, 3, 2).unwrap(),
                Money::from_cents(1200),
            )])
            .unwrap();

        let snapshot = store.load_snapshot(alice).unwrap();

        assert_eq!(snapshot.categories, vec![food]);
        assert_eq!(snapshot.transactions.len(), 1);
        assert!(snapshot.ensure_single_owner().is_ok());
        assert_eq!(store.owners().unwrap(), vec![alice, bob]);
        assert!(store.resolve_user(None).is_err());
        assert_eq!(store.resolve_user(Some(bob)).unwrap(), bob);
    }

    #[test]
    fn test_apply_budget_changes_upserts() {
        let (_temp_dir, store) = create_test_store();
        let user = UserId::new();
        let food = CategoryId::new();
        let rent = CategoryId::new();
        let existing = Budget::new(user, food, month(), Money::from_cents(100));
        store.save_budgets(&[existing.clone()]).unwrap();

        let outcomes = store
            .apply_budget_changes(user, month(), &[change(food, 250), change(rent, 900)])
            .unwrap();

        assert!(matches!(outcomes[0].write, BudgetWrite::Update { id, .. } if id == existing.id));
        assert!(matches!(outcomes[1].write, BudgetWrite::Insert(_)));

        let stored = store.budgets().unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].amount.cents(), 250);
        assert_eq!(stored[1].category_id, rent);
    }

    #[test]
    fn test_repeated_saves_never_duplicate() {
        let (_temp_dir, store) = create_test_store();
        let user = UserId::new();
        let food = CategoryId::new();

        store.apply_budget_changes(user, month(), &[change(food, 100)]).unwrap();
        store.apply_budget_changes(user, month(), &[change(food, 200)]).unwrap();

        let stored = store.budgets().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].amount.cents(), 200);
    }

    #[test]
    fn test_negative_change_rejected_without_writing() {
        let (_temp_dir, store) = create_test_store();
        let user = UserId::new();

        let result = store.apply_budget_changes(user, month(), &[change(CategoryId::new(), -5)]);

        assert!(result.unwrap_err().is_validation());
        assert!(!store.paths().budgets_file().exists());
    }
}
