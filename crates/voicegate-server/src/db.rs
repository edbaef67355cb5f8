use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::sync::{Arc, Mutex, MutexGuard};
use voicegate::quota::{decide_reservation, ReservationDecision};
use voicegate::{IdentityAdmin, IdentityError, Plan, PlanSource, UserAccount};

use crate::error::ApiError;

const ACCOUNT_COLUMNS: &str =
    "uid, plan, total_tokens_used, created_at, updated_at, last_plan_sync_source";

/// SQLite-backed account store.
///
/// Also backs the local identity admin: custom claims and the token
/// revocation cut-off live in `identity_claims`.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn new(path: &str) -> Result<Self, ApiError> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_schema()?;
        Ok(db)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, ApiError> {
        self.conn
            .lock()
            .map_err(|_| ApiError::Internal("database lock poisoned".to_string()))
    }

    fn init_schema(&self) -> Result<(), ApiError> {
        let conn = self.lock()?;

        // Enable WAL mode for better concurrent read/write performance
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS user_accounts (
                uid TEXT PRIMARY KEY,
                plan TEXT NOT NULL DEFAULT 'free',
                total_tokens_used INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                last_plan_sync_source TEXT
            )
            "#,
            [],
        )?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS identity_claims (
                uid TEXT PRIMARY KEY,
                premium INTEGER NOT NULL DEFAULT 0,
                tokens_valid_after INTEGER NOT NULL DEFAULT 0,
                updated_at INTEGER NOT NULL
            )
            "#,
            [],
        )?;

        Ok(())
    }

    /// Liveness check for `/health`.
    pub fn ping(&self) -> Result<(), ApiError> {
        let conn = self.lock()?;
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
    }

    pub fn get_account(&self, uid: &str) -> Result<Option<UserAccount>, ApiError> {
        let conn = self.lock()?;
        let account = conn
            .query_row(
                &format!("SELECT {ACCOUNT_COLUMNS} FROM user_accounts WHERE uid = ?1"),
                params![uid],
                account_from_row,
            )
            .optional()?;
        Ok(account)
    }

    /// Reserve `cost` tokens for `uid`.
    ///
    /// Read, cap check and write run in one `BEGIN IMMEDIATE` transaction, so
    /// concurrent reservations on the same account serialise and the check
    /// can never be split from the increment. Premium callers (claim or
    /// stored plan) are not charged, but the record is still touched.
    pub fn reserve_tokens(
        &self,
        uid: &str,
        cost: u64,
        cap: u64,
        premium_claim: bool,
    ) -> Result<ReservationDecision, ApiError> {
        let mut conn = self.lock()?;
        let now = chrono::Utc::now().timestamp();

        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing = tx
            .query_row(
                &format!("SELECT {ACCOUNT_COLUMNS} FROM user_accounts WHERE uid = ?1"),
                params![uid],
                account_from_row,
            )
            .optional()?;

        // Dropping `tx` on the error path rolls back; nothing was written.
        let decision = decide_reservation(existing.as_ref(), cost, cap, premium_claim)?;
        let charge = to_sql_int(decision.charge)?;

        tx.execute(
            r#"
            INSERT INTO user_accounts (uid, plan, total_tokens_used, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            ON CONFLICT(uid) DO UPDATE SET
                plan = ?2,
                total_tokens_used = total_tokens_used + ?3,
                updated_at = ?4
            "#,
            params![uid, decision.plan.as_str(), charge, now],
        )?;

        tx.commit()?;
        Ok(decision)
    }

    /// Give back `tokens` previously reserved for `uid`.
    ///
    /// Not transactional with the reservation. The counter never drops
    /// below zero. Fails if the account does not exist.
    pub fn refund_tokens(&self, uid: &str, tokens: u64) -> Result<(), ApiError> {
        let conn = self.lock()?;
        let now = chrono::Utc::now().timestamp();

        let rows = conn.execute(
            r#"
            UPDATE user_accounts
            SET total_tokens_used = MAX(total_tokens_used - ?2, 0), updated_at = ?3
            WHERE uid = ?1
            "#,
            params![uid, to_sql_int(tokens)?, now],
        )?;

        if rows == 0 {
            return Err(ApiError::Internal(format!(
                "refund target account not found: {uid}"
            )));
        }
        Ok(())
    }

    /// Merge-write the plan and its provenance, creating the account if
    /// needed. The token counter and `created_at` of an existing record are
    /// left untouched.
    pub fn set_plan(&self, uid: &str, plan: Plan, source: PlanSource) -> Result<(), ApiError> {
        let conn = self.lock()?;
        let now = chrono::Utc::now().timestamp();

        conn.execute(
            r#"
            INSERT INTO user_accounts (uid, plan, total_tokens_used, created_at, updated_at, last_plan_sync_source)
            VALUES (?1, ?2, 0, ?3, ?3, ?4)
            ON CONFLICT(uid) DO UPDATE SET
                plan = ?2,
                updated_at = ?3,
                last_plan_sync_source = ?4
            "#,
            params![uid, plan.as_str(), now, source.as_str()],
        )?;

        Ok(())
    }

    /// Write the `premium` custom claim for `uid`.
    pub fn upsert_premium_claim(&self, uid: &str, premium: bool) -> Result<(), ApiError> {
        let conn = self.lock()?;
        let now = chrono::Utc::now().timestamp();

        conn.execute(
            r#"
            INSERT INTO identity_claims (uid, premium, tokens_valid_after, updated_at)
            VALUES (?1, ?2, 0, ?3)
            ON CONFLICT(uid) DO UPDATE SET premium = ?2, updated_at = ?3
            "#,
            params![uid, premium, now],
        )?;

        Ok(())
    }

    #[cfg(test)]
    pub fn premium_claim(&self, uid: &str) -> Result<Option<bool>, ApiError> {
        let conn = self.lock()?;
        let premium = conn
            .query_row(
                "SELECT premium FROM identity_claims WHERE uid = ?1",
                params![uid],
                |row| row.get::<_, bool>(0),
            )
            .optional()?;
        Ok(premium)
    }

    /// Reject every credential for `uid` issued before now.
    pub fn upsert_revocation(&self, uid: &str) -> Result<(), ApiError> {
        let conn = self.lock()?;
        let now = chrono::Utc::now().timestamp();

        conn.execute(
            r#"
            INSERT INTO identity_claims (uid, premium, tokens_valid_after, updated_at)
            VALUES (?1, 0, ?2, ?2)
            ON CONFLICT(uid) DO UPDATE SET tokens_valid_after = ?2, updated_at = ?2
            "#,
            params![uid, now],
        )?;

        Ok(())
    }

    /// Unix seconds before which credentials for `uid` are rejected.
    pub fn tokens_valid_after(&self, uid: &str) -> Result<Option<i64>, ApiError> {
        let conn = self.lock()?;
        let cutoff = conn
            .query_row(
                "SELECT tokens_valid_after FROM identity_claims WHERE uid = ?1",
                params![uid],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(cutoff.filter(|c| *c > 0))
    }
}

#[async_trait]
impl IdentityAdmin for Database {
    async fn set_premium_claim(&self, uid: &str, premium: bool) -> Result<(), IdentityError> {
        self.upsert_premium_claim(uid, premium)
            .map_err(|e| IdentityError::Backend(e.to_string()))
    }

    async fn revoke_tokens(&self, uid: &str) -> Result<(), IdentityError> {
        self.upsert_revocation(uid).map_err(|e| IdentityError::Backend(e.to_string()))
    }
}

fn account_from_row(row: &Row<'_>) -> rusqlite::Result<UserAccount> {
    let plan: String = row.get(1)?;
    let source: Option<String> = row.get(5)?;
    Ok(UserAccount {
        uid: row.get(0)?,
        // Unknown values read as free, like a missing field would.
        plan: plan.parse().unwrap_or_default(),
        total_tokens_used: row.get::<_, i64>(2)?.max(0) as u64,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
        last_plan_sync_source: source.and_then(|s| s.parse().ok()),
    })
}

fn to_sql_int(value: u64) -> Result<i64, ApiError> {
    i64::try_from(value)
        .map_err(|_| ApiError::InvalidArgument(format!("token count out of range: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> Database {
        Database::new(":memory:").unwrap()
    }

    #[test]
    fn test_reserve_creates_free_account() {
        let db = db();
        let d = db.reserve_tokens("u1", 120, 1000, false).unwrap();
        assert!(!d.existed);
        assert_eq!(d.charge, 120);

        let acct = db.get_account("u1").unwrap().unwrap();
        assert_eq!(acct.plan, Plan::Free);
        assert_eq!(acct.total_tokens_used, 120);
        assert!(acct.last_plan_sync_source.is_none());
    }

    #[test]
    fn test_reserve_accumulates_and_stops_at_cap() {
        let db = db();
        db.reserve_tokens("u1", 600, 1000, false).unwrap();
        db.reserve_tokens("u1", 400, 1000, false).unwrap();

        let err = db.reserve_tokens("u1", 1, 1000, false).unwrap_err();
        match err {
            ApiError::ResourceExhausted(msg) => assert_eq!(msg, "Token limit exceeded: 1000/1000"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(db.get_account("u1").unwrap().unwrap().total_tokens_used, 1000);
    }

    #[test]
    fn test_rejected_reservation_writes_nothing() {
        let db = db();
        assert!(db.reserve_tokens("new-user", 5000, 1000, false).is_err());
        assert!(db.get_account("new-user").unwrap().is_none());
    }

    #[test]
    fn test_premium_plan_is_touched_but_not_charged() {
        let db = db();
        db.set_plan("u1", Plan::Premium, PlanSource::Webhook).unwrap();
        let d = db.reserve_tokens("u1", 50_000, 1000, false).unwrap();
        assert!(d.is_premium);

        let acct = db.get_account("u1").unwrap().unwrap();
        assert_eq!(acct.total_tokens_used, 0);
        assert_eq!(acct.plan, Plan::Premium);
        assert_eq!(acct.last_plan_sync_source, Some(PlanSource::Webhook));
    }

    #[test]
    fn test_concurrent_reservations_never_exceed_cap() {
        let db = db();
        let handles: Vec<_> = (0..20)
            .map(|_| {
                let db = db.clone();
                std::thread::spawn(move || db.reserve_tokens("u1", 100, 1000, false))
            })
            .collect();

        let mut granted = 0;
        for handle in handles {
            match handle.join().unwrap() {
                Ok(_) => granted += 1,
                Err(ApiError::ResourceExhausted(_)) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(granted, 10);
        assert_eq!(db.get_account("u1").unwrap().unwrap().total_tokens_used, 1000);
    }

    #[test]
    fn test_refund_restores_counter() {
        let db = db();
        db.reserve_tokens("u1", 300, 1000, false).unwrap();
        db.reserve_tokens("u1", 200, 1000, false).unwrap();
        db.refund_tokens("u1", 200).unwrap();
        assert_eq!(db.get_account("u1").unwrap().unwrap().total_tokens_used, 300);
    }

    #[test]
    fn test_refund_never_goes_negative_and_needs_account() {
        let db = db();
        db.reserve_tokens("u1", 10, 1000, false).unwrap();
        db.refund_tokens("u1", 50).unwrap();
        assert_eq!(db.get_account("u1").unwrap().unwrap().total_tokens_used, 0);
        assert!(db.refund_tokens("ghost", 1).is_err());
    }

    #[test]
    fn test_set_plan_keeps_counter_and_created_at() {
        let db = db();
        db.reserve_tokens("u1", 42, 1000, false).unwrap();
        let before = db.get_account("u1").unwrap().unwrap();

        db.set_plan("u1", Plan::Premium, PlanSource::Client).unwrap();
        let after = db.get_account("u1").unwrap().unwrap();
        assert_eq!(after.plan, Plan::Premium);
        assert_eq!(after.total_tokens_used, 42);
        assert_eq!(after.created_at, before.created_at);
        assert_eq!(after.last_plan_sync_source, Some(PlanSource::Client));
    }

    #[test]
    fn test_claims_and_revocation() {
        let db = db();
        assert_eq!(db.premium_claim("u1").unwrap(), None);
        assert_eq!(db.tokens_valid_after("u1").unwrap(), None);

        db.upsert_premium_claim("u1", true).unwrap();
        assert_eq!(db.premium_claim("u1").unwrap(), Some(true));
        // Setting a claim alone does not revoke anything.
        assert_eq!(db.tokens_valid_after("u1").unwrap(), None);

        db.upsert_revocation("u1").unwrap();
        assert!(db.tokens_valid_after("u1").unwrap().is_some());
        assert_eq!(db.premium_claim("u1").unwrap(), Some(true));
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.db");
        let path = path.to_str().unwrap();

        Database::new(path)
            .unwrap()
            .reserve_tokens("u1", 7, 1000, false)
            .unwrap();
        let reopened = Database::new(path).unwrap();
        assert_eq!(reopened.get_account("u1").unwrap().unwrap().total_tokens_used, 7);
    }
}
