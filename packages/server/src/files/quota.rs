use std::collections::HashSet;

use common::storage::ContentHash;
use sea_orm::{ConnectionTrait, DbBackend, DbErr, FromQueryResult, Statement};

use super::registry;
use crate::error::AppError;

/// Rejection produced by [`QuotaLedger::admit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("storage quota exceeded: {current_bytes} of {limit_bytes} bytes in use")]
pub struct QuotaExceeded {
    /// Usage including bytes already admitted earlier in the batch.
    pub current_bytes: u64,
    pub limit_bytes: u64,
}

impl From<QuotaExceeded> for AppError {
    fn from(e: QuotaExceeded) -> Self {
        AppError::QuotaExceeded {
            current_bytes: e.current_bytes,
            limit_bytes: e.limit_bytes,
        }
    }
}

/// Running quota accounting for one upload batch.
///
/// Only content that is new to the registry and not yet counted in this
/// batch adds to usage; duplicates are admitted for free.
#[derive(Debug)]
pub struct QuotaLedger {
    current_usage: u64,
    limit: u64,
    new_bytes: u64,
    counted: HashSet<ContentHash>,
}

impl QuotaLedger {
    pub fn new(current_usage: u64, limit: u64) -> Self {
        Self {
            current_usage,
            limit,
            new_bytes: 0,
            counted: HashSet::new(),
        }
    }

    /// Admit one file of the batch, in arrival order.
    ///
    /// `persisted` tells whether the fingerprint already exists in the
    /// physical file registry.
    pub fn admit(
        &mut self,
        hash: ContentHash,
        size: u64,
        persisted: bool,
    ) -> Result<(), QuotaExceeded> {
        if persisted || self.counted.contains(&hash) {
            return Ok(());
        }

        let used = self.current_usage.saturating_add(self.new_bytes);
        if used.saturating_add(size) > self.limit {
            return Err(QuotaExceeded {
                current_bytes: used,
                limit_bytes: self.limit,
            });
        }

        self.new_bytes += size;
        self.counted.insert(hash);
        Ok(())
    }

    pub fn new_bytes(&self) -> u64 {
        self.new_bytes
    }
}

/// Admit a whole batch of `(fingerprint, size)` pairs against the owner's quota.
///
/// Nothing is reserved in the database; the check only decides whether the
/// batch may start. Returns the number of new bytes the batch will add.
pub async fn check_and_reserve<C: ConnectionTrait>(
    db: &C,
    owner_id: i32,
    limit: u64,
    batch: &[(ContentHash, u64)],
) -> Result<u64, AppError> {
    let usage = current_usage(db, owner_id).await?;
    let hashes: Vec<ContentHash> = batch.iter().map(|(hash, _)| *hash).collect();
    let persisted = registry::persisted_hashes(db, &hashes).await?;

    let mut ledger = QuotaLedger::new(usage, limit);
    for (hash, size) in batch {
        ledger.admit(*hash, *size, persisted.contains(hash))?;
    }
    Ok(ledger.new_bytes())
}

#[derive(Debug, FromQueryResult)]
struct UsageRow {
    total: i64,
}

/// Deduplicated usage: sizes of the distinct physical files the owner references.
pub async fn current_usage<C: ConnectionTrait>(db: &C, owner_id: i32) -> Result<u64, DbErr> {
    let row = UsageRow::find_by_statement(Statement::from_sql_and_values(
        DbBackend::Postgres,
        r#"SELECT COALESCE(SUM(pf.size_bytes), 0)::BIGINT AS total
           FROM physical_file pf
           WHERE pf.id IN (SELECT DISTINCT physical_file_id FROM user_file WHERE owner_id = $1)"#,
        [owner_id.into()],
    ))
    .one(db)
    .await?;

    Ok(row.map(|r| r.total.max(0) as u64).unwrap_or(0))
}
