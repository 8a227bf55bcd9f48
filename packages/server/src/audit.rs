//! Fire-and-forget audit trail.
//!
//! Callers enqueue events without awaiting; a single background worker
//! persists them. A full queue or a failed insert drops the event.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::entity::audit_log;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    FileUpload,
    FileDelete,
    FileSharePublic,
    FileUnsharePublic,
    FileShareUser,
    FileUnshareSelf,
    FileDownloadAuth,
    FileDownloadPublic,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FileUpload => "FILE_UPLOAD",
            Self::FileDelete => "FILE_DELETE",
            Self::FileSharePublic => "FILE_SHARE_PUBLIC",
            Self::FileUnsharePublic => "FILE_UNSHARE_PUBLIC",
            Self::FileShareUser => "FILE_SHARE_USER",
            Self::FileUnshareSelf => "FILE_UNSHARE_SELF",
            Self::FileDownloadAuth => "FILE_DOWNLOAD_AUTH",
            Self::FileDownloadPublic => "FILE_DOWNLOAD_PUBLIC",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuditEvent {
    pub user_id: Option<i32>,
    pub target_id: Option<i32>,
    pub action: AuditAction,
    pub details: Value,
}

impl AuditEvent {
    pub fn new(
        user_id: Option<i32>,
        target_id: Option<i32>,
        action: AuditAction,
        details: Value,
    ) -> Self {
        Self {
            user_id,
            target_id,
            action,
            details,
        }
    }
}

/// Handle for submitting audit events.
#[derive(Clone)]
pub struct AuditLog {
    tx: mpsc::Sender<AuditEvent>,
}

impl AuditLog {
    /// Start the persistence worker and return a handle to it.
    pub fn spawn(db: DatabaseConnection, capacity: usize) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(run_worker(db, rx));
        (Self { tx }, handle)
    }

    /// Enqueue an event. Never blocks and never fails the caller.
    pub fn record(&self, event: AuditEvent) {
        let action = event.action.as_str();
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(action, "Audit queue full, dropping event");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!(action, "Audit worker stopped, dropping event");
            }
        }
    }
}

async fn run_worker(db: DatabaseConnection, mut rx: mpsc::Receiver<AuditEvent>) {
    info!("Starting audit log worker");

    while let Some(event) = rx.recv().await {
        let action = event.action.as_str();
        let entry = audit_log::ActiveModel {
            user_id: Set(event.user_id),
            target_id: Set(event.target_id),
            action: Set(action.to_string()),
            details: Set(event.details),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        if let Err(e) = entry.insert(&db).await {
            error!(action, user_id = ?event.user_id, error = %e, "Failed to write audit log");
        }
    }

    info!("Audit log worker stopped");
}
