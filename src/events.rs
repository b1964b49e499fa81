//! 领域事件
//! 状态变更事件先挂在请求事务上，提交成功后才广播给监听方

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::{AppError, Result};

/// 事件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ItemSubmitted,
    ItemAutoApproved,
    ItemApproved,
    ItemDenied,
    ItemRevision,
    ItemInactivated,
    ItemDeleted,
    ClaimSubmitted,
    ClaimReviewAdvanced,
    ClaimPreapproved,
    ClaimReceiptRequested,
    ClaimRevision,
    ClaimApproved,
    ClaimDenied,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::ItemSubmitted => "item_submitted",
            EventKind::ItemAutoApproved => "item_auto_approved",
            EventKind::ItemApproved => "item_approved",
            EventKind::ItemDenied => "item_denied",
            EventKind::ItemRevision => "item_revision",
            EventKind::ItemInactivated => "item_inactivated",
            EventKind::ItemDeleted => "item_deleted",
            EventKind::ClaimSubmitted => "claim_submitted",
            EventKind::ClaimReviewAdvanced => "claim_review_advanced",
            EventKind::ClaimPreapproved => "claim_preapproved",
            EventKind::ClaimReceiptRequested => "claim_receipt_requested",
            EventKind::ClaimRevision => "claim_revision",
            EventKind::ClaimApproved => "claim_approved",
            EventKind::ClaimDenied => "claim_denied",
        }
    }

    /// 实体名称，用于指标标签
    pub fn entity(&self) -> &'static str {
        match self {
            EventKind::ItemSubmitted
            | EventKind::ItemAutoApproved
            | EventKind::ItemApproved
            | EventKind::ItemDenied
            | EventKind::ItemRevision
            | EventKind::ItemInactivated
            | EventKind::ItemDeleted => "item",
            _ => "claim",
        }
    }
}

/// 领域事件
#[derive(Debug, Clone, Serialize)]
pub struct DomainEvent {
    pub resource_id: Uuid,
    pub kind: EventKind,
    pub actor_id: Uuid,
    /// 退回或拒绝时的说明
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl DomainEvent {
    pub fn new(resource_id: Uuid, kind: EventKind, actor_id: Uuid) -> Self {
        Self {
            resource_id,
            kind,
            actor_id,
            reason: None,
            occurred_at: Utc::now(),
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// 请求内待发布的事件
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    pending: Arc<Mutex<Vec<DomainEvent>>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: DomainEvent) {
        crate::telemetry::record_transition(event.kind.entity(), event.kind.as_str());
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    pub fn drain(&self) -> Vec<DomainEvent> {
        std::mem::take(&mut *self.pending.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn len(&self) -> usize {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 事件总线
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// 发布事件（没有订阅者时返回错误）
    pub fn publish(&self, event: DomainEvent) -> Result<()> {
        self.sender
            .send(event)
            .map_err(|e| AppError::internal_error(&format!("Failed to publish event: {}", e)))?;
        Ok(())
    }

    /// 批量发布，失败只记录日志，不影响已提交的请求
    pub fn publish_all(&self, events: Vec<DomainEvent>) {
        for event in events {
            let kind = event.kind;
            if let Err(e) = self.publish(event) {
                tracing::warn!(kind = kind.as_str(), error = %e, "Event dropped");
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }
}

/// 通知监听任务
/// 把事件交给外部邮件服务（此处只输出结构化日志）
pub fn spawn_notification_listener(bus: &EventBus) -> JoinHandle<()> {
    let mut receiver = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    tracing::info!(
                        resource_id = %event.resource_id,
                        kind = event.kind.as_str(),
                        actor_id = %event.actor_id,
                        reason = event.reason.as_deref().unwrap_or(""),
                        "notification queued"
                    );
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Notification listener lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
