//! Domain layer - Core business logic and entities

pub mod access;
pub mod error;
pub mod notification;
pub mod review;
pub mod storage;
pub mod user;

pub use access::{can, ReviewAction};
pub use error::DomainError;
pub use notification::{Notification, NotificationPriority, NotificationSender, Recipients};
pub use review::{
    AuditContext, HistoryAction, HistoryEntry, HistoryFilter, HistoryRepository, ItemRegistry,
    ItemResolver, ItemType, Page, PageRequest, Priority, ReviewStats, ReviewStatus,
    WorkflowFilter, WorkflowId, WorkflowOverride, WorkflowRecord, WorkflowRepository,
};
pub use storage::{Storage, StorageEntity, StorageKey};
pub use user::{Caller, Role, UserDirectory, UserProfile};
