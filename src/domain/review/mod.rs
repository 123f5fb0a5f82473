//! Review domain module
//!
//! Models the review and sign-off lifecycle for audit artifacts:
//! - `WorkflowRecord`: mutable per-item review state and its transitions
//! - `HistoryEntry`: immutable per-transition audit trail
//! - repository traits for both, plus listing filters and pagination
//!
//! ## Lifecycle
//!
//! ```text
//! in-progress | rejected | re-opened --submit--> ready-for-review
//! ready-for-review --assign--> under-review
//! under-review --review--> approved | rejected
//! approved --sign off--> signed-off (locked)
//! signed-off --reopen--> re-opened (unlocked, version + 1)
//! ```

mod history;
pub mod item;
mod item_type;
mod query;
pub mod repository;
mod status;
mod workflow;

pub use history::{AuditContext, HistoryEntry, HistoryEntryId};
pub use item::{AcceptAllResolver, ItemRegistry, ItemResolver};
pub use item_type::ItemType;
pub use query::{queue_order, HistoryFilter, Page, PageRequest, ReviewStats, WorkflowFilter};
pub use repository::{HistoryRepository, WorkflowRepository};
pub use status::{HistoryAction, Priority, ReviewStatus};
pub use workflow::{WorkflowId, WorkflowNote, WorkflowOverride, WorkflowRecord, MAX_NOTE_LENGTH};

#[cfg(test)]
pub use repository::{MockHistoryRepository, MockWorkflowRepository};
