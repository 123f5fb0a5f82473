//! Listing filters, pagination and aggregate types

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::history::HistoryEntry;
use super::item_type::ItemType;
use super::status::{HistoryAction, ReviewStatus};
use super::workflow::WorkflowRecord;

/// Filter over workflow records; unset fields match everything
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowFilter {
    pub statuses: Option<Vec<ReviewStatus>>,
    pub engagement: Option<String>,
    pub reviewer: Option<String>,
    pub item_type: Option<ItemType>,
    pub item_id: Option<String>,
}

impl WorkflowFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: ReviewStatus) -> Self {
        self.statuses = Some(vec![status]);
        self
    }

    pub fn with_statuses(mut self, statuses: Vec<ReviewStatus>) -> Self {
        self.statuses = Some(statuses);
        self
    }

    pub fn with_engagement(mut self, engagement: impl Into<String>) -> Self {
        self.engagement = Some(engagement.into());
        self
    }

    pub fn with_reviewer(mut self, reviewer: impl Into<String>) -> Self {
        self.reviewer = Some(reviewer.into());
        self
    }

    pub fn with_item_type(mut self, item_type: ItemType) -> Self {
        self.item_type = Some(item_type);
        self
    }

    pub fn with_item_id(mut self, item_id: impl Into<String>) -> Self {
        self.item_id = Some(item_id.into());
        self
    }

    pub fn matches(&self, record: &WorkflowRecord) -> bool {
        if let Some(ref statuses) = self.statuses {
            if !statuses.contains(&record.status()) {
                return false;
            }
        }

        if let Some(ref engagement) = self.engagement {
            if record.engagement() != engagement {
                return false;
            }
        }

        if let Some(ref reviewer) = self.reviewer {
            if record.assigned_reviewer() != Some(reviewer.as_str()) {
                return false;
            }
        }

        if let Some(item_type) = self.item_type {
            if record.item_type() != item_type {
                return false;
            }
        }

        if let Some(ref item_id) = self.item_id {
            if record.item_id() != item_id {
                return false;
            }
        }

        true
    }
}

/// Filter over history entries; unset fields match everything
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryFilter {
    pub item: Option<(ItemType, String)>,
    pub item_id: Option<String>,
    pub engagement: Option<String>,
    pub performed_by: Option<String>,
    pub action: Option<HistoryAction>,
    pub since: Option<DateTime<Utc>>,
}

impl HistoryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_item(mut self, item_type: ItemType, item_id: impl Into<String>) -> Self {
        self.item = Some((item_type, item_id.into()));
        self
    }

    /// Match on the item id regardless of item type
    pub fn with_item_id(mut self, item_id: impl Into<String>) -> Self {
        self.item_id = Some(item_id.into());
        self
    }

    pub fn with_engagement(mut self, engagement: impl Into<String>) -> Self {
        self.engagement = Some(engagement.into());
        self
    }

    pub fn with_performed_by(mut self, user_id: impl Into<String>) -> Self {
        self.performed_by = Some(user_id.into());
        self
    }

    pub fn with_action(mut self, action: HistoryAction) -> Self {
        self.action = Some(action);
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn matches(&self, entry: &HistoryEntry) -> bool {
        if let Some((item_type, ref item_id)) = self.item {
            if entry.item_type() != item_type || entry.item_id() != item_id {
                return false;
            }
        }

        if let Some(ref item_id) = self.item_id {
            if entry.item_id() != item_id {
                return false;
            }
        }

        if let Some(ref engagement) = self.engagement {
            if entry.engagement() != engagement {
                return false;
            }
        }

        if let Some(ref user_id) = self.performed_by {
            if entry.performed_by() != user_id {
                return false;
            }
        }

        if let Some(action) = self.action {
            if entry.action() != action {
                return false;
            }
        }

        if let Some(since) = self.since {
            if entry.performed_at() < since {
                return false;
            }
        }

        true
    }
}

/// Review queue ordering: priority desc, then due date asc (undated last),
/// then creation time asc
pub fn queue_order(a: &WorkflowRecord, b: &WorkflowRecord) -> Ordering {
    b.priority()
        .cmp(&a.priority())
        .then_with(|| match (a.due_date(), b.due_date()) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.created_at().cmp(&b.created_at()))
}

/// One-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub limit: usize,
}

impl PageRequest {
    /// Normalise raw query values: page defaults to 1, limit to `default_limit`
    /// and is capped at `max_limit`
    pub fn new(
        page: Option<usize>,
        limit: Option<usize>,
        default_limit: usize,
        max_limit: usize,
    ) -> Self {
        Self {
            page: page.filter(|p| *p > 0).unwrap_or(1),
            limit: limit
                .filter(|l| *l > 0)
                .unwrap_or(default_limit)
                .min(max_limit.max(1)),
        }
    }

    /// Items to skip; saturates for page numbers past any real result set
    pub fn offset(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

/// A page of results with its pagination metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub current_page: usize,
    pub total_pages: usize,
    pub total_count: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

impl<T> Page<T> {
    /// Slice an already-ordered result set
    pub fn from_sorted(all: Vec<T>, request: PageRequest) -> Self {
        let total_count = all.len();
        let items: Vec<T> = all
            .into_iter()
            .skip(request.offset())
            .take(request.limit)
            .collect();

        Self::from_parts(items, total_count, request)
    }

    /// Wrap one page fetched by the backend, given the size of the full result set
    pub fn from_parts(items: Vec<T>, total_count: usize, request: PageRequest) -> Self {
        let total_pages = total_count.div_ceil(request.limit.max(1));

        Self {
            items,
            current_page: request.page,
            total_pages,
            total_count,
            has_next: request.page < total_pages,
            has_prev: request.page > 1,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            current_page: self.current_page,
            total_pages: self.total_pages,
            total_count: self.total_count,
            has_next: self.has_next,
            has_prev: self.has_prev,
        }
    }
}

/// Aggregate counts over a set of workflow records
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub by_status: BTreeMap<String, usize>,
    pub total: usize,
    pub pending: usize,
    pub completed: usize,
    pub locked: usize,
    pub overdue: usize,
}

impl ReviewStats {
    pub fn collect<'a>(records: impl IntoIterator<Item = &'a WorkflowRecord>, now: DateTime<Utc>) -> Self {
        let mut stats = ReviewStats {
            by_status: ReviewStatus::ALL
                .iter()
                .map(|s| (s.as_str().to_string(), 0))
                .collect(),
            ..Default::default()
        };

        for record in records {
            stats.total += 1;
            *stats
                .by_status
                .entry(record.status().as_str().to_string())
                .or_insert(0) += 1;

            if record.status().is_pending_review() {
                stats.pending += 1;
            }

            if matches!(record.status(), ReviewStatus::Approved | ReviewStatus::SignedOff) {
                stats.completed += 1;
            }

            if record.is_locked() {
                stats.locked += 1;
            }

            if record.is_overdue(now) {
                stats.overdue += 1;
            }
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::review::Priority;
    use chrono::Duration;

    fn record(item_id: &str) -> WorkflowRecord {
        WorkflowRecord::new(ItemType::Procedure, item_id, "EG1")
    }

    #[test]
    fn test_workflow_filter_matching() {
        let now = Utc::now();
        let mut wf = record("p-1");
        wf.submit_for_review("E1", now).unwrap();
        wf.assign_reviewer("R1", now).unwrap();

        assert!(WorkflowFilter::new().matches(&wf));
        assert!(WorkflowFilter::new().with_reviewer("R1").matches(&wf));
        assert!(!WorkflowFilter::new().with_reviewer("R2").matches(&wf));
        assert!(WorkflowFilter::new()
            .with_statuses(ReviewStatus::QUEUE_DEFAULT.to_vec())
            .matches(&wf));
        assert!(!WorkflowFilter::new()
            .with_status(ReviewStatus::Approved)
            .matches(&wf));
        assert!(!WorkflowFilter::new().with_engagement("EG2").matches(&wf));
        assert!(!WorkflowFilter::new()
            .with_item_type(ItemType::Kyc)
            .matches(&wf));
    }

    #[test]
    fn test_history_filter_matching() {
        let wf = record("p-1");
        let entry = HistoryEntry::for_workflow(&wf, HistoryAction::CommentAdded, "E1");

        assert!(HistoryFilter::new().for_item(ItemType::Procedure, "p-1").matches(&entry));
        assert!(!HistoryFilter::new().for_item(ItemType::Kyc, "p-1").matches(&entry));
        assert!(HistoryFilter::new().with_item_id("p-1").matches(&entry));
        assert!(HistoryFilter::new().with_performed_by("E1").matches(&entry));
        assert!(!HistoryFilter::new()
            .with_action(HistoryAction::SignedOff)
            .matches(&entry));
        assert!(!HistoryFilter::new()
            .since(Utc::now() + Duration::hours(1))
            .matches(&entry));
    }

    #[test]
    fn test_queue_order() {
        let now = Utc::now();
        let low = record("low").with_priority(Priority::Low);
        let critical = record("critical").with_priority(Priority::Critical);
        let high_late = record("high-late")
            .with_priority(Priority::High)
            .with_due_date(now + Duration::days(5));
        let high_soon = record("high-soon")
            .with_priority(Priority::High)
            .with_due_date(now + Duration::days(1));
        let high_undated_old = record("high-undated-old")
            .with_priority(Priority::High)
            .with_created_at(now - Duration::days(2));
        let high_undated_new = record("high-undated-new").with_priority(Priority::High);

        let mut records = vec![
            high_undated_new,
            low,
            high_late,
            critical,
            high_undated_old,
            high_soon,
        ];
        records.sort_by(queue_order);

        let order: Vec<&str> = records.iter().map(|r| r.item_id()).collect();
        assert_eq!(
            order,
            vec![
                "critical",
                "high-soon",
                "high-late",
                "high-undated-old",
                "high-undated-new",
                "low"
            ]
        );
    }

    #[test]
    fn test_page_request_normalisation() {
        let req = PageRequest::new(None, None, 20, 100);
        assert_eq!(req, PageRequest { page: 1, limit: 20 });

        let req = PageRequest::new(Some(0), Some(500), 20, 100);
        assert_eq!(req, PageRequest { page: 1, limit: 100 });

        let req = PageRequest::new(Some(3), Some(10), 20, 100);
        assert_eq!(req.offset(), 20);
    }

    #[test]
    fn test_page_metadata() {
        let all: Vec<u32> = (1..=25).collect();

        let first = Page::from_sorted(all.clone(), PageRequest { page: 1, limit: 10 });
        assert_eq!(first.items, (1..=10).collect::<Vec<_>>());
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.total_count, 25);
        assert!(first.has_next);
        assert!(!first.has_prev);

        let last = Page::from_sorted(all, PageRequest { page: 3, limit: 10 });
        assert_eq!(last.items, vec![21, 22, 23, 24, 25]);
        assert!(!last.has_next);
        assert!(last.has_prev);

        let empty: Page<u32> = Page::from_sorted(Vec::new(), PageRequest { page: 1, limit: 10 });
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next);
    }

    #[test]
    fn test_huge_page_number_yields_empty_page() {
        let req = PageRequest::new(Some(usize::MAX), Some(20), 20, 100);
        assert_eq!(req.offset(), usize::MAX);

        let page = Page::from_sorted(vec![1, 2, 3], req);
        assert!(page.items.is_empty());
        assert_eq!(page.total_count, 3);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.current_page, usize::MAX);
        assert!(!page.has_next);
        assert!(page.has_prev);
    }

    #[test]
    fn test_page_from_parts() {
        let page = Page::from_parts(vec!["c", "d"], 5, PageRequest { page: 2, limit: 2 });

        assert_eq!(page.total_pages, 3);
        assert!(page.has_next);
        assert!(page.has_prev);
    }

    #[test]
    fn test_stats_collect() {
        let now = Utc::now();
        let mut submitted = record("a");
        submitted.submit_for_review("E1", now).unwrap();

        let mut signed = record("b");
        signed.submit_for_review("E1", now).unwrap();
        signed.assign_reviewer("R1", now).unwrap();
        signed.complete_review(true, "R1", None, now).unwrap();
        signed.sign_off("P1", None, now).unwrap();

        let overdue = record("c").with_due_date(now - Duration::days(1));

        let stats = ReviewStats::collect([&submitted, &signed, &overdue], now);

        assert_eq!(stats.total, 3);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.locked, 1);
        assert_eq!(stats.overdue, 1);
        assert_eq!(stats.by_status["ready-for-review"], 1);
        assert_eq!(stats.by_status["signed-off"], 1);
        assert_eq!(stats.by_status["in-progress"], 1);
        assert_eq!(stats.by_status["rejected"], 0);
    }
}
