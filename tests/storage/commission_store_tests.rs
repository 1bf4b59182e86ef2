//! CommissionStore interface tests.
//!
//! These tests verify the contract of the CommissionStore trait.
//! Each storage implementation should run these tests.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use commission_engine::entry::{CommissionEntryBuilder, CustomerTerms, EntryChange};
use commission_engine::interfaces::CommissionStore;
use commission_engine::model::{
    AuditAction, AuditRecord, CommissionEntry, CommissionMonth, CustomerId, EntryId, LineItem,
    MonthlyCommissionSummary, Order, OrderId, RelationshipStatus, RepId, Segment, SummaryKey,
};
use commission_engine::rates::{RateTier, ResolvedRate};
use commission_engine::summary::MonthlySummaryRecalculator;

pub fn month(s: &str) -> CommissionMonth {
    s.parse().expect("valid month")
}

/// Build a fresh entry for `order_id` posted on 2025-10-14.
pub fn make_entry(order_id: &str, rep: &str, revenue: Decimal, rate: Decimal) -> EntryChange {
    let order = Order {
        id: OrderId::new(order_id),
        customer_id: CustomerId::new("cust-1"),
        rep_id: RepId::new(rep),
        posted_on: NaiveDate::from_ymd_opt(2025, 10, 14).expect("valid date"),
        line_items: vec![LineItem::sale(revenue), LineItem::shipping(dec!(25))],
    };
    let terms = CustomerTerms {
        segment: Segment::Wholesale,
        status: RelationshipStatus::Maintained,
    };
    let resolved = ResolvedRate {
        rate,
        tier: RateTier::Exact,
        rate_table_version: "contract-v1".to_string(),
    };
    CommissionEntryBuilder::build(&order, terms, &resolved, Utc::now())
}

// =============================================================================
// Entry tests
// =============================================================================

pub async fn test_get_missing_entry<S: CommissionStore>(store: &S) {
    let id = EntryId::for_order(&OrderId::new("test_missing"), &RepId::new("test_rep"));
    let entry = store.get_entry(id).await.expect("get should succeed");
    assert!(entry.is_none(), "missing entry should be None");
}

pub async fn test_put_and_get_entry<S: CommissionStore>(store: &S) {
    let change = make_entry("test_put_get", "test_rep_put", dec!(33665), dec!(8));
    store
        .put_entry(&change.entry, &change.audit)
        .await
        .expect("put should succeed");

    let loaded = store
        .get_entry(change.entry.id())
        .await
        .expect("get should succeed")
        .expect("entry should exist");
    assert_eq!(loaded, change.entry, "entry should round-trip unchanged");
    assert_eq!(loaded.commission_amount(), dec!(2693.20));
    assert_eq!(loaded.order_revenue(), dec!(33665), "shipping is not revenue");
}

pub async fn test_find_entry_by_order<S: CommissionStore>(store: &S) {
    let change = make_entry("test_find", "test_rep_find", dec!(100), dec!(5));
    store
        .put_entry(&change.entry, &change.audit)
        .await
        .expect("put should succeed");

    let found = store
        .find_entry(&OrderId::new("test_find"), &RepId::new("test_rep_find"))
        .await
        .expect("find should succeed");
    assert_eq!(found.map(|e| e.id()), Some(change.entry.id()));
}

pub async fn test_put_replaces_entry<S: CommissionStore>(store: &S) {
    let change = make_entry("test_replace", "test_rep_replace", dec!(1000), dec!(8));
    store
        .put_entry(&change.entry, &change.audit)
        .await
        .expect("put should succeed");

    let overridden =
        CommissionEntryBuilder::apply_override(&change.entry, dec!(10), "promo", Utc::now())
            .expect("override should be valid");
    store
        .put_entry(&overridden.entry, &overridden.audit)
        .await
        .expect("second put should succeed");

    let loaded = store
        .get_entry(change.entry.id())
        .await
        .expect("get should succeed")
        .expect("entry should exist");
    assert!(loaded.is_override());
    assert_eq!(loaded.original_rate(), Some(dec!(8)));
    assert_eq!(loaded.rate_comment(), Some("promo"));
    assert_eq!(loaded.commission_amount(), dec!(100.00));
}

pub async fn test_move_is_in_place<S: CommissionStore>(store: &S) {
    let rep = RepId::new("test_rep_move");
    let change = make_entry("test_move", rep.as_str(), dec!(500), dec!(4));
    store
        .put_entry(&change.entry, &change.audit)
        .await
        .expect("put should succeed");

    let moved = CommissionEntryBuilder::move_month(
        &change.entry,
        month("2025-10"),
        month("2025-12"),
        "late booking",
        Utc::now(),
    )
    .expect("move should be valid");
    store
        .put_entry(&moved.entry, &moved.audit)
        .await
        .expect("move put should succeed");

    let oct = store
        .list_entries(&rep, month("2025-10"))
        .await
        .expect("list should succeed");
    let dec_entries = store
        .list_entries(&rep, month("2025-12"))
        .await
        .expect("list should succeed");
    assert!(oct.is_empty(), "entry should have left October");
    assert_eq!(dec_entries.len(), 1, "entry should be in December once");
}

pub async fn test_list_entries_sorted_by_order<S: CommissionStore>(store: &S) {
    let rep = "test_rep_list";
    for id in ["test_list_c", "test_list_a", "test_list_b"] {
        let change = make_entry(id, rep, dec!(10), dec!(5));
        store
            .put_entry(&change.entry, &change.audit)
            .await
            .expect("put should succeed");
    }
    let other = make_entry("test_list_other", "test_rep_other", dec!(10), dec!(5));
    store
        .put_entry(&other.entry, &other.audit)
        .await
        .expect("put should succeed");

    let entries = store
        .list_entries(&RepId::new(rep), month("2025-10"))
        .await
        .expect("list should succeed");
    let ids: Vec<&str> = entries.iter().map(|e| e.order_id().as_str()).collect();
    assert_eq!(ids, vec!["test_list_a", "test_list_b", "test_list_c"]);
}

/// Seven entries plus their summary, to be written at batch size 3.
pub fn chunked_change_set(
    rep: &str,
) -> (Vec<(CommissionEntry, AuditRecord)>, MonthlyCommissionSummary) {
    let changes: Vec<_> = (0..7)
        .map(|i| {
            let change = make_entry(&format!("test_batch_{i}"), rep, dec!(100), dec!(5));
            (change.entry, change.audit)
        })
        .collect();
    let entries: Vec<CommissionEntry> = changes.iter().map(|(e, _)| e.clone()).collect();
    let key = SummaryKey::new(RepId::new(rep), month("2025-10"));
    let summary = MonthlySummaryRecalculator::summarize(&key, &entries, Utc::now());
    (changes, summary)
}

pub async fn test_apply_changes_in_chunks<S: CommissionStore>(store: &S) {
    let rep = "test_rep_batch";
    let (changes, summary) = chunked_change_set(rep);
    store
        .apply_changes(&changes, std::slice::from_ref(&summary), 3)
        .await
        .expect("apply should succeed");

    let entries = store
        .list_entries(&RepId::new(rep), month("2025-10"))
        .await
        .expect("list should succeed");
    assert_eq!(entries.len(), 7);

    let stored = store
        .get_summary(&RepId::new(rep), month("2025-10"))
        .await
        .expect("get should succeed")
        .expect("summary should be written with the entries");
    assert_eq!(stored.total_orders, 7);
    assert_eq!(stored.total_commission, dec!(35.00));

    let trail = store
        .audit_trail(changes[6].0.id())
        .await
        .expect("audit should succeed");
    assert_eq!(trail.len(), 1, "every chunk writes its audit records");
}

// =============================================================================
// Audit tests
// =============================================================================

pub async fn test_audit_trail_in_order<S: CommissionStore>(store: &S) {
    let change = make_entry("test_audit", "test_rep_audit", dec!(100), dec!(5));
    store
        .put_entry(&change.entry, &change.audit)
        .await
        .expect("put should succeed");
    let excluded =
        CommissionEntryBuilder::set_exclusion(&change.entry, true, "disputed", Utc::now());
    store
        .put_entry(&excluded.entry, &excluded.audit)
        .await
        .expect("put should succeed");

    let trail = store
        .audit_trail(change.entry.id())
        .await
        .expect("audit should succeed");
    assert_eq!(trail.len(), 2);
    assert!(matches!(trail[0].action, AuditAction::Created { .. }));
    assert_eq!(trail[1].action, AuditAction::ExclusionChanged { excluded: true });
    assert_eq!(trail[1].reason.as_deref(), Some("disputed"));
}

// =============================================================================
// Summary tests
// =============================================================================

pub async fn test_get_missing_summary<S: CommissionStore>(store: &S) {
    let summary = store
        .get_summary(&RepId::new("test_rep_nosummary"), month("2025-10"))
        .await
        .expect("get should succeed");
    assert!(summary.is_none());
}

pub async fn test_replace_summary<S: CommissionStore>(store: &S) {
    let key = SummaryKey::new(RepId::new("test_rep_summary"), month("2025-10"));
    let first = MonthlySummaryRecalculator::summarize(
        &key,
        &[make_entry("test_summary_1", "test_rep_summary", dec!(120.10), dec!(7.5)).entry],
        Utc::now(),
    );
    store.replace_summary(&first).await.expect("replace should succeed");

    let empty = MonthlySummaryRecalculator::summarize(&key, &[], Utc::now());
    store.replace_summary(&empty).await.expect("replace should succeed");

    let loaded = store
        .get_summary(&key.rep_id, key.month)
        .await
        .expect("get should succeed")
        .expect("summary should exist");
    assert!(loaded.same_totals(&empty), "replace must not merge with prior totals");
    assert_eq!(loaded.total_orders, 0);
}

pub async fn test_list_summaries_by_month<S: CommissionStore>(store: &S) {
    for (rep, m) in [
        ("test_rep_ls_b", "2026-01"),
        ("test_rep_ls_a", "2026-01"),
        ("test_rep_ls_a", "2026-02"),
    ] {
        let key = SummaryKey::new(RepId::new(rep), month(m));
        let summary = MonthlySummaryRecalculator::summarize(&key, &[], Utc::now());
        store.replace_summary(&summary).await.expect("replace should succeed");
    }

    let summaries = store
        .list_summaries(month("2026-01"))
        .await
        .expect("list should succeed");
    let reps: Vec<&str> = summaries.iter().map(|s| s.rep_id.as_str()).collect();
    assert_eq!(reps, vec!["test_rep_ls_a", "test_rep_ls_b"]);
}

/// Run all CommissionStore tests against a store implementation.
#[macro_export]
macro_rules! run_commission_store_tests {
    ($store:expr) => {
        use $crate::storage::commission_store_tests::*;

        // entry tests
        test_get_missing_entry($store).await;
        println!("  test_get_missing_entry: PASSED");

        test_put_and_get_entry($store).await;
        println!("  test_put_and_get_entry: PASSED");

        test_find_entry_by_order($store).await;
        println!("  test_find_entry_by_order: PASSED");

        test_put_replaces_entry($store).await;
        println!("  test_put_replaces_entry: PASSED");

        test_move_is_in_place($store).await;
        println!("  test_move_is_in_place: PASSED");

        test_list_entries_sorted_by_order($store).await;
        println!("  test_list_entries_sorted_by_order: PASSED");

        test_apply_changes_in_chunks($store).await;
        println!("  test_apply_changes_in_chunks: PASSED");

        // audit tests
        test_audit_trail_in_order($store).await;
        println!("  test_audit_trail_in_order: PASSED");

        // summary tests
        test_get_missing_summary($store).await;
        println!("  test_get_missing_summary: PASSED");

        test_replace_summary($store).await;
        println!("  test_replace_summary: PASSED");

        test_list_summaries_by_month($store).await;
        println!("  test_list_summaries_by_month: PASSED");
    };
}
