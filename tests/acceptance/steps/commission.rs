//! Commission entry and summary step definitions.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use cucumber::{gherkin::Step, given, then, when, World};

use commission_engine::attainment::{BonusConfig, BonusPlan};
use commission_engine::interfaces::CommissionStore;
use commission_engine::model::{
    CommissionEntry, CommissionMonth, Customer, CustomerId, EntryId, LineItem,
    MonthlyCommissionSummary, Order, OrderId, Rep, RepId, StatusChange,
};
use commission_engine::rates::{RateRow, RateTable};
use commission_engine::services::CommissionService;
use commission_engine::storage::{MockCommissionStore, MockReferenceData};
use commission_engine::{EngineError, ErrorKind};

use super::{decimal, parse_enum};

/// Test context for commission scenarios.
#[derive(World)]
#[world(init = Self::new)]
pub struct CommissionWorld {
    store: Arc<MockCommissionStore>,
    reference: Arc<MockReferenceData>,
    rate_version: String,
    rate_rows: Vec<RateRow>,
    service: Option<CommissionService>,
    order_reps: HashMap<String, RepId>,
    last_error: Option<EngineError>,
    summaries: Vec<MonthlyCommissionSummary>,
}

impl std::fmt::Debug for CommissionWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommissionWorld")
            .field("rate_version", &self.rate_version)
            .field("rate_rows", &self.rate_rows.len())
            .field("service", &self.service.as_ref().map(|_| "<CommissionService>"))
            .field("order_reps", &self.order_reps)
            .field("last_error", &self.last_error)
            .field("summaries", &self.summaries.len())
            .finish()
    }
}

impl CommissionWorld {
    fn new() -> Self {
        Self {
            store: Arc::new(MockCommissionStore::new()),
            reference: Arc::new(MockReferenceData::new()),
            rate_version: String::new(),
            rate_rows: Vec::new(),
            service: None,
            order_reps: HashMap::new(),
            last_error: None,
            summaries: Vec::new(),
        }
    }

    /// Build the service on first use so every Given step lands first.
    fn service(&mut self) -> &CommissionService {
        if self.service.is_none() {
            let rates = RateTable::from_rows(self.rate_version.clone(), &self.rate_rows)
                .expect("rate table should be valid");
            let bonus = BonusPlan::from_config(&BonusConfig::default())
                .expect("default bonus plan should be valid");
            self.service = Some(CommissionService::new(
                self.store.clone(),
                self.reference.clone(),
                Arc::new(rates),
                Arc::new(bonus),
                400,
            ));
        }
        self.service.as_ref().expect("service initialized")
    }

    fn entry_id(&self, order: &str) -> EntryId {
        let rep = self.order_reps.get(order).expect("unknown order");
        EntryId::for_order(&OrderId::new(order), rep)
    }

    async fn entry(&self, order: &str) -> Option<CommissionEntry> {
        self.store
            .get_entry(self.entry_id(order))
            .await
            .expect("store read should succeed")
    }

    async fn summary(&self, rep: &str, month: &str) -> MonthlyCommissionSummary {
        self.store
            .get_summary(&RepId::new(rep), parse_month(month))
            .await
            .expect("store read should succeed")
            .expect("summary should exist")
    }

    fn record<T>(&mut self, result: Result<T, EngineError>) {
        self.last_error = result.err();
    }
}

fn parse_month(raw: &str) -> CommissionMonth {
    raw.parse().expect("valid YYYY-MM")
}

fn parse_date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("valid date")
}

// --- Given steps ---

#[given(expr = "the rate table {string}:")]
async fn given_rate_table(world: &mut CommissionWorld, step: &Step, version: String) {
    let table = step.table.as_ref().expect("rate table rows");
    world.rate_version = version;
    world.rate_rows = table
        .rows
        .iter()
        .skip(1)
        .map(|row| RateRow {
            title: parse_enum(&row[0]),
            segment: (!row[1].trim().is_empty()).then(|| parse_enum(&row[1])),
            status: parse_enum(&row[2]),
            rate: decimal(&row[3]),
        })
        .collect();
}

#[given(expr = "rep {string} is an {string}")]
async fn given_rep(world: &mut CommissionWorld, rep: String, title: String) {
    world
        .reference
        .put_rep(Rep {
            id: RepId::new(rep),
            name: String::new(),
            title: parse_enum(&title),
        })
        .await;
}

#[given(expr = "customer {string} is a {string} customer with status {string} for rep {string} since {string}")]
async fn given_customer(
    world: &mut CommissionWorld,
    customer: String,
    segment: String,
    status: String,
    rep: String,
    since: String,
) {
    world
        .reference
        .put_customer(Customer {
            id: CustomerId::new(customer),
            segment: parse_enum(&segment),
            relationship_history: vec![StatusChange {
                rep_id: RepId::new(rep),
                status: parse_enum(&status),
                effective_from: parse_date(&since),
            }],
        })
        .await;
}

#[given(expr = "order {string} for customer {string} by rep {string} posted {string} with lines:")]
async fn given_order(
    world: &mut CommissionWorld,
    step: &Step,
    order: String,
    customer: String,
    rep: String,
    posted: String,
) {
    let table = step.table.as_ref().expect("line item rows");
    let line_items = table
        .rows
        .iter()
        .skip(1)
        .map(|row| {
            let amount = decimal(&row[0]);
            match row[1].trim() {
                "sale" => LineItem::sale(amount),
                "shipping" => LineItem::shipping(amount),
                "fee" => LineItem::fee(amount),
                other => panic!("unknown line kind: {other}"),
            }
        })
        .collect();

    world.order_reps.insert(order.clone(), RepId::new(&rep));
    world
        .reference
        .put_order(Order {
            id: OrderId::new(order),
            customer_id: CustomerId::new(customer),
            rep_id: RepId::new(rep),
            posted_on: parse_date(&posted),
            line_items,
        })
        .await;
}

// --- When steps ---

#[when(expr = "I recalculate order {string}")]
async fn when_recalculate_order(world: &mut CommissionWorld, order: String) {
    let result = world.service().recalculate_entry(&OrderId::new(order)).await;
    world.record(result);
}

#[when(expr = "I recalculate orders {string}")]
async fn when_recalculate_orders(world: &mut CommissionWorld, orders: String) {
    let ids: Vec<OrderId> = orders.split(',').map(|id| OrderId::new(id.trim())).collect();
    let result = world.service().recalculate_orders(&ids).await;
    world.record(result);
}

#[when(expr = "I exclude order {string}")]
async fn when_exclude(world: &mut CommissionWorld, order: String) {
    let id = world.entry_id(&order);
    let result = world.service().set_exclusion(id, true, "acceptance").await;
    world.record(result);
}

#[when(expr = "I include order {string}")]
async fn when_include(world: &mut CommissionWorld, order: String) {
    let id = world.entry_id(&order);
    let result = world.service().set_exclusion(id, false, "acceptance").await;
    world.record(result);
}

#[when(expr = "I override order {string} to rate {string} with comment {string}")]
async fn when_override(world: &mut CommissionWorld, order: String, rate: String, comment: String) {
    let id = world.entry_id(&order);
    let result = world.service().set_override(id, decimal(&rate), &comment).await;
    world.record(result);
}

#[when(expr = "I move order {string} from {string} to {string}")]
async fn when_move(world: &mut CommissionWorld, order: String, from: String, to: String) {
    let id = world.entry_id(&order);
    let result = world
        .service()
        .move_entry(id, parse_month(&from), parse_month(&to), "acceptance")
        .await;
    world.record(result);
}

#[when(expr = "I recalculate the summary for rep {string} in {string} twice")]
async fn when_recalculate_summary_twice(world: &mut CommissionWorld, rep: String, month: String) {
    let rep = RepId::new(rep);
    let month = parse_month(&month);
    for _ in 0..2 {
        let summary = world
            .service()
            .recalculate_summary(&rep, month)
            .await
            .expect("recalculation should succeed");
        world.summaries.push(summary);
    }
}

// --- Then steps ---

#[then(expr = "the entry for order {string} has rate {string} and amount {string}")]
async fn then_entry_rate_amount(
    world: &mut CommissionWorld,
    order: String,
    rate: String,
    amount: String,
) {
    let entry = world.entry(&order).await.expect("entry should exist");
    assert_eq!(entry.commission_rate(), decimal(&rate), "rate");
    assert_eq!(entry.commission_amount(), decimal(&amount), "amount");
}

#[then(expr = "the entry for order {string} has revenue {string} and amount {string}")]
async fn then_entry_revenue_amount(
    world: &mut CommissionWorld,
    order: String,
    revenue: String,
    amount: String,
) {
    let entry = world.entry(&order).await.expect("entry should exist");
    assert_eq!(entry.order_revenue(), decimal(&revenue), "revenue");
    assert_eq!(entry.commission_amount(), decimal(&amount), "amount");
}

#[then(expr = "the original rate for order {string} is {string}")]
async fn then_original_rate(world: &mut CommissionWorld, order: String, rate: String) {
    let entry = world.entry(&order).await.expect("entry should exist");
    assert_eq!(entry.original_rate(), Some(decimal(&rate)));
}

#[then(expr = "no entry exists for order {string}")]
async fn then_no_entry(world: &mut CommissionWorld, order: String) {
    assert!(world.entry(&order).await.is_none());
}

#[then(expr = "the summary for rep {string} in {string} has {int} orders, revenue {string} and commission {string}")]
async fn then_summary_totals(
    world: &mut CommissionWorld,
    rep: String,
    month: String,
    orders: u32,
    revenue: String,
    commission: String,
) {
    let summary = world.summary(&rep, &month).await;
    assert_eq!(summary.total_orders, orders, "orders");
    assert_eq!(summary.total_revenue, decimal(&revenue), "revenue");
    assert_eq!(summary.total_commission, decimal(&commission), "commission");
}

#[then(expr = "the summary for rep {string} in {string} has {int} overrides")]
async fn then_summary_overrides(
    world: &mut CommissionWorld,
    rep: String,
    month: String,
    count: u32,
) {
    let summary = world.summary(&rep, &month).await;
    assert_eq!(summary.override_count, count);
}

#[then(expr = "the operation fails with a {string} error mentioning {string}")]
async fn then_operation_fails(world: &mut CommissionWorld, kind: String, fragment: String) {
    let err = world.last_error.as_ref().expect("operation should have failed");
    let expected = match kind.as_str() {
        "configuration" => ErrorKind::Configuration,
        "validation" => ErrorKind::Validation,
        "not found" => ErrorKind::NotFound,
        "storage" => ErrorKind::Storage,
        other => panic!("unknown error kind: {other}"),
    };
    assert_eq!(err.kind(), expected, "error kind for: {err}");
    assert!(
        err.to_string().contains(&fragment),
        "'{err}' should mention '{fragment}'"
    );
}

#[then("both summaries have identical totals")]
async fn then_summaries_identical(world: &mut CommissionWorld) {
    assert_eq!(world.summaries.len(), 2);
    assert!(world.summaries[0].same_totals(&world.summaries[1]));
}
