//! Grouped statistics over the transaction set.
//!
//! Every aggregation here is a commutative, associative reduction: the
//! accumulators can be filled from disjoint partitions of the set and
//! merged, and the merged result equals a single pass over the whole set.

use crate::{
    transaction::{Transaction, TxnType},
    types::{round_to, CustomerId},
};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Per-type share of the transaction set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeSummary {
    pub txn_type: TxnType,
    pub count: usize,
    /// `count / total * 100`, rounded to 2 places.
    pub percentage_of_total: f64,
    pub average_amount: f64,
    pub total_volume: f64,
}

/// Per-customer totals, keyed by the originating account.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerAggregate {
    pub customer_id: CustomerId,
    pub transaction_count: usize,
    pub total_amount: f64,
    pub max_transaction: f64,
    pub fraud_incident_count: usize,
    pub fraud_total_amount: f64,
}

impl CustomerAggregate {
    fn empty(customer_id: CustomerId) -> Self {
        Self {
            customer_id,
            transaction_count: 0,
            total_amount: 0.0,
            max_transaction: 0.0,
            fraud_incident_count: 0,
            fraud_total_amount: 0.0,
        }
    }

    fn absorb(&mut self, other: &CustomerAggregate) {
        self.transaction_count += other.transaction_count;
        self.total_amount += other.total_amount;
        self.max_transaction = self.max_transaction.max(other.max_transaction);
        self.fraud_incident_count += other.fraud_incident_count;
        self.fraud_total_amount += other.fraud_total_amount;
    }
}

// ── Type distribution ───────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct TypeAccumulator {
    groups: BTreeMap<TxnType, (usize, f64)>,
    total: usize,
}

impl TypeAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, txn: &Transaction) {
        let group = self.groups.entry(txn.txn_type).or_insert((0, 0.0));
        group.0 += 1;
        group.1 += txn.amount;
        self.total += 1;
    }

    pub fn merge(&mut self, other: TypeAccumulator) {
        for (txn_type, (count, volume)) in other.groups {
            let group = self.groups.entry(txn_type).or_insert((0, 0.0));
            group.0 += count;
            group.1 += volume;
        }
        self.total += other.total;
    }

    /// Ordered by count descending, then type.
    pub fn finish(self) -> Vec<TypeSummary> {
        if self.total == 0 {
            return Vec::new();
        }
        let total = self.total as f64;
        let mut summaries: Vec<TypeSummary> = self
            .groups
            .into_iter()
            .map(|(txn_type, (count, volume))| TypeSummary {
                txn_type,
                count,
                percentage_of_total: round_to(count as f64 / total * 100.0, 2),
                average_amount: if count > 0 { volume / count as f64 } else { 0.0 },
                total_volume: volume,
            })
            .collect();
        summaries.sort_by(|a, b| b.count.cmp(&a.count).then(a.txn_type.cmp(&b.txn_type)));
        summaries
    }
}

pub fn type_distribution(txns: &[Transaction]) -> Vec<TypeSummary> {
    let mut acc = TypeAccumulator::new();
    for txn in txns {
        acc.add(txn);
    }
    acc.finish()
}

// ── Customer aggregates ─────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct CustomerAccumulator {
    by_customer: HashMap<CustomerId, CustomerAggregate>,
}

impl CustomerAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, txn: &Transaction) {
        let agg = self
            .by_customer
            .entry(txn.origin_id.clone())
            .or_insert_with(|| CustomerAggregate::empty(txn.origin_id.clone()));
        agg.transaction_count += 1;
        agg.total_amount += txn.amount;
        agg.max_transaction = agg.max_transaction.max(txn.amount);
        if txn.is_fraud {
            agg.fraud_incident_count += 1;
            agg.fraud_total_amount += txn.amount;
        }
    }

    pub fn merge(&mut self, other: CustomerAccumulator) {
        for (customer_id, partial) in other.by_customer {
            self.by_customer
                .entry(customer_id)
                .and_modify(|agg| agg.absorb(&partial))
                .or_insert(partial);
        }
    }

    /// Ordered by total amount descending, then customer id.
    pub fn finish(self) -> Vec<CustomerAggregate> {
        let mut aggregates: Vec<CustomerAggregate> = self.by_customer.into_values().collect();
        aggregates.sort_by(|a, b| {
            b.total_amount
                .total_cmp(&a.total_amount)
                .then_with(|| a.customer_id.cmp(&b.customer_id))
        });
        aggregates
    }
}

pub fn customer_aggregates(txns: &[Transaction]) -> Vec<CustomerAggregate> {
    let mut acc = CustomerAccumulator::new();
    for txn in txns {
        acc.add(txn);
    }
    acc.finish()
}
