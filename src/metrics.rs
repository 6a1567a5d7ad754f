use std::collections::{BTreeMap, HashMap};

use log::info;

use crate::{
    diagnostics::{Diagnostics, Issue},
    join,
    records::{Claim, Dataset, Revert},
    report::{MetricRow, round_money},
};

#[derive(Debug, Default)]
struct FillAccumulator {
    fills: u64,
    total_price: f64,
    unit_price_sum: f64,
}

impl FillAccumulator {
    fn ingest(&mut self, claim: &Claim) {
        self.fills += 1;
        self.total_price += claim.price;
        self.unit_price_sum += claim.unit_price();
    }

    fn avg_unit_price(&self) -> f64 {
        self.unit_price_sum / self.fills as f64
    }
}

/// Per (npi, ndc) fill counts, price totals, mean unit price, and reversal
/// counts. Rows are ordered by (npi, ndc).
///
/// A claim matched by several reverts counts once per revert.
pub fn compute_metrics(
    claims: &Dataset<Claim>,
    reverts: &Dataset<Revert>,
    diagnostics: &mut Diagnostics,
) -> Vec<MetricRow> {
    if claims.is_empty() {
        diagnostics.push(Issue::MetricsWithoutClaims);
        return Vec::new();
    }

    let mut groups: BTreeMap<(&str, &str), FillAccumulator> = BTreeMap::new();
    for claim in claims.iter() {
        groups
            .entry((claim.npi.as_str(), claim.ndc.as_str()))
            .or_default()
            .ingest(claim);
    }

    let reverted = if reverts.is_empty() {
        diagnostics.push(Issue::MetricsWithoutReverts);
        HashMap::new()
    } else {
        count_reversals(&claims.records, &reverts.records)
    };

    let rows = groups
        .into_iter()
        .map(|((npi, ndc), acc)| MetricRow {
            npi: npi.to_string(),
            ndc: ndc.to_string(),
            fills: acc.fills,
            total_price: round_money(acc.total_price),
            avg_price: round_money(acc.avg_unit_price()),
            reverted: reverted.get(&(npi, ndc)).copied().unwrap_or(0),
        })
        .collect::<Vec<_>>();
    info!(
        "Computed metrics for {} pharmacy/drug pair(s) from {} claim(s)",
        rows.len(),
        claims.len()
    );
    rows
}

fn count_reversals<'a>(
    claims: &'a [Claim],
    reverts: &'a [Revert],
) -> HashMap<(&'a str, &'a str), u64> {
    let lookup = join::index_by(reverts, |r| r.claim_id.as_str());
    let mut counts: HashMap<(&str, &str), u64> = HashMap::new();
    for (claim, revert) in join::left_join(claims, &lookup, |c| c.id.as_str()) {
        if revert.is_some() {
            *counts
                .entry((claim.npi.as_str(), claim.ndc.as_str()))
                .or_insert(0) += 1;
        }
    }
    counts
}
