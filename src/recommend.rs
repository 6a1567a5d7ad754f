use std::{cmp::Ordering, collections::BTreeMap};

use log::info;

use crate::{
    diagnostics::{Diagnostics, Issue},
    join,
    records::{Claim, Dataset, Pharmacy},
    report::{ChainPrice, ChainRecommendation, round_money},
    schema::Layout,
};

/// Number of chains recommended per drug.
pub const TOP_CHAINS: usize = 2;

#[derive(Debug, Default)]
struct UnitPriceMean {
    sum: f64,
    count: u64,
}

impl UnitPriceMean {
    fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }
}

/// For each drug, the (up to) two chains with the lowest mean unit price.
///
/// Claims whose pharmacy is not in the directory are grouped under a missing
/// chain. Equal means are ordered by chain name, missing chain last.
/// Recommendations are ordered by ndc.
pub fn compute_top_chains(
    claims: &Dataset<Claim>,
    pharmacies: &Dataset<Pharmacy>,
    diagnostics: &mut Diagnostics,
) -> Vec<ChainRecommendation> {
    let missing = [
        (Layout::Claims, claims.is_empty()),
        (Layout::Pharmacies, pharmacies.is_empty()),
    ]
    .into_iter()
    .filter_map(|(layout, empty)| empty.then_some(layout))
    .collect::<Vec<_>>();
    if !missing.is_empty() {
        diagnostics.push(Issue::RecommendationsWithoutInput { missing });
        return Vec::new();
    }

    let lookup = join::index_by(&pharmacies.records, |p| p.npi.as_str());
    let mut groups: BTreeMap<&str, BTreeMap<Option<&str>, UnitPriceMean>> = BTreeMap::new();
    for (claim, pharmacy) in join::left_join(&claims.records, &lookup, |c| c.npi.as_str()) {
        let chain = pharmacy.map(|p| p.chain.as_str());
        let acc = groups
            .entry(claim.ndc.as_str())
            .or_default()
            .entry(chain)
            .or_default();
        acc.sum += claim.unit_price();
        acc.count += 1;
    }

    let recommendations = groups
        .into_iter()
        .map(|(ndc, chains)| {
            let mut ranked = chains
                .into_iter()
                .map(|(chain, acc)| (chain, acc.mean()))
                .collect::<Vec<_>>();
            ranked.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| compare_chain_names(a.0, b.0)));
            ChainRecommendation {
                ndc: ndc.to_string(),
                chain: ranked
                    .into_iter()
                    .take(TOP_CHAINS)
                    .map(|(name, avg)| ChainPrice {
                        name: name.map(str::to_string),
                        avg_price: round_money(avg),
                    })
                    .collect(),
            }
        })
        .collect::<Vec<_>>();
    info!(
        "Computed chain recommendations for {} drug(s)",
        recommendations.len()
    );
    recommendations
}

fn compare_chain_names(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
