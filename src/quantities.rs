use std::collections::{BTreeMap, HashMap};

use log::info;

use crate::{
    diagnostics::{Diagnostics, Issue},
    records::{Claim, Dataset},
    report::QuantityRanking,
};

/// Every prescribed quantity per drug, most frequent first. Equal counts are
/// ordered by ascending quantity. Rankings are ordered by ndc.
pub fn compute_common_quantities(
    claims: &Dataset<Claim>,
    diagnostics: &mut Diagnostics,
) -> Vec<QuantityRanking> {
    if claims.is_empty() {
        diagnostics.push(Issue::QuantitiesWithoutClaims);
        return Vec::new();
    }

    let mut counts: BTreeMap<&str, HashMap<i64, usize>> = BTreeMap::new();
    for claim in claims.iter() {
        *counts
            .entry(claim.ndc.as_str())
            .or_default()
            .entry(claim.quantity)
            .or_insert(0) += 1;
    }

    let rankings = counts
        .into_iter()
        .map(|(ndc, histogram)| {
            let mut items = histogram.into_iter().collect::<Vec<_>>();
            items.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            QuantityRanking {
                ndc: ndc.to_string(),
                most_prescribed_quantity: items
                    .into_iter()
                    .map(|(quantity, _)| quantity)
                    .collect(),
            }
        })
        .collect::<Vec<_>>();
    info!("Computed quantity rankings for {} drug(s)", rankings.len());
    rankings
}
