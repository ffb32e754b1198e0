//! Ordered report built from [`Totals`], and its text form.

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

use super::totals::{IngestStats, Totals};
use crate::classify::{Bucket, Layer};
use crate::fmt::{format_pct, pct};

/// Printed when the log holds nothing to attribute.
pub const NO_DATA_MESSAGE: &str = "No numeric delta values > 0 found.";

const NAME_WIDTH: usize = 26;
const PATH_WIDTH: usize = 70;

#[derive(Debug, Clone, Serialize)]
pub struct LayerShare {
    pub layer: Layer,
    pub total: i64,
    pub pct_of_total: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CounterDetail {
    pub path: String,
    pub total: i64,
    pub pct_of_component: f64,
    pub pct_of_total: f64,
    pub source: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComponentDetail {
    pub component: &'static str,
    pub total: i64,
    pub pct_of_layer: f64,
    pub pct_of_total: f64,
    pub counters: Vec<CounterDetail>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LayerDetail {
    pub layer: Layer,
    pub total: i64,
    pub pct_of_total: f64,
    pub components: Vec<ComponentDetail>,
}

/// Fully ordered report, ready to print or serialize.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub total: i64,
    /// Nonzero layers, largest first.
    pub layers: Vec<LayerShare>,
    /// Per-layer breakdown in canonical layer order.
    pub details: Vec<LayerDetail>,
    pub stats: IngestStats,
}

/// Descending by value, then ascending by name.
fn by_total_desc<K: Ord>(a: (&K, i64), b: (&K, i64)) -> Ordering {
    b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0))
}

impl Report {
    /// Builds the report. `None` when the global total is zero.
    pub fn build(totals: &Totals) -> Option<Self> {
        if totals.global == 0 {
            return None;
        }
        let global = totals.global;

        let mut layers: Vec<LayerShare> = totals
            .by_layer
            .iter()
            .filter(|(_, total)| **total != 0)
            .map(|(layer, total)| LayerShare {
                layer: *layer,
                total: *total,
                pct_of_total: pct(*total, global),
            })
            .collect();
        layers.sort_by(|a, b| by_total_desc((&a.layer.name(), a.total), (&b.layer.name(), b.total)));

        let details = Layer::ALL
            .iter()
            .filter_map(|layer| layer_detail(totals, *layer))
            .collect();

        Some(Self {
            total: global,
            layers,
            details,
            stats: totals.stats,
        })
    }
}

fn layer_detail(totals: &Totals, layer: Layer) -> Option<LayerDetail> {
    let mut buckets: Vec<(Bucket, i64)> = totals.buckets_in(layer).map(|(b, v)| (*b, *v)).collect();
    if buckets.is_empty() {
        return None;
    }
    buckets.sort_by(|a, b| by_total_desc((&a.0.component, a.1), (&b.0.component, b.1)));

    let global = totals.global;
    let layer_total = totals.layer_total(layer);
    let components = buckets
        .into_iter()
        .map(|(bucket, comp_total)| {
            let mut counters: Vec<(&String, i64)> =
                totals.counters_in(bucket).map(|(p, v)| (p, *v)).collect();
            counters.sort_by(|a, b| by_total_desc(*a, *b));

            ComponentDetail {
                component: bucket.component,
                total: comp_total,
                pct_of_layer: pct(comp_total, layer_total),
                pct_of_total: pct(comp_total, global),
                counters: counters
                    .into_iter()
                    .map(|(path, total)| CounterDetail {
                        path: path.clone(),
                        total,
                        pct_of_component: pct(total, comp_total),
                        pct_of_total: pct(total, global),
                        source: totals.sources.get(path).copied().unwrap_or("(unknown)"),
                    })
                    .collect(),
            }
        })
        .collect();

    Some(LayerDetail {
        layer,
        total: layer_total,
        pct_of_total: pct(layer_total, global),
        components,
    })
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Error shares by Layer ===")?;
        for share in &self.layers {
            writeln!(
                f,
                "{:<w$} {:>10}  ({})",
                share.layer.name(),
                share.total,
                format_pct(share.pct_of_total),
                w = NAME_WIDTH
            )?;
        }
        writeln!(f, "{:<w$} {:>10}", "Total errors/drops", self.total, w = NAME_WIDTH)?;
        writeln!(f)?;

        for detail in &self.details {
            writeln!(
                f,
                "## {}  (Sum: {}, Share of total: {})",
                detail.layer,
                detail.total,
                format_pct(detail.pct_of_total)
            )?;
            for comp in &detail.components {
                writeln!(
                    f,
                    "  - Component: {}  (Sum: {}, Share of layer: {}, Share of total: {})",
                    comp.component,
                    comp.total,
                    format_pct(comp.pct_of_layer),
                    format_pct(comp.pct_of_total)
                )?;
                for c in &comp.counters {
                    writeln!(
                        f,
                        "      • {:<w$} {:>10}  [{} of comp., {} total]   <{}>",
                        c.path,
                        c.total,
                        format_pct(c.pct_of_component),
                        format_pct(c.pct_of_total),
                        c.source,
                        w = PATH_WIDTH
                    )?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
