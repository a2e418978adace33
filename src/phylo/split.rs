use super::taxon::TaxonRegistry;
use crate::SplitBitmask;
use crate::parsers::newick::{LabelEscaping, escape_newick_label};
use std::sync::Arc;

/// `true` for `0` and for the mask of all taxa: both name the whole leaf set.
pub fn is_trivial_split(split: SplitBitmask, registry: &TaxonRegistry) -> bool {
    split == 0 || split == registry.all_taxa_bitmask()
}

/// Partitions the registry labels by `split`: labels whose bit is set come
/// first, the rest second. Both keep registry order.
pub fn split_leaf_labels(
    split: SplitBitmask,
    registry: &TaxonRegistry,
) -> (Vec<Arc<str>>, Vec<Arc<str>>) {
    let mut in_split = Vec::new();
    let mut out_of_split = Vec::new();
    for (index, label) in registry.labels().into_iter().enumerate() {
        let bit_set = index < SplitBitmask::BITS as usize && (split >> index) & 1 == 1;
        if bit_set {
            in_split.push(label);
        } else {
            out_of_split.push(label);
        }
    }
    (in_split, out_of_split)
}

/// Renders a split as a NEWICK-style bipartition.
///
/// The trivial split is a single group of every label, `(A,B,C)`; any other
/// split is `((set...), (unset...))`.
pub fn split_as_newick_string(
    split: SplitBitmask,
    registry: &TaxonRegistry,
    escaping: LabelEscaping,
) -> String {
    let escape = |labels: Vec<Arc<str>>| -> Vec<String> {
        labels
            .iter()
            .map(|label| escape_newick_label(label, escaping).into_owned())
            .collect()
    };

    if is_trivial_split(split, registry) {
        return format!("({})", escape(registry.labels()).join(","));
    }

    let (left, right) = split_leaf_labels(split, registry);
    debug_assert_eq!(left.len() + right.len(), registry.len());
    format!("(({}), ({}))", escape(left).join(", "), escape(right).join(", "))
}
