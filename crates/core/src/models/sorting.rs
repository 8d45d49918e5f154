use std::cmp::Ordering;

use super::types::Category;

/// Total order used for display: `sort_order` ascending with unset values
/// last, then name, then id.
///
/// Names compare by byte order, not by locale collation, so `"éclair"`
/// sorts after `"zucchini"`. Stored names are already lowercased.
pub fn compare_categories(a: &Category, b: &Category) -> Ordering {
    let order_a = a.sort_order.unwrap_or(i64::MAX);
    let order_b = b.sort_order.unwrap_or(i64::MAX);

    order_a
        .cmp(&order_b)
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.id.cmp(&b.id))
}

/// Sorts categories in display order.
pub fn sort_categories(categories: &mut [Category]) {
    categories.sort_by(compare_categories);
}
