//! Picks the rule of a price list that applies to a product in context.

use std::cmp::Reverse;

use chrono::NaiveDate;

use catalog_products::{ProductTemplate, ProductVariant};

use crate::pricelist::{Pricelist, PricelistItem};

/// Whether `item` applies to the product at `quantity` (in the product's
/// default unit) on `date`.
pub fn applies(
    item: &PricelistItem,
    template: &ProductTemplate,
    variant: &ProductVariant,
    quantity: f64,
    date: NaiveDate,
) -> bool {
    item.applied_on.matches(template, variant) && quantity >= item.min_quantity && item.validity.contains(date)
}

/// The winning rule, or `None` when no rule applies.
///
/// Lowest sequence wins, then the narrowest scope, then list order.
pub fn select_rule<'a>(
    pricelist: &'a Pricelist,
    template: &ProductTemplate,
    variant: &ProductVariant,
    quantity: f64,
    date: NaiveDate,
) -> Option<&'a PricelistItem> {
    pricelist
        .items
        .iter()
        .enumerate()
        .filter(|(_, item)| applies(item, template, variant, quantity, date))
        .min_by_key(|(position, item)| (item.sequence, Reverse(item.applied_on.specificity()), *position))
        .map(|(_, item)| item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricelist::{AppliedOn, ComputePrice};
    use catalog_core::{CategoryId, CurrencyCode, TemplateId, UomId, Validity};

    fn product() -> (ProductTemplate, ProductVariant) {
        let template = ProductTemplate {
            id: TemplateId::new(),
            name: "Laptop".into(),
            category: CategoryId::new(),
            currency: CurrencyCode::new("EUR").unwrap(),
            company: None,
            list_price: 100.0,
            standard_price: 60.0,
            uom: UomId::new(),
            uom_po: UomId::new(),
            attribute_lines: Vec::new(),
            sellers: Vec::new(),
            sale_ok: true,
            purchase_ok: true,
            active: true,
        };
        let variant = ProductVariant::new(template.id, []);
        (template, variant)
    }

    fn fixed(applied_on: AppliedOn, price: f64) -> PricelistItem {
        PricelistItem::new(applied_on, ComputePrice::Fixed(price))
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn list(items: Vec<PricelistItem>) -> Pricelist {
        let mut pricelist = Pricelist::new("Public", CurrencyCode::new("EUR").unwrap());
        pricelist.items = items;
        pricelist
    }

    fn picked(pricelist: &Pricelist, t: &ProductTemplate, v: &ProductVariant, qty: f64, date: &str) -> Option<ComputePrice> {
        select_rule(pricelist, t, v, qty, d(date)).map(|i| i.compute)
    }

    #[test]
    fn empty_list_selects_nothing() {
        let (t, v) = product();
        assert!(picked(&list(Vec::new()), &t, &v, 1.0, "2024-01-01").is_none());
    }

    #[test]
    fn lowest_sequence_wins_over_scope() {
        let (t, v) = product();
        let pl = list(vec![
            fixed(AppliedOn::Variant(v.id), 1.0).with_sequence(5),
            fixed(AppliedOn::Global, 2.0).with_sequence(1),
        ]);
        assert_eq!(picked(&pl, &t, &v, 1.0, "2024-01-01"), Some(ComputePrice::Fixed(2.0)));
    }

    #[test]
    fn narrower_scope_breaks_sequence_ties() {
        let (t, v) = product();
        let pl = list(vec![
            fixed(AppliedOn::Global, 1.0),
            fixed(AppliedOn::Category(t.category), 2.0),
            fixed(AppliedOn::Template(t.id), 3.0),
        ]);
        assert_eq!(picked(&pl, &t, &v, 1.0, "2024-01-01"), Some(ComputePrice::Fixed(3.0)));
    }

    #[test]
    fn list_order_breaks_remaining_ties() {
        let (t, v) = product();
        let pl = list(vec![fixed(AppliedOn::Global, 1.0), fixed(AppliedOn::Global, 2.0)]);
        assert_eq!(picked(&pl, &t, &v, 1.0, "2024-01-01"), Some(ComputePrice::Fixed(1.0)));
    }

    #[test]
    fn other_products_and_categories_do_not_match() {
        let (t, v) = product();
        let pl = list(vec![
            fixed(AppliedOn::Category(CategoryId::new()), 1.0),
            fixed(AppliedOn::Template(TemplateId::new()), 2.0),
        ]);
        assert!(picked(&pl, &t, &v, 1.0, "2024-01-01").is_none());
    }

    #[test]
    fn quantity_threshold_is_inclusive() {
        let (t, v) = product();
        let pl = list(vec![fixed(AppliedOn::Global, 1.0).with_min_quantity(3.0)]);
        assert!(picked(&pl, &t, &v, 2.0, "2024-01-01").is_none());
        assert!(picked(&pl, &t, &v, 3.0, "2024-01-01").is_some());
    }

    #[test]
    fn date_window_is_inclusive_on_both_ends() {
        let (t, v) = product();
        let window = Validity::between(d("2011-12-27"), d("2011-12-31")).unwrap();
        let pl = list(vec![fixed(AppliedOn::Global, 1.0).with_validity(window)]);
        assert!(picked(&pl, &t, &v, 1.0, "2011-12-26").is_none());
        assert!(picked(&pl, &t, &v, 1.0, "2011-12-27").is_some());
        assert!(picked(&pl, &t, &v, 1.0, "2011-12-31").is_some());
        assert!(picked(&pl, &t, &v, 1.0, "2012-01-01").is_none());
    }

    #[test]
    fn open_ended_window() {
        let (t, v) = product();
        let from = Validity::new(Some(d("2020-01-01")), None).unwrap();
        let pl = list(vec![fixed(AppliedOn::Global, 1.0).with_validity(from)]);
        assert!(picked(&pl, &t, &v, 1.0, "2019-12-31").is_none());
        assert!(picked(&pl, &t, &v, 1.0, "2099-01-01").is_some());
    }
}
