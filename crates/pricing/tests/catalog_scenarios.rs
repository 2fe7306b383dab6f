use std::sync::Arc;

use chrono::NaiveDate;

use catalog_core::{CatalogDefaults, CategoryId, CurrencyCode, PartnerId, PricelistId, TemplateId, UomId, Validity, VariantId};
use catalog_pricing::{
    AppliedOn, ComputePrice, Formula, InMemoryPricelistStore, PriceBase, PriceQuery, PriceResolver, Pricelist,
    PricelistItem, PricelistStore, StaticRates,
};
use catalog_products::{
    Attribute, AttributeLine, AttributeValue, CatalogStore, InMemoryCatalogStore, NewTemplate, SupplierInfo,
    TemplatePatch, create_template, select_seller, update_template,
};
use catalog_uom::{Uom, UomCategory};

type Resolver = PriceResolver<Arc<InMemoryCatalogStore>, Arc<InMemoryPricelistStore>, StaticRates>;

fn eur() -> CurrencyCode {
    CurrencyCode::new("EUR").unwrap()
}

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn today() -> NaiveDate {
    d("2024-01-10")
}

fn assert_close(actual: f64, expected: f64) {
    assert!((actual - expected).abs() < 1e-9, "expected {expected}, got {actual}");
}

struct Units {
    unit: UomId,
    dozen: UomId,
    kg: UomId,
    ton: UomId,
}

struct Demo {
    catalog: Arc<InMemoryCatalogStore>,
    pricelists: Arc<InMemoryPricelistStore>,
    resolver: Resolver,
    units: Units,
    defaults: CatalogDefaults,
    computers: CategoryId,
    list0: PricelistId,
}

fn demo() -> Demo {
    let catalog = Arc::new(InMemoryCatalogStore::new());
    let count = UomCategory::new("Unit");
    let weight = UomCategory::new("Weight");
    let units = Units {
        unit: catalog.insert_uom(Uom::reference("Unit(s)", count.id, 0.01).unwrap()).unwrap(),
        dozen: catalog.insert_uom(Uom::bigger("Dozen(s)", count.id, 12.0, 0.01).unwrap()).unwrap(),
        kg: catalog.insert_uom(Uom::reference("kg", weight.id, 0.001).unwrap()).unwrap(),
        ton: catalog.insert_uom(Uom::bigger("t", weight.id, 1000.0, 0.001).unwrap()).unwrap(),
    };

    let pricelists = Arc::new(InMemoryPricelistStore::new());
    let list0 = pricelists.insert_pricelist(Pricelist::new("Public Pricelist", eur())).unwrap();
    pricelists.set_main_pricelist(list0).unwrap();

    let rates = StaticRates::new().with_rate(eur(), 1.0).unwrap();
    Demo {
        resolver: PriceResolver::new(Arc::clone(&catalog), Arc::clone(&pricelists), rates),
        catalog,
        pricelists,
        units,
        defaults: CatalogDefaults::new(CategoryId::new(), eur()),
        computers: CategoryId::new(),
        list0,
    }
}

impl Demo {
    fn product(&self, new: NewTemplate) -> (TemplateId, VariantId) {
        let template = create_template(&*self.catalog, new, &self.defaults).unwrap();
        let variant = self.catalog.variants_of(template).unwrap()[0].id;
        (template, variant)
    }

    fn unit_product(&self, name: &str, list_price: f64) -> (TemplateId, VariantId) {
        self.product(NewTemplate::new(name, self.units.unit).with_list_price(list_price))
    }

    fn price(&self, query: PriceQuery) -> f64 {
        self.resolver.get_product_price(&query).unwrap()
    }
}

#[test]
fn sale_pricelist_discount_and_surcharge() {
    let demo = demo();
    let (_, usb) = demo.unit_product("USB Adapter", 70.0);
    let (_, card) = demo.unit_product("Datacard", 40.0);

    let sale = demo
        .pricelists
        .insert_pricelist(
            Pricelist::new("Sale pricelist", eur())
                .with_item(PricelistItem::new(AppliedOn::Variant(usb), ComputePrice::Formula(Formula::discount(10.0))))
                .with_item(PricelistItem::new(AppliedOn::Variant(card), ComputePrice::Formula(Formula::surcharge(-0.5)))),
        )
        .unwrap();

    assert_close(demo.price(PriceQuery::new(sale, usb, 1.0, today())), 63.0);
    assert_close(demo.price(PriceQuery::new(demo.list0, usb, 1.0, today())), 70.0);
    assert_close(demo.price(PriceQuery::new(sale, card, 1.0, today())), 39.5);
    assert_close(demo.price(PriceQuery::new(demo.list0, card, 1.0, today())), 40.0);

    for product in [usb, card] {
        let per_unit = demo.price(PriceQuery::new(sale, product, 1.0, today()).with_uom(demo.units.unit));
        let per_dozen = demo.price(PriceQuery::new(sale, product, 1.0, today()).with_uom(demo.units.dozen));
        assert_close(per_unit * 12.0, per_dozen);
    }
}

#[test]
fn quantity_break_in_another_unit() {
    let demo = demo();
    let (_, spam) = demo.product(
        NewTemplate::new("1 tonne of spam", demo.units.ton)
            .with_list_price(100.0)
            .with_uom_po(demo.units.ton),
    );

    let mut public = demo.pricelists.pricelist(demo.list0).unwrap();
    public.items.push(
        PricelistItem::new(AppliedOn::Variant(spam), ComputePrice::Formula(Formula::surcharge(-10.0)))
            .with_sequence(10)
            .with_min_quantity(3.0),
    );
    demo.pricelists.save_pricelist(public).unwrap();

    let unit_price = |qty: f64, uom: UomId| demo.price(PriceQuery::new(demo.list0, spam, qty, today()).with_uom(uom));

    assert_close(unit_price(2.0, demo.units.kg), 0.1);
    assert_close(unit_price(2000.0, demo.units.kg), 0.1);
    assert_close(unit_price(3500.0, demo.units.kg), 0.09);
    assert_close(unit_price(2.0, demo.units.ton), 100.0);
    assert_close(unit_price(3.0, demo.units.ton), 90.0);
}

#[test]
fn customer_pricelist_based_on_the_public_one() {
    let demo = demo();
    let (retina, retina_variant) =
        demo.product(NewTemplate::new("iPad Retina Display", demo.units.unit).with_list_price(750.0).with_category(demo.computers));
    let (e5023, e5023_variant) = demo.unit_product("Laptop E5023", 70.0);
    let (_, headphones) = demo.unit_product("Apple In-Ear Headphones", 79.0);
    let (_, s3450) =
        demo.product(NewTemplate::new("Laptop S3450", demo.units.unit).with_list_price(2950.0).with_category(demo.computers));
    let (_, mini) = demo.unit_product("iPad Mini", 320.0);

    let customer = demo
        .pricelists
        .insert_pricelist(
            Pricelist::new("Customer pricelist", eur())
                .with_item(
                    PricelistItem::new(AppliedOn::Global, ComputePrice::Formula(Formula::default()))
                        .with_base(PriceBase::Pricelist(demo.list0)),
                )
                .with_item(
                    PricelistItem::new(AppliedOn::Template(retina), ComputePrice::Formula(Formula::discount(10.0)))
                        .with_sequence(1),
                )
                .with_item(
                    PricelistItem::new(AppliedOn::Template(e5023), ComputePrice::Formula(Formula::surcharge(1.0)))
                        .with_sequence(4),
                )
                .with_item(
                    PricelistItem::new(AppliedOn::Category(demo.computers), ComputePrice::Formula(Formula::discount(5.0)))
                        .with_sequence(1)
                        .with_min_quantity(2.0),
                )
                .with_item(
                    PricelistItem::new(AppliedOn::Variant(mini), ComputePrice::Formula(Formula::discount(30.0)))
                        .with_sequence(1)
                        .with_validity(Validity::between(d("2011-12-27"), d("2011-12-31")).unwrap()),
                ),
        )
        .unwrap();

    let at = |variant: VariantId, qty: f64, date: NaiveDate| demo.price(PriceQuery::new(customer, variant, qty, date));

    assert_close(at(retina_variant, 1.0, today()), 675.0);
    assert_close(at(e5023_variant, 1.0, today()), 71.0);
    assert_close(at(headphones, 1.0, today()), 79.0);
    assert_close(at(s3450, 5.0, today()), 2802.5);
    assert_close(at(s3450, 1.0, today()), 2950.0);
    assert_close(at(mini, 1.0, today()), 320.0);
    assert_close(at(mini, 1.0, d("2011-12-31")), 224.0);
    assert_close(at(mini, 1.0, d("2012-01-01")), 320.0);
}

#[test]
fn vendor_breaks_pick_the_tightest_quantity() {
    let demo = demo();
    let partner = PartnerId::new();
    let (_, mini) = demo.product(
        NewTemplate::new("iPad Mini", demo.units.unit)
            .with_list_price(320.0)
            .with_seller(SupplierInfo::new(Some(partner), 1.0, 790.0, eur()))
            .with_seller(SupplierInfo::new(Some(partner), 3.0, 785.0, eur())),
    );
    let variant = demo.catalog.variant(mini).unwrap();

    let at = |qty: f64| {
        select_seller(&*demo.catalog, &variant, Some(partner), qty, today(), None)
            .unwrap()
            .map(|s| s.price)
    };
    assert_eq!(at(1.0), Some(790.0));
    assert_eq!(at(3.0), Some(785.0));
    assert_eq!(at(0.5), None);
}

#[test]
fn cost_based_prices_agree_across_sibling_variants() {
    let demo = demo();
    let size = Attribute::new("Size");
    demo.catalog.insert_attribute(size.clone()).unwrap();
    let sizes: Vec<_> = ["S", "M", "L"]
        .into_iter()
        .map(|name| demo.catalog.insert_attribute_value(AttributeValue::new(&size, name)).unwrap())
        .collect();

    let template = create_template(
        &*demo.catalog,
        NewTemplate::new("Chair", demo.units.unit)
            .with_line(AttributeLine::new(&size, sizes))
            .with_standard_price(42.0),
        &demo.defaults,
    )
    .unwrap();
    let patch = TemplatePatch {
        standard_price: Some(50.0),
        ..TemplatePatch::default()
    };
    update_template(&*demo.catalog, template, patch).unwrap();

    let at_cost = demo
        .pricelists
        .insert_pricelist(Pricelist::new("Cost plus", eur()).with_item(
            PricelistItem::new(AppliedOn::Global, ComputePrice::Formula(Formula::surcharge(10.0)))
                .with_base(PriceBase::StandardPrice),
        ))
        .unwrap();

    let prices: Vec<f64> = demo
        .catalog
        .variants_of(template)
        .unwrap()
        .iter()
        .map(|v| demo.price(PriceQuery::new(at_cost, v.id, 1.0, today())))
        .collect();
    assert_eq!(prices.len(), 3);
    for price in prices {
        assert_close(price, 60.0);
    }
}
