use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use std::sync::Arc;

use chrono::NaiveDate;
use catalog_core::{CatalogDefaults, CategoryId, CurrencyCode, PricelistId, VariantId};
use catalog_pricing::{
    AppliedOn, ComputePrice, Formula, InMemoryPricelistStore, PriceBase, PriceQuery, PriceResolver, Pricelist,
    PricelistItem, PricelistStore, StaticRates,
};
use catalog_products::{CatalogStore, InMemoryCatalogStore, NewTemplate, create_template};
use catalog_uom::{Uom, UomCategory};

type Resolver = PriceResolver<Arc<InMemoryCatalogStore>, Arc<InMemoryPricelistStore>, StaticRates>;

fn eur() -> CurrencyCode {
    CurrencyCode::new("EUR").unwrap()
}

/// A product and a chain of `depth` price lists, each based on the previous one.
fn setup(depth: usize, noise_items: usize) -> (Resolver, PricelistId, VariantId) {
    let catalog = Arc::new(InMemoryCatalogStore::new());
    let unit = catalog
        .insert_uom(Uom::reference("Unit", UomCategory::new("Unit").id, 0.01).unwrap())
        .unwrap();
    let defaults = CatalogDefaults::new(CategoryId::new(), eur());
    let template = create_template(&*catalog, NewTemplate::new("Widget", unit).with_list_price(100.0), &defaults).unwrap();
    let variant = catalog.variants_of(template).unwrap()[0].id;

    let pricelists = Arc::new(InMemoryPricelistStore::new());
    let mut previous: Option<PricelistId> = None;
    for level in 0..depth {
        let mut list = Pricelist::new(format!("Level {level}"), eur());
        // Rules for other categories the selector has to skip.
        for _ in 0..noise_items {
            list.items.push(PricelistItem::new(AppliedOn::Category(CategoryId::new()), ComputePrice::Fixed(1.0)));
        }
        let mut item = PricelistItem::new(AppliedOn::Global, ComputePrice::Formula(Formula::discount(1.0)));
        if let Some(base) = previous {
            item = item.with_base(PriceBase::Pricelist(base));
        }
        list.items.push(item);
        previous = Some(pricelists.insert_pricelist(list).unwrap());
    }

    let resolver = PriceResolver::new(catalog, pricelists, StaticRates::new());
    (resolver, previous.unwrap(), variant)
}

fn bench_flat_pricelist(c: &mut Criterion) {
    let mut group = c.benchmark_group("flat_pricelist");
    for noise in [0usize, 10, 100] {
        let (resolver, pricelist, variant) = setup(1, noise);
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::from_parameter(noise), &noise, |b, _| {
            b.iter(|| {
                let query = PriceQuery::new(pricelist, variant, black_box(5.0), date);
                black_box(resolver.get_product_price(&query).unwrap())
            });
        });
    }
    group.finish();
}

fn bench_chained_pricelists(c: &mut Criterion) {
    let mut group = c.benchmark_group("chained_pricelists");
    for depth in [1usize, 3, 10] {
        let (resolver, pricelist, variant) = setup(depth, 5);
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, _| {
            b.iter(|| {
                let query = PriceQuery::new(pricelist, variant, black_box(1.0), date);
                black_box(resolver.get_product_price(&query).unwrap())
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_flat_pricelist, bench_chained_pricelists);
criterion_main!(benches);
