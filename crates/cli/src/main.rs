use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use catalog_core::{CatalogConfig, CurrencyCode, PartnerId, PricelistId, TemplateId, UomId, VariantId};
use catalog_pricing::{PriceQuery, PricelistStore};
use catalog_products::{CatalogStore, select_seller, synchronize_variants};
use catalog_uom::{compute_price, compute_quantity};

mod snapshot;

use snapshot::{Resolver, Snapshot};

#[derive(Parser)]
#[command(version, about = "Query a product catalog snapshot")]
struct Cli {
    /// Catalog snapshot (JSON)
    #[arg(short, long, global = true, default_value = "catalog.json")]
    snapshot: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a unit price through a price list
    Price {
        /// Price list; the main one when omitted
        #[arg(long)]
        pricelist: Option<PricelistId>,
        #[arg(long, conflicts_with = "template", required_unless_present = "template")]
        variant: Option<VariantId>,
        /// Price the template's first active variant
        #[arg(long)]
        template: Option<TemplateId>,
        #[arg(long, default_value_t = 1.0)]
        quantity: f64,
        #[arg(long)]
        partner: Option<PartnerId>,
        /// Defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        uom: Option<UomId>,
        #[arg(long)]
        currency: Option<CurrencyCode>,
    },
    /// Pick the vendor price break for a purchase
    Seller {
        #[arg(long)]
        variant: VariantId,
        #[arg(long)]
        partner: Option<PartnerId>,
        #[arg(long, default_value_t = 1.0)]
        quantity: f64,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        uom: Option<UomId>,
    },
    /// List a template's variants
    Variants {
        #[arg(long)]
        template: TemplateId,
        /// Reconcile the variants with the attribute lines first
        #[arg(long)]
        sync: bool,
    },
    /// Convert a quantity, or a unit price with --price, between two units of the same category
    Convert {
        amount: f64,
        #[arg(long)]
        from: UomId,
        #[arg(long)]
        to: UomId,
        /// Treat the amount as a price per `from` unit
        #[arg(long)]
        price: bool,
    },
}

fn main() -> Result<()> {
    catalog_observability::init();
    let cli = Cli::parse();

    let result = run(cli);
    if let Err(e) = &result {
        tracing::error!(error = %e, "Command failed");
    }
    result
}

fn run(cli: Cli) -> Result<()> {
    let config = CatalogConfig::from_env().context("Invalid catalog environment")?;
    let resolver = Snapshot::read(&cli.snapshot)?.load(config)?;
    let today = || chrono::Local::now().date_naive();

    match cli.command {
        Commands::Price {
            pricelist,
            variant,
            template,
            quantity,
            partner,
            date,
            uom,
            currency,
        } => {
            let pricelist = match pricelist {
                Some(id) => id,
                None => main_pricelist(&resolver)?,
            };
            let date = date.unwrap_or_else(today);
            let price = match (variant, template) {
                (Some(variant), _) => {
                    let mut query = PriceQuery::new(pricelist, variant, quantity, date);
                    query.partner = partner;
                    query.uom = uom;
                    query.currency = currency;
                    Some(resolver.get_product_price(&query)?)
                }
                (None, Some(template)) => resolver.template_price(template, Some(pricelist), partner, quantity, date)?,
                (None, None) => anyhow::bail!("Either --variant or --template is required"),
            };
            println!("{}", serde_json::to_string(&price)?);
        }
        Commands::Seller {
            variant,
            partner,
            quantity,
            date,
            uom,
        } => {
            let variant = resolver.catalog().variant(variant)?;
            let seller = select_seller(&**resolver.catalog(), &variant, partner, quantity, date.unwrap_or_else(today), uom)?;
            println!("{}", serde_json::to_string_pretty(&seller)?);
        }
        Commands::Variants { template, sync } => {
            if sync {
                let report = synchronize_variants(&**resolver.catalog(), template)?;
                tracing::info!(?report, "variants synchronized");
            }
            let variants = resolver.catalog().variants_of(template)?;
            println!("{}", serde_json::to_string_pretty(&variants)?);
        }
        Commands::Convert { amount, from, to, price } => {
            println!("{}", convert(&**resolver.catalog(), amount, from, to, price)?);
        }
    }
    Ok(())
}

fn convert<S>(store: &S, amount: f64, from: UomId, to: UomId, price: bool) -> Result<f64>
where
    S: CatalogStore + ?Sized,
{
    let from = store.uom(from)?;
    let to = store.uom(to)?;
    let converted = if price {
        compute_price(amount, &from, &to)?
    } else {
        compute_quantity(amount, &from, &to)?
    };
    Ok(converted)
}

fn main_pricelist(resolver: &Resolver) -> Result<PricelistId> {
    let main = resolver
        .pricelists()
        .main_pricelist()?
        .context("Snapshot has no main price list; pass --pricelist")?;
    Ok(main.id)
}
