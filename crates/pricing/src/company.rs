//! Companies and their default price lists.

use serde::{Deserialize, Serialize};

use catalog_core::{CompanyId, CurrencyCode, DomainResult, Entity, PricelistId};

use crate::pricelist::Pricelist;
use crate::store::PricelistStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub currency: CurrencyCode,
    /// Price list offered to this company's partners by default.
    #[serde(default)]
    pub default_pricelist: Option<PricelistId>,
}

impl Company {
    pub fn new(name: impl Into<String>, currency: CurrencyCode) -> Self {
        Self {
            id: CompanyId::new(),
            name: name.into(),
            currency,
            default_pricelist: None,
        }
    }
}

impl Entity for Company {
    type Id = CompanyId;

    fn id(&self) -> CompanyId {
        self.id
    }
}

/// Give `company` a default price list.
///
/// A shared (company-less) list in the company's currency is reused; otherwise
/// a new list named after the company is created.
pub fn ensure_company_pricelist<S>(store: &S, company: CompanyId) -> DomainResult<PricelistId>
where
    S: PricelistStore + ?Sized,
{
    let mut company = store.company(company)?;
    let shared = store
        .pricelists()?
        .into_iter()
        .find(|p| p.company.is_none() && p.currency == company.currency);

    let pricelist = match shared {
        Some(pricelist) => pricelist.id,
        None => {
            let pricelist = Pricelist::new(company.name.clone(), company.currency.clone());
            let id = pricelist.id;
            store.insert_pricelist(pricelist)?;
            tracing::info!(company = %company.id, pricelist = %id, "company price list created");
            id
        }
    };

    company.default_pricelist = Some(pricelist);
    store.save_company(company)?;
    Ok(pricelist)
}

/// Switch the company to `currency` and keep its price list in step.
///
/// The main price list follows the new currency when it belongs to the
/// company, or when it is shared and this is the only company. Otherwise a new
/// list in that currency becomes the company's default. Returns the company's
/// default price list afterwards.
pub fn change_company_currency<S>(
    store: &S,
    company: CompanyId,
    currency: CurrencyCode,
) -> DomainResult<Option<PricelistId>>
where
    S: PricelistStore + ?Sized,
{
    let mut company = store.company(company)?;
    if let Some(mut main) = store.main_pricelist()? {
        let sole_company = store.companies()?.len() == 1;
        let owned = main.company == Some(company.id);
        if owned || (main.company.is_none() && sole_company) {
            main.currency = currency.clone();
            tracing::info!(pricelist = %main.id, currency = %currency, "main price list currency changed");
            store.save_pricelist(main)?;
        } else {
            let pricelist = Pricelist::new(company.name.clone(), currency.clone());
            company.default_pricelist = Some(pricelist.id);
            store.insert_pricelist(pricelist)?;
        }
    }

    company.currency = currency;
    let default = company.default_pricelist;
    store.save_company(company)?;
    Ok(default)
}
