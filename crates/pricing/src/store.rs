//! Record access for price lists and companies.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use catalog_core::{CompanyId, DomainError, DomainResult, PricelistId};

use crate::company::Company;
use crate::pricelist::Pricelist;

pub trait PricelistStore: Send + Sync {
    fn pricelist(&self, id: PricelistId) -> DomainResult<Pricelist>;

    /// Every price list, in insertion order.
    fn pricelists(&self) -> DomainResult<Vec<Pricelist>>;

    /// The catalog-wide public price list, when one is designated.
    fn main_pricelist(&self) -> DomainResult<Option<Pricelist>>;

    /// Validates and inserts; `Conflict` when the id is taken.
    fn insert_pricelist(&self, pricelist: Pricelist) -> DomainResult<PricelistId>;

    /// Validates and overwrites; `NotFound` when absent.
    fn save_pricelist(&self, pricelist: Pricelist) -> DomainResult<()>;

    fn company(&self, id: CompanyId) -> DomainResult<Company>;
    fn companies(&self) -> DomainResult<Vec<Company>>;
    fn insert_company(&self, company: Company) -> DomainResult<CompanyId>;
    fn save_company(&self, company: Company) -> DomainResult<()>;
}

impl<S> PricelistStore for Arc<S>
where
    S: PricelistStore + ?Sized,
{
    fn pricelist(&self, id: PricelistId) -> DomainResult<Pricelist> {
        (**self).pricelist(id)
    }

    fn pricelists(&self) -> DomainResult<Vec<Pricelist>> {
        (**self).pricelists()
    }

    fn main_pricelist(&self) -> DomainResult<Option<Pricelist>> {
        (**self).main_pricelist()
    }

    fn insert_pricelist(&self, pricelist: Pricelist) -> DomainResult<PricelistId> {
        (**self).insert_pricelist(pricelist)
    }

    fn save_pricelist(&self, pricelist: Pricelist) -> DomainResult<()> {
        (**self).save_pricelist(pricelist)
    }

    fn company(&self, id: CompanyId) -> DomainResult<Company> {
        (**self).company(id)
    }

    fn companies(&self) -> DomainResult<Vec<Company>> {
        (**self).companies()
    }

    fn insert_company(&self, company: Company) -> DomainResult<CompanyId> {
        (**self).insert_company(company)
    }

    fn save_company(&self, company: Company) -> DomainResult<()> {
        (**self).save_company(company)
    }
}

#[derive(Debug, Default)]
struct PricingState {
    pricelists: HashMap<PricelistId, Pricelist>,
    order: Vec<PricelistId>,
    main: Option<PricelistId>,
    companies: HashMap<CompanyId, Company>,
    company_order: Vec<CompanyId>,
}

/// In-memory price list store for tests, benches and the CLI.
#[derive(Debug, Default)]
pub struct InMemoryPricelistStore {
    inner: RwLock<PricingState>,
}

impl InMemoryPricelistStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> DomainResult<RwLockReadGuard<'_, PricingState>> {
        self.inner
            .read()
            .map_err(|_| DomainError::invariant("price list store lock poisoned"))
    }

    fn write(&self) -> DomainResult<RwLockWriteGuard<'_, PricingState>> {
        self.inner
            .write()
            .map_err(|_| DomainError::invariant("price list store lock poisoned"))
    }

    pub fn set_main_pricelist(&self, id: PricelistId) -> DomainResult<()> {
        let mut state = self.write()?;
        if !state.pricelists.contains_key(&id) {
            return Err(DomainError::not_found(format!("price list {id}")));
        }
        state.main = Some(id);
        Ok(())
    }
}

impl PricelistStore for InMemoryPricelistStore {
    fn pricelist(&self, id: PricelistId) -> DomainResult<Pricelist> {
        self.read()?
            .pricelists
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("price list {id}")))
    }

    fn pricelists(&self) -> DomainResult<Vec<Pricelist>> {
        let state = self.read()?;
        Ok(state
            .order
            .iter()
            .filter_map(|id| state.pricelists.get(id).cloned())
            .collect())
    }

    fn main_pricelist(&self) -> DomainResult<Option<Pricelist>> {
        let state = self.read()?;
        Ok(state.main.and_then(|id| state.pricelists.get(&id).cloned()))
    }

    fn insert_pricelist(&self, pricelist: Pricelist) -> DomainResult<PricelistId> {
        pricelist.validate()?;
        let mut state = self.write()?;
        let id = pricelist.id;
        if state.pricelists.contains_key(&id) {
            return Err(DomainError::conflict(format!("price list {id} already exists")));
        }
        state.pricelists.insert(id, pricelist);
        state.order.push(id);
        Ok(id)
    }

    fn save_pricelist(&self, pricelist: Pricelist) -> DomainResult<()> {
        pricelist.validate()?;
        let mut state = self.write()?;
        match state.pricelists.get_mut(&pricelist.id) {
            Some(existing) => {
                *existing = pricelist;
                Ok(())
            }
            None => Err(DomainError::not_found(format!("price list {}", pricelist.id))),
        }
    }

    fn company(&self, id: CompanyId) -> DomainResult<Company> {
        self.read()?
            .companies
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("company {id}")))
    }

    fn companies(&self) -> DomainResult<Vec<Company>> {
        let state = self.read()?;
        Ok(state
            .company_order
            .iter()
            .filter_map(|id| state.companies.get(id).cloned())
            .collect())
    }

    fn insert_company(&self, company: Company) -> DomainResult<CompanyId> {
        let mut state = self.write()?;
        let id = company.id;
        if state.companies.contains_key(&id) {
            return Err(DomainError::conflict(format!("company {id} already exists")));
        }
        state.companies.insert(id, company);
        state.company_order.push(id);
        Ok(id)
    }

    fn save_company(&self, company: Company) -> DomainResult<()> {
        let mut state = self.write()?;
        match state.companies.get_mut(&company.id) {
            Some(existing) => {
                *existing = company;
                Ok(())
            }
            None => Err(DomainError::not_found(format!("company {}", company.id))),
        }
    }
}
