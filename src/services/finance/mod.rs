//! Money in and money out: funding sources, the expenditures drawn from them,
//! and debts owed in either direction.

pub mod debts;
pub mod expenditures;
pub mod funding;

pub use debts::DebtService;
pub use expenditures::ExpenditureService;
pub use funding::FundingService;
