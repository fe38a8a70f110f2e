//! SeaORM entities, one module per table.

pub mod appointment;
pub mod business;
pub mod category;
pub mod customer;
pub mod debt;
pub mod debt_payment;
pub mod delivery;
pub mod distribution_client;
pub mod distribution_route;
pub mod employee;
pub mod expenditure;
pub mod funding_source;
pub mod product;
pub mod production;
pub mod production_labor;
pub mod production_output;
pub mod production_resource;
pub mod production_stage;
pub mod sale;
pub mod sale_item;
pub mod supplier;
