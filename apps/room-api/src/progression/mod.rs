pub mod ledger;
pub mod service;
