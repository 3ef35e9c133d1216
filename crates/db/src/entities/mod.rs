//! `SeaORM` entities, one per table.

pub mod accounts;
pub mod cards;
pub mod credits;
pub mod payment_schedules;
pub mod transactions;
pub mod users;
