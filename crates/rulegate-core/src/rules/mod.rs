//! Rule variants.
//!
//! - [`ConcreteRule`], [`BusinessRule`], [`ComplianceRule`]: closure-backed rules
//! - [`FieldRule`]: predicates over one field value
//! - [`CompositeRule`]: AND / OR / XOR over child rules
//! - [`ConditionalRule`]: runs another rule only while a condition holds
//! - [`AsyncRule`]: bounds another rule by a timeout
//! - [`DatabaseRule`]: a store query whose failures become system errors

mod composite;
mod concrete;
mod conditional;
mod database;
mod field;
mod timeout;

pub use composite::{CompositeRule, LogicalOperator};
pub use concrete::{BusinessRule, ComplianceRule, ConcreteRule};
pub use conditional::ConditionalRule;
pub use database::{DatabaseRule, DEFAULT_QUERY_TIMEOUT};
pub use field::FieldRule;
pub use timeout::AsyncRule;
