//! Condition compilation and SQL statement building for recordkit.
//!
//! `recordkit-query` turns query intent into SQL text plus an ordered list of
//! bind values. It owns no shared state; every compilation is independent.
//!
//! # Role In The Architecture
//!
//! - **Conditions**: [`Condition`] is a tagged union over the accepted input
//!   shapes (raw SQL, positional binds, equality maps, derived finders), all
//!   compiled by one function into a [`CompiledCondition`].
//! - **Options**: [`FindOptions`] is the options structure finders accept.
//! - **Statements**: [`SqlBuilder`] renders SELECT/INSERT/UPDATE/DELETE with the
//!   connection's dialect.
//! - **Pagination**: [`Paginator`] strategies, chosen per dialect or overridden.
//!
//! Every placeholder is the single positional marker `?`. The number of
//! placeholders in rendered SQL always equals the number of bind values.

pub mod builder;
pub mod condition;
pub mod options;
pub mod pagination;

pub use builder::{SqlBuilder, StatementKind, StatementPlan};
pub use condition::{CompiledCondition, Condition, ConditionArg, Joiner, count_placeholders};
pub use options::{FindOptions, OPTION_KEYS, OptionValue, SetClause};
pub use pagination::{LimitOffset, Paginator, ROW_NUMBER_COLUMN, RowNumberWrap, default_paginator};
