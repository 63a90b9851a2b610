//! # oxide-link
//!
//! A lightweight ORM: models declare a table and ordered, validated fields;
//! instances are saved and deleted; collections are read through lazy,
//! chainable query sets whose filters lower to parameterized SQL.
//!
//! This crate provides:
//! - `Model` trait and `ModelSchema` for table definitions
//! - `ModelInstance` with insert/update/delete and primary-key tracking
//! - `QuerySet` for lazy, chainable, buffered queries
//! - `Q` objects for complex filter expressions
//! - Field types with validation
//! - The `Gateway` contract a database driver implements
//!
//! Everything is synchronous: each database call blocks until the gateway
//! answers.
//!
//! ## Quick Start
//!
//! ```ignore
//! use oxide_link::fields::{CharField, Field, IntegerField};
//! use oxide_link::{Model, Q, SharedGateway};
//!
//! struct User;
//!
//! impl Model for User {
//!     fn table_name() -> &'static str {
//!         "user"
//!     }
//!
//!     fn field_definitions() -> Vec<(&'static str, Box<dyn Field>)> {
//!         vec![
//!             ("id", Box::new(IntegerField::auto())),
//!             ("name", Box::new(CharField::new(10))),
//!         ]
//!     }
//! }
//!
//! fn example(gateway: &SharedGateway) -> oxide_link::Result<()> {
//!     let mut alice = User::create(gateway)?;
//!     alice.set("name", "Alice")?;
//!     alice.save()?;
//!
//!     let mut users = User::objects(gateway)?
//!         .filter(Q::gt("name", "B"))
//!         .order("name", true)
//!         .limit(2, 0)?;
//!     println!("{} users", users.count()?);
//!
//!     let bob = User::objects(gateway)?.filter(Q::eq("name", "Bob")).get()?;
//!     println!("{bob}");
//!     Ok(())
//! }
//! ```
//!
//! ## Complex Filters with Q Objects
//!
//! ```ignore
//! use oxide_link::Q;
//!
//! // AND conditions
//! let filter = Q::eq("status", "active").and(Q::gt("age", 18));
//!
//! // OR conditions
//! let filter = Q::eq("role", "admin").or(Q::eq("role", "moderator"));
//!
//! // NOT conditions
//! let filter = Q::eq("deleted", true).not();
//!
//! // IN lists must not be empty
//! let filter = Q::in_list("role", ["admin", "staff"])?;
//! ```

mod error;
pub mod fields;
pub mod gateway;
mod instance;
pub mod query;
mod queryset;
pub mod schema;
pub mod value;

pub use error::{OrmError, Result, ValidationError};
pub use gateway::{Gateway, ResultSet, Row, SharedGateway, Statement};
pub use instance::ModelInstance;
pub use query::{CompareOp, FilterExpr, Q};
pub use queryset::{OrderBy, OrderDirection, QuerySet};
pub use schema::{Model, ModelSchema};
pub use value::{SqlValue, ToSqlValue};
