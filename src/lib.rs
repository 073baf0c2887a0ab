//! # Restmap - declarative REST requests
//!
//! Restmap turns a typed *request descriptor* into an HTTP request, using a
//! declaration attached to the descriptor's type: a route template, an HTTP
//! verb, and where each field goes (path, query string, or JSON body). The
//! response is decoded back into the descriptor's response type.
//!
//! ## Quick Start
//!
//! ```no_run
//! use restmap::metadata::{Descriptor, DescriptorMetadata, FieldValues, MetadataBuilder, Verb};
//! use restmap::Client;
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize)]
//! struct Category {
//!     id: u32,
//!     title: String,
//!     clues_count: u32,
//! }
//!
//! struct GetCategory {
//!     id: Option<u32>,
//! }
//!
//! impl Descriptor for GetCategory {
//!     type Response = Category;
//!
//!     fn declare() -> MetadataBuilder {
//!         DescriptorMetadata::builder()
//!             .route("/category/{id}")
//!             .verb(Verb::Get)
//!             .field("Id")
//!     }
//!
//!     fn write_fields(&self, fields: &mut FieldValues) -> restmap::Result<()> {
//!         fields.set("Id", &self.id)?;
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> Result<(), restmap::Error> {
//!     let client = Client::builder()
//!         .base_url("https://trivia.example.com/api")?
//!         .build()?;
//!
//!     // GET https://trivia.example.com/api/category/7
//!     match client.invoke(&GetCategory { id: Some(7) })? {
//!         Some(category) => println!("{} ({} clues)", category.title, category.clues_count),
//!         None => println!("category unavailable"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Field placement
//!
//! - A field named by a `{placeholder}` in the route is substituted into the
//!   path and must have a value.
//! - A field declared with [`body_field`](metadata::MetadataBuilder::body_field)
//!   becomes a key of the JSON body object.
//! - A field declared with [`body_value`](metadata::MetadataBuilder::body_value)
//!   becomes the whole JSON body.
//! - Every other field goes to the query string.
//!
//! Fields without a value are skipped. Query and body keys are the declared
//! names converted by the client's [`NamingPolicy`](naming::NamingPolicy),
//! snake_case by default (`MinDate` is sent as `min_date`).
//!
//! ## Failure policy
//!
//! [`Client::invoke`] returns `Err` only for declaration defects, before
//! anything is sent. Transport failures, non-2xx statuses and undecodable
//! bodies are logged with `tracing`, passed to the client's error hook, and
//! returned as `Ok(None)`.

mod client;
pub mod encode;
mod error;
pub mod metadata;
pub mod naming;
pub mod request;
mod response;
mod transport;

pub use client::{Client, ClientBuilder, ErrorHook, RequestHook, ResponseHook};
pub use error::{Error, Result};
pub use metadata::{Descriptor, Verb};
pub use request::HttpRequest;
pub use response::{HttpResponse, RawStatus};
pub use transport::{ReqwestTransport, Transport};
