//! Carrier API integration for the Chibi backend
//!
//! This crate talks to the telephony carrier on behalf of the rest of the
//! system. It provides:
//!
//! - An HTTP client implementing [`chibi_core::traits::CallLookup`] for
//!   call-record retrieval (one request per lookup, no retries)
//! - An XML-to-structure parser for carrier CDR batch payloads
//!
//! # Architecture
//!
//! ```text
//! Carrier REST API          Carrier XML batches
//!        |                          |
//!        v                          v
//!  HttpCarrierClient           xml::parse
//!        |                          |
//!        v                          v
//!     CarrierCall               XmlValue
//!        |                          |
//!        +-----------+--------------+
//!                    v
//!        CDR reconciliation (chibi-services)
//! ```

pub mod client;
pub mod xml;

pub use client::HttpCarrierClient;
pub use xml::XmlValue;
