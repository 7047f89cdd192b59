//! NGSI-LD boundary for Agrigraph
//!
//! Everything wire-shaped lives here: decoding broker entities into the
//! flat model, encoding relationship patches into NGSI-LD fragments, the
//! Orion-LD client (behind the `orion` feature), and the request-token
//! guard that turns late responses to dismissed operations into safe
//! no-ops.
//!
//! The attribute names `refAgriParcel`, `refAgriFarm` and
//! `refAgriGreenhouse` are the only contract shared with the backend;
//! every other shape in this crate is tolerant of both normalized and
//! `keyValues` representations.

pub mod codec;
pub mod error;
pub mod token;

#[cfg(feature = "orion")]
pub mod client;

pub use codec::{decode_entities, decode_entity, encode_relationship_patch};
pub use error::NgsiError;
pub use token::{RequestToken, TokenIssuer};

#[cfg(feature = "orion")]
pub use client::OrionClient;
