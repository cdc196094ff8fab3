//! Headless provider for the KKBOX streaming service.
//!
//! * [`gateway`] speaks the encrypted mobile API: login, session renewal,
//!   device activation, playback tickets and catalogue lookups
//! * [`decrypt`] downloads and decrypts protected audio
//! * [`provider`] maps the catalogue into [`metadata`] records
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

#[macro_use]
extern crate log;

pub mod cipher;
pub mod config;
pub mod decrypt;
pub mod device;
pub mod error;
pub mod gateway;
pub mod http;
pub mod image;
pub mod link;
pub mod lyrics;
pub mod metadata;
pub mod protocol;
pub mod provider;
pub mod quality;
pub mod session;
pub mod util;
