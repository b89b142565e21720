//! Uniform translation client backed by Google Translate or Microsoft Translator.

pub mod core;
pub mod error;
pub mod google;
pub mod http;
pub mod microsoft;

pub use crate::{
    core::{Language, Translator},
    error::{Error, Result},
};
