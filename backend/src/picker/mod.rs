//! Client side of the Google Photos Picker API.

pub mod client;
pub mod error;

pub use client::{ByteStream, GooglePickerClient, MediaDownload, MediaItemsQuery, PickerApi};
pub use error::PickerError;

#[cfg(test)]
pub use client::MockPickerApi;
