//! HTTP request handlers, grouped by resource.

pub mod notification;
