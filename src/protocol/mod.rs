//! Portal wire format: endpoints, login payload and license query.

pub mod endpoints;
pub mod payload;
