//! Portal client: HTTP transport and the three-step session.

pub mod http;
pub mod session;
