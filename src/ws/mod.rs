//! Server connection: wire protocol, outbound transport and session loop

pub mod protocol;
pub mod session;
pub mod transport;
