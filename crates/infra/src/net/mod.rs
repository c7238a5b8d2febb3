//! Network reachability probing

mod probe;

pub use probe::TcpProbe;
