// Market data domain
pub mod market;

// Core trading domain (simulator entities)
pub mod trading;

// Port interfaces
pub mod ports;

// Domain-specific error types
pub mod errors;
