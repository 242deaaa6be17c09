pub mod clock;
pub mod crypto;
pub mod entropy;
pub mod jwt;
pub mod serialization;
