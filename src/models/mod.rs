pub mod credential;
pub mod did;
