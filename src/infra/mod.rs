pub mod safemiles;
pub mod session;
