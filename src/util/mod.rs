pub mod lang;
pub mod logging;
pub mod numbers;
