pub mod logging;
pub mod parse;
pub mod setting;
