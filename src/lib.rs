pub mod marketplace;
pub mod portfolio;
pub mod repl;
pub mod trader;
