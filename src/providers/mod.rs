pub mod revolut;
