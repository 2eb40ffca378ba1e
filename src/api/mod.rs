pub mod scanner;

pub use scanner::MarkerScanner;
