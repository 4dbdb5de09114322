//! Activity classification domain

pub mod classifier;

pub use classifier::{default_domain_rules, default_process_rules, extract_domain, CategoryClassifier};
