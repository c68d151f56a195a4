//! jreview - AI-assisted review and unit-test generation for Java projects
//!
//! Every source file under `src/main/java` is sent to an OpenAI-compatible
//! completion service for review, and tagged by two small local classifiers
//! (a naive-Bayes category model and a k-means style model) whose trained
//! artifacts live in a [`store::ModelStore`].

pub mod ai;
pub mod classifier;
pub mod config;
pub mod report;
pub mod review;
pub mod store;
