//! # GraphQL Resolvers Module
//!
//! Query and Subscription resolvers.

pub mod query;
pub mod subscription;

pub use query::QueryRoot;
pub use subscription::SubscriptionRoot;
