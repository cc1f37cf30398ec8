//! MongoDB implementation of the Convoca document store.

pub mod mongo;

pub use mongo::MongoCollection;
