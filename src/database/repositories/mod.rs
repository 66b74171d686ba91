//! One repository per entity. Reads borrow a single pooled connection; writes run in
//! one transaction that also covers association changes and delete cascades.

mod businesses;
mod categories;
mod people;
mod tags;
mod tasks;
mod users;

pub use businesses::BusinessRepository;
pub use categories::CategoryRepository;
pub use people::PersonRepository;
pub use tags::TagRepository;
pub use tasks::TaskRepository;
pub use users::UserRepository;
