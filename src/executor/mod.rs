pub mod aggregate;
pub mod batch;
pub mod cursor;
pub mod paginate;
pub mod predicate;
pub mod pull;
pub mod scan;
pub mod users;
