pub mod auth;
pub mod categories;
pub mod comments;
pub mod locations;
pub mod pagination;
pub mod posts;
pub mod users;
