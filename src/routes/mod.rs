mod auth;
mod books;
mod health_check;

pub use auth::{logout, recover_password, refresh, signin, signup, update_password};
pub use books::{create_book, delete_book, get_book, list_books, update_book};
pub use health_check::health_check;
