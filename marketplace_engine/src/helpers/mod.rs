mod order_numbers;
mod passwords;
mod slugs;
pub mod validation;

pub use order_numbers::{new_order_number, ORDER_NUMBER_PREFIX};
pub use passwords::{hash_password, verify_password, PasswordError, DUMMY_PASSWORD_HASH};
pub use slugs::slugify;
pub use validation::{ValidationErrors, MAX_QUANTITY, MAX_QUANTITY_MESSAGE};
