mod cents;
mod secret;

pub use cents::{Cents, CentsConversionError, ZAR_CURRENCY_CODE, ZAR_CURRENCY_CODE_LOWER};
pub use secret::Secret;
