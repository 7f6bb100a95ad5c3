pub mod error;
pub mod page;
pub mod record;
pub mod row;
pub mod value;

// Common type aliases
pub type PageNumber = usize;
pub type RowOffset = usize;

// Defaults for the CLI and config file
pub const DEFAULT_BATCH_SIZE: usize = 10;
pub const DEFAULT_PAGE_SIZE: usize = 7;

// Fixed-point scale of the `age` column, DECIMAL(5, 2)
pub const AGE_PRECISION: u32 = 5;
pub const AGE_SCALE: u32 = 2;
