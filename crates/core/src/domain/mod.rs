pub mod item;
pub mod month;
pub mod transaction;

pub use item::{ItemCatalog, ItemName, DEFAULT_ITEM_VOCABULARY};
pub use month::Month;
pub use transaction::{
    CustomerId, IngestReport, PaymentMethod, RejectReason, Transaction, TransactionRecord,
    TransactionTable,
};
