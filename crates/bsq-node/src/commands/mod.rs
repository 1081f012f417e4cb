pub mod fee;
pub mod ledger;
pub mod op_return;
pub mod sync;
