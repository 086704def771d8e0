//! Question-answering backend for a single project car: a deterministic
//! rule engine over the parts ledger, plus semantic retrieval over
//! pre-embedded manual pages, owner notes, and parts history.

pub mod core;
pub mod llm;
pub mod rag;
pub mod rules;
pub mod server;
pub mod state;
