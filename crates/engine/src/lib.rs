//! Check-splitting engine.
//!
//! Takes one open order and partitions its charges into independently payable
//! checks (by seat, by custom assignment, evenly, or by fragmenting single
//! items among several payers) without creating or destroying a cent.
//!
//! The engine is synchronous and in-memory. A [`SplitSession`] is opened from
//! an [`OrderSnapshot`], mutated interactively, and finally turned into a
//! [`PreparedCommit`] that a transport hands to the persistence boundary.
//!
//! ```rust
//! use engine::{ItemId, MoneyCents, OrderItem, OrderSnapshot, SplitSession};
//!
//! let order = OrderSnapshot::new(
//!     "order-1",
//!     MoneyCents::new(10_00),
//!     vec![OrderItem::new("pizza", "Pizza", MoneyCents::new(10_00))],
//! );
//! let mut session = SplitSession::builder().order(order).build().unwrap();
//! session.split_item(&ItemId::from("pizza"), 3).unwrap();
//!
//! let totals: Vec<i64> = session.checks().iter().map(|c| c.total.cents()).collect();
//! assert_eq!(totals, vec![333, 333, 334]);
//! assert!(!session.has_integrity_issue());
//! ```

pub use aggregate::{CheckLine, CheckSummary, LineShare, grand_total, recompute_totals};
pub use apportion::{EvenSplitResult, MAX_WAYS, apportion, compute_even_split, fragment_item};
pub use commit::{CommitPlan, PreparedCommit, SplitItemPlan};
pub use error::EngineError;
pub use integrity::{
    CONSERVATION_TOLERANCE_CENTS, IntegrityIssue, IssueKind, check_even_integrity,
    check_integrity,
};
pub use mode::{KeepAssignments, SeatSeeding, SeedStrategy, SplitMode};
pub use money::MoneyCents;
pub use order::{ItemId, OrderItem, OrderSnapshot};
pub use session::{SplitSession, SplitSessionBuilder};
pub use store::{AssignmentStore, Check, CheckEntry, CheckId, Claim, Placement};
pub use tax::{TaxPolicy, TaxRate};

mod aggregate;
mod apportion;
mod commit;
mod error;
mod integrity;
mod mode;
mod money;
mod order;
mod session;
mod store;
mod tax;

type ResultEngine<T> = Result<T, EngineError>;
