//! Transaction admission fees.
//!
//! Every transaction is priced before its messages run: each message has
//! an intrinsic value fee and, unless its type is excluded by governance,
//! a percentage-based system surcharge clamped into `[minimum, maximum]`.
//! The payer must be able to cover the sum; only the surcharge is moved
//! here, to the fee collector module account.

pub mod assessor;
pub mod exclusion;
pub mod params;
pub mod schedule;

pub use assessor::{
    AdmissionError, FeeAssessment, FeeAssessor, NameLookupError, NameRegistry,
};
pub use exclusion::ExclusionRegistry;
pub use params::{FeeParams, FeeParamsError, DEFAULT_BASE_DENOM, PARAMS_SUBSPACE};
pub use schedule::FeeSchedule;
