//! Agreement profiling between the two labelings of a contingency matrix.

mod agreement;
mod purity;

pub use agreement::{adjusted_rand_index, normalized_mutual_info, profile_agreement, AgreementProfile};
pub use purity::{profile_purity, PurityProfile, RowAssignment};
