use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// How missing (`NaN`) entries are propagated after a computation.
#[derive(
    Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum FillMethod {
    /// Carry the last valid value forward.
    #[strum(to_string = "ffill", serialize = "pad")]
    #[serde(alias = "pad")]
    Ffill,
    /// Carry the next valid value backward.
    #[strum(to_string = "bfill", serialize = "backfill")]
    #[serde(alias = "backfill")]
    Bfill,
}
