use serde::{Deserialize, Serialize};

use crate::model::common::{election::Weight, identity::Identity};

/// A voter registration request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterRegistration {
    pub voter: Identity,
    #[serde(default = "default_weight")]
    pub weight: Weight,
}

fn default_weight() -> Weight {
    1
}
