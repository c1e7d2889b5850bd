mod desc;
mod dump;

pub use desc::{ElectionInfo, ElectionSummary};
pub use dump::{AuditError, ElectionDump, VoterRecord};
