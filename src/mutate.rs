use crate::types::{Dataset, PowerStatus};
use tracing::warn;

/// Produces a new dataset with the named district's status fields
/// overwritten. The input dataset is untouched; the return value is a
/// fully independent copy even when nothing matched, so callers can never
/// end up aliasing the snapshot they passed in.
///
/// All districts whose name matches are updated (expected zero or one; a
/// document with duplicate names gets every duplicate updated). Status
/// fields are overwritten unconditionally: empty start/end strings are
/// stored as given, not skipped, and outage times are never cleared when
/// the status moves away from `Outage`. An unknown name is a no-op, not an
/// error.
pub fn apply(
    dataset: &Dataset,
    district_name: &str,
    status: PowerStatus,
    outage_start: &str,
    outage_end: &str,
) -> Dataset {
    let mut next = dataset.clone();
    let mut matched = 0usize;

    for district in next
        .districts
        .iter_mut()
        .filter(|d| d.name == district_name)
    {
        district.status = status.clone();
        district.outage_start = Some(outage_start.to_string());
        district.outage_end = Some(outage_end.to_string());
        matched += 1;
    }

    if matched == 0 {
        warn!(district = district_name, "status update matched no district");
    }

    next
}
