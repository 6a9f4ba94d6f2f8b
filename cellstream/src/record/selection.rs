//! Primary/neighbor split of the cells in one message.

use super::model::CellObservation;

/// The serving cell and the other visible cells of one message.
#[derive(Debug, Clone, PartialEq)]
pub struct CellSelection {
    pub primary: CellObservation,
    /// Remaining identified cells, in the order the device reported them.
    pub neighbors: Vec<CellObservation>,
}

/// Pick the primary cell among the identified cells of a message.
///
/// Cells lacking a country or network code are discarded first. The primary
/// is the first remaining cell flagged `registered`, or the first remaining
/// cell when none is. Returns `None` if no identified cell remains.
pub fn select_cells(cells: &[CellObservation]) -> Option<CellSelection> {
    let mut candidates: Vec<CellObservation> = cells
        .iter()
        .filter(|c| c.is_identified())
        .cloned()
        .collect();

    if candidates.is_empty() {
        return None;
    }

    let primary_index = candidates.iter().position(CellObservation::is_registered).unwrap_or(0);
    let primary = candidates.remove(primary_index);

    Some(CellSelection {
        primary,
        neighbors: candidates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Scalar;

    fn cell(pci: i64, registered: bool) -> CellObservation {
        CellObservation {
            registered: Some(registered),
            mcc: Some("310".into()),
            mnc: Some("260".into()),
            pci: Some(Scalar::Int(pci)),
            ..Default::default()
        }
    }

    #[test]
    fn test_registered_cell_is_primary() {
        let cells = vec![cell(1, false), cell(2, true), cell(3, false)];
        let selection = select_cells(&cells).unwrap();
        assert_eq!(selection.primary, cells[1]);
        assert_eq!(selection.neighbors, vec![cells[0].clone(), cells[2].clone()]);
    }

    #[test]
    fn test_first_cell_when_none_registered() {
        let cells = vec![cell(1, false), cell(2, false)];
        let selection = select_cells(&cells).unwrap();
        assert_eq!(selection.primary, cells[0]);
        assert_eq!(selection.neighbors, vec![cells[1].clone()]);
    }

    #[test]
    fn test_second_registered_cell_becomes_neighbor() {
        let cells = vec![cell(1, true), cell(2, true)];
        let selection = select_cells(&cells).unwrap();
        assert_eq!(selection.primary, cells[0]);
        assert_eq!(selection.neighbors, vec![cells[1].clone()]);
    }

    #[test]
    fn test_unidentified_cells_are_dropped() {
        let mut anonymous = cell(9, true);
        anonymous.mnc = None;
        let cells = vec![anonymous, cell(1, false)];
        let selection = select_cells(&cells).unwrap();
        assert_eq!(selection.primary, cells[1]);
        assert!(selection.neighbors.is_empty());
    }

    #[test]
    fn test_no_candidates() {
        assert!(select_cells(&[]).is_none());
        let mut anonymous = cell(9, true);
        anonymous.mcc = Some("".into());
        assert!(select_cells(&[anonymous]).is_none());
    }
}
