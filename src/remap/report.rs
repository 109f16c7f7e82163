//! The outcome of a remap pass, shaped for JSON responses.

use serde::{Deserialize, Serialize};

/// Which kind of boundary received a needle.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Boundary {
    /// The implicit boundary before the first command (only when requested).
    DesignStart,
    /// An explicit `ColorChange` command.
    ColorChange,
}

/// One needle written by a remap pass.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeedleAssignment {
    pub boundary: Boundary,
    /// Index into `Pattern::stitches`; `None` for the design start, which has
    /// no command of its own.
    pub stitch_index: Option<usize>,
    pub previous_needle: Option<u32>,
    pub new_needle: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct RemapReport {
    /// Assignments in stitch order; the design start, if any, comes first.
    pub assignments: Vec<NeedleAssignment>,
}

impl RemapReport {
    /// Needles in assignment order.
    pub fn needles(&self) -> Vec<u32> {
        self.assignments.iter().map(|a| a.new_needle).collect()
    }

    /// Stitch indices of the color changes that received a needle.
    pub fn positions(&self) -> Vec<usize> {
        self.assignments
            .iter()
            .filter(|a| a.boundary == Boundary::ColorChange)
            .filter_map(|a| a.stitch_index)
            .collect()
    }

    /// Distinct needles, ascending.
    pub fn used_needles(&self) -> Vec<u32> {
        let mut used = self.needles();
        used.sort_unstable();
        used.dedup();
        used
    }

    /// Number of assignments whose needle actually changed.
    pub fn changed(&self) -> usize {
        self.assignments
            .iter()
            .filter(|a| a.previous_needle != Some(a.new_needle))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment(index: usize, previous: Option<u32>, new: u32) -> NeedleAssignment {
        NeedleAssignment {
            boundary: Boundary::ColorChange,
            stitch_index: Some(index),
            previous_needle: previous,
            new_needle: new,
        }
    }

    #[test]
    fn test_used_needles_sorted_unique() {
        let report = RemapReport {
            assignments: vec![
                assignment(2, None, 4),
                assignment(5, Some(4), 1),
                assignment(9, None, 4),
            ],
        };
        assert_eq!(report.needles(), vec![4, 1, 4]);
        assert_eq!(report.used_needles(), vec![1, 4]);
        assert_eq!(report.positions(), vec![2, 5, 9]);
        assert_eq!(report.changed(), 3);
    }

    #[test]
    fn test_json_shape() {
        let report = RemapReport {
            assignments: vec![assignment(1, None, 1)],
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["assignments"][0]["boundary"], "color_change");
        assert_eq!(json["assignments"][0]["new_needle"], 1);
        assert!(json["assignments"][0]["previous_needle"].is_null());
        assert_eq!(json["assignments"][0]["stitch_index"], 1);
    }

    #[test]
    fn test_design_start_has_no_stitch_index() {
        let report = RemapReport {
            assignments: vec![
                NeedleAssignment {
                    boundary: Boundary::DesignStart,
                    stitch_index: None,
                    previous_needle: None,
                    new_needle: 3,
                },
                assignment(0, None, 5),
            ],
        };
        assert_eq!(report.positions(), vec![0]);
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["assignments"][0]["stitch_index"].is_null());
        assert_eq!(json["assignments"][1]["stitch_index"], 0);
    }
}
